use serde::{Deserialize, Serialize};

/// One of the four segments of a breath cycle.
///
/// Replaces the positional 0..3 indexing of phase arrays; the cycle order is
/// fixed (inhale, hold at the top, exhale, hold at the bottom) while the
/// per-phase durations and labels come from the active [`BreathPattern`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Inhale,
    HoldHigh,
    Exhale,
    HoldLow,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Inhale, Phase::HoldHigh, Phase::Exhale, Phase::HoldLow];

    pub fn index(self) -> usize {
        match self {
            Phase::Inhale => 0,
            Phase::HoldHigh => 1,
            Phase::Exhale => 2,
            Phase::HoldLow => 3,
        }
    }

    /// Next phase in cycle order, wrapping from the bottom hold back to inhale.
    pub fn next(self) -> Phase {
        match self {
            Phase::Inhale => Phase::HoldHigh,
            Phase::HoldHigh => Phase::Exhale,
            Phase::Exhale => Phase::HoldLow,
            Phase::HoldLow => Phase::Inhale,
        }
    }

    pub fn is_hold(self) -> bool {
        matches!(self, Phase::HoldHigh | Phase::HoldLow)
    }
}

/// A four-phase breathing pattern: per-phase durations in seconds plus the
/// label shown while that phase is active. An empty label means the phase is
/// displayed as blank. A duration of 0 means the phase is skipped instantly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreathPattern {
    pub timings: [f64; 4],
    pub labels: [String; 4],
}

impl BreathPattern {
    pub fn new(timings: [f64; 4], labels: [&str; 4]) -> Self {
        Self {
            timings,
            labels: labels.map(|l| l.to_string()),
        }
    }

    pub fn duration(&self, phase: Phase) -> f64 {
        self.timings[phase.index()]
    }

    pub fn label(&self, phase: Phase) -> &str {
        &self.labels[phase.index()]
    }

    pub fn total_secs(&self) -> f64 {
        self.timings.iter().sum()
    }

    /// Sum of the full durations of all phases strictly before `phase`.
    pub fn elapsed_before(&self, phase: Phase) -> f64 {
        self.timings[..phase.index()].iter().sum()
    }

    /// A pattern whose phases are all zero never advances; the visual
    /// degenerates to a flat idle line.
    pub fn is_degenerate(&self) -> bool {
        self.total_secs() <= 0.0
    }
}

/// Named preset patterns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PatternId {
    Box,
    Relax,
    Energize,
    Coherent,
    Triangle,
}

impl PatternId {
    pub const ALL: [PatternId; 5] = [
        PatternId::Box,
        PatternId::Relax,
        PatternId::Energize,
        PatternId::Coherent,
        PatternId::Triangle,
    ];

    pub fn preset(self) -> BreathPattern {
        match self {
            PatternId::Box => {
                BreathPattern::new([4.0, 4.0, 4.0, 4.0], ["Inhale", "Hold", "Exhale", "Hold"])
            }
            PatternId::Relax => {
                BreathPattern::new([4.0, 7.0, 8.0, 0.0], ["Inhale", "Hold", "Exhale", ""])
            }
            PatternId::Energize => {
                BreathPattern::new([3.0, 1.0, 3.0, 1.0], ["Inhale", "Hold", "Exhale", "Hold"])
            }
            PatternId::Coherent => {
                BreathPattern::new([5.0, 0.0, 5.0, 0.0], ["Inhale", "", "Exhale", ""])
            }
            PatternId::Triangle => {
                BreathPattern::new([4.0, 4.0, 8.0, 0.0], ["Inhale", "Hold", "Exhale", ""])
            }
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            PatternId::Box => "Box Breathing",
            PatternId::Relax => "4-7-8 Relaxing Breath",
            PatternId::Energize => "Energizing Breath",
            PatternId::Coherent => "Coherent Breathing",
            PatternId::Triangle => "Triangle Breathing",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PatternId::Box => "Balanced 4-part pattern to calm the nervous system.",
            PatternId::Relax => "4-7-8 pattern promotes relaxation and better sleep.",
            PatternId::Energize => "Quick rhythm to boost alertness and energy.",
            PatternId::Coherent => "Equal inhale/exhale for heart rate variability optimization.",
            PatternId::Triangle => "Extended exhale pattern for deep calming effect.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PatternId::Box => "box",
            PatternId::Relax => "relax",
            PatternId::Energize => "energize",
            PatternId::Coherent => "coherent",
            PatternId::Triangle => "triangle",
        }
    }

    pub fn parse(s: &str) -> Option<PatternId> {
        PatternId::ALL.into_iter().find(|id| id.as_str() == s)
    }
}

/// Raw user-supplied duration fields for the custom pattern, kept as strings
/// so resolution can apply the documented fallbacks instead of rejecting
/// unparseable input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomFields {
    pub inhale: String,
    pub hold_top: String,
    pub exhale: String,
    pub hold_bottom: String,
}

const CUSTOM_BREATH_FALLBACK: f64 = 4.0;
const CUSTOM_HOLD_FALLBACK: f64 = 0.0;

fn parse_duration_field(raw: &str, fallback: f64) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(fallback)
}

/// What the user picked in the pattern selector: a preset or the custom
/// editor's four fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum PatternSelection {
    Preset(PatternId),
    Custom(CustomFields),
}

impl Default for PatternSelection {
    fn default() -> Self {
        PatternSelection::Preset(PatternId::Box)
    }
}

impl PatternSelection {
    /// Resolves the selection to a concrete pattern. Pure given the current
    /// field values; called fresh whenever the active pattern is needed so
    /// edits to the custom fields take effect immediately.
    pub fn resolve(&self) -> BreathPattern {
        match self {
            PatternSelection::Preset(id) => id.preset(),
            PatternSelection::Custom(fields) => BreathPattern::new(
                [
                    parse_duration_field(&fields.inhale, CUSTOM_BREATH_FALLBACK),
                    parse_duration_field(&fields.hold_top, CUSTOM_HOLD_FALLBACK),
                    parse_duration_field(&fields.exhale, CUSTOM_BREATH_FALLBACK),
                    parse_duration_field(&fields.hold_bottom, CUSTOM_HOLD_FALLBACK),
                ],
                ["Inhale", "Hold", "Exhale", "Hold"],
            ),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PatternSelection::Preset(id) => id.display_name(),
            PatternSelection::Custom(_) => "Custom",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_cycle_wraps() {
        let mut phase = Phase::Inhale;
        for _ in 0..4 {
            phase = phase.next();
        }
        assert_eq!(phase, Phase::Inhale);
    }

    #[test]
    fn presets_have_expected_timings() {
        assert_eq!(PatternId::Box.preset().timings, [4.0, 4.0, 4.0, 4.0]);
        assert_eq!(PatternId::Relax.preset().timings, [4.0, 7.0, 8.0, 0.0]);
        assert_eq!(PatternId::Coherent.preset().timings, [5.0, 0.0, 5.0, 0.0]);
    }

    #[test]
    fn preset_labels_may_be_blank() {
        let relax = PatternId::Relax.preset();
        assert_eq!(relax.label(Phase::HoldLow), "");
        assert_eq!(relax.label(Phase::Inhale), "Inhale");
    }

    #[test]
    fn elapsed_before_accumulates_prior_phases() {
        let p = PatternId::Relax.preset();
        assert_eq!(p.elapsed_before(Phase::Inhale), 0.0);
        assert_eq!(p.elapsed_before(Phase::Exhale), 11.0);
        assert_eq!(p.elapsed_before(Phase::HoldLow), 19.0);
    }

    #[test]
    fn custom_fields_fall_back_on_bad_input() {
        let selection = PatternSelection::Custom(CustomFields {
            inhale: "abc".into(),
            hold_top: "-3".into(),
            exhale: "6.5".into(),
            hold_bottom: "".into(),
        });
        assert_eq!(selection.resolve().timings, [4.0, 0.0, 6.5, 0.0]);
    }

    #[test]
    fn custom_zero_is_a_valid_field_value() {
        let selection = PatternSelection::Custom(CustomFields {
            inhale: "0".into(),
            hold_top: "0".into(),
            exhale: "0".into(),
            hold_bottom: "0".into(),
        });
        let pattern = selection.resolve();
        assert_eq!(pattern.timings, [0.0; 4]);
        assert!(pattern.is_degenerate());
    }

    #[test]
    fn pattern_id_round_trips_through_parse() {
        for id in PatternId::ALL {
            assert_eq!(PatternId::parse(id.as_str()), Some(id));
        }
        assert_eq!(PatternId::parse("custom"), None);
    }
}
