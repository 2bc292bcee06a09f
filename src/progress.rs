use crate::pattern::{BreathPattern, Phase};

/// Normalized position within the full breath cycle, in [0, 1].
///
/// Sums the full durations of all phases before the current one plus the time
/// spent in the current phase (capped at its duration, so a frame that
/// overshoots a boundary never reports progress past it). Degenerate patterns
/// report 0.
pub fn cycle_progress(pattern: &BreathPattern, phase: Phase, time_in_phase: f64) -> f64 {
    let total = pattern.total_secs();
    if total <= 0.0 {
        return 0.0;
    }
    let elapsed = pattern.elapsed_before(phase) + time_in_phase.min(pattern.duration(phase));
    (elapsed / total).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::PhaseClock;
    use crate::pattern::PatternId;

    #[test]
    fn zero_at_cycle_start() {
        let p = PatternId::Box.preset();
        assert_eq!(cycle_progress(&p, Phase::Inhale, 0.0), 0.0);
    }

    #[test]
    fn degenerate_pattern_reports_zero() {
        let p = crate::pattern::BreathPattern::new([0.0; 4], ["", "", "", ""]);
        assert_eq!(cycle_progress(&p, Phase::Exhale, 3.0), 0.0);
    }

    #[test]
    fn approaches_one_before_wrap() {
        let p = PatternId::Box.preset();
        let progress = cycle_progress(&p, Phase::HoldLow, 3.9);
        assert!(progress > 0.99 && progress <= 1.0);
    }

    #[test]
    fn overshoot_in_current_phase_is_capped() {
        let p = PatternId::Box.preset();
        assert_eq!(cycle_progress(&p, Phase::Inhale, 7.0), 0.25);
    }

    #[test]
    fn monotonically_non_decreasing_within_a_cycle() {
        let p = PatternId::Relax.preset();
        let mut clock = PhaseClock::new();
        let mut previous = 0.0;
        let total = p.total_secs();
        let mut elapsed = 0.0;
        while elapsed + 0.05 < total {
            clock.advance(&p, 0.05);
            elapsed += 0.05;
            let progress = cycle_progress(&p, clock.phase(), clock.time_in_phase());
            assert!(progress >= previous - 1e-9);
            assert!((0.0..=1.0).contains(&progress));
            previous = progress;
        }
    }
}
