use crate::pattern::{BreathPattern, Phase};

/// Cyclic state machine tracking position within the breath cycle.
///
/// Advanced once per frame with the frame's delta time; it has no terminal
/// state and runs until the session controller stops driving it. Reset
/// whenever a session starts or the active pattern changes.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseClock {
    phase: Phase,
    time_in_phase: f64,
    /// Phase observed by the previous frame; `None` means "no previous phase",
    /// so the first frame after a reset never reports a transition.
    last_phase: Option<Phase>,
}

impl Default for PhaseClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseClock {
    pub fn new() -> Self {
        Self {
            phase: Phase::Inhale,
            time_in_phase: 0.0,
            last_phase: None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn time_in_phase(&self) -> f64 {
        self.time_in_phase
    }

    /// Advances the clock by `delta_secs`.
    ///
    /// Zero-duration phases are logically instantaneous: every consecutive
    /// zero-duration phase is skipped within this same call, consuming none of
    /// the delta, so no frame ever observes one as current. Overshoot past a
    /// phase boundary is truncated rather than carried into the next phase,
    /// which bounds drift to one frame's duration per transition.
    pub fn advance(&mut self, pattern: &BreathPattern, delta_secs: f64) {
        if pattern.is_degenerate() {
            // Nothing to cycle through; stay parked on inhale.
            return;
        }

        self.skip_zero_phases(pattern);
        self.time_in_phase += delta_secs.max(0.0);

        if self.time_in_phase >= pattern.duration(self.phase) {
            self.time_in_phase = 0.0;
            self.phase = self.phase.next();
            self.skip_zero_phases(pattern);
        }
    }

    fn skip_zero_phases(&mut self, pattern: &BreathPattern) {
        for _ in 0..Phase::ALL.len() {
            if pattern.duration(self.phase) > 0.0 {
                return;
            }
            self.phase = self.phase.next();
            self.time_in_phase = 0.0;
        }
    }

    /// Returns the new phase if it differs from what the previous call saw.
    ///
    /// Used by the render loop to fire the bell cue exactly once per
    /// transition. The first call after a reset seeds the comparison and
    /// reports nothing.
    pub fn take_phase_change(&mut self) -> Option<Phase> {
        match self.last_phase {
            None => {
                self.last_phase = Some(self.phase);
                None
            }
            Some(previous) if previous != self.phase => {
                self.last_phase = Some(self.phase);
                Some(self.phase)
            }
            _ => None,
        }
    }
}
