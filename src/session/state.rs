use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sessions shorter than this produce no summary.
const MIN_SUMMARY_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Running,
}

/// Lifecycle state of the single modeled session. Elapsed time is derived
/// from a monotonic anchor taken at start, not from wall-clock subtraction,
/// so a system clock adjustment mid-session cannot corrupt the duration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub running_anchor: Option<Instant>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn begin(&mut self, started_at: DateTime<Utc>, anchor: Instant) {
        *self = Self {
            status: SessionStatus::Running,
            started_at: Some(started_at),
            running_anchor: Some(anchor),
        };
    }

    /// Whole seconds since the session started; 0 when not running.
    pub fn elapsed_secs(&self) -> u64 {
        match (self.status, self.running_anchor) {
            (SessionStatus::Running, Some(anchor)) => anchor.elapsed().as_secs(),
            _ => 0,
        }
    }

    /// Ends the session, returning a summary when it lasted long enough to be
    /// worth reporting. Always resets to idle.
    pub fn finish(&mut self, pattern_name: &str) -> Option<SessionSummary> {
        let elapsed = self.elapsed_secs();
        *self = Self::default();
        SessionSummary::from_elapsed(pattern_name, elapsed)
    }
}

/// Outcome of a completed session. Held only for the current run; summaries
/// are never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub pattern: String,
    pub elapsed_secs: u64,
}

impl SessionSummary {
    /// `None` for sessions under the reporting threshold.
    pub fn from_elapsed(pattern_name: &str, elapsed_secs: u64) -> Option<Self> {
        if elapsed_secs < MIN_SUMMARY_SECS {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            pattern: pattern_name.to_string(),
            elapsed_secs,
        })
    }

    pub fn minutes_label(&self) -> String {
        format!("{:.1}", self.elapsed_secs as f64 / 60.0)
    }

    pub fn message(&self) -> String {
        format!(
            "Completed {} min session ({}s). Great job maintaining focus.",
            self.minutes_label(),
            self.elapsed_secs
        )
    }

    /// Text handed to the share glue; the native-share/clipboard fallback is
    /// the caller's concern.
    pub fn share_line(&self) -> String {
        format!(
            "I just completed a {} mindful breathing session using the {} pattern.",
            format_clock(self.elapsed_secs),
            self.pattern
        )
    }
}

/// MM:SS wall-clock display, zero-padded.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_sessions_produce_no_summary() {
        assert_eq!(SessionSummary::from_elapsed("Box Breathing", 0), None);
        assert_eq!(SessionSummary::from_elapsed("Box Breathing", 2), None);
        assert_eq!(SessionSummary::from_elapsed("Box Breathing", 4), None);
        assert!(SessionSummary::from_elapsed("Box Breathing", 5).is_some());
    }

    #[test]
    fn six_seconds_reports_a_tenth_of_a_minute() {
        let summary = SessionSummary::from_elapsed("Box Breathing", 6).unwrap();
        assert_eq!(summary.minutes_label(), "0.1");
        assert_eq!(
            summary.message(),
            "Completed 0.1 min session (6s). Great job maintaining focus."
        );
    }

    #[test]
    fn share_line_carries_clock_and_pattern_name() {
        let summary = SessionSummary::from_elapsed("4-7-8 Relaxing Breath", 75).unwrap();
        assert_eq!(
            summary.share_line(),
            "I just completed a 01:15 mindful breathing session using the \
             4-7-8 Relaxing Breath pattern."
        );
    }

    #[test]
    fn clock_formatting_pads_both_fields() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(9), "00:09");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[test]
    fn begin_and_finish_reset_the_state() {
        let mut state = SessionState::new();
        assert!(!state.is_running());
        assert_eq!(state.elapsed_secs(), 0);

        state.begin(Utc::now(), Instant::now());
        assert!(state.is_running());
        assert!(state.started_at.is_some());

        // Immediate stop: below threshold, no summary, back to idle.
        assert_eq!(state.finish("Box Breathing"), None);
        assert!(!state.is_running());
        assert!(state.started_at.is_none());
    }
}
