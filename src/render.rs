use log::{debug, info, trace};

use crate::session::SessionSummary;

/// Presentation seam: the session controller never reaches into the display
/// directly, it pushes updates through this interface. Implementations decide
/// how (and whether) to show them; a cross-fade on label changes, for
/// instance, is the renderer's business.
pub trait Renderer: Send + Sync {
    /// New phase label; called only when the text actually changed. An empty
    /// label means the phase is displayed blank.
    fn set_phase_label(&self, label: &str);

    /// Whether the current phase is a hold, for the "holding" visual accent.
    fn set_hold_visual(&self, holding: bool);

    /// Marker position in pixel space.
    fn set_marker_position(&self, x: f64, y: f64);

    /// Wall-clock session timer text, already formatted as MM:SS.
    fn set_clock_display(&self, text: &str);

    fn show_summary(&self, summary: &SessionSummary);
}

/// Renderer that discards everything. Useful as a placeholder and in tests.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn set_phase_label(&self, _label: &str) {}
    fn set_hold_visual(&self, _holding: bool) {}
    fn set_marker_position(&self, _x: f64, _y: f64) {}
    fn set_clock_display(&self, _text: &str) {}
    fn show_summary(&self, _summary: &SessionSummary) {}
}

/// Renderer backed by the log facade, used by the demo binary. Label and
/// summary updates are the interesting events; marker positions arrive every
/// frame and go to trace so they can be switched on without drowning the rest.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl Renderer for TerminalRenderer {
    fn set_phase_label(&self, label: &str) {
        if label.is_empty() {
            info!("phase: (hold quietly)");
        } else {
            info!("phase: {}", label);
        }
    }

    fn set_hold_visual(&self, holding: bool) {
        trace!("hold visual: {}", holding);
    }

    fn set_marker_position(&self, x: f64, y: f64) {
        trace!("marker at ({:.1}, {:.1})", x, y);
    }

    fn set_clock_display(&self, text: &str) {
        debug!("session clock: {}", text);
    }

    fn show_summary(&self, summary: &SessionSummary) {
        info!("{}", summary.message());
    }
}
