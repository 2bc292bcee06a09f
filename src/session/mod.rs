pub mod controller;
pub mod state;

pub use controller::SessionController;
pub use state::{format_clock, SessionState, SessionStatus, SessionSummary};
