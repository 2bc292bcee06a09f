//! Guided breathing timer core.
//!
//! A [`session::SessionController`] drives the whole runtime: it advances a
//! four-phase [`clock::PhaseClock`] from per-frame delta time, maps the
//! resulting cycle progress onto a cached breath-shaped curve
//! ([`path::PathGeometry`]) by arc length, pushes display updates through the
//! [`render::Renderer`] seam, and asks the [`audio`] engine for a bell cue on
//! every phase transition. Patterns come from [`pattern`]: named presets or a
//! user-edited custom pattern.

pub mod audio;
pub mod clock;
pub mod path;
pub mod pattern;
pub mod progress;
pub mod render;
pub mod session;
pub mod settings;

pub use audio::{AudioEngineHandle, AudioState, NoiseKind};
pub use clock::PhaseClock;
pub use path::{PathGeometry, Point, Viewport};
pub use pattern::{BreathPattern, CustomFields, PatternId, PatternSelection, Phase};
pub use progress::cycle_progress;
pub use render::{NullRenderer, Renderer, TerminalRenderer};
pub use session::{SessionController, SessionState, SessionSummary};
pub use settings::SettingsStore;
