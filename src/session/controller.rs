use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{debug, info};
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::audio::{AudioEngineHandle, AudioState, NoiseKind};
use crate::clock::PhaseClock;
use crate::path::{PathGeometry, Viewport};
use crate::pattern::PatternSelection;
use crate::progress::cycle_progress;
use crate::render::Renderer;

use super::{format_clock, SessionState, SessionSummary};

/// Stand-in for the host's animation-frame cadence.
const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Quiet periods before a resize or orientation change triggers a path
/// rebuild; orientation gets longer so layout can settle first.
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);
const ORIENTATION_DEBOUNCE: Duration = Duration::from_millis(400);

/// Owns the whole breathing-session runtime: phase clock, cached path
/// geometry, the per-frame animation task and the one-second wall-clock
/// ticker, plus the audio engine handle. One controller per surface; no
/// process-wide state, so independent instances coexist (tests rely on it).
///
/// Two periodic tasks run during a session. They write disjoint renderer
/// fields and both re-check `is_running` at the top of every iteration, so a
/// stop only has to abort both handles to uphold the cancellation contract.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    clock: Arc<Mutex<PhaseClock>>,
    selection: Arc<Mutex<PatternSelection>>,
    geometry: Arc<Mutex<PathGeometry>>,
    viewport: Arc<Mutex<Viewport>>,
    renderer: Arc<dyn Renderer>,
    audio: AudioEngineHandle,
    frame_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    rebuild_guard: Arc<Mutex<Option<CancellationToken>>>,
    frame_interval: Duration,
}

impl SessionController {
    pub fn new(renderer: Arc<dyn Renderer>, viewport: Viewport, audio: AudioEngineHandle) -> Self {
        let selection = PatternSelection::default();
        let geometry = PathGeometry::build(&selection.resolve(), &viewport);

        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            clock: Arc::new(Mutex::new(PhaseClock::new())),
            selection: Arc::new(Mutex::new(selection)),
            geometry: Arc::new(Mutex::new(geometry)),
            viewport: Arc::new(Mutex::new(viewport)),
            renderer,
            audio,
            frame_task: Arc::new(Mutex::new(None)),
            ticker: Arc::new(Mutex::new(None)),
            rebuild_guard: Arc::new(Mutex::new(None)),
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    /// Overrides the animation cadence; tests run much faster than 60 Hz
    /// walls would allow.
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_running()
    }

    /// Starts a session: resets the phase clock, fires the opening bell, and
    /// spawns both periodic tasks.
    pub async fn start_session(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.is_running() {
                return Err(anyhow!("session already running"));
            }
            state.begin(Utc::now(), Instant::now());
        }
        self.clock.lock().await.reset();

        let pattern = self.selection.lock().await.resolve();
        self.renderer.set_phase_label(pattern.label(crate::pattern::Phase::Inhale));
        self.renderer.set_clock_display(&format_clock(0));

        self.audio.play_bell();
        self.spawn_frame_loop().await;
        self.spawn_ticker().await;

        info!("session started ({})", self.selection.lock().await.display_name());
        Ok(())
    }

    /// Stops the session, cancelling both periodic tasks before anything else
    /// so no callback fires against the stopped session. Idempotent; returns
    /// a summary only when the session ran long enough to report.
    pub async fn stop_session(&self) -> Option<SessionSummary> {
        let pattern_name = self.selection.lock().await.display_name().to_string();
        let summary = {
            let mut state = self.state.lock().await;
            if !state.is_running() {
                return None;
            }
            state.finish(&pattern_name)
        };

        self.cancel_tasks().await;

        self.renderer.set_hold_visual(false);
        self.park_marker(0.0).await;

        if let Some(summary) = &summary {
            self.renderer.show_summary(summary);
            info!("session complete: {}s on {}", summary.elapsed_secs, summary.pattern);
        } else {
            debug!("session under the summary threshold; discarded");
        }
        summary
    }

    /// Switches the active pattern. A running session is stopped first; the
    /// clock and geometry always restart from scratch for the new pattern.
    pub async fn set_active_pattern(&self, selection: PatternSelection) {
        if self.is_running().await {
            let _ = self.stop_session().await;
        }

        *self.selection.lock().await = selection;
        self.clock.lock().await.reset();
        self.renderer.set_clock_display(&format_clock(0));
        self.rebuild_geometry().await;
        self.park_marker(0.0).await;
    }

    /// Viewport size changed. Rebuilds are debounced: bursts of resize events
    /// coalesce into one regeneration after a quiet period.
    pub async fn on_resize(&self, viewport: Viewport) {
        *self.viewport.lock().await = viewport;
        self.schedule_rebuild(RESIZE_DEBOUNCE).await;
    }

    /// Orientation changes settle layout more slowly than plain resizes, so
    /// they get a longer quiet period.
    pub async fn on_orientation_change(&self, viewport: Viewport) {
        *self.viewport.lock().await = viewport;
        self.schedule_rebuild(ORIENTATION_DEBOUNCE).await;
    }

    pub fn toggle_sound(&self) -> bool {
        self.audio.toggle_sound()
    }

    pub fn toggle_background_noise(&self) -> bool {
        self.audio.toggle_background_noise()
    }

    pub fn set_noise_kind(&self, kind: NoiseKind) {
        self.audio.set_noise_kind(kind);
    }

    pub fn set_bell_volume(&self, volume: f32) {
        self.audio.set_bell_volume(volume);
    }

    pub fn set_noise_volume(&self, volume: f32) {
        self.audio.set_noise_volume(volume);
    }

    pub fn audio_state(&self) -> AudioState {
        self.audio.state()
    }

    /// Per-frame animation task. Single-flight by construction: the next
    /// iteration only starts after the previous one finished.
    async fn spawn_frame_loop(&self) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(this.frame_interval);
            let mut last_instant: Option<Instant> = None;
            let mut last_label: Option<String> = None;

            loop {
                interval.tick().await;
                if !this.state.lock().await.is_running() {
                    break;
                }

                let now = Instant::now();
                let delta = match last_instant.replace(now) {
                    // First frame only seeds the reference timestamp.
                    None => continue,
                    Some(previous) => now.duration_since(previous).as_secs_f64(),
                };

                // Resolved fresh every frame so custom-field edits apply
                // immediately.
                let pattern = this.selection.lock().await.resolve();

                let (phase, time_in_phase, transition) = {
                    let mut clock = this.clock.lock().await;
                    clock.advance(&pattern, delta);
                    (clock.phase(), clock.time_in_phase(), clock.take_phase_change())
                };

                if transition.is_some() {
                    this.audio.play_bell();
                }

                let label = pattern.label(phase);
                if last_label.as_deref() != Some(label) {
                    this.renderer.set_phase_label(label);
                    this.renderer.set_hold_visual(phase.is_hold() && !label.is_empty());
                    last_label = Some(label.to_string());
                }

                let progress = cycle_progress(&pattern, phase, time_in_phase);
                this.update_marker(progress).await;
            }
        });

        if let Some(old) = self.frame_task.lock().await.replace(handle) {
            old.abort();
        }
    }

    /// Coarse wall-clock ticker; the elapsed display needs whole seconds
    /// only, so it runs decoupled from the frame cadence.
    async fn spawn_ticker(&self) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(CLOCK_TICK);
            // Consume the immediate first tick; start already drew 00:00.
            interval.tick().await;
            loop {
                interval.tick().await;
                let elapsed = {
                    let state = this.state.lock().await;
                    if !state.is_running() {
                        break;
                    }
                    state.elapsed_secs()
                };
                this.renderer.set_clock_display(&format_clock(elapsed));
            }
        });

        if let Some(old) = self.ticker.lock().await.replace(handle) {
            old.abort();
        }
    }

    async fn cancel_tasks(&self) {
        if let Some(handle) = self.frame_task.lock().await.take() {
            handle.abort();
        }
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }

    /// Maps cycle progress to a pixel position via arc length. A lookup
    /// failure means the geometry is not usable this frame; the marker simply
    /// keeps its previous position.
    async fn update_marker(&self, progress: f64) {
        let point = {
            let geometry = self.geometry.lock().await;
            geometry.point_at_length(progress * geometry.total_len())
        };
        match point {
            Some(point) => {
                let viewport = *self.viewport.lock().await;
                let px = PathGeometry::to_pixels(point, &viewport);
                self.renderer.set_marker_position(px.x, px.y);
            }
            None => debug!("path geometry unavailable; skipping marker update"),
        }
    }

    async fn park_marker(&self, progress: f64) {
        self.update_marker(progress).await;
    }

    async fn rebuild_geometry(&self) {
        let pattern = self.selection.lock().await.resolve();
        let viewport = *self.viewport.lock().await;
        *self.geometry.lock().await = PathGeometry::build(&pattern, &viewport);
    }

    /// Re-armed debounce: each new event cancels the pending rebuild and
    /// starts a fresh quiet period.
    async fn schedule_rebuild(&self, quiet: Duration) {
        let token = CancellationToken::new();
        {
            let mut guard = self.rebuild_guard.lock().await;
            if let Some(previous) = guard.replace(token.clone()) {
                previous.cancel();
            }
        }

        let this = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = time::sleep(quiet) => {
                    this.rebuild_geometry().await;
                    let running = this.is_running().await;
                    let progress = if running {
                        let pattern = this.selection.lock().await.resolve();
                        let clock = this.clock.lock().await;
                        cycle_progress(&pattern, clock.phase(), clock.time_in_phase())
                    } else {
                        0.0
                    };
                    this.park_marker(progress).await;
                }
            }
        });
    }

    #[cfg(test)]
    async fn geometry_point_count(&self) -> usize {
        self.geometry.lock().await.point_count()
    }
}
