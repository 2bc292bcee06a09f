pub mod bell;
pub mod noise;

pub use self::noise::NoiseKind;

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex, PoisonError,
};
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use serde::{Deserialize, Serialize};

use self::noise::SAMPLE_RATE;

/// User-facing audio preferences. Lifecycle is independent of the session:
/// background noise can be toggled while no session is running.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioState {
    pub enabled: bool,
    pub noise_enabled: bool,
    pub noise_kind: NoiseKind,
    pub bell_volume: f32,
    pub noise_volume: f32,
}

impl Default for AudioState {
    fn default() -> Self {
        Self {
            enabled: true,
            noise_enabled: false,
            noise_kind: NoiseKind::Brown,
            bell_volume: 0.8,
            noise_volume: 0.5,
        }
    }
}

enum AudioCommand {
    Bell { volume: f32 },
    /// Retarget the noise sink gains: the named kind ramps to `volume`,
    /// everything else ramps to silence. `volume` 0 mutes all three.
    NoiseMix { kind: NoiseKind, volume: f32 },
}

/// Handle to the audio engine. The engine itself is a dedicated thread owning
/// the non-Send rodio objects, reached over a command channel; the thread and
/// the output device are created lazily on the first command that would make
/// sound. Every operation degrades to a logged no-op if audio is unavailable.
#[derive(Clone)]
pub struct AudioEngineHandle {
    tx: Arc<Mutex<Option<Sender<AudioCommand>>>>,
    state: Arc<Mutex<AudioState>>,
}

impl AudioEngineHandle {
    pub fn new(initial: AudioState) -> Self {
        Self {
            tx: Arc::new(Mutex::new(None)),
            state: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn state(&self) -> AudioState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flips the global sound switch; muting also silences background noise.
    pub fn toggle_sound(&self) -> bool {
        let enabled = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.enabled = !state.enabled;
            state.enabled
        };
        self.sync_noise();
        enabled
    }

    pub fn toggle_background_noise(&self) -> bool {
        let noise_enabled = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.noise_enabled = !state.noise_enabled;
            state.noise_enabled
        };
        self.sync_noise();
        noise_enabled
    }

    pub fn set_noise_kind(&self, kind: NoiseKind) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .noise_kind = kind;
        self.sync_noise();
    }

    pub fn set_bell_volume(&self, volume: f32) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .bell_volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_noise_volume(&self, volume: f32) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .noise_volume = volume.clamp(0.0, 1.0);
        self.sync_noise();
    }

    /// Plays one bell strike. No-op when sound is globally disabled.
    pub fn play_bell(&self) {
        let state = self.state();
        if !state.enabled {
            return;
        }
        self.send(AudioCommand::Bell {
            volume: state.bell_volume,
        });
    }

    /// Pushes the current noise preferences to the engine. Skipped entirely
    /// when the target is silence and the engine was never started, so merely
    /// toggling preferences never initializes the audio device.
    fn sync_noise(&self) {
        let state = self.state();
        let volume = if state.enabled && state.noise_enabled {
            state.noise_volume
        } else {
            0.0
        };
        if volume <= 0.0 && !self.thread_started() {
            return;
        }
        self.send(AudioCommand::NoiseMix {
            kind: state.noise_kind,
            volume,
        });
    }

    fn thread_started(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn send(&self, cmd: AudioCommand) {
        match self.ensure_thread() {
            Some(tx) => {
                if tx.send(cmd).is_err() {
                    warn!("audio engine thread is gone; dropping command");
                }
            }
            None => debug!("audio unavailable; dropping command"),
        }
    }

    fn ensure_thread(&self) -> Option<Sender<AudioCommand>> {
        let mut guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = guard.as_ref() {
            return Some(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<AudioCommand>();

        // Dedicated thread holding the non-Send rodio stream and sinks.
        let spawned = thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                let mut bank: Option<NoiseBank> = None;
                let mut init_warned = false;

                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCommand::Bell { volume } => {
                            match ensure_bank(&mut bank) {
                                Ok(bank) => {
                                    let samples = bell::render(SAMPLE_RATE, volume);
                                    let source = SamplesBuffer::new(1, SAMPLE_RATE, samples);
                                    if let Err(e) = bank.handle.play_raw(source) {
                                        warn!("failed to play bell cue: {}", e);
                                    }
                                }
                                Err(e) => warn_init_once(&mut init_warned, &e),
                            }
                        }
                        AudioCommand::NoiseMix { kind, volume } => {
                            if volume <= 0.0 && bank.is_none() {
                                continue;
                            }
                            match ensure_bank(&mut bank) {
                                Ok(bank) => bank.retarget(kind, volume),
                                Err(e) => warn_init_once(&mut init_warned, &e),
                            }
                        }
                    }
                }
            });

        match spawned {
            Ok(_) => {
                let tx_clone = tx.clone();
                *guard = Some(tx);
                Some(tx_clone)
            }
            Err(e) => {
                warn!("failed to spawn audio engine thread: {}", e);
                None
            }
        }
    }
}

fn warn_init_once(warned: &mut bool, err: &str) {
    if !*warned {
        warn!("audio output unavailable, sound disabled: {}", err);
        *warned = true;
    } else {
        debug!("audio output still unavailable: {}", err);
    }
}

const RAMP_STEPS: u32 = 12;
const RAMP_STEP_MS: u64 = 5;

/// The three looping noise textures, one sink per kind so switching kinds is
/// just a gain crossfade.
struct NoiseBank {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sinks: Vec<(NoiseKind, Sink)>,
    volumes: Vec<f32>,
}

impl NoiseBank {
    /// Ramps every sink gain linearly to its new target; short steps instead
    /// of an instantaneous jump so enabling or switching noise never clicks.
    fn retarget(&mut self, kind: NoiseKind, volume: f32) {
        let targets: Vec<f32> = self
            .sinks
            .iter()
            .map(|(k, _)| if *k == kind { volume } else { 0.0 })
            .collect();

        for step in 1..=RAMP_STEPS {
            let t = step as f32 / RAMP_STEPS as f32;
            for (i, (_, sink)) in self.sinks.iter().enumerate() {
                sink.set_volume(self.volumes[i] + (targets[i] - self.volumes[i]) * t);
            }
            thread::sleep(Duration::from_millis(RAMP_STEP_MS));
        }

        self.volumes = targets;
    }
}

fn ensure_bank(slot: &mut Option<NoiseBank>) -> Result<&mut NoiseBank, String> {
    if slot.is_none() {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| format!("failed to open audio output: {}", e))?;

        let mut sinks = Vec::with_capacity(NoiseKind::ALL.len());
        for kind in NoiseKind::ALL {
            let sink = Sink::try_new(&handle)
                .map_err(|e| format!("failed to create {} noise sink: {}", kind.as_str(), e))?;
            sink.set_volume(0.0);
            sink.append(SamplesBuffer::new(1, SAMPLE_RATE, noise::render_loop(kind)).repeat_infinite());
            sinks.push((kind, sink));
        }

        let volumes = vec![0.0; sinks.len()];
        *slot = Some(NoiseBank {
            _stream: stream,
            handle,
            sinks,
            volumes,
        });
        debug!("audio output initialized with {} noise loops", NoiseKind::ALL.len());
    }

    slot.as_mut().ok_or_else(|| "audio output unavailable".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_mutators_update_state_without_touching_audio() {
        // None of these may start the audio thread: targets are all silent.
        let audio = AudioEngineHandle::new(AudioState::default());

        assert!(!audio.toggle_sound());
        assert!(audio.toggle_background_noise());
        audio.set_noise_kind(NoiseKind::Pink);
        audio.set_bell_volume(2.0);
        audio.set_noise_volume(-1.0);

        let state = audio.state();
        assert!(!state.enabled);
        assert!(state.noise_enabled);
        assert_eq!(state.noise_kind, NoiseKind::Pink);
        assert_eq!(state.bell_volume, 1.0);
        assert_eq!(state.noise_volume, 0.0);
        assert!(!audio.thread_started());
    }

    #[test]
    fn bell_is_a_noop_when_sound_is_disabled() {
        let audio = AudioEngineHandle::new(AudioState {
            enabled: false,
            ..AudioState::default()
        });
        audio.play_bell();
        assert!(!audio.thread_started());
    }

    #[test]
    fn state_round_trips_through_serde() {
        let state = AudioState {
            enabled: true,
            noise_enabled: true,
            noise_kind: NoiseKind::White,
            bell_volume: 0.4,
            noise_volume: 0.7,
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: AudioState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
