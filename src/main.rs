use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::warn;

use breathscape::{
    AudioEngineHandle, NoiseKind, PatternId, PatternSelection, SessionController, SettingsStore,
    TerminalRenderer, Viewport,
};

/// Demo driver: runs one breathing session against the terminal renderer.
///
/// Usage: breathscape [pattern] [seconds] [noise]
/// where pattern is one of box|relax|energize|coherent|triangle, and noise
/// (optional) enables background noise of kind white|pink|brown.
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let pattern = match args.next() {
        Some(raw) => PatternId::parse(&raw).ok_or_else(|| {
            anyhow!(
                "unknown pattern '{}'; expected one of {}",
                raw,
                PatternId::ALL
                    .map(PatternId::as_str)
                    .join(", ")
            )
        })?,
        None => PatternId::Box,
    };
    let seconds: u64 = match args.next() {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow!("invalid session length '{}'", raw))?,
        None => 20,
    };
    let noise = args.next().map(|raw| {
        NoiseKind::parse(&raw).ok_or_else(|| anyhow!("unknown noise kind '{}'", raw))
    });

    let settings = SettingsStore::new(settings_path())?;
    let audio = AudioEngineHandle::new(settings.audio());
    let controller = SessionController::new(
        Arc::new(TerminalRenderer),
        Viewport {
            width: 800.0,
            height: 440.0,
        },
        audio,
    );

    log::info!(
        "{}: {} — {}s session",
        pattern.as_str(),
        pattern.description(),
        seconds
    );

    controller.set_active_pattern(PatternSelection::Preset(pattern)).await;

    if let Some(kind) = noise {
        let kind = kind?;
        controller.set_noise_kind(kind);
        if !controller.audio_state().noise_enabled {
            controller.toggle_background_noise();
        }
    }

    controller.start_session().await?;
    tokio::time::sleep(Duration::from_secs(seconds)).await;

    if let Some(summary) = controller.stop_session().await {
        println!("{}", summary.message());
        println!("{}", summary.share_line());
    }

    if let Err(e) = settings.update_audio(controller.audio_state()) {
        warn!("failed to persist audio settings: {}", e);
    }

    Ok(())
}

fn settings_path() -> std::path::PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("breathscape")
        .join("settings.json")
}
