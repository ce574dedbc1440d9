// Spoken Countdown - pre-rendered audio countdown with a synced console clock

use anyhow::{Context, Result};
use std::io::Write;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use spoken_countdown::{
    audio::{AudioPlayer, AudioRenderer, CancelFlag, PlaybackFinished, TempFiles},
    config::SettingsStore,
    display::{describe_schedule, CountdownClock, Phase},
    schedule::load_override_announcements,
    tts::SynthesizerChain,
};

/// Display refresh cadence
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Removes every recorded temporary file when dropped
struct CleanupGuard(TempFiles);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.0.cleanup();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting spoken countdown");

    // Load configuration
    let store = SettingsStore::new().context("Failed to locate settings directory")?;
    let settings = store.load();
    tracing::debug!(path = %store.path().display(), ?settings, "Settings loaded");

    let prep_seconds = settings
        .prep_seconds()
        .context("Invalid prep_duration in settings")?;
    let main_seconds = settings
        .main_seconds()
        .context("Invalid main_duration in settings")?;

    // Build schedules
    let strategy = settings
        .schedule_strategy()
        .context("Invalid schedule strategy in settings")?;
    let prep_schedule = strategy.announcements(prep_seconds);
    let mut main_schedule = strategy.announcements(main_seconds);

    if let Some(path) = &settings.announcements_file {
        let overrides = load_override_announcements(path);
        if !overrides.is_empty() {
            tracing::info!(
                path = %path.display(),
                count = overrides.len(),
                "Using override announcements for main countdown"
            );
            main_schedule = overrides;
        }
    }

    tracing::info!(
        strategy = strategy.name(),
        "Prep countdown\n{}",
        describe_schedule(prep_seconds, &prep_schedule, settings.audio_offset)
    );
    tracing::info!(
        strategy = strategy.name(),
        "Main countdown\n{}",
        describe_schedule(main_seconds, &main_schedule, settings.audio_offset)
    );

    // Render audio off the runtime thread
    let temp_files = TempFiles::new();
    let _cleanup = CleanupGuard(temp_files.clone());
    let chain = SynthesizerChain::from_settings(&settings.synthesizers, temp_files.clone());
    let cancel = CancelFlag::new();
    let renderer = Arc::new(
        AudioRenderer::new(Box::new(chain), settings.speech_rates())
            .with_temp_files(temp_files)
            .with_cancel_flag(cancel.clone()),
    );

    tracing::info!("Rendering announcements, this may take a moment");
    let mut render_task = {
        let renderer = Arc::clone(&renderer);
        let prep_schedule = prep_schedule.clone();
        let main_schedule = main_schedule.clone();
        tokio::task::spawn_blocking(move || {
            renderer.render_session_to_file(
                prep_seconds,
                &prep_schedule,
                main_seconds,
                &main_schedule,
                None,
            )
        })
    };

    let audio_path = tokio::select! {
        joined = &mut render_task => joined
            .context("Render task failed")?
            .context("Failed to render countdown audio")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C during render, cancelling");
            cancel.cancel();
            if let Ok(Ok(path)) = render_task.await {
                tracing::debug!(path = %path.display(), "Render finished after cancel");
            }
            return Ok(());
        }
    };

    // Start playback
    let mut player = match AudioPlayer::new() {
        Ok(mut player) => {
            player.set_volume(settings.volume);
            Some(player)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Audio output unavailable, running silent countdown");
            None
        }
    };

    let completion: Option<Receiver<PlaybackFinished>> = match player.as_mut() {
        Some(player) => match player.play_file(&audio_path) {
            Ok(rx) => Some(rx),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to start playback");
                None
            }
        },
        None => None,
    };
    let mut audio_done = completion.is_none();

    // Drive the visual clock
    let mut clock = CountdownClock::new(prep_seconds, main_seconds, settings.audio_offset)
        .with_schedules(prep_schedule, main_schedule);
    clock.start(Instant::now());

    let total = settings.audio_offset + (prep_seconds + main_seconds) as f64;
    let ends_at = chrono::Local::now() + chrono::Duration::milliseconds((total * 1000.0) as i64);
    tracing::info!(ends_at = %ends_at.format("%H:%M:%S"), "Countdown started");

    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    let mut shown = String::new();
    let mut stdout = std::io::stdout();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let frame = clock.frame(Instant::now());

                for announcement in &frame.announcements {
                    tracing::debug!(
                        remaining = announcement.remaining_seconds,
                        text = %announcement.text,
                        "Announcement reached"
                    );
                }

                if frame.text != shown {
                    let label = match frame.phase {
                        Phase::Prep => "prep",
                        Phase::Main => "main",
                        Phase::Finished => "",
                    };
                    let _ = write!(stdout, "\r{label:>4} {:>8}", frame.text);
                    let _ = stdout.flush();
                    shown = frame.text;
                }

                if let Some(rx) = &completion {
                    if !audio_done {
                        audio_done = !matches!(rx.try_recv(), Err(TryRecvError::Empty));
                    }
                }

                if frame.phase == Phase::Finished && audio_done {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, stopping");
                break;
            }
        }
    }
    let _ = writeln!(stdout);

    if let Some(player) = player.as_mut() {
        player.stop();
    }

    tracing::info!("Countdown finished");
    Ok(())
}
