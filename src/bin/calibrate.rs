//! Countdown speech-rate calibration
//!
//! Times the words "10" to "1" with the configured synthesizers at several
//! rates and prints the slowest rate where each word fits in one second.
//! Pass `--save` to store the result as `tts_rate_countdown`.

use anyhow::{bail, Context, Result};

use spoken_countdown::{
    audio::TempFiles,
    calibrate::{
        calibrate_countdown_rate, measure_phrases, COUNTDOWN_WORDS, DEFAULT_RATES, SAMPLE_PHRASES,
        WORD_LIMIT_SECS,
    },
    config::SettingsStore,
    tts::SynthesizerChain,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let save = std::env::args().skip(1).any(|arg| arg == "--save");

    let store = SettingsStore::new().context("Failed to locate settings directory")?;
    let mut settings = store.load();

    let temp_files = TempFiles::new();
    let chain = SynthesizerChain::from_settings(&settings.synthesizers, temp_files.clone());

    println!("Speech rate calibration");
    println!("{}", "=".repeat(50));

    let report = calibrate_countdown_rate(&chain, &DEFAULT_RATES, &COUNTDOWN_WORDS);
    for result in &report.results {
        println!("\nRate {}", result.rate);
        for (word, seconds) in &result.durations {
            let mark = if *seconds < WORD_LIMIT_SECS { "ok" } else { "too long" };
            println!("  {word:>3}: {seconds:.3}s {mark}");
        }
        println!("  average {:.3}s, max {:.3}s", result.avg, result.max);
    }
    for rate in &report.failed_rates {
        println!("\nRate {rate}: synthesis failed");
    }

    let Some(rate) = report.recommended_or_fastest() else {
        temp_files.cleanup();
        bail!("No synthesizer could produce speech; check the `synthesizers` setting");
    };
    if report.recommended.is_none() {
        println!("\nNo rate keeps every word under {WORD_LIMIT_SECS}s, using the fastest tested");
    }

    println!("\nPhrases at normal rate ({}):", settings.tts_rate_normal);
    for (phrase, seconds) in measure_phrases(&chain, settings.tts_rate_normal, &SAMPLE_PHRASES) {
        println!("  {phrase:<22} {seconds:.3}s");
    }
    temp_files.cleanup();

    println!("\nRecommended settings:");
    println!("  tts_rate_normal = {}", settings.tts_rate_normal);
    println!("  tts_rate_countdown = {rate}");

    if save {
        settings.tts_rate_countdown = rate;
        store.save(&settings).context("Failed to save settings")?;
        println!("\nSaved to {}", store.path().display());
    }

    Ok(())
}
