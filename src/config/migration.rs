//! Configuration migration from the legacy JSON settings file
//!
//! Older installs kept a flat `settings.json` with the same keys as the
//! current TOML file but no strategy, volume or synthesizer entries. It is
//! read once, converted and written back as TOML by the settings store.

use serde::Deserialize;
use tracing::{debug, info};

use super::Settings;
use crate::error::ConfigResult;
use crate::schedule::Stage;
use crate::time::TimeSpec;

/// Legacy JSON settings
#[derive(Debug, Clone, Default, Deserialize)]
struct LegacySettings {
    #[serde(default)]
    prep_duration: Option<TimeSpec>,

    #[serde(default)]
    main_duration: Option<TimeSpec>,

    #[serde(default)]
    audio_offset: Option<f64>,

    #[serde(default)]
    stages: Option<Vec<Stage>>,

    #[serde(default)]
    tts_rate_normal: Option<u32>,

    #[serde(default)]
    tts_rate_countdown: Option<u32>,
}

/// Migrate legacy JSON content to current settings
///
/// Keys the legacy file lacks keep their current defaults.
pub fn migrate_legacy_json(content: &str) -> ConfigResult<Settings> {
    let legacy: LegacySettings = serde_json::from_str(content)?;

    info!(
        has_stages = legacy.stages.is_some(),
        "Migrating from legacy JSON settings"
    );

    let settings = convert_legacy(legacy);

    debug!("Migration complete");
    Ok(settings)
}

/// Check if content looks like the legacy JSON format
pub fn is_legacy_format(content: &str) -> bool {
    // Legacy files are a single JSON object
    content.trim_start().starts_with('{')
}

fn convert_legacy(legacy: LegacySettings) -> Settings {
    let defaults = Settings::default();
    Settings {
        prep_duration: legacy.prep_duration.unwrap_or(defaults.prep_duration),
        main_duration: legacy.main_duration.unwrap_or(defaults.main_duration),
        audio_offset: legacy.audio_offset.unwrap_or(defaults.audio_offset),
        tts_rate_normal: legacy.tts_rate_normal.unwrap_or(defaults.tts_rate_normal),
        tts_rate_countdown: legacy
            .tts_rate_countdown
            .unwrap_or(defaults.tts_rate_countdown),
        stages: legacy.stages.unwrap_or(defaults.stages),
        ..defaults
    }
}
