// Configuration management

mod migration;

pub use migration::{is_legacy_format, migrate_legacy_json};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::audio::SpeechRates;
use crate::error::{ConfigError, ConfigResult, TimeParseError};
use crate::schedule::{ScheduleStrategy, Stage, StageConfig, StrategySettings};
use crate::time::TimeSpec;
use crate::tts::SynthesizerSettings;

/// Directory name under the platform config dir
const APP_DIR: &str = "spoken-countdown";

/// Settings file name
const SETTINGS_FILE: &str = "settings.toml";

/// Legacy JSON settings file looked for next to the TOML file
const LEGACY_SETTINGS_FILE: &str = "settings.json";

/// Persisted timer settings; every key is optional in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Preparation countdown, e.g. `"20s"`
    #[serde(default = "default_prep_duration")]
    pub prep_duration: TimeSpec,

    /// Main countdown, e.g. `"6m55s"`
    #[serde(default = "default_main_duration")]
    pub main_duration: TimeSpec,

    /// Seconds the visual clock lags audio start
    #[serde(default)]
    pub audio_offset: f64,

    /// Words per minute for phrases
    #[serde(default = "default_tts_rate_normal")]
    pub tts_rate_normal: u32,

    /// Words per minute for bare countdown numbers
    #[serde(default = "default_tts_rate_countdown")]
    pub tts_rate_countdown: u32,

    /// Playback volume (0.0 to 1.0)
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Override list replacing the main phase's generated schedule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announcements_file: Option<PathBuf>,

    /// Which scheduling algorithm to use
    #[serde(default)]
    pub strategy: StrategySettings,

    /// Announcement tiers
    #[serde(default = "default_stages")]
    pub stages: Vec<Stage>,

    /// Ranked synthesis commands, first working one wins
    #[serde(default = "SynthesizerSettings::defaults")]
    pub synthesizers: Vec<SynthesizerSettings>,
}

fn default_prep_duration() -> TimeSpec {
    TimeSpec::from("20s")
}
fn default_main_duration() -> TimeSpec {
    TimeSpec::from("6m55s")
}
fn default_tts_rate_normal() -> u32 {
    180
}
fn default_tts_rate_countdown() -> u32 {
    250
}
fn default_volume() -> f32 {
    1.0
}
fn default_stages() -> Vec<Stage> {
    StageConfig::default().to_records()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            prep_duration: default_prep_duration(),
            main_duration: default_main_duration(),
            audio_offset: 0.0,
            tts_rate_normal: default_tts_rate_normal(),
            tts_rate_countdown: default_tts_rate_countdown(),
            volume: default_volume(),
            announcements_file: None,
            strategy: StrategySettings::default(),
            stages: default_stages(),
            synthesizers: SynthesizerSettings::defaults(),
        }
    }
}

impl Settings {
    /// Prep countdown in whole seconds
    pub fn prep_seconds(&self) -> Result<u64, TimeParseError> {
        self.prep_duration.seconds()
    }

    /// Main countdown in whole seconds
    pub fn main_seconds(&self) -> Result<u64, TimeParseError> {
        self.main_duration.seconds()
    }

    /// Validated stages, or the default tiers if the stored list is invalid
    pub fn stage_config(&self) -> StageConfig {
        match StageConfig::from_records(self.stages.clone()) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Invalid stages in settings, using defaults");
                StageConfig::default()
            }
        }
    }

    /// Configured speech rates
    pub fn speech_rates(&self) -> SpeechRates {
        SpeechRates {
            normal: self.tts_rate_normal,
            countdown: self.tts_rate_countdown,
        }
    }

    /// The configured schedule generator
    pub fn schedule_strategy(
        &self,
    ) -> Result<Box<dyn ScheduleStrategy + Send + Sync>, TimeParseError> {
        self.strategy.build(self.stage_config())
    }
}

/// Loads and persists [`Settings`] at a fixed path
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store at the platform default location
    pub fn new() -> ConfigResult<Self> {
        Ok(Self {
            path: Self::default_path()?,
        })
    }

    /// Store at an explicit path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the settings file
    pub fn default_path() -> ConfigResult<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_DIR).join(SETTINGS_FILE))
    }

    /// Path of the settings file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn legacy_path(&self) -> PathBuf {
        self.path.with_file_name(LEGACY_SETTINGS_FILE)
    }

    /// Load settings, never failing
    ///
    /// A missing file is created with defaults (migrating a legacy JSON file
    /// when one exists). An unreadable or malformed file yields defaults.
    pub fn load(&self) -> Settings {
        if self.path.exists() {
            return match self.read() {
                Ok(settings) => {
                    debug!(path = %self.path.display(), "Loaded settings");
                    settings
                }
                Err(e) => {
                    warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Failed to load settings, using defaults"
                    );
                    Settings::default()
                }
            };
        }

        let settings = self.migrate_legacy().unwrap_or_default();
        if let Err(e) = self.save(&settings) {
            warn!(path = %self.path.display(), error = %e, "Failed to write settings file");
        }
        settings
    }

    fn read(&self) -> ConfigResult<Settings> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn migrate_legacy(&self) -> Option<Settings> {
        let legacy = self.legacy_path();
        let content = std::fs::read_to_string(&legacy).ok()?;
        if !is_legacy_format(&content) {
            return None;
        }

        match migrate_legacy_json(&content) {
            Ok(settings) => {
                info!(from = %legacy.display(), to = %self.path.display(), "Migrated legacy settings");
                Some(settings)
            }
            Err(e) => {
                warn!(path = %legacy.display(), error = %e, "Failed to migrate legacy settings");
                None
            }
        }
    }

    /// Save settings to file
    pub fn save(&self, settings: &Settings) -> ConfigResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(settings)?;
        std::fs::write(&self.path, content)?;

        debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }

    /// Change both durations and persist
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDuration`] if either value does not parse;
    /// nothing is written in that case.
    pub fn update_durations(
        &self,
        prep: impl Into<TimeSpec>,
        main: impl Into<TimeSpec>,
    ) -> ConfigResult<Settings> {
        let (prep, main) = (prep.into(), main.into());
        prep.seconds()?;
        main.seconds()?;

        let mut settings = self.load();
        settings.prep_duration = prep;
        settings.main_duration = main;
        self.save(&settings)?;
        Ok(settings)
    }

    /// Replace the stage tiers and persist
    pub fn update_stages(&self, stages: &StageConfig) -> ConfigResult<Settings> {
        let mut settings = self.load();
        settings.stages = stages.to_records();
        self.save(&settings)?;
        Ok(settings)
    }

    /// Stage configuration from the stored settings
    pub fn stage_config(&self) -> StageConfig {
        self.load().stage_config()
    }
}
