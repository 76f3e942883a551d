//! Player-facing settings
//!
//! Kept apart from tuning: tuning is game balance, settings are the player's
//! choices. Persisted as JSON.

use std::path::Path;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sim::{DEFAULT_DAILY_SALT, RunSeedMode, daily_date_key};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Run seeding ===
    pub run_seed_mode: RunSeedMode,
    /// Mixed into the daily seed; blank falls back to the default salt
    pub daily_challenge_salt: String,
    /// Roll the daily challenge over at UTC midnight instead of local midnight
    pub daily_challenge_use_utc_date: bool,

    // === Restart ===
    /// Start the next run by itself once the restart delay elapses
    pub auto_restart_after_death: bool,
    /// Real seconds between death and restart being possible
    pub restart_delay_seconds: f32,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            run_seed_mode: RunSeedMode::Normal,
            daily_challenge_salt: DEFAULT_DAILY_SALT.to_string(),
            daily_challenge_use_utc_date: true,

            auto_restart_after_death: false,
            restart_delay_seconds: 0.18,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    pub fn sanitized(mut self) -> Self {
        if self.daily_challenge_salt.trim().is_empty() {
            self.daily_challenge_salt = DEFAULT_DAILY_SALT.to_string();
        }
        self.restart_delay_seconds = if self.restart_delay_seconds.is_finite() {
            self.restart_delay_seconds.max(0.0)
        } else {
            0.0
        };
        self.master_volume = crate::clamp01(self.master_volume);
        self.sfx_volume = crate::clamp01(self.sfx_volume);
        self
    }

    /// Today's daily-challenge key as of `now`
    pub fn daily_date_key(&self, now: SystemTime) -> String {
        daily_date_key(now, self.daily_challenge_use_utc_date)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let settings: Settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings.sanitized())
    }

    /// Load, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::info!("Using default settings ({e})");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| Error::io(path, e))?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_repairs_values() {
        let settings = Settings {
            daily_challenge_salt: "  ".into(),
            restart_delay_seconds: -1.0,
            master_volume: 3.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(settings.daily_challenge_salt, DEFAULT_DAILY_SALT);
        assert_eq!(settings.restart_delay_seconds, 0.0);
        assert_eq!(settings.master_volume, 1.0);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("osl-settings-{}.json", std::process::id()));
        let settings = Settings {
            run_seed_mode: RunSeedMode::DailyChallenge,
            auto_restart_after_death: true,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "muted": true }"#).unwrap();
        assert!(settings.muted);
        assert_eq!(settings.restart_delay_seconds, 0.18);
    }

    #[test]
    fn test_daily_date_key_follows_utc_flag() {
        let now = std::time::UNIX_EPOCH + std::time::Duration::from_secs(1_792_195_199);
        let utc = Settings::default();
        assert!(utc.daily_challenge_use_utc_date);
        assert_eq!(utc.daily_date_key(now), "2026-10-16");

        let local = Settings {
            daily_challenge_use_utc_date: false,
            ..Default::default()
        };
        assert_eq!(local.daily_date_key(now), crate::sim::local_date_key(now));
    }

    #[test]
    fn test_missing_file_falls_back() {
        assert_eq!(Settings::load_or_default("/no/such/settings.json"), Settings::default());
    }
}
