//! Run seeding
//!
//! Normal runs get a volatile, time-derived seed. Daily-challenge runs hash
//! a salt and the calendar date so every player sees the same obstacles,
//! and always simulate deterministically.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Salt mixed into daily-challenge seeds
pub const DEFAULT_DAILY_SALT: &str = "OneSecondLeft.DailyChallenge.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunSeedMode {
    #[default]
    Normal,
    DailyChallenge,
}

impl RunSeedMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunSeedMode::Normal => "normal",
            RunSeedMode::DailyChallenge => "daily_challenge",
        }
    }
}

/// Immutable description of how the current run was seeded
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunSeedContext {
    pub mode: RunSeedMode,
    pub seed: u64,
    /// `yyyy-MM-dd`, empty for normal runs
    pub challenge_date_key: String,
    pub deterministic: bool,
}

impl RunSeedContext {
    pub fn normal(seed: u64, deterministic: bool) -> Self {
        Self {
            mode: RunSeedMode::Normal,
            seed,
            challenge_date_key: String::new(),
            deterministic,
        }
    }

    /// Daily challenge for `date_key`; always deterministic
    pub fn daily(date_key: &str, salt: &str) -> Self {
        let salt = if salt.trim().is_empty() {
            DEFAULT_DAILY_SALT
        } else {
            salt
        };
        Self {
            mode: RunSeedMode::DailyChallenge,
            seed: stable_seed(&format!("{salt}|{date_key}")),
            challenge_date_key: date_key.to_string(),
            deterministic: true,
        }
    }
}

/// 32-bit FNV-1a over the UTF-16 code units of `input`, masked to 31 bits, never 0
pub fn stable_seed(input: &str) -> u64 {
    if input.is_empty() {
        return 1;
    }

    let mut hash: u32 = 2_166_136_261;
    for unit in input.encode_utf16() {
        hash ^= u32::from(unit);
        hash = hash.wrapping_mul(16_777_619);
    }
    let seed = hash & 0x7fff_ffff;
    if seed == 0 { 1 } else { u64::from(seed) }
}

/// Time-derived seed that differs between runs, never 0
pub fn volatile_seed(run_count: u32) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let mut seed = nanos.wrapping_mul(397) ^ (nanos >> 17);
    seed ^= u64::from(run_count.wrapping_add(1)).wrapping_mul(7919);
    if seed == 0 { 1 } else { seed }
}

/// Format of daily-challenge date keys
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// UTC calendar date of `time` as `yyyy-MM-dd`
pub fn utc_date_key(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(DATE_KEY_FORMAT).to_string()
}

/// Calendar date of `time` in the machine's time zone
pub fn local_date_key(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(DATE_KEY_FORMAT).to_string()
}

/// Daily-challenge key for `time`, in UTC or local time
pub fn daily_date_key(time: SystemTime, use_utc: bool) -> String {
    if use_utc {
        utc_date_key(time)
    } else {
        local_date_key(time)
    }
}
