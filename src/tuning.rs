//! Data-driven gameplay tuning
//!
//! Every field has a serde default, so a tuning file only needs the knobs it
//! changes. Values are sanitized on load; nonsense degrades to something
//! playable instead of failing.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::sim::{DifficultyCurve, GapShrinkCurve, ResponseCurve};

/// All tuning, grouped by the system that reads it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub spawner: SpawnerTuning,
    pub player: PlayerTuning,
    pub score: ScoreTuning,
    pub time_ability: TimeAbilityTuning,
}

impl Tuning {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning.sanitized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that cannot be repaired by clamping
    fn validate(&self) -> Result<()> {
        let s = &self.spawner;
        if !s.start_speed.is_finite() || !s.max_speed.is_finite() {
            return Err(Error::InvalidTuning("speeds must be finite"));
        }
        if !s.spawn_y.is_finite() || !s.recycle_y.is_finite() {
            return Err(Error::InvalidTuning("spawn_y and recycle_y must be finite"));
        }
        if s.recycle_y >= s.spawn_y {
            return Err(Error::InvalidTuning("recycle_y must be below spawn_y"));
        }
        Ok(())
    }

    pub fn sanitized(self) -> Self {
        Self {
            spawner: self.spawner.sanitized(),
            player: self.player.sanitized(),
            score: self.score.sanitized(),
            time_ability: self.time_ability.sanitized(),
        }
    }
}

/// Obstacle lane, difficulty ramp, collision and determinism knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerTuning {
    // Lane
    pub pool_size: usize,
    pub spawn_y: f32,
    pub recycle_y: f32,
    /// Half width of the solid row
    pub wall_half_width: f32,
    /// Half width of the region gaps are placed in (the player's reach)
    pub lane_half_width: f32,
    pub max_gap_shift_per_spawn: f32,

    // Ramp
    pub start_speed: f32,
    pub max_speed: f32,
    pub start_spacing: f32,
    pub min_spacing: f32,
    pub start_gap_width: f32,
    pub min_gap_width: f32,
    pub difficulty: DifficultyCurve,
    pub gap_shrink: GapShrinkCurve,
    /// Speed progress to danger intensity
    pub danger_curve: ResponseCurve,

    // Near miss and boosts
    pub near_miss_threshold: f32,
    pub near_miss_speed_boost: f32,
    pub max_speed_boost: f32,
    pub speed_boost_decay_per_second: f32,
    pub signature_moment_enabled: bool,
    pub signature_moment_seconds: f32,
    pub signature_speed_boost: f32,

    // Collision
    /// Shrinks the gap for the discrete pass test; negative is forgiving
    pub gap_edge_padding: f32,
    /// Widens the gap for the overlap test
    pub overlap_edge_padding: f32,

    // Moving gaps
    pub moving_gap_chance_at_start: f32,
    pub moving_gap_chance_at_max_difficulty: f32,
    pub moving_gap_amplitude_min: f32,
    pub moving_gap_amplitude_max: f32,
    /// Radians per second
    pub moving_gap_frequency_min: f32,
    pub moving_gap_frequency_max: f32,

    // Determinism
    pub deterministic_simulation: bool,
    pub fixed_step: f32,
    pub max_steps_per_frame: u32,
    pub max_spawns_per_tick: u32,
}

impl Default for SpawnerTuning {
    fn default() -> Self {
        Self {
            pool_size: 20,
            spawn_y: 7.0,
            recycle_y: -7.0,
            wall_half_width: 6.0,
            lane_half_width: 3.5,
            max_gap_shift_per_spawn: 1.5,

            start_speed: 3.8,
            max_speed: 8.8,
            start_spacing: 2.6,
            min_spacing: 1.9,
            start_gap_width: 2.8,
            min_gap_width: 1.8,
            difficulty: DifficultyCurve::default(),
            gap_shrink: GapShrinkCurve::default(),
            danger_curve: ResponseCurve::new([(0.0, 0.0), (0.5, 0.35), (0.85, 0.8), (1.0, 1.0)]),

            near_miss_threshold: 0.18,
            near_miss_speed_boost: 0.35,
            max_speed_boost: 1.2,
            speed_boost_decay_per_second: 0.6,
            signature_moment_enabled: true,
            signature_moment_seconds: 45.0,
            signature_speed_boost: 0.8,

            gap_edge_padding: 0.0,
            overlap_edge_padding: 0.12,

            moving_gap_chance_at_start: 0.0,
            moving_gap_chance_at_max_difficulty: 0.35,
            moving_gap_amplitude_min: 0.25,
            moving_gap_amplitude_max: 0.9,
            moving_gap_frequency_min: 1.2,
            moving_gap_frequency_max: 2.4,

            deterministic_simulation: false,
            fixed_step: SIM_DT,
            max_steps_per_frame: MAX_SUBSTEPS,
            max_spawns_per_tick: MAX_SPAWNS_PER_TICK,
        }
    }
}

impl SpawnerTuning {
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();

        self.pool_size = self.pool_size.max(1);
        self.spawn_y = finite_or(self.spawn_y, d.spawn_y);
        self.recycle_y = finite_or(self.recycle_y, d.recycle_y);
        if self.recycle_y >= self.spawn_y {
            self.recycle_y = self.spawn_y - 1.0;
        }
        self.lane_half_width = finite_or(self.lane_half_width, d.lane_half_width).max(MIN_GAP_HALF_WIDTH);
        self.wall_half_width = finite_or(self.wall_half_width, d.wall_half_width)
            .max(MIN_ROW_HALF_WIDTH)
            .max(self.lane_half_width);
        self.max_gap_shift_per_spawn = non_negative(self.max_gap_shift_per_spawn);

        self.start_speed = non_negative(self.start_speed);
        self.max_speed = finite_or(self.max_speed, d.max_speed).max(self.start_speed);
        self.start_spacing = finite_or(self.start_spacing, d.start_spacing).max(MIN_SPACING);
        self.min_spacing = finite_or(self.min_spacing, d.min_spacing).max(MIN_SPACING);
        self.start_gap_width = finite_or(self.start_gap_width, d.start_gap_width).max(MIN_GAP_WIDTH);
        self.min_gap_width = finite_or(self.min_gap_width, d.min_gap_width).max(MIN_GAP_WIDTH);
        self.difficulty = self.difficulty.sanitized();
        self.gap_shrink = self.gap_shrink.sanitized();

        self.near_miss_threshold = non_negative(self.near_miss_threshold);
        self.near_miss_speed_boost = non_negative(self.near_miss_speed_boost);
        self.max_speed_boost = non_negative(self.max_speed_boost);
        self.speed_boost_decay_per_second = non_negative(self.speed_boost_decay_per_second);
        self.signature_moment_seconds = non_negative(self.signature_moment_seconds);
        self.signature_speed_boost = non_negative(self.signature_speed_boost);

        self.gap_edge_padding = finite_or(self.gap_edge_padding, 0.0);
        self.overlap_edge_padding = finite_or(self.overlap_edge_padding, 0.0);

        self.moving_gap_chance_at_start = crate::clamp01(self.moving_gap_chance_at_start);
        self.moving_gap_chance_at_max_difficulty = crate::clamp01(self.moving_gap_chance_at_max_difficulty);
        (self.moving_gap_amplitude_min, self.moving_gap_amplitude_max) =
            ordered_range(self.moving_gap_amplitude_min, self.moving_gap_amplitude_max);
        (self.moving_gap_frequency_min, self.moving_gap_frequency_max) =
            ordered_range(self.moving_gap_frequency_min, self.moving_gap_frequency_max);

        if !crate::is_finite_positive(self.fixed_step) {
            self.fixed_step = SIM_DT;
        }
        self.max_steps_per_frame = self.max_steps_per_frame.max(1);
        self.max_spawns_per_tick = self.max_spawns_per_tick.max(1);
        self
    }
}

/// Player movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub max_x: f32,
    /// Exponential smoothing rate toward the target x
    pub smoothing: f32,
    pub y: f32,
    pub hitbox_half_extents: Vec2,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            max_x: 3.5,
            smoothing: 18.0,
            y: -3.0,
            hitbox_half_extents: Vec2::splat(0.15),
        }
    }
}

impl PlayerTuning {
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        self.max_x = non_negative(self.max_x);
        self.smoothing = non_negative(self.smoothing);
        self.y = finite_or(self.y, d.y);
        if !self.hitbox_half_extents.is_finite() {
            self.hitbox_half_extents = d.hitbox_half_extents;
        }
        self.hitbox_half_extents = self.hitbox_half_extents.abs();
        self
    }
}

/// Score and combo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTuning {
    pub points_per_unit: f32,
    pub near_miss_bonus_points: f32,
    /// Multiplier added per consecutive near miss after the first
    pub combo_step: f32,
    pub max_combo_multiplier: f32,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            points_per_unit: 1.0,
            near_miss_bonus_points: 25.0,
            combo_step: 0.25,
            max_combo_multiplier: 3.0,
        }
    }
}

impl ScoreTuning {
    pub fn sanitized(mut self) -> Self {
        self.points_per_unit = non_negative(self.points_per_unit);
        self.near_miss_bonus_points = non_negative(self.near_miss_bonus_points);
        self.combo_step = non_negative(self.combo_step);
        self.max_combo_multiplier = finite_or(self.max_combo_multiplier, 1.0).max(1.0);
        self
    }
}

/// Bullet-time meter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeAbilityTuning {
    /// Time scale while slowed
    pub slow_scale: f32,
    /// Meter capacity in real seconds
    pub max_slow_seconds: f32,
}

impl Default for TimeAbilityTuning {
    fn default() -> Self {
        Self {
            slow_scale: 0.32,
            max_slow_seconds: 1.0,
        }
    }
}

impl TimeAbilityTuning {
    pub fn sanitized(mut self) -> Self {
        self.slow_scale = finite_or(self.slow_scale, 0.32).clamp(0.05, 1.0);
        self.max_slow_seconds = finite_or(self.max_slow_seconds, 1.0).clamp(0.1, 5.0);
        self
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

fn non_negative(value: f32) -> f32 {
    finite_or(value, 0.0).max(0.0)
}

fn ordered_range(a: f32, b: f32) -> (f32, f32) {
    let a = non_negative(a);
    let b = non_negative(b);
    if a <= b { (a, b) } else { (b, a) }
}
