//! One Second Left - a single-lane gap-dodging endless runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pool, walls, difficulty, spawner, seeding)
//! - `game`: Frame driver that wires the simulation to its collaborators
//! - `session`: Run-state context (playing flag, seed context, death cause)
//! - `score`, `time_ability`, `player`: Gameplay collaborators
//! - `audio`, `analytics`: Fire-and-forget cue and event sinks
//! - `tuning`, `settings`: Data-driven game balance and preferences

pub mod analytics;
pub mod audio;
pub mod error;
pub mod game;
pub mod player;
pub mod score;
pub mod session;
pub mod settings;
pub mod sim;
pub mod time_ability;
pub mod tuning;

pub use error::{Error, Result};
pub use game::{FrameInput, Game};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep for deterministic runs (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum fixed substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the driver will simulate (seconds)
    pub const MAX_FRAME_DT: f32 = 0.25;
    /// Maximum walls spawned in a single tick
    pub const MAX_SPAWNS_PER_TICK: u32 = 8;

    /// Narrowest gap the game will ever present
    pub const MIN_GAP_WIDTH: f32 = 0.9;
    /// Narrowest gap half-width a wall accepts
    pub const MIN_GAP_HALF_WIDTH: f32 = MIN_GAP_WIDTH / 2.0;
    /// Smallest row half-width a wall accepts
    pub const MIN_ROW_HALF_WIDTH: f32 = 0.5;
    /// Smallest distance between two spawns
    pub const MIN_SPACING: f32 = 0.2;

    /// Default wall thickness (world units)
    pub const WALL_HEIGHT: f32 = 0.95;
}

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box centered on `center` extending `half_extents` in each direction
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }
}

/// Linear interpolation with `t` clamped to [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * clamp01(t)
}

/// Clamp to [0, 1], mapping NaN to 0
#[inline]
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// True for finite values strictly greater than zero
#[inline]
pub fn is_finite_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_clamps_t() {
        assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
        assert_eq!(lerp(2.0, 4.0, -1.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 7.0), 4.0);
        assert_eq!(lerp(2.0, 4.0, f32::NAN), 2.0);
    }

    #[test]
    fn test_aabb_normalizes_corners() {
        let aabb = Aabb::new(Vec2::new(1.0, 2.0), Vec2::new(-1.0, -2.0));
        assert_eq!(aabb.min, Vec2::new(-1.0, -2.0));
        assert_eq!(aabb.max, Vec2::new(1.0, 2.0));
        assert_eq!(aabb.center(), Vec2::ZERO);
        assert_eq!(aabb.half_extents(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_is_finite_positive() {
        assert!(is_finite_positive(0.5));
        assert!(!is_finite_positive(0.0));
        assert!(!is_finite_positive(f32::INFINITY));
        assert!(!is_finite_positive(f32::NAN));
    }
}
