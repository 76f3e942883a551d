//! Obstacle simulation
//!
//! All lane logic lives here. Nothing in this module renders or touches the
//! platform:
//! - Variable step, or fixed step from an accumulator
//! - Seeded RNG only in deterministic mode
//! - Walls iterate oldest first (spawn order, kept across recycling)
//! - Collaborators are lent per update, never owned

pub mod difficulty;
pub mod hooks;
pub mod pool;
pub mod seed;
pub mod spawner;
pub mod wall;

pub use difficulty::{DifficultyCurve, DifficultyPhase, GapShrinkCurve, PHASE_ANCHORS, ResponseCurve};
pub use hooks::{
    AudioCues, DeathCause, DeathLog, DeathSink, PlayerBody, ScoreSink, SpawnerHooks, StaticPlayer,
};
pub use pool::{Pool, PoolHandle, Poolable};
pub use seed::{
    DATE_KEY_FORMAT, DEFAULT_DAILY_SALT, RunSeedContext, RunSeedMode, daily_date_key, local_date_key,
    stable_seed, utc_date_key, volatile_seed,
};
pub use spawner::{ObstacleSpawner, SpawnerSnapshot, WallTemplate, clamp_gap_width_to_fair_range};
pub use wall::{GapOscillation, ObstacleWall, WallSnapshot, WallState};
