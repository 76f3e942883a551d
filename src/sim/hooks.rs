//! Collaborators the simulation reports to
//!
//! The spawner never owns these; the frame driver lends them for one update
//! through [`SpawnerHooks`].

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyPhase;
use crate::Aabb;
use crate::analytics::Analytics;

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    /// Player's x was outside the gap when the wall crossed its y
    GapMiss,
    /// Player's box touched the solid part of a wall
    GeometryOverlap,
    Unknown,
}

impl DeathCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeathCause::GapMiss => "gap_miss",
            DeathCause::GeometryOverlap => "geometry_overlap",
            DeathCause::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the player is
pub trait PlayerBody {
    fn position(&self) -> Vec2;

    /// Hitbox for the continuous overlap test; `None` disables that test
    fn bounds(&self) -> Option<Aabb> {
        None
    }
}

/// Score collaborator
pub trait ScoreSink {
    fn add_distance(&mut self, amount: f32);
    /// Called once per near miss with the measured edge distance
    fn add_near_miss_bonus(&mut self, distance: f32);
    /// A wall was passed without a near miss
    fn clean_pass(&mut self) {}
}

/// Fire-and-forget audio cues; implementations must not block
pub trait AudioCues {
    fn play_near_miss(&mut self);
    fn play_speed_tier(&mut self, _phase: DifficultyPhase) {}
    fn play_signature_moment(&mut self) {}
    fn play_crash(&mut self) {}
    fn play_slow_enter(&mut self) {}
    fn play_slow_exit(&mut self) {}
}

/// Death notification; must be idempotent once the player is dead
pub trait DeathSink {
    fn kill_player(&mut self, cause: DeathCause);
}

/// Collaborators lent to [`ObstacleSpawner::update`](super::ObstacleSpawner::update)
pub struct SpawnerHooks<'a> {
    pub death: &'a mut dyn DeathSink,
    pub score: Option<&'a mut dyn ScoreSink>,
    pub audio: Option<&'a mut dyn AudioCues>,
    pub analytics: Option<&'a mut Analytics>,
}

impl<'a> SpawnerHooks<'a> {
    /// Only a death sink, everything else disconnected
    pub fn new(death: &'a mut dyn DeathSink) -> Self {
        Self {
            death,
            score: None,
            audio: None,
            analytics: None,
        }
    }
}

/// Fixed player position with an optional hitbox (tests, replays)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticPlayer {
    pub position: Vec2,
    pub half_extents: Option<Vec2>,
}

impl StaticPlayer {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            half_extents: None,
        }
    }

    pub fn with_hitbox(mut self, half_extents: Vec2) -> Self {
        self.half_extents = Some(half_extents);
        self
    }
}

impl PlayerBody for StaticPlayer {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn bounds(&self) -> Option<Aabb> {
        self.half_extents
            .map(|half| Aabb::from_center(self.position, half))
    }
}

/// Death sink that only records causes (god mode for replays and tests)
#[derive(Debug, Clone, Default)]
pub struct DeathLog {
    pub causes: Vec<DeathCause>,
}

impl DeathSink for DeathLog {
    fn kill_player(&mut self, cause: DeathCause) {
        self.causes.push(cause);
    }
}
