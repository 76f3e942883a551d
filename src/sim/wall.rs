//! A single obstacle row with a safe gap
//!
//! The row spans `[-wall_half_width, wall_half_width]` horizontally and
//! `wall_height` vertically around `y`. Everything outside
//! `[gap_left, gap_right]` is solid.

use serde::{Deserialize, Serialize};

use super::pool::Poolable;
use crate::Aabb;
use crate::consts::*;

/// Lifecycle of a wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WallState {
    /// Sitting in the pool
    #[default]
    Inactive,
    /// Configured and scrolling, not yet level with the player
    Spawned,
    /// Crossed the player's y (one-shot)
    Passed,
}

/// Sinusoidal horizontal motion of the gap center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapOscillation {
    pub amplitude: f32,
    /// Radians per second
    pub angular_frequency: f32,
    pub phase: f32,
    pub base_center: f32,
    pub elapsed: f32,
}

impl GapOscillation {
    #[inline]
    pub fn center_at(&self, elapsed: f32) -> f32 {
        self.base_center + self.amplitude * (self.phase + elapsed * self.angular_frequency).sin()
    }
}

/// Serializable view of a wall (replays, CLI output)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallSnapshot {
    pub gap_left: f32,
    pub gap_right: f32,
    pub y: f32,
    pub state: WallState,
    pub oscillation: Option<GapOscillation>,
}

/// One obstacle row
#[derive(Debug, Clone)]
pub struct ObstacleWall {
    state: WallState,
    gap_left: f32,
    gap_right: f32,
    wall_half_width: f32,
    wall_height: f32,
    y: f32,
    passed_player: bool,
    was_near_miss: bool,
    near_miss_distance: f32,
    oscillation: Option<GapOscillation>,
    center_min_limit: f32,
    center_max_limit: f32,
    /// Visual escalation only, never read by collision code
    danger_intensity: f32,
}

impl Default for ObstacleWall {
    fn default() -> Self {
        Self::new(WALL_HEIGHT)
    }
}

impl ObstacleWall {
    pub fn new(wall_height: f32) -> Self {
        Self {
            state: WallState::Inactive,
            gap_left: -MIN_GAP_HALF_WIDTH,
            gap_right: MIN_GAP_HALF_WIDTH,
            wall_half_width: MIN_ROW_HALF_WIDTH,
            wall_height: if wall_height.is_finite() {
                wall_height.max(0.1)
            } else {
                WALL_HEIGHT
            },
            y: 0.0,
            passed_player: false,
            was_near_miss: false,
            near_miss_distance: f32::INFINITY,
            oscillation: None,
            center_min_limit: 0.0,
            center_max_limit: 0.0,
            danger_intensity: 0.0,
        }
    }

    /// (Re)initialize for a new pass down the lane
    ///
    /// Gap width is clamped to `[MIN_GAP_WIDTH, 2 * row_half_width]` and the
    /// center so the whole gap stays inside the row.
    pub fn configure(&mut self, gap_center: f32, gap_width: f32, row_half_width: f32, spawn_y: f32) {
        let half_width = if row_half_width.is_finite() {
            row_half_width.max(MIN_ROW_HALF_WIDTH)
        } else {
            MIN_ROW_HALF_WIDTH
        };
        let width = if gap_width.is_finite() {
            gap_width.clamp(MIN_GAP_WIDTH, half_width * 2.0)
        } else {
            MIN_GAP_WIDTH
        };
        let gap_half = width * 0.5;
        let limit = (half_width - gap_half).max(0.0);
        let center = if gap_center.is_finite() {
            gap_center.clamp(-limit, limit)
        } else {
            0.0
        };

        self.state = WallState::Spawned;
        self.wall_half_width = half_width;
        self.gap_left = center - gap_half;
        self.gap_right = center + gap_half;
        self.center_min_limit = -limit;
        self.center_max_limit = limit;
        self.oscillation = None;
        self.passed_player = false;
        self.was_near_miss = false;
        self.near_miss_distance = f32::INFINITY;
        self.danger_intensity = 0.0;
        self.y = spawn_y;
    }

    /// Make the gap sway around its current center
    ///
    /// The center limits are intersected with the row's own limits and the
    /// amplitude shrunk to the room between the center and the nearer limit.
    /// Returns false (and leaves the gap static) if no motion is possible.
    pub fn set_oscillation(
        &mut self,
        amplitude: f32,
        angular_frequency: f32,
        phase: f32,
        center_min: f32,
        center_max: f32,
    ) -> bool {
        let hard = self.hard_center_limit();
        let mut lo = center_min.max(-hard);
        let mut hi = center_max.min(hard);
        if !(lo <= hi) {
            lo = self.gap_center();
            hi = lo;
        }
        self.center_min_limit = lo;
        self.center_max_limit = hi;

        let base = self.gap_center().clamp(lo, hi);
        let room = (base - lo).min(hi - base).max(0.0);
        let amplitude = if amplitude.is_finite() {
            amplitude.abs().min(room)
        } else {
            0.0
        };

        if amplitude <= f32::EPSILON || !angular_frequency.is_finite() || !phase.is_finite() {
            self.oscillation = None;
            self.set_gap_center(base);
            return false;
        }

        let oscillation = GapOscillation {
            amplitude,
            angular_frequency,
            phase,
            base_center: base,
            elapsed: 0.0,
        };
        self.set_gap_center(oscillation.center_at(0.0));
        self.oscillation = Some(oscillation);
        true
    }

    /// Advance gap motion by `dt`
    pub fn simulate(&mut self, dt: f32) {
        let Some(oscillation) = self.oscillation.as_mut() else {
            return;
        };
        oscillation.elapsed += dt;
        let center = oscillation.center_at(oscillation.elapsed);
        self.set_gap_center(center);
    }

    pub fn move_down(&mut self, distance: f32) {
        self.y -= distance;
    }

    /// Fires once, on the first call where the wall is level with or below the player
    pub fn try_register_pass(&mut self, player_y: f32, player_x: f32, near_miss_threshold: f32) -> bool {
        if self.passed_player || self.y > player_y {
            return false;
        }

        self.passed_player = true;
        self.state = WallState::Passed;
        self.near_miss_distance = self.distance_to_nearest_gap_edge(player_x);
        self.was_near_miss = near_miss_threshold > 0.0 && self.near_miss_distance <= near_miss_threshold;
        true
    }

    /// Distance from `x` to the closest gap edge, whichever side `x` is on
    pub fn distance_to_nearest_gap_edge(&self, x: f32) -> f32 {
        if x <= self.gap_left {
            return self.gap_left - x;
        }
        if x >= self.gap_right {
            return x - self.gap_right;
        }
        (x - self.gap_left).min(self.gap_right - x)
    }

    /// Strict containment in the gap shrunk by `edge_padding` on both sides
    pub fn is_inside_gap(&self, player_x: f32, edge_padding: f32) -> bool {
        player_x > self.gap_left + edge_padding && player_x < self.gap_right - edge_padding
    }

    /// Continuous fail-safe: does the box touch the solid part of the row?
    ///
    /// `edge_padding` widens the gap on both sides before testing.
    pub fn overlaps_solid_bounds(&self, player: &Aabb, edge_padding: f32) -> bool {
        let half_height = self.wall_height * 0.5;
        if player.max.y < self.y - half_height || player.min.y > self.y + half_height {
            return false;
        }
        if player.max.x < -self.wall_half_width || player.min.x > self.wall_half_width {
            return false;
        }

        let overlap_min = player.min.x.max(-self.wall_half_width);
        let overlap_max = player.max.x.min(self.wall_half_width);
        overlap_min < self.gap_left - edge_padding || overlap_max > self.gap_right + edge_padding
    }

    pub fn set_danger_intensity(&mut self, intensity: f32) {
        self.danger_intensity = crate::clamp01(intensity);
    }

    pub fn state(&self) -> WallState {
        self.state
    }

    pub fn gap_left(&self) -> f32 {
        self.gap_left
    }

    pub fn gap_right(&self) -> f32 {
        self.gap_right
    }

    pub fn gap_center(&self) -> f32 {
        (self.gap_left + self.gap_right) * 0.5
    }

    pub fn gap_width(&self) -> f32 {
        self.gap_right - self.gap_left
    }

    pub fn wall_half_width(&self) -> f32 {
        self.wall_half_width
    }

    pub fn wall_height(&self) -> f32 {
        self.wall_height
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn passed_player(&self) -> bool {
        self.passed_player
    }

    pub fn was_near_miss(&self) -> bool {
        self.was_near_miss
    }

    pub fn near_miss_distance(&self) -> f32 {
        self.near_miss_distance
    }

    pub fn oscillation(&self) -> Option<&GapOscillation> {
        self.oscillation.as_ref()
    }

    pub fn center_limits(&self) -> (f32, f32) {
        (self.center_min_limit, self.center_max_limit)
    }

    pub fn danger_intensity(&self) -> f32 {
        self.danger_intensity
    }

    pub fn snapshot(&self) -> WallSnapshot {
        WallSnapshot {
            gap_left: self.gap_left,
            gap_right: self.gap_right,
            y: self.y,
            state: self.state,
            oscillation: self.oscillation,
        }
    }

    fn hard_center_limit(&self) -> f32 {
        (self.wall_half_width - self.gap_width() * 0.5).max(0.0)
    }

    fn set_gap_center(&mut self, center: f32) {
        let center = center.clamp(self.center_min_limit, self.center_max_limit);
        let gap_half = self.gap_width() * 0.5;
        self.gap_left = center - gap_half;
        self.gap_right = center + gap_half;
    }
}

impl Poolable for ObstacleWall {
    fn activate(&mut self) {
        self.state = WallState::Spawned;
    }

    fn deactivate(&mut self) {
        self.state = WallState::Inactive;
    }

    fn reset(&mut self) {
        let wall_height = self.wall_height;
        let state = self.state;
        *self = Self::new(wall_height);
        self.state = state;
    }
}
