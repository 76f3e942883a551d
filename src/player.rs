//! Player token
//!
//! The token follows the pointer horizontally with exponential smoothing.
//! Grabbing anywhere keeps the token's offset from the pointer, so the first
//! touch never makes it jump.

use glam::Vec2;

use crate::Aabb;
use crate::sim::PlayerBody;
use crate::tuning::PlayerTuning;

#[derive(Debug, Clone)]
pub struct PlayerController {
    tuning: PlayerTuning,
    position: Vec2,
    start_position: Vec2,
    target_x: f32,
    drag_offset_x: f32,
    pointer_was_down: bool,
}

impl PlayerController {
    pub fn new(tuning: PlayerTuning) -> Self {
        let tuning = tuning.sanitized();
        let start_position = Vec2::new(0.0, tuning.y);
        Self {
            tuning,
            position: start_position,
            start_position,
            target_x: start_position.x,
            drag_offset_x: 0.0,
            pointer_was_down: false,
        }
    }

    /// Move toward the pointer. `pointer_x` is the pointer's world x while
    /// pressed, `None` when released.
    pub fn update(&mut self, dt: f32, pointer_x: Option<f32>) {
        match pointer_x.filter(|x| x.is_finite()) {
            Some(world_x) => {
                if !self.pointer_was_down {
                    self.drag_offset_x = self.position.x - world_x;
                    self.pointer_was_down = true;
                }
                let max_x = self.tuning.max_x;
                self.target_x = (world_x + self.drag_offset_x).clamp(-max_x, max_x);
            }
            None => self.pointer_was_down = false,
        }

        if !crate::is_finite_positive(dt) {
            return;
        }
        let t = 1.0 - (-self.tuning.smoothing * dt).exp();
        self.position.x = crate::lerp(self.position.x, self.target_x, t);
    }

    /// Steer directly to `x` (autopilot), bypassing the drag offset
    pub fn set_target_x(&mut self, x: f32) {
        if x.is_finite() {
            let max_x = self.tuning.max_x;
            self.target_x = x.clamp(-max_x, max_x);
        }
    }

    pub fn reset_run_position(&mut self) {
        self.position = self.start_position;
        self.target_x = self.start_position.x;
        self.pointer_was_down = false;
    }

    pub fn target_x(&self) -> f32 {
        self.target_x
    }

    pub fn max_x(&self) -> f32 {
        self.tuning.max_x
    }
}

impl PlayerBody for PlayerController {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn bounds(&self) -> Option<Aabb> {
        Some(Aabb::from_center(self.position, self.tuning.hitbox_half_extents))
    }
}
