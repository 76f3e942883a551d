//! Bullet time
//!
//! Holding the ability slows the world to `slow_scale` until the meter runs
//! dry. The meter drains with real (unscaled) time and only refills when a
//! new run starts.

use crate::sim::AudioCues;
use crate::tuning::TimeAbilityTuning;

#[derive(Debug, Clone)]
pub struct TimeAbility {
    tuning: TimeAbilityTuning,
    remaining_seconds: f32,
    slow_active: bool,
}

impl TimeAbility {
    pub fn new(tuning: TimeAbilityTuning) -> Self {
        let tuning = tuning.sanitized();
        Self {
            remaining_seconds: tuning.max_slow_seconds,
            tuning,
            slow_active: false,
        }
    }

    /// Advance the meter by `real_dt` and return the world time scale
    pub fn update(&mut self, real_dt: f32, hold: bool, audio: Option<&mut dyn AudioCues>) -> f32 {
        let wants_slow = hold && self.remaining_seconds > 0.0;
        if wants_slow {
            self.set_slow_active(true, audio, true);
            let drained = if real_dt.is_finite() { real_dt.max(0.0) } else { 0.0 };
            self.remaining_seconds = (self.remaining_seconds - drained).max(0.0);
            if self.remaining_seconds <= 0.0 {
                self.set_slow_active(false, None, false);
            }
        } else {
            self.set_slow_active(false, audio, true);
        }
        self.time_scale()
    }

    /// Refill for a new run, silently back to normal time
    pub fn reset_meter(&mut self) {
        self.remaining_seconds = self.tuning.max_slow_seconds;
        self.slow_active = false;
    }

    /// Drop back to normal time without a cue (death, pause)
    pub fn force_normal_time(&mut self) {
        self.slow_active = false;
    }

    fn set_slow_active(&mut self, active: bool, audio: Option<&mut dyn AudioCues>, play_audio: bool) {
        if self.slow_active == active {
            return;
        }
        self.slow_active = active;
        if !play_audio {
            return;
        }
        if let Some(audio) = audio {
            if active {
                audio.play_slow_enter();
            } else {
                audio.play_slow_exit();
            }
        }
    }

    pub fn time_scale(&self) -> f32 {
        if self.slow_active {
            self.tuning.slow_scale
        } else {
            1.0
        }
    }

    pub fn is_slow_active(&self) -> bool {
        self.slow_active
    }

    pub fn remaining_seconds(&self) -> f32 {
        self.remaining_seconds
    }

    pub fn max_slow_seconds(&self) -> f32 {
        self.tuning.max_slow_seconds
    }

    /// Meter fill in [0, 1]
    pub fn fraction(&self) -> f32 {
        crate::clamp01(self.remaining_seconds / self.tuning.max_slow_seconds)
    }
}
