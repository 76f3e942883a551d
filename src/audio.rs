//! Audio cues
//!
//! The core never synthesizes sound. It fires [`SoundEffect`] cues through
//! the [`AudioCues`] collaborator; [`CueRecorder`] is the headless backend
//! that applies the volume settings and keeps what was played.

use crate::sim::{AudioCues, DifficultyPhase};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    /// Player squeezed past a gap edge
    NearMiss,
    /// Difficulty phase changed
    SpeedTier(DifficultyPhase),
    /// One-time surge mid-run
    SignatureMoment,
    /// Run ended
    Crash,
    /// Bullet time engaged
    SlowEnter,
    /// Bullet time released or exhausted
    SlowExit,
}

impl SoundEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundEffect::NearMiss => "near_miss",
            SoundEffect::SpeedTier(_) => "speed_tier",
            SoundEffect::SignatureMoment => "signature_moment",
            SoundEffect::Crash => "crash",
            SoundEffect::SlowEnter => "slow_enter",
            SoundEffect::SlowExit => "slow_exit",
        }
    }
}

/// Headless audio backend
#[derive(Debug, Clone)]
pub struct CueRecorder {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    played: Vec<SoundEffect>,
}

impl Default for CueRecorder {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            played: Vec::new(),
        }
    }
}

impl CueRecorder {
    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = crate::clamp01(vol);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = crate::clamp01(vol);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Play a sound effect; silent cues are dropped
    pub fn play(&mut self, effect: SoundEffect) {
        if self.effective_volume() <= 0.0 {
            return;
        }
        log::trace!("cue {}", effect.as_str());
        self.played.push(effect);
    }

    pub fn played(&self) -> &[SoundEffect] {
        &self.played
    }

    pub fn count(&self, effect: SoundEffect) -> usize {
        self.played.iter().filter(|e| **e == effect).count()
    }

    pub fn clear(&mut self) {
        self.played.clear();
    }
}

impl AudioCues for CueRecorder {
    fn play_near_miss(&mut self) {
        self.play(SoundEffect::NearMiss);
    }

    fn play_speed_tier(&mut self, phase: DifficultyPhase) {
        self.play(SoundEffect::SpeedTier(phase));
    }

    fn play_signature_moment(&mut self) {
        self.play(SoundEffect::SignatureMoment);
    }

    fn play_crash(&mut self) {
        self.play(SoundEffect::Crash);
    }

    fn play_slow_enter(&mut self) {
        self.play(SoundEffect::SlowEnter);
    }

    fn play_slow_exit(&mut self) {
        self.play(SoundEffect::SlowExit);
    }
}
