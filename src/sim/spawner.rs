//! Obstacle spawner - the core simulation loop
//!
//! Owns the wall pool and the active set, evolves speed and difficulty,
//! schedules spawns by travelled distance, and resolves player-vs-wall
//! outcomes. Runs either on the caller's frame delta or, in deterministic
//! mode, on a fixed step fed from an accumulator with a seeded RNG.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::DifficultyPhase;
use super::hooks::{DeathCause, PlayerBody, SpawnerHooks};
use super::pool::{Pool, PoolHandle};
use super::wall::{ObstacleWall, WallSnapshot};
use crate::analytics::{fields, format_f32};
use crate::consts::*;
use crate::lerp;
use crate::tuning::SpawnerTuning;

/// What a wall is built from; without one the spawner stays disabled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallTemplate {
    pub wall_height: f32,
}

impl Default for WallTemplate {
    fn default() -> Self {
        Self {
            wall_height: WALL_HEIGHT,
        }
    }
}

/// Result of one simulation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    Continue,
    Died(DeathCause),
}

/// Serializable view of the spawner (replays, CLI output)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnerSnapshot {
    pub run_elapsed_seconds: f32,
    pub current_speed: f32,
    pub transient_speed_boost: f32,
    pub distance_since_spawn: f32,
    pub phase: DifficultyPhase,
    pub walls_spawned: u32,
    pub near_misses: u32,
    pub walls: Vec<WallSnapshot>,
}

pub struct ObstacleSpawner {
    tuning: SpawnerTuning,
    template: Option<WallTemplate>,
    pool: Option<Pool<ObstacleWall>>,
    /// Active walls, oldest first
    active: Vec<PoolHandle>,
    rng: Pcg32,

    // Seeding
    seed: u64,
    deterministic: bool,
    accumulator: f32,

    // Run state
    run_elapsed_seconds: f32,
    distance_since_spawn: f32,
    base_speed: f32,
    current_speed: f32,
    transient_speed_boost: f32,
    last_gap_center: Option<f32>,
    signature_moment_triggered: bool,
    phase: DifficultyPhase,
    danger_intensity: f32,
    walls_spawned: u32,
    near_misses: u32,
    was_playing_last_frame: bool,

    // One-time diagnostics
    missing_template_logged: bool,
    step_overrun_logged: bool,
    spawn_overrun_logged: bool,
}

impl ObstacleSpawner {
    /// Build a spawner. Without a template spawning stays disabled until
    /// [`set_wall_template`](Self::set_wall_template) is called.
    pub fn new(tuning: SpawnerTuning, template: Option<WallTemplate>) -> Self {
        let tuning = tuning.sanitized();
        let deterministic = tuning.deterministic_simulation;
        let start_speed = tuning.start_speed;
        let mut spawner = Self {
            tuning,
            template: None,
            pool: None,
            active: Vec::new(),
            rng: Pcg32::seed_from_u64(1),
            seed: 1,
            deterministic,
            accumulator: 0.0,
            run_elapsed_seconds: 0.0,
            distance_since_spawn: 0.0,
            base_speed: start_speed,
            current_speed: start_speed,
            transient_speed_boost: 0.0,
            last_gap_center: None,
            signature_moment_triggered: false,
            phase: DifficultyPhase::Safe,
            danger_intensity: 0.0,
            walls_spawned: 0,
            near_misses: 0,
            was_playing_last_frame: false,
            missing_template_logged: false,
            step_overrun_logged: false,
            spawn_overrun_logged: false,
        };
        match template {
            Some(template) => spawner.set_wall_template(template),
            None => spawner.log_missing_template(),
        }
        spawner
    }

    /// Provide the wall template and build the pool (once)
    pub fn set_wall_template(&mut self, template: WallTemplate) {
        self.template = Some(template);
        if self.pool.is_some() {
            return;
        }

        let capacity = self.tuning.pool_size.max(1);
        self.pool = Some(Pool::new(capacity, |_| ObstacleWall::new(template.wall_height)));
        self.active = Vec::with_capacity(capacity);
        self.missing_template_logged = false;
        log::info!("Obstacle pool ready ({capacity} walls)");
    }

    /// Seed for the next run; daily challenges force deterministic stepping
    pub fn configure_run_seed(&mut self, seed: u64, force_deterministic: bool) {
        self.seed = seed;
        self.deterministic = force_deterministic || self.tuning.deterministic_simulation;
    }

    /// Clear the lane and start a fresh run
    pub fn reset_run(&mut self) {
        let Some(pool) = self.pool.as_mut() else {
            self.log_missing_template();
            return;
        };
        pool.release_all(&mut self.active);

        self.rng = if self.deterministic {
            Pcg32::seed_from_u64(self.seed)
        } else {
            Pcg32::from_rng(&mut rand::rng())
        };
        self.accumulator = 0.0;
        self.run_elapsed_seconds = 0.0;
        self.distance_since_spawn = 0.0;
        self.base_speed = self.tuning.start_speed;
        self.current_speed = self.tuning.start_speed;
        self.transient_speed_boost = 0.0;
        self.last_gap_center = None;
        self.signature_moment_triggered = false;
        self.phase = self.tuning.difficulty.phase_at(0.0);
        self.danger_intensity = self.tuning.danger_curve.evaluate(0.0);
        self.walls_spawned = 0;
        self.near_misses = 0;
        self.was_playing_last_frame = true;

        let gap_width = self.evaluate_gap_width(0.0);
        self.spawn_wall(gap_width, 0.0);
    }

    /// Advance by one frame. Returns the number of simulation steps run.
    ///
    /// Nothing moves while `is_playing` is false; the first playing frame
    /// after a pause in play resets the run. The first death in a frame
    /// stops the rest of that frame.
    pub fn update(
        &mut self,
        frame_dt: f32,
        is_playing: bool,
        player: &dyn PlayerBody,
        hooks: &mut SpawnerHooks<'_>,
    ) -> u32 {
        if self.pool.is_none() {
            return 0;
        }
        if !is_playing {
            self.was_playing_last_frame = false;
            return 0;
        }
        if !self.was_playing_last_frame {
            self.reset_run();
        }
        if !crate::is_finite_positive(frame_dt) {
            return 0;
        }

        if !self.deterministic {
            self.step(frame_dt, player, hooks);
            return 1;
        }

        let fixed_step = self.tuning.fixed_step;
        let max_steps = self.tuning.max_steps_per_frame;
        self.accumulator += frame_dt;

        let mut steps = 0;
        while self.accumulator >= fixed_step {
            if steps >= max_steps {
                // Drop the backlog rather than spiral
                self.accumulator = fixed_step * 0.5;
                if !self.step_overrun_logged {
                    self.step_overrun_logged = true;
                    log::warn!(
                        "Fixed-step backlog exceeded {max_steps} steps in one frame; dropping excess time"
                    );
                }
                break;
            }
            self.accumulator -= fixed_step;
            steps += 1;
            if let StepOutcome::Died(_) = self.step(fixed_step, player, hooks) {
                break;
            }
        }
        steps
    }

    fn step(&mut self, dt: f32, player: &dyn PlayerBody, hooks: &mut SpawnerHooks<'_>) -> StepOutcome {
        self.run_elapsed_seconds += dt;
        let elapsed = self.run_elapsed_seconds;
        let progress = self.tuning.difficulty.evaluate_speed_progress(elapsed);

        self.update_phase(elapsed, hooks);
        self.update_signature_moment(elapsed, hooks);
        self.transient_speed_boost =
            (self.transient_speed_boost - self.tuning.speed_boost_decay_per_second * dt).max(0.0);

        self.base_speed = lerp(self.tuning.start_speed, self.tuning.max_speed, progress);
        self.current_speed = self.base_speed + self.transient_speed_boost;
        self.danger_intensity = crate::clamp01(self.tuning.danger_curve.evaluate(progress));

        let distance = self.current_speed * dt;
        if let Some(score) = &mut hooks.score {
            score.add_distance(distance);
        }

        if let Some(cause) = self.move_and_resolve(dt, distance, player, hooks) {
            return StepOutcome::Died(cause);
        }

        self.spawn_by_spacing(distance, progress, elapsed);
        StepOutcome::Continue
    }

    fn update_phase(&mut self, elapsed: f32, hooks: &mut SpawnerHooks<'_>) {
        let phase = self.tuning.difficulty.phase_at(elapsed);
        if phase == self.phase {
            return;
        }
        self.phase = phase;
        log::debug!("Speed tier -> {} at {:.2}s", phase.as_str(), elapsed);

        if let Some(audio) = &mut hooks.audio {
            audio.play_speed_tier(phase);
        }
        if let Some(analytics) = &mut hooks.analytics {
            analytics.track(
                "speed_tier_changed",
                fields([
                    ("tier", phase.tier().to_string()),
                    ("phase", phase.as_str().to_string()),
                    ("elapsed_seconds", format_f32(elapsed)),
                ]),
            );
        }
    }

    fn update_signature_moment(&mut self, elapsed: f32, hooks: &mut SpawnerHooks<'_>) {
        if !self.tuning.signature_moment_enabled
            || self.signature_moment_triggered
            || elapsed < self.tuning.signature_moment_seconds
        {
            return;
        }
        self.signature_moment_triggered = true;

        let cap = self.tuning.max_speed_boost + self.tuning.signature_speed_boost;
        self.transient_speed_boost =
            (self.transient_speed_boost + self.tuning.signature_speed_boost).min(cap);

        if let Some(audio) = &mut hooks.audio {
            audio.play_signature_moment();
        }
        if let Some(analytics) = &mut hooks.analytics {
            analytics.track(
                "signature_moment",
                fields([
                    ("elapsed_seconds", format_f32(elapsed)),
                    ("speed_boost", format_f32(self.transient_speed_boost)),
                ]),
            );
        }
    }

    /// Move, oscillate and test every active wall; recycle the ones past the line.
    /// Returns the first death, skipping the remaining walls.
    fn move_and_resolve(
        &mut self,
        dt: f32,
        distance: f32,
        player: &dyn PlayerBody,
        hooks: &mut SpawnerHooks<'_>,
    ) -> Option<DeathCause> {
        let Some(pool) = self.pool.as_mut() else {
            return None;
        };
        let position = player.position();
        let bounds = player.bounds();
        let tuning = &self.tuning;

        let mut i = 0;
        while i < self.active.len() {
            let handle = self.active[i];
            let Some(wall) = pool.get_mut(handle) else {
                self.active.remove(i);
                continue;
            };

            wall.simulate(dt);
            wall.move_down(distance);
            wall.set_danger_intensity(self.danger_intensity);

            if let Some(bounds) = bounds
                && wall.overlaps_solid_bounds(&bounds, tuning.overlap_edge_padding)
            {
                hooks.death.kill_player(DeathCause::GeometryOverlap);
                return Some(DeathCause::GeometryOverlap);
            }

            if wall.try_register_pass(position.y, position.x, tuning.near_miss_threshold) {
                if !wall.is_inside_gap(position.x, tuning.gap_edge_padding) {
                    hooks.death.kill_player(DeathCause::GapMiss);
                    return Some(DeathCause::GapMiss);
                }

                if wall.was_near_miss() {
                    let near_miss_distance = wall.near_miss_distance();
                    self.near_misses += 1;
                    let boosted = (self.transient_speed_boost + tuning.near_miss_speed_boost)
                        .min(tuning.max_speed_boost);
                    self.transient_speed_boost = self.transient_speed_boost.max(boosted);

                    if let Some(score) = &mut hooks.score {
                        score.add_near_miss_bonus(near_miss_distance);
                    }
                    if let Some(audio) = &mut hooks.audio {
                        audio.play_near_miss();
                    }
                    if let Some(analytics) = &mut hooks.analytics {
                        analytics.track(
                            "near_miss",
                            fields([
                                ("distance", format_f32(near_miss_distance)),
                                ("elapsed_seconds", format_f32(self.run_elapsed_seconds)),
                                ("speed", format_f32(self.current_speed)),
                            ]),
                        );
                    }
                } else if let Some(score) = &mut hooks.score {
                    score.clean_pass();
                }
            }

            if wall.y() <= tuning.recycle_y {
                self.active.remove(i);
                pool.release(handle);
                continue;
            }
            i += 1;
        }
        None
    }

    fn spawn_by_spacing(&mut self, distance: f32, progress: f32, elapsed: f32) {
        self.distance_since_spawn += distance;
        let spacing = self.evaluate_spacing(progress);
        let gap_width = self.evaluate_gap_width(elapsed);

        let mut spawned = 0;
        while self.distance_since_spawn >= spacing {
            if spawned >= self.tuning.max_spawns_per_tick {
                self.distance_since_spawn = self.distance_since_spawn.rem_euclid(spacing);
                if !self.spawn_overrun_logged {
                    self.spawn_overrun_logged = true;
                    log::warn!(
                        "Spawn loop hit {} walls in one tick; clamping travelled distance",
                        self.tuning.max_spawns_per_tick
                    );
                }
                return;
            }
            if !self.spawn_wall(gap_width, progress) {
                // Pool exhausted: keep one spacing of debt and retry next tick
                self.distance_since_spawn = spacing;
                return;
            }
            self.distance_since_spawn -= spacing;
            spawned += 1;
        }
    }

    fn spawn_wall(&mut self, gap_width: f32, progress: f32) -> bool {
        let Some(pool) = self.pool.as_mut() else {
            return false;
        };
        if self.active.len() >= pool.capacity() {
            return false;
        }
        let Some(handle) = pool.try_get() else {
            return false;
        };
        let tuning = &self.tuning;
        let rng = &mut self.rng;

        let gap_width = clamp_gap_width_to_fair_range(gap_width, tuning.lane_half_width);
        let center_limit = (tuning.lane_half_width - gap_width * 0.5).max(0.0);

        let mut center = sample_symmetric(rng, center_limit);
        if let Some(last) = self.last_gap_center {
            let shift = tuning.max_gap_shift_per_spawn;
            center = center.clamp(last - shift, last + shift);
            center = center.clamp(-center_limit, center_limit);
        }

        let Some(wall) = pool.get_mut(handle) else {
            return false;
        };
        wall.configure(center, gap_width, tuning.wall_half_width, tuning.spawn_y);
        wall.set_danger_intensity(self.danger_intensity);

        let moving_chance = lerp(
            tuning.moving_gap_chance_at_start,
            tuning.moving_gap_chance_at_max_difficulty,
            progress,
        );
        if center_limit > 0.0 && moving_chance > 0.0 && rng.random::<f32>() < moving_chance {
            let amplitude = sample_range(rng, tuning.moving_gap_amplitude_min, tuning.moving_gap_amplitude_max);
            let frequency = sample_range(rng, tuning.moving_gap_frequency_min, tuning.moving_gap_frequency_max);
            let phase = rng.random::<f32>() * std::f32::consts::TAU;
            wall.set_oscillation(amplitude, frequency, phase, -center_limit, center_limit);
        }

        self.active.push(handle);
        self.last_gap_center = Some(wall.gap_center());
        self.walls_spawned += 1;
        true
    }

    fn evaluate_spacing(&self, progress: f32) -> f32 {
        lerp(self.tuning.start_spacing, self.tuning.min_spacing, progress).max(MIN_SPACING)
    }

    fn evaluate_gap_width(&self, elapsed: f32) -> f32 {
        let shrink = self.tuning.gap_shrink.evaluate(elapsed);
        let width = lerp(self.tuning.start_gap_width, self.tuning.min_gap_width, shrink);
        clamp_gap_width_to_fair_range(width, self.tuning.lane_half_width)
    }

    fn log_missing_template(&mut self) {
        if self.missing_template_logged {
            return;
        }
        self.missing_template_logged = true;
        log::error!("ObstacleSpawner has no wall template; obstacle spawning is disabled");
    }

    /// Iterate active walls, oldest (lowest) first
    pub fn active_walls(&self) -> impl Iterator<Item = &ObstacleWall> {
        let pool = self.pool.as_ref();
        self.active
            .iter()
            .filter_map(move |handle| pool.and_then(|p| p.get(*handle)))
    }

    pub fn active_wall_count(&self) -> usize {
        self.active.len()
    }

    pub fn pool_capacity(&self) -> usize {
        self.pool.as_ref().map_or(0, Pool::capacity)
    }

    pub fn pool_available(&self) -> usize {
        self.pool.as_ref().map_or(0, Pool::available_count)
    }

    pub fn is_spawning_enabled(&self) -> bool {
        self.pool.is_some()
    }

    pub fn wall_template(&self) -> Option<WallTemplate> {
        self.template
    }

    pub fn tuning(&self) -> &SpawnerTuning {
        &self.tuning
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    pub fn run_elapsed_seconds(&self) -> f32 {
        self.run_elapsed_seconds
    }

    pub fn distance_since_spawn(&self) -> f32 {
        self.distance_since_spawn
    }

    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    pub fn current_speed(&self) -> f32 {
        self.current_speed
    }

    pub fn transient_speed_boost(&self) -> f32 {
        self.transient_speed_boost
    }

    pub fn last_gap_center(&self) -> Option<f32> {
        self.last_gap_center
    }

    pub fn signature_moment_triggered(&self) -> bool {
        self.signature_moment_triggered
    }

    pub fn phase(&self) -> DifficultyPhase {
        self.phase
    }

    pub fn danger_intensity(&self) -> f32 {
        self.danger_intensity
    }

    pub fn walls_spawned(&self) -> u32 {
        self.walls_spawned
    }

    pub fn near_misses(&self) -> u32 {
        self.near_misses
    }

    pub fn snapshot(&self) -> SpawnerSnapshot {
        SpawnerSnapshot {
            run_elapsed_seconds: self.run_elapsed_seconds,
            current_speed: self.current_speed,
            transient_speed_boost: self.transient_speed_boost,
            distance_since_spawn: self.distance_since_spawn,
            phase: self.phase,
            walls_spawned: self.walls_spawned,
            near_misses: self.near_misses,
            walls: self.active_walls().map(ObstacleWall::snapshot).collect(),
        }
    }
}

/// Fair gaps are never narrower than the minimum nor wider than the lane
pub fn clamp_gap_width_to_fair_range(gap_width: f32, lane_half_width: f32) -> f32 {
    let max_gap = (lane_half_width * 2.0).max(MIN_GAP_WIDTH);
    if gap_width.is_finite() {
        gap_width.clamp(MIN_GAP_WIDTH, max_gap)
    } else {
        MIN_GAP_WIDTH
    }
}

fn sample_symmetric(rng: &mut Pcg32, limit: f32) -> f32 {
    if limit > 0.0 {
        rng.random_range(-limit..=limit)
    } else {
        0.0
    }
}

fn sample_range(rng: &mut Pcg32, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..=max)
    } else {
        min
    }
}
