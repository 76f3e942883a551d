//! Frame driver
//!
//! `Game` owns the simulation and every collaborator and advances one frame
//! at a time: bullet time picks the time scale, the player moves, the
//! spawner runs, and a death reported through the session is turned into its
//! side effects exactly once.

use serde::{Deserialize, Serialize};

use crate::analytics::{Analytics, Fields, fields, format_f32};
use crate::audio::CueRecorder;
use crate::consts::MAX_FRAME_DT;
use crate::player::PlayerController;
use crate::score::{BestScoreStore, ScoreKeeper};
use crate::session::{RunSession, SessionEvent};
use crate::settings::Settings;
use crate::sim::{
    AudioCues, DeathCause, ObstacleSpawner, PlayerBody, RunSeedContext, RunSeedMode,
    SpawnerHooks, WallTemplate, volatile_seed,
};
use crate::time_ability::TimeAbility;
use crate::tuning::Tuning;

/// Input for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Pointer world x while pressed
    pub pointer_x: Option<f32>,
    /// Bullet time held
    pub hold_slow: bool,
    /// Manual restart (space / enter / R)
    pub restart: bool,
    /// Idle/demo mode - the autopilot steers
    pub idle_mode: bool,
}

/// What happened during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// Simulation steps the spawner ran
    pub steps: u32,
    pub time_scale: f32,
    pub death: Option<DeathCause>,
    pub run_started: bool,
}

/// End-of-run (or in-progress) summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_index: u32,
    pub mode: RunSeedMode,
    pub seed: u64,
    pub challenge_date: Option<String>,
    pub deterministic: bool,
    pub elapsed_seconds: f32,
    pub score: f32,
    pub best_score: f32,
    pub new_best: bool,
    pub near_misses: u32,
    pub best_combo: u32,
    pub walls_spawned: u32,
    pub final_speed: f32,
    pub death_cause: Option<DeathCause>,
}

pub struct Game {
    tuning: Tuning,
    settings: Settings,
    spawner: ObstacleSpawner,
    player: PlayerController,
    score: ScoreKeeper,
    time: TimeAbility,
    audio: CueRecorder,
    analytics: Analytics,
    session: RunSession,
    best_store: Option<BestScoreStore>,

    seed_override: Option<u64>,
    today: String,
    restart_queued: bool,
    restart_timer: f32,
    manual_restart_ready: bool,
    /// Unscaled seconds since the run started
    run_real_seconds: f32,
    /// Unscaled seconds since the last death, if any
    since_death_seconds: Option<f32>,
}

impl Game {
    pub fn new(tuning: Tuning, settings: Settings) -> Self {
        let tuning = tuning.sanitized();
        let settings = settings.sanitized();

        let mut audio = CueRecorder::default();
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);

        Self {
            spawner: ObstacleSpawner::new(tuning.spawner.clone(), Some(WallTemplate::default())),
            player: PlayerController::new(tuning.player.clone()),
            score: ScoreKeeper::new(tuning.score.clone(), 0.0),
            time: TimeAbility::new(tuning.time_ability.clone()),
            audio,
            analytics: Analytics::default(),
            session: RunSession::new(),
            best_store: None,
            seed_override: None,
            today: String::new(),
            restart_queued: false,
            restart_timer: 0.0,
            manual_restart_ready: false,
            run_real_seconds: 0.0,
            since_death_seconds: None,
            tuning,
            settings,
        }
    }

    /// Persist the best score through `store`, seeding it from disk
    pub fn with_best_score_store(mut self, store: BestScoreStore) -> Self {
        let best = store.load();
        self.score = ScoreKeeper::new(self.tuning.score.clone(), best);
        self.best_store = Some(store);
        self
    }

    /// Use `seed` for normal runs instead of a volatile one
    pub fn set_seed_override(&mut self, seed: Option<u64>) {
        self.seed_override = seed;
    }

    pub fn set_analytics(&mut self, analytics: Analytics) {
        self.analytics = analytics;
    }

    /// Start a run; `today` is the `yyyy-MM-dd` key used by daily challenges
    pub fn start_run(&mut self, today: &str) {
        self.today = today.to_string();
        self.start_run_internal(false);
    }

    fn start_run_internal(&mut self, auto_restarted: bool) {
        let context = self.build_run_context();
        self.spawner
            .configure_run_seed(context.seed, context.deterministic);
        self.session.begin_run(context);

        self.restart_queued = false;
        self.restart_timer = 0.0;
        self.manual_restart_ready = false;

        self.score.reset_run();
        self.spawner.reset_run();
        self.player.reset_run_position();
        self.time.reset_meter();
        self.run_real_seconds = 0.0;

        self.analytics
            .set_base_fields(self.session.run_context_fields());
        self.analytics.track(
            "run_start",
            fields([
                ("auto_restarted", auto_restarted.to_string()),
                (
                    "restart_delay_seconds",
                    format_f32(self.settings.restart_delay_seconds),
                ),
            ]),
        );
        if auto_restarted {
            let mut extra = Fields::new();
            if let Some(seconds) = self.since_death_seconds {
                extra.insert(
                    "time_since_death_ms".into(),
                    ((seconds * 1000.0).round() as i64).to_string(),
                );
            }
            self.analytics.track("run_auto_restarted", extra);
        }
        self.drain_session_events();
    }

    fn build_run_context(&self) -> RunSeedContext {
        match self.settings.run_seed_mode {
            RunSeedMode::DailyChallenge => {
                RunSeedContext::daily(&self.today, &self.settings.daily_challenge_salt)
            }
            RunSeedMode::Normal => {
                let seed = self
                    .seed_override
                    .unwrap_or_else(|| volatile_seed(self.session.run_count()));
                RunSeedContext::normal(seed, self.tuning.spawner.deterministic_simulation)
            }
        }
    }

    /// Advance one frame of `real_dt` unscaled seconds
    pub fn frame(&mut self, real_dt: f32, input: &FrameInput) -> FrameReport {
        let real_dt = if real_dt.is_finite() {
            real_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        let mut report = FrameReport {
            time_scale: 1.0,
            ..Default::default()
        };

        if let Some(seconds) = &mut self.since_death_seconds {
            *seconds += real_dt;
        }
        report.run_started = self.update_restart(real_dt, input);

        let playing = self.session.is_playing();
        let mut scaled_dt = real_dt;
        if playing {
            self.run_real_seconds += real_dt;
            report.time_scale =
                self.time
                    .update(real_dt, input.hold_slow, Some(&mut self.audio as &mut dyn AudioCues));
            scaled_dt = real_dt * report.time_scale;

            if input.idle_mode {
                if let Some(x) = self.autopilot_target() {
                    self.player.set_target_x(x);
                }
                self.player.update(scaled_dt, None);
            } else {
                self.player.update(scaled_dt, input.pointer_x);
            }
        } else {
            self.time.force_normal_time();
        }

        let mut hooks = SpawnerHooks::new(&mut self.session);
        hooks.score = Some(&mut self.score);
        hooks.audio = Some(&mut self.audio);
        hooks.analytics = Some(&mut self.analytics);
        report.steps = self.spawner.update(scaled_dt, playing, &self.player, &mut hooks);

        if let Some(cause) = self.session.take_death() {
            self.handle_death(cause);
            report.death = Some(cause);
        }
        self.drain_session_events();
        report
    }

    /// Count down the restart delay and honor restart requests.
    /// Returns true if a run started.
    fn update_restart(&mut self, real_dt: f32, input: &FrameInput) -> bool {
        if self.restart_queued {
            self.restart_timer -= real_dt;
            if self.restart_timer > 0.0 {
                return false;
            }
            self.restart_queued = false;
            if self.settings.auto_restart_after_death {
                self.start_run_internal(true);
                return true;
            }
            self.manual_restart_ready = true;
        }

        if self.manual_restart_ready && input.restart && !self.session.is_playing() {
            self.start_run_internal(false);
            return true;
        }
        false
    }

    fn handle_death(&mut self, cause: DeathCause) {
        let duration = format_f32(self.run_real_seconds);
        let score = format_f32(self.score.current());
        log::info!(
            "Run {} ended: {} after {}s, score {}",
            self.session.run_count(),
            cause,
            duration,
            score
        );

        self.analytics.track(
            "death_cause",
            fields([("death_cause", cause.as_str().to_string())]),
        );
        // Best score as it stood before this run is committed
        self.analytics.track(
            "run_end",
            fields([
                ("duration_seconds", duration),
                ("score", score),
                ("best_score", format_f32(self.score.best())),
                ("new_best", self.score.is_current_run_new_best().to_string()),
                ("death_cause", cause.as_str().to_string()),
                ("near_misses", self.score.near_misses().to_string()),
                ("best_combo", self.score.best_combo().to_string()),
                ("walls_spawned", self.spawner.walls_spawned().to_string()),
            ]),
        );

        if self.score.commit_run_if_best()
            && let Some(store) = &self.best_store
            && let Err(e) = store.save(self.score.best())
        {
            log::warn!("Failed to save best score: {e}");
        }
        self.audio.play_crash();
        self.time.force_normal_time();
        self.since_death_seconds = Some(0.0);

        let delay = self.settings.restart_delay_seconds;
        if self.settings.auto_restart_after_death || delay > 0.0 {
            self.restart_queued = true;
            self.restart_timer = delay;
        } else {
            self.manual_restart_ready = true;
        }
    }

    /// Drop out of bullet time (focus loss, pause)
    pub fn normalize_time_state(&mut self, reason: &str) {
        self.time.force_normal_time();
        self.analytics.track(
            "pause_focus_normalized",
            fields([
                ("reason", reason.to_string()),
                ("time_scale_after", format_f32(self.time.time_scale())),
            ]),
        );
    }

    fn drain_session_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                SessionEvent::RunContextChanged(ctx) => log::info!(
                    "Run context -> {} seed={} deterministic={}",
                    ctx.mode.as_str(),
                    ctx.seed,
                    ctx.deterministic
                ),
                SessionEvent::RunStarted { run_index } => log::debug!("Run {run_index} started"),
                SessionEvent::PlayerDied(cause) => log::debug!("Player died ({cause})"),
            }
        }
    }

    /// Gap center of the nearest wall still ahead of the player's hitbox
    fn autopilot_target(&self) -> Option<f32> {
        let position = self.player.position();
        let bottom = self
            .player
            .bounds()
            .map_or(position.y, |bounds| bounds.min.y);

        self.spawner
            .active_walls()
            .filter(|wall| wall.y() + wall.wall_height() * 0.5 >= bottom)
            .min_by(|a, b| a.y().total_cmp(&b.y()))
            .map(|wall| wall.gap_center())
    }

    pub fn summary(&self) -> RunSummary {
        let ctx = self.session.run_context();
        RunSummary {
            run_index: self.session.run_count(),
            mode: ctx.mode,
            seed: ctx.seed,
            challenge_date: (!ctx.challenge_date_key.is_empty())
                .then(|| ctx.challenge_date_key.clone()),
            deterministic: ctx.deterministic,
            elapsed_seconds: self.spawner.run_elapsed_seconds(),
            score: self.score.current(),
            best_score: self.score.best(),
            new_best: self.score.is_current_run_new_best(),
            near_misses: self.score.near_misses(),
            best_combo: self.score.best_combo(),
            walls_spawned: self.spawner.walls_spawned(),
            final_speed: self.spawner.current_speed(),
            death_cause: self.session.last_death_cause(),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_playing()
    }

    pub fn can_manual_restart(&self) -> bool {
        self.manual_restart_ready
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn spawner(&self) -> &ObstacleSpawner {
        &self.spawner
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn score(&self) -> &ScoreKeeper {
        &self.score
    }

    pub fn time_ability(&self) -> &TimeAbility {
        &self.time
    }

    pub fn audio(&self) -> &CueRecorder {
        &self.audio
    }

    pub fn analytics(&self) -> &Analytics {
        &self.analytics
    }

    pub fn session(&self) -> &RunSession {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SoundEffect;
    use crate::consts::SIM_DT;

    const TODAY: &str = "2026-10-17";

    fn quiet(mut game: Game) -> Game {
        game.set_analytics(Analytics::silent());
        game
    }

    fn daily_settings() -> Settings {
        Settings {
            run_seed_mode: RunSeedMode::DailyChallenge,
            ..Default::default()
        }
    }

    /// Drag the token to the right edge of its reach, where no gap can hold it
    fn hug_right_edge(game: &mut Game) -> Option<DeathCause> {
        game.frame(SIM_DT, &FrameInput {
            pointer_x: Some(0.0),
            ..Default::default()
        });
        for _ in 0..(60 * 10) {
            let report = game.frame(SIM_DT, &FrameInput {
                pointer_x: Some(100.0),
                ..Default::default()
            });
            if report.death.is_some() {
                return report.death;
            }
        }
        None
    }

    #[test]
    fn test_death_side_effects_happen_once() {
        let mut game = quiet(Game::new(Tuning::default(), daily_settings()));
        game.start_run(TODAY);
        assert!(game.is_playing());

        let cause = hug_right_edge(&mut game);
        assert_eq!(cause, Some(DeathCause::GeometryOverlap));
        assert!(!game.is_playing());

        for _ in 0..30 {
            let report = game.frame(SIM_DT, &FrameInput::default());
            assert_eq!(report.death, None);
            assert_eq!(report.steps, 0);
        }
        assert_eq!(game.analytics().count("death_cause"), 1);
        assert_eq!(game.analytics().count("run_end"), 1);
        let death = game.analytics().last("death_cause").unwrap();
        assert_eq!(death.fields["death_cause"], "geometry_overlap");
        let end = game.analytics().last("run_end").unwrap();
        assert_eq!(end.fields["death_cause"], "geometry_overlap");
        assert_eq!(end.fields["best_score"], "0.000", "best before this run");
        assert_eq!(end.fields["new_best"], "true");
        let duration: f32 = end.fields["duration_seconds"].parse().unwrap();
        assert!(duration > 0.0 && duration < 10.5);
        assert_eq!(game.audio().count(SoundEffect::Crash), 1);
        assert!(game.score().best() > 0.0, "first run always sets the best");
        assert_eq!(game.summary().death_cause, Some(DeathCause::GeometryOverlap));
    }

    #[test]
    fn test_manual_restart_after_delay() {
        let mut game = quiet(Game::new(Tuning::default(), daily_settings()));
        game.start_run(TODAY);
        hug_right_edge(&mut game);

        let restart = FrameInput {
            restart: true,
            ..Default::default()
        };
        assert!(!game.frame(0.05, &restart).run_started, "still inside the restart delay");
        for _ in 0..5 {
            game.frame(0.05, &FrameInput::default());
        }
        assert!(game.can_manual_restart());
        assert!(game.frame(0.05, &restart).run_started);
        assert!(game.is_playing());
        assert_eq!(game.session().run_count(), 2);
        assert!(game.score().current() < 1.0, "score restarted from zero");
    }

    #[test]
    fn test_auto_restart() {
        let settings = Settings {
            auto_restart_after_death: true,
            ..daily_settings()
        };
        let mut game = quiet(Game::new(Tuning::default(), settings));
        game.start_run(TODAY);
        hug_right_edge(&mut game);

        let mut restarted = false;
        for _ in 0..20 {
            restarted |= game.frame(0.05, &FrameInput::default()).run_started;
        }
        assert!(restarted);
        assert!(game.is_playing());
        assert_eq!(game.analytics().count("run_auto_restarted"), 1);
        // Four 50ms frames cover the 0.18s delay
        let event = game.analytics().last("run_auto_restarted").unwrap();
        assert_eq!(event.fields["time_since_death_ms"], "200");
    }

    #[test]
    fn test_daily_runs_replay_identically() {
        let run = || {
            let mut game = quiet(Game::new(Tuning::default(), daily_settings()));
            game.start_run(TODAY);
            let input = FrameInput {
                idle_mode: true,
                ..Default::default()
            };
            for _ in 0..(60 * 8) {
                game.frame(SIM_DT, &input);
            }
            (game.spawner().snapshot(), game.summary())
        };
        let (snap_a, summary_a) = run();
        let (snap_b, summary_b) = run();
        assert_eq!(snap_a, snap_b);
        assert_eq!(summary_a, summary_b);
        assert_eq!(summary_a.challenge_date.as_deref(), Some(TODAY));
        assert!(summary_a.deterministic);
    }

    #[test]
    fn test_autopilot_survives_opening() {
        let mut game = quiet(Game::new(Tuning::default(), daily_settings()));
        game.start_run(TODAY);
        let input = FrameInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..(60 * 8) {
            let report = game.frame(SIM_DT, &input);
            assert_eq!(report.death, None);
        }
        assert!(game.score().current() > 0.0);
    }

    #[test]
    fn test_bullet_time_slows_the_lane() {
        let run = |hold: bool| {
            let mut game = quiet(Game::new(Tuning::default(), daily_settings()));
            game.start_run(TODAY);
            let input = FrameInput {
                hold_slow: hold,
                ..Default::default()
            };
            for _ in 0..30 {
                game.frame(SIM_DT, &input);
            }
            game.spawner().run_elapsed_seconds()
        };
        let normal = run(false);
        let slowed = run(true);
        assert!(slowed < normal * 0.5, "slowed={slowed} normal={normal}");
    }

    #[test]
    fn test_normalize_time_state_leaves_bullet_time() {
        let mut game = quiet(Game::new(Tuning::default(), daily_settings()));
        game.start_run(TODAY);
        let hold = FrameInput {
            hold_slow: true,
            ..Default::default()
        };
        for _ in 0..5 {
            game.frame(SIM_DT, &hold);
        }
        assert!(game.time_ability().is_slow_active());

        game.normalize_time_state("focus");
        assert!(!game.time_ability().is_slow_active());
        assert_eq!(game.time_ability().time_scale(), 1.0);
        let event = game.analytics().last("pause_focus_normalized").unwrap();
        assert_eq!(event.fields["reason"], "focus");
        assert_eq!(event.fields["time_scale_after"], "1.000");
        assert_eq!(event.fields["run_mode"], "daily_challenge");
    }

    #[test]
    fn test_analytics_carry_run_context() {
        let mut game = quiet(Game::new(Tuning::default(), daily_settings()));
        game.start_run(TODAY);
        let event = game.analytics().last("run_start").unwrap();
        assert_eq!(event.fields["run_mode"], "daily_challenge");
        assert_eq!(event.fields["challenge_date"], TODAY);
        assert_eq!(event.fields["auto_restarted"], "false");
        assert_eq!(event.fields["restart_delay_seconds"], "0.180");
    }

    #[test]
    fn test_seed_override_for_normal_runs() {
        let tuning = Tuning {
            spawner: crate::tuning::SpawnerTuning {
                deterministic_simulation: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut game = quiet(Game::new(tuning, Settings::default()));
        game.set_seed_override(Some(12345));
        game.start_run(TODAY);
        let summary = game.summary();
        assert_eq!(summary.seed, 12345);
        assert_eq!(summary.mode, RunSeedMode::Normal);
        assert!(summary.deterministic);
        assert_eq!(summary.challenge_date, None);
    }
}
