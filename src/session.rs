//! Run session
//!
//! Explicit run-state context handed to whoever needs it: the playing flag,
//! how the run was seeded, and why it ended. Death arrives here through
//! [`DeathSink`]; the frame driver collects it with [`RunSession::take_death`]
//! and applies the side effects once.

use std::collections::VecDeque;

use crate::analytics::{Fields, fields};
use crate::sim::{DeathCause, DeathSink, RunSeedContext};

/// Notifications raised by the session, drained by the frame driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    RunStarted { run_index: u32 },
    RunContextChanged(RunSeedContext),
    PlayerDied(DeathCause),
}

#[derive(Debug, Clone, Default)]
pub struct RunSession {
    is_playing: bool,
    run_context: RunSeedContext,
    run_count: u32,
    last_death_cause: Option<DeathCause>,
    pending_death: Option<DeathCause>,
    events: VecDeque<SessionEvent>,
}

impl RunSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a run with `context`
    pub fn begin_run(&mut self, context: RunSeedContext) {
        self.update_run_context(context);
        self.is_playing = true;
        self.run_count += 1;
        self.last_death_cause = None;
        self.pending_death = None;
        self.events.push_back(SessionEvent::RunStarted {
            run_index: self.run_count,
        });
    }

    /// Replace the run context, raising an event if it changed
    pub fn update_run_context(&mut self, context: RunSeedContext) {
        if context == self.run_context {
            return;
        }
        self.run_context = context.clone();
        self.events.push_back(SessionEvent::RunContextChanged(context));
    }

    /// Leave play without a death (title screen, shutdown)
    pub fn stop(&mut self) {
        self.is_playing = false;
    }

    /// The death recorded since the last call, if any
    pub fn take_death(&mut self) -> Option<DeathCause> {
        self.pending_death.take()
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = SessionEvent> + '_ {
        self.events.drain(..)
    }

    /// `run_*` analytics fields describing the current run
    pub fn run_context_fields(&self) -> Fields {
        let ctx = &self.run_context;
        let mut out = fields([
            ("run_mode", ctx.mode.as_str().to_string()),
            ("run_seed", ctx.seed.to_string()),
            ("run_deterministic", ctx.deterministic.to_string()),
            ("run_index", self.run_count.to_string()),
        ]);
        if !ctx.challenge_date_key.is_empty() {
            out.insert("challenge_date".into(), ctx.challenge_date_key.clone());
        }
        out
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn run_context(&self) -> &RunSeedContext {
        &self.run_context
    }

    pub fn run_count(&self) -> u32 {
        self.run_count
    }

    pub fn last_death_cause(&self) -> Option<DeathCause> {
        self.last_death_cause
    }
}

impl DeathSink for RunSession {
    /// Ignored unless a run is in progress
    fn kill_player(&mut self, cause: DeathCause) {
        if !self.is_playing {
            return;
        }
        self.is_playing = false;
        self.last_death_cause = Some(cause);
        self.pending_death = Some(cause);
        self.events.push_back(SessionEvent::PlayerDied(cause));
    }
}
