//! Verb module --
//!
//! A verb is an ordered list of [`Action`]s plus an instruction pointer. The
//! interpreter runs actions until one suspends, then parks the verb until the
//! completion source (a timer, an animation, a dialog choice) delivers exactly
//! one `resume`. Verbs never own threads or callbacks; every transition happens
//! inside a call made by the world on the game's single tick.

pub mod action;
pub mod condition;
pub mod context;
pub mod manager;

pub use action::*;
pub use condition::*;
pub use context::*;
pub use manager::*;

use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use variantly::Variantly;

/// Errors raised by the interpreter's resume protocol and by restored save data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerbError {
    #[error("verb {verb} is not suspended (ip {ip:?})")]
    NotSuspended { verb: String, ip: Option<usize> },
    #[error("verb {verb} has corrupt saved state: {reason}")]
    CorruptState { verb: String, reason: String },
    #[error("no verb {0}")]
    NotFound(String),
}

/// Where a verb stands after the interpreter hands control back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Variantly)]
pub enum RunState {
    /// Parked on a suspending action.
    Suspended,
    /// Ran off the end, or was cancelled.
    Finished,
}

/// An action sequence and its cursor. Verbs own one; `Conditional` and `RunVerb`
/// actions own nested ones.
///
/// `ip` is `None` before the first run, `Some(0..len)` while running and `Some(len)` when done.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub actions: Vec<Action>,
    // required in saves: a missing cursor must not read as "not started"
    #[serde(deserialize_with = "Option::deserialize")]
    pub ip: Option<usize>,
    pub suspended: bool,
}

impl Script {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions,
            ip: None,
            suspended: false,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.ip.is_some_and(|ip| ip < self.actions.len())
    }

    pub fn is_finished(&self) -> bool {
        self.ip.is_some_and(|ip| ip >= self.actions.len())
    }

    fn in_flight_ip(&self) -> Option<usize> {
        self.ip.filter(|&ip| self.suspended && ip < self.actions.len())
    }

    /// The action the sequence is parked on, if suspended.
    pub fn in_flight(&self) -> Option<&Action> {
        self.in_flight_ip().and_then(|ip| self.actions.get(ip))
    }

    /// The innermost suspended action, following nested sequences, and the owner
    /// its unqualified references resolve against.
    pub fn in_flight_leaf(&self, owner: &VerbOwner) -> Option<(&Action, VerbOwner)> {
        let action = self.in_flight()?;
        match action.nested_script() {
            Some((nested, scope)) => nested.in_flight_leaf(scope.unwrap_or(owner)),
            None => Some((action, owner.clone())),
        }
    }

    fn run_state(&self) -> RunState {
        if self.suspended {
            RunState::Suspended
        } else {
            RunState::Finished
        }
    }

    /// Back to "not started", clearing every action's progress.
    pub fn reset(&mut self) {
        self.ip = None;
        self.suspended = false;
        for action in &mut self.actions {
            action.reset();
        }
    }

    /// Start from the first action. A sequence that is still running first releases
    /// whatever its in-flight action holds.
    pub fn start(&mut self, ctx: &mut ActionContext<'_>) -> RunState {
        if self.is_running()
            && let Some(ip) = self.ip
        {
            debug!("{}: restarting, releasing action {ip}", ctx.label());
            self.actions[ip].cancel(ctx);
        }
        self.reset();
        self.ip = Some(0);
        self.step(ctx)
    }

    /// The step loop: run actions until one suspends or the sequence ends.
    pub fn step(&mut self, ctx: &mut ActionContext<'_>) -> RunState {
        let label = ctx.label();
        while let Some(ip) = self.ip.filter(|&ip| ip < self.actions.len()) {
            if ctx.cancel_requested() {
                self.cancel(ctx);
                break;
            }
            let action = &mut self.actions[ip];
            debug!("{label} step {ip}: {}", action.name());
            match action.run(ctx) {
                StepOutcome::Continue => {},
                StepOutcome::Suspend => {
                    self.suspended = true;
                    debug!("{label} suspended at step {ip}");
                    return RunState::Suspended;
                },
                StepOutcome::Fault(reason) => {
                    error!("{label} step {ip} ({}) failed: {reason}", action.name());
                },
            }
            self.ip = Some(ip + 1);
        }
        RunState::Finished
    }

    /// The in-flight action completed: advance past it and continue.
    ///
    /// A nested sequence that is itself suspended receives the resume first; this
    /// sequence only advances once the nested one finishes.
    ///
    /// # Errors
    /// - [`VerbError::NotSuspended`] when nothing is in flight; `ip` is left untouched
    pub fn resume(&mut self, ctx: &mut ActionContext<'_>) -> Result<RunState, VerbError> {
        let Some(ip) = self.in_flight_ip() else {
            return Err(VerbError::NotSuspended {
                verb: ctx.label(),
                ip: self.ip,
            });
        };
        if let Some((nested, scope)) = self.actions[ip].nested_script_mut() {
            let scope = scope.cloned();
            if ctx.scoped(scope.as_ref(), |ctx| nested.resume(ctx))?.is_suspended() {
                return Ok(RunState::Suspended);
            }
        }
        Ok(self.advance(ip, ctx))
    }

    /// Feed elapsed time to the in-flight action; completion advances the sequence.
    pub fn tick(&mut self, delta: f32, ctx: &mut ActionContext<'_>) -> RunState {
        let Some(ip) = self.in_flight_ip() else {
            return self.run_state();
        };
        let done = match self.actions[ip].tick(delta, ctx) {
            Ok(done) => done,
            Err(err) => {
                error!("{} step {ip} failed while in progress: {err:#}", ctx.label());
                true
            },
        };
        if done { self.advance(ip, ctx) } else { RunState::Suspended }
    }

    fn advance(&mut self, ip: usize, ctx: &mut ActionContext<'_>) -> RunState {
        self.suspended = false;
        self.ip = Some(ip + 1);
        self.step(ctx)
    }

    /// Cancel the in-flight and remaining actions and jump to the end. Not resumable.
    pub fn cancel(&mut self, ctx: &mut ActionContext<'_>) {
        let len = self.actions.len();
        let from = self.ip.unwrap_or(len).min(len);
        for action in &mut self.actions[from..] {
            action.cancel(ctx);
        }
        self.ip = Some(len);
        self.suspended = false;
    }

    /// Continue a sequence restored mid-run that was not parked on an action.
    pub fn reenter(&mut self, ctx: &mut ActionContext<'_>) -> RunState {
        if self.is_running() && !self.suspended {
            self.step(ctx)
        } else {
            self.run_state()
        }
    }

    /// Check the cursor of restored data.
    ///
    /// # Errors
    /// - [`VerbError::CorruptState`] for an `ip` past the end, a suspended flag outside
    ///   `0..len`, or a suspension on an action that never suspends
    pub fn validate(&self, verb: &str) -> Result<(), VerbError> {
        let corrupt = |reason: String| VerbError::CorruptState {
            verb: verb.to_string(),
            reason,
        };
        let len = self.actions.len();
        if let Some(ip) = self.ip
            && ip > len
        {
            return Err(corrupt(format!("ip {ip} is past the end of {len} action(s)")));
        }
        if self.suspended && !self.is_running() {
            return Err(corrupt(format!("suspended with ip {:?} outside 0..{len}", self.ip)));
        }
        if let Some(action) = self.in_flight() {
            if !action.can_suspend() {
                return Err(corrupt(format!("suspended on {}, which never suspends", action.name())));
            }
            match action {
                Action::RunVerb { bound: None, .. } => {
                    return Err(corrupt("suspended on RunVerb with no bound owner".to_string()));
                },
                Action::Goto { origin: None, .. } => {
                    return Err(corrupt("suspended on Goto that never started walking".to_string()));
                },
                _ => {},
            }
            if let Some((nested, _)) = action.nested_script() {
                if !nested.suspended {
                    return Err(corrupt(format!("suspended on {} whose sequence is not suspended", action.name())));
                }
                nested.validate(verb)?;
            }
        }
        Ok(())
    }
}

/// An authored behavior: a script selected by id, owner state and optional target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verb {
    pub id: String,
    pub state: Option<String>,
    pub target: Option<String>,
    pub script: Script,
}

impl Verb {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: None,
            target: None,
            script: Script::default(),
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: Option<&str>) -> Self {
        self.state = state.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: Option<&str>) -> Self {
        self.target = target.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.script = Script::new(actions);
        self
    }

    pub fn key(&self) -> VerbKey {
        VerbKey::new(&self.id, self.state.as_deref(), self.target.as_deref())
    }

    pub fn ip(&self) -> Option<usize> {
        self.script.ip
    }

    pub fn actions(&self) -> &[Action] {
        &self.script.actions
    }

    pub fn is_running(&self) -> bool {
        self.script.is_running()
    }

    pub fn is_finished(&self) -> bool {
        self.script.is_finished()
    }

    pub fn is_suspended(&self) -> bool {
        self.script.in_flight_ip().is_some()
    }

    /// Copies of this verb's actions with all progress cleared.
    pub fn fresh_actions(&self) -> Vec<Action> {
        let mut actions = self.script.actions.clone();
        for action in &mut actions {
            action.reset();
        }
        actions
    }

    /// Run from the first action. Re-running a running verb releases its in-flight action.
    pub fn run(&mut self, ctx: &mut ActionContext<'_>) -> RunState {
        info!(">>> running verb {}", self.key());
        let state = self.script.start(ctx);
        self.settle(ctx, state)
    }

    /// Deliver the single completion signal for the suspended action.
    ///
    /// # Errors
    /// - [`VerbError::NotSuspended`] if the verb is not parked on an action
    pub fn resume(&mut self, ctx: &mut ActionContext<'_>) -> Result<RunState, VerbError> {
        debug!(">>> resuming verb {}", self.key());
        let state = self.script.resume(ctx)?;
        Ok(self.settle(ctx, state))
    }

    pub fn tick(&mut self, delta: f32, ctx: &mut ActionContext<'_>) -> RunState {
        let state = self.script.tick(delta, ctx);
        self.settle(ctx, state)
    }

    /// Tear down the verb: nested sequences are cancelled and `ip` jumps to the end.
    /// Mutations made by actions already run stay in place.
    pub fn cancel(&mut self, ctx: &mut ActionContext<'_>) {
        info!(">>> cancelling verb {}", self.key());
        self.script.cancel(ctx);
    }

    /// Continue after a load if the verb was saved between steps.
    pub fn reenter(&mut self, ctx: &mut ActionContext<'_>) -> RunState {
        let state = self.script.reenter(ctx);
        self.settle(ctx, state)
    }

    /// # Errors
    /// - [`VerbError::CorruptState`] if the saved cursor is inconsistent
    pub fn validate(&self) -> Result<(), VerbError> {
        self.script.validate(&self.key().to_string())
    }

    // honour a CancelVerb that named this verb
    fn settle(&mut self, ctx: &mut ActionContext<'_>, state: RunState) -> RunState {
        if ctx.take_cancel_request() {
            self.cancel(ctx);
            return RunState::Finished;
        }
        if state.is_finished() {
            info!(">>> verb {} finished", self.key());
        }
        state
    }
}
