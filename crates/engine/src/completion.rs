//! One-shot completion token bound to a single step invocation.
//!
//! A step reports its outcome by calling [`Completion::succeed`] or
//! [`Completion::fail`] exactly once, either before its invocation returns
//! (synchronous completion) or later from whatever deferred-execution
//! facility it handed the token to (asynchronous completion). The driver
//! never polls: after invoking a step it atomically either collects an
//! already-present outcome or installs a resume hook that the eventual
//! resolution will fire.

use std::panic::Location;
use std::sync::{Arc, Mutex};

use anyhow::Error;
use tracing::warn;

use crate::error::ProtocolViolation;
use crate::values::Values;

/// What a step reported through its token.
pub(crate) type Outcome = Result<Values, Error>;

/// Hook fired when a detached token finally resolves.
pub(crate) type ResumeFn = Box<dyn FnOnce(Outcome) + Send>;

enum Phase {
    /// The driver is still inside the invocation that received this token.
    Attached,
    /// The invocation returned unresolved; resolving now fires the hook.
    Detached(ResumeFn),
    /// The outcome has been handed to the driver.
    Spent,
}

struct TokenState {
    /// Call site of the first resolution. `Some` means decided.
    resolved_at: Option<&'static Location<'static>>,
    /// Outcome awaiting collection by the driver.
    pending: Option<Outcome>,
    phase: Phase,
}

/// Cloneable handle to one step's completion cell.
///
/// Clones share the cell, so a step may move one handle into a timer or I/O
/// callback while the driver keeps another to decide synchronous versus
/// asynchronous completion. The first resolution wins; any later one is
/// rejected with a [`ProtocolViolation`] and reported to the diagnostics
/// sink without disturbing the decided outcome.
#[derive(Clone)]
pub struct Completion {
    state: Arc<Mutex<TokenState>>,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TokenState {
                resolved_at: None,
                pending: None,
                phase: Phase::Attached,
            })),
        }
    }

    /// Report success with zero or more positional values.
    #[track_caller]
    pub fn succeed(&self, values: impl Into<Values>) -> Result<(), ProtocolViolation> {
        self.resolve(Ok(values.into()), Location::caller())
    }

    /// Report failure.
    #[track_caller]
    pub fn fail(&self, error: impl Into<Error>) -> Result<(), ProtocolViolation> {
        self.resolve(Err(error.into()), Location::caller())
    }

    /// Whether this token has been decided.
    pub fn is_resolved(&self) -> bool {
        self.lock().resolved_at.is_some()
    }

    /// Whether the driver has parked this token for asynchronous resolution.
    pub fn is_detached(&self) -> bool {
        matches!(self.lock().phase, Phase::Detached(_))
    }

    fn resolve(&self, outcome: Outcome, site: &'static Location<'static>) -> Result<(), ProtocolViolation> {
        let routed = {
            let mut state = self.lock();
            if let Some(first) = state.resolved_at {
                let violation = ProtocolViolation { first, second: site };
                warn!(%violation, "completion token resolved twice");
                return Err(violation);
            }
            state.resolved_at = Some(site);
            match std::mem::replace(&mut state.phase, Phase::Spent) {
                Phase::Attached => {
                    state.phase = Phase::Attached;
                    state.pending = Some(outcome);
                    None
                }
                Phase::Detached(resume) => Some((resume, outcome)),
                // Spent implies resolved_at was set, handled above.
                Phase::Spent => None,
            }
        };
        // The hook re-enters the driver; it must run outside the token lock.
        if let Some((resume, outcome)) = routed {
            resume(outcome);
        }
        Ok(())
    }

    /// Driver-side: route a step's `Err` return as this token's resolution,
    /// blocking any later call. Returns `false` when the token had already
    /// been decided, in which case that outcome stands.
    #[track_caller]
    pub(crate) fn resolve_with_invocation_error(&self, error: Error) -> bool {
        let mut state = self.lock();
        if state.resolved_at.is_some() {
            return false;
        }
        state.resolved_at = Some(Location::caller());
        state.pending = Some(Err(error));
        true
    }

    /// Driver-side: atomically collect a synchronously produced outcome, or
    /// park the token with the given resume hook and report detachment.
    pub(crate) fn collect_or_detach(&self, resume: ResumeFn) -> Option<Outcome> {
        let mut state = self.lock();
        match state.pending.take() {
            Some(outcome) => {
                state.phase = Phase::Spent;
                Some(outcome)
            }
            None => {
                state.phase = Phase::Detached(resume);
                None
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TokenState> {
        self.state.lock().expect("completion token lock poisoned")
    }
}

impl std::fmt::Debug for Completion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Completion")
            .field("resolved", &state.resolved_at.is_some())
            .field("detached", &matches!(state.phase, Phase::Detached(_)))
            .finish()
    }
}
