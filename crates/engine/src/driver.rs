//! Trampoline driver.
//!
//! One explicit loop pulls work items from the root cursor, invokes them,
//! and branches once per item on "did the token resolve before the
//! invocation returned?". Synchronous completions continue the same loop
//! iteration, so arbitrarily long synchronous chains run at constant stack
//! depth. An unresolved token is parked with a resume hook; the loop
//! unwinds, and the eventual resolution re-enters it from a fresh
//! top-level frame.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::completion::{Completion, Outcome, ResumeFn};
use crate::cursor::{Pull, SequenceCursor, TaskCursor};

/// Terminal callback of a run: receives the execution context and either
/// the assembled result or the first failure.
pub type TerminalFn<C> = Box<dyn FnOnce(&mut C, Result<Value, anyhow::Error>) + Send>;

struct RunState<C> {
    cursor: SequenceCursor<C>,
    context: C,
    /// First failure, latched; stops every further pull at every level.
    failure: Option<anyhow::Error>,
    terminal: TerminalFn<C>,
    steps_run: usize,
}

/// Shared per-run cell. `None` once the terminal callback has been taken,
/// which is what makes its delivery exactly-once.
struct Run<C> {
    state: Mutex<Option<RunState<C>>>,
}

impl<C> Run<C> {
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<RunState<C>>> {
        self.state.lock().expect("run state lock poisoned")
    }
}

pub(crate) fn start<C: Send + 'static>(cursor: SequenceCursor<C>, context: C, terminal: TerminalFn<C>) {
    let run = Arc::new(Run {
        state: Mutex::new(Some(RunState {
            cursor,
            context,
            failure: None,
            terminal,
            steps_run: 0,
        })),
    });
    drive(&run);
}

fn drive<C: Send + 'static>(run: &Arc<Run<C>>) {
    let mut guard = run.lock();
    loop {
        let Some(state) = guard.as_mut() else {
            return;
        };
        if state.failure.is_some() {
            break;
        }
        let item = match state.cursor.next() {
            Pull::Item(item) => item,
            Pull::Done => break,
        };
        state.steps_run += 1;
        debug!(step = state.steps_run, inputs = item.inputs.len(), "step invocation started");

        let completion = Completion::new();
        if let Err(error) = (item.invoke)(&mut state.context, item.inputs, completion.clone()) {
            if !completion.resolve_with_invocation_error(error) {
                warn!(step = state.steps_run, "step returned an error after resolving its token; keeping the token's outcome");
            }
        }

        let resume: ResumeFn = {
            let run = Arc::clone(run);
            Box::new(move |outcome| {
                record_outcome(&run, outcome);
                drive(&run);
            })
        };
        match completion.collect_or_detach(resume) {
            Some(outcome) => apply(state, outcome),
            None => {
                debug!(step = state.steps_run, "step detached; awaiting external resolution");
                return;
            }
        }
    }

    let Some(state) = guard.take() else {
        return;
    };
    drop(guard);
    deliver(state);
}

/// Resume-hook half of an asynchronous completion: latch the outcome under
/// the run lock, before `drive` re-enters the loop.
fn record_outcome<C: Send + 'static>(run: &Run<C>, outcome: Outcome) {
    let mut guard = run.lock();
    if let Some(state) = guard.as_mut() {
        apply(state, outcome);
    }
}

fn apply<C: Send + 'static>(state: &mut RunState<C>, outcome: Outcome) {
    match outcome {
        Ok(values) => state.cursor.record(values),
        Err(error) => state.failure = Some(error),
    }
}

fn deliver<C: Send + 'static>(state: RunState<C>) {
    let RunState {
        mut cursor,
        mut context,
        failure,
        terminal,
        steps_run,
    } = state;
    let result = match failure {
        Some(error) => {
            warn!(steps_run, %error, "sequence run failed");
            Err(error)
        }
        None => {
            info!(steps_run, "sequence run finished");
            Ok(cursor.output().into_slot())
        }
    };
    terminal(&mut context, result);
}
