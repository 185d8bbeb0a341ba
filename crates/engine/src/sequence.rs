//! Sequence builder: ordered tasks, a propagation mode, and one shared
//! execution context, with `run` handing the whole thing to the driver.
//!
//! Task kinds are decided once, at append time, as a closed variant; the
//! hot loop never re-inspects what a task is. Consuming `self` everywhere
//! makes the task list immutable once `run` starts and makes a second run
//! unrepresentable.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::completion::Completion;
use crate::cursor::{MappedCursor, SequenceCursor, StepCursor, TaskCursor};
use crate::driver;
use crate::values::Values;

/// A plain step operation: shared context, positional inputs (empty outside
/// waterfall threading), and the completion token to resolve exactly once.
pub type StepFn<C> = Box<dyn FnOnce(&mut C, Values, Completion) -> anyhow::Result<()> + Send>;

/// A mapped element operation, invoked once per captured element with
/// inputs `(index, element)`.
pub type ElementFn<C> = Box<dyn FnMut(&mut C, Values, Completion) -> anyhow::Result<()> + Send>;

/// Result-propagation policy of a sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Accumulate every task's shaped output into one ordered result list.
    #[default]
    Series,
    /// Thread each task's output values into the next task's inputs; the
    /// result is the last task's output.
    Waterfall,
}

/// One appended task, tagged once at append time.
pub(crate) enum TaskSpec<C> {
    Step(StepFn<C>),
    Nested { tasks: Vec<TaskSpec<C>>, mode: Mode },
    Mapped { elements: Vec<Value>, op: ElementFn<C> },
}

impl<C: Send + 'static> TaskSpec<C> {
    /// The pre-bound cursor for this task kind.
    pub(crate) fn into_cursor(self) -> Box<dyn TaskCursor<C>> {
        match self {
            TaskSpec::Step(op) => Box::new(StepCursor::new(op)),
            TaskSpec::Nested { tasks, mode } => Box::new(SequenceCursor::new(tasks, mode)),
            TaskSpec::Mapped { elements, op } => Box::new(MappedCursor::new(elements, op)),
        }
    }
}

/// An ordered, composable list of tasks sharing one execution context.
///
/// Steps run strictly in append order, one at a time, whether they complete
/// synchronously or hand their token to a timer, I/O callback, or other
/// deferred facility. The first failure halts the run and reaches the
/// terminal callback alone.
pub struct Sequence<C = ()> {
    tasks: Vec<TaskSpec<C>>,
    mode: Mode,
    context: C,
}

impl Sequence<()> {
    /// New empty sequence with the engine-private unit context.
    pub fn new() -> Self {
        Self::with_context(())
    }
}

impl Default for Sequence<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send + 'static> Sequence<C> {
    /// New empty sequence whose steps and terminal callback all receive
    /// `&mut context`.
    pub fn with_context(context: C) -> Self {
        Self {
            tasks: Vec::new(),
            mode: Mode::Series,
            context,
        }
    }

    /// Append one plain step.
    pub fn step<F>(mut self, op: F) -> Self
    where
        F: FnOnce(&mut C, Values, Completion) -> anyhow::Result<()> + Send + 'static,
    {
        self.tasks.push(TaskSpec::Step(Box::new(op)));
        self
    }

    /// Append a batch of boxed steps in order.
    pub fn steps<I>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = StepFn<C>>,
    {
        self.tasks.extend(ops.into_iter().map(TaskSpec::Step));
        self
    }

    /// Append a whole sub-sequence as one task. The child contributes its
    /// tasks and mode; during the run its steps share this run's context,
    /// and its assembled output fills exactly one slot of this sequence.
    pub fn nested(mut self, child: Sequence<C>) -> Self {
        self.tasks.push(TaskSpec::Nested {
            tasks: child.tasks,
            mode: child.mode,
        });
        self
    }

    /// Append one operation applied to every element of `collection`.
    ///
    /// The collection is snapshotted here, at append time. The operation is
    /// invoked once per element with inputs `(index, element)`, elements run
    /// strictly one at a time, and the task contributes a single slot: the
    /// per-element results in snapshot order.
    pub fn map<I, T, F>(mut self, collection: I, op: F) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
        F: FnMut(&mut C, Values, Completion) -> anyhow::Result<()> + Send + 'static,
    {
        let elements: Vec<Value> = collection.into_iter().map(Into::into).collect();
        self.tasks.push(TaskSpec::Mapped {
            elements,
            op: Box::new(op),
        });
        self
    }

    /// Accumulate every task's output positionally (the default).
    pub fn series(mut self) -> Self {
        self.mode = Mode::Series;
        self
    }

    /// Thread each task's output into the next task's inputs.
    pub fn waterfall(mut self) -> Self {
        self.mode = Mode::Waterfall;
        self
    }

    /// Number of appended tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The currently selected propagation mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Start the run. Consumes the sequence: the task list is final and a
    /// second run cannot exist.
    ///
    /// `terminal` is invoked exactly once, with the execution context, as
    /// `Err(first failure)` or `Ok(assembled result)`. When every step
    /// completes synchronously it has already fired by the time `run`
    /// returns; otherwise it fires from whatever context resolves the last
    /// completion token.
    pub fn run<F>(self, terminal: F)
    where
        F: FnOnce(&mut C, Result<Value, anyhow::Error>) + Send + 'static,
    {
        info!(mode = ?self.mode, task_count = self.tasks.len(), "sequence run started");
        let cursor = SequenceCursor::new(self.tasks, self.mode);
        driver::start(cursor, self.context, Box::new(terminal));
    }

    /// Run without observing the result; the outcome goes to the log.
    pub fn start(self) {
        self.run(|_context, result| match result {
            Ok(_) => debug!("unobserved sequence run finished"),
            Err(error) => warn!(%error, "unobserved sequence run failed"),
        });
    }
}

/// One-call convenience: run `steps` as a context-free series.
pub fn run_series<F>(steps: Vec<StepFn<()>>, terminal: F)
where
    F: FnOnce(&mut (), Result<Value, anyhow::Error>) + Send + 'static,
{
    Sequence::new().steps(steps).run(terminal);
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::{Value, json};

    use super::{Mode, Sequence, StepFn, run_series};

    fn capture() -> (
        Arc<Mutex<Option<Result<Value, anyhow::Error>>>>,
        impl FnOnce(&mut (), Result<Value, anyhow::Error>) + Send + 'static,
    ) {
        let slot = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&slot);
        (slot, move |_cx: &mut (), result| {
            *sink.lock().expect("result slot lock") = Some(result);
        })
    }

    #[test]
    fn synchronous_series_run_assembles_in_append_order() {
        let (slot, terminal) = capture();
        Sequence::new()
            .step(|_cx, _inputs, done| {
                let _ = done.succeed(json!("first"));
                Ok(())
            })
            .step(|_cx, _inputs, done| {
                let _ = done.succeed(json!("second"));
                Ok(())
            })
            .run(terminal);

        let result = slot.lock().expect("result slot lock").take().expect("terminal fired");
        assert_eq!(result.expect("success"), json!(["first", "second"]));
    }

    #[test]
    fn default_mode_is_series() {
        assert_eq!(Sequence::new().mode(), Mode::Series);
        assert_eq!(Sequence::new().waterfall().series().mode(), Mode::Series);
    }

    #[test]
    fn context_is_threaded_to_steps_and_terminal() {
        #[derive(Default)]
        struct Tally {
            seen: u32,
        }

        let observed = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&observed);
        Sequence::with_context(Tally::default())
            .step(|cx, _inputs, done| {
                cx.seen += 1;
                let _ = done.succeed(());
                Ok(())
            })
            .step(|cx, _inputs, done| {
                cx.seen += 1;
                let _ = done.succeed(());
                Ok(())
            })
            .run(move |cx, _result| {
                *sink.lock().expect("observed lock") = cx.seen;
            });

        assert_eq!(*observed.lock().expect("observed lock"), 2);
    }

    #[test]
    fn step_error_return_reaches_the_terminal() {
        let (slot, terminal) = capture();
        Sequence::new()
            .step(|_cx, _inputs, _done| anyhow::bail!("exploded"))
            .run(terminal);

        let result = slot.lock().expect("result slot lock").take().expect("terminal fired");
        assert_eq!(result.expect_err("failure").to_string(), "exploded");
    }

    #[test]
    fn run_series_convenience_collects_results() {
        let steps: Vec<StepFn<()>> = vec![
            Box::new(|_cx, _inputs, done| {
                let _ = done.succeed(json!(1));
                Ok(())
            }),
            Box::new(|_cx, _inputs, done| {
                let _ = done.succeed(json!(2));
                Ok(())
            }),
        ];
        let (slot, terminal) = capture();
        run_series(steps, terminal);

        let result = slot.lock().expect("result slot lock").take().expect("terminal fired");
        assert_eq!(result.expect("success"), json!([1, 2]));
    }

    #[test]
    fn start_runs_to_completion_without_a_terminal() {
        let hits = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&hits);
        Sequence::new()
            .step(move |_cx, _inputs, done| {
                *sink.lock().expect("hits lock") += 1;
                let _ = done.succeed(());
                Ok(())
            })
            .start();

        assert_eq!(*hits.lock().expect("hits lock"), 1);
    }
}
