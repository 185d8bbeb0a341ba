//! Sequence cursor: composes one sub-cursor per task over an ordered list.
//!
//! This is also the root cursor of every run. Work items flow up from the
//! innermost active sub-cursor, and recorded outputs flow back down to it,
//! so the driver stays oblivious to nesting depth.

use serde_json::Value;

use super::{Pull, TaskCursor};
use crate::sequence::{Mode, TaskSpec};
use crate::values::Values;

pub(crate) struct SequenceCursor<C> {
    tasks: std::vec::IntoIter<TaskSpec<C>>,
    mode: Mode,
    active: Option<Box<dyn TaskCursor<C>>>,
    /// Per-task result slots, series mode only.
    slots: Vec<Value>,
    /// Most recent task output, waterfall mode only: it feeds the next
    /// task's input and, once exhausted, it is the assembled output.
    threaded: Option<Values>,
    /// Input for the first task, handed down by a threading parent.
    primed: Option<Values>,
}

impl<C: Send + 'static> SequenceCursor<C> {
    pub(crate) fn new(tasks: Vec<TaskSpec<C>>, mode: Mode) -> Self {
        let slots = match mode {
            Mode::Series => Vec::with_capacity(tasks.len()),
            Mode::Waterfall => Vec::new(),
        };
        Self {
            tasks: tasks.into_iter(),
            mode,
            active: None,
            slots,
            threaded: None,
            primed: None,
        }
    }
}

impl<C: Send + 'static> TaskCursor<C> for SequenceCursor<C> {
    fn next(&mut self) -> Pull<C> {
        loop {
            match self.active.as_mut() {
                Some(active) => match active.next() {
                    Pull::Item(item) => return Pull::Item(item),
                    Pull::Done => {
                        let output = active.output();
                        self.active = None;
                        match self.mode {
                            Mode::Series => self.slots.push(output.into_slot()),
                            Mode::Waterfall => self.threaded = Some(output),
                        }
                    }
                },
                None => match self.tasks.next() {
                    Some(task) => {
                        let mut cursor = task.into_cursor();
                        if self.mode == Mode::Waterfall {
                            let input = self.primed.take().or_else(|| self.threaded.take()).unwrap_or_default();
                            cursor.prime(input);
                        }
                        self.active = Some(cursor);
                    }
                    None => return Pull::Done,
                },
            }
        }
    }

    fn record(&mut self, values: Values) {
        if let Some(active) = self.active.as_mut() {
            active.record(values);
        }
    }

    fn output(&mut self) -> Values {
        match self.mode {
            Mode::Series => Values::one(Value::Array(std::mem::take(&mut self.slots))),
            Mode::Waterfall => self.threaded.take().unwrap_or_default(),
        }
    }

    fn prime(&mut self, values: Values) {
        // A sequence that does not thread input ignores primed values.
        if self.mode == Mode::Waterfall {
            self.primed = Some(values);
        }
    }
}
