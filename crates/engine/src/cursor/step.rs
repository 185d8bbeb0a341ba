//! Plain-step cursor: yields exactly one work item.

use super::{Pull, TaskCursor, WorkItem};
use crate::sequence::StepFn;
use crate::values::Values;

pub(crate) struct StepCursor<C> {
    op: Option<StepFn<C>>,
    primed: Values,
    result: Option<Values>,
}

impl<C> StepCursor<C> {
    pub(crate) fn new(op: StepFn<C>) -> Self {
        Self {
            op: Some(op),
            primed: Values::none(),
            result: None,
        }
    }
}

impl<C> TaskCursor<C> for StepCursor<C> {
    fn next(&mut self) -> Pull<C> {
        match self.op.take() {
            Some(invoke) => Pull::Item(WorkItem {
                inputs: std::mem::take(&mut self.primed),
                invoke,
            }),
            None => Pull::Done,
        }
    }

    fn record(&mut self, values: Values) {
        self.result = Some(values);
    }

    fn output(&mut self) -> Values {
        self.result.take().unwrap_or_default()
    }

    fn prime(&mut self, values: Values) {
        self.primed = values;
    }
}
