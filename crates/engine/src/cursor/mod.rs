//! Uniform pull protocol over the three task kinds.
//!
//! A plain step, a whole nested sequence, and a mapped collection all answer
//! the same four operations, so the driver runs them through one code path:
//!
//! - `next`: hand out the next bound work item, or report exhaustion
//! - `record`: route a completed item's output values back to the cursor
//!   that issued it
//! - `output`: the assembled result once exhausted
//! - `prime`: input values for the first sub-step; only cursors that
//!   thread input (waterfall) use them, everything else ignores them
//!
//! The sequence cursor composes sub-cursors, one per task, so nesting to any
//! depth never introduces a per-kind branch in the driver's hot loop.

mod mapped;
mod sequence;
mod step;

pub(crate) use mapped::MappedCursor;
pub(crate) use sequence::SequenceCursor;
pub(crate) use step::StepCursor;

use crate::sequence::StepFn;
use crate::values::Values;

/// One invocable unit of work: the operation pre-bound for a single
/// invocation, together with the positional input values it will receive.
pub(crate) struct WorkItem<C> {
    pub inputs: Values,
    pub invoke: StepFn<C>,
}

/// Result of asking a cursor for more work.
pub(crate) enum Pull<C> {
    Item(WorkItem<C>),
    Done,
}

/// The pull protocol shared by every task kind.
pub(crate) trait TaskCursor<C>: Send {
    /// The next bound work item, or [`Pull::Done`] once exhausted.
    fn next(&mut self) -> Pull<C>;

    /// Route the output values of the most recently pulled item back to the
    /// cursor that issued it.
    fn record(&mut self, values: Values);

    /// The assembled output. Meaningful only after [`Self::next`] returned
    /// [`Pull::Done`].
    fn output(&mut self) -> Values;

    /// Prime the input delivered to the first sub-step pulled from this
    /// cursor. Cursors that do not thread input ignore it.
    fn prime(&mut self, values: Values);
}
