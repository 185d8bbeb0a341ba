//! Mapped-step cursor: one work item per captured element.
//!
//! The element operation is shared across invocations, so it lives behind a
//! lock and each work item carries a shim that borrows it for one call.
//! Inputs are `(index, element)`; outputs are slotted by index, so the
//! assembled array follows snapshot order.

use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::{Pull, TaskCursor, WorkItem};
use crate::sequence::ElementFn;
use crate::values::Values;

pub(crate) struct MappedCursor<C> {
    op: Arc<Mutex<ElementFn<C>>>,
    elements: std::vec::IntoIter<Value>,
    next_index: usize,
    in_flight: Option<usize>,
    slots: Vec<Value>,
}

impl<C> MappedCursor<C> {
    pub(crate) fn new(elements: Vec<Value>, op: ElementFn<C>) -> Self {
        Self {
            op: Arc::new(Mutex::new(op)),
            slots: vec![Value::Null; elements.len()],
            elements: elements.into_iter(),
            next_index: 0,
            in_flight: None,
        }
    }
}

impl<C: Send + 'static> TaskCursor<C> for MappedCursor<C> {
    fn next(&mut self) -> Pull<C> {
        let Some(element) = self.elements.next() else {
            return Pull::Done;
        };
        let index = self.next_index;
        self.next_index += 1;
        self.in_flight = Some(index);

        let op = Arc::clone(&self.op);
        Pull::Item(WorkItem {
            inputs: Values::many(vec![Value::from(index), element]),
            invoke: Box::new(move |context, inputs, completion| {
                let mut op = op.lock().expect("mapped operation lock poisoned");
                (*op)(context, inputs, completion)
            }),
        })
    }

    fn record(&mut self, values: Values) {
        if let Some(index) = self.in_flight.take() {
            self.slots[index] = values.into_slot();
        }
    }

    fn output(&mut self) -> Values {
        Values::one(Value::Array(std::mem::take(&mut self.slots)))
    }

    fn prime(&mut self, _values: Values) {
        // Inputs are always (index, element); threading does not apply.
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::MappedCursor;
    use crate::completion::Completion;
    use crate::cursor::{Pull, TaskCursor};
    use crate::values::Values;

    fn drain(cursor: &mut MappedCursor<()>) -> Values {
        loop {
            match cursor.next() {
                Pull::Item(item) => {
                    let token = Completion::new();
                    (item.invoke)(&mut (), item.inputs, token.clone()).expect("element ok");
                    let outcome = token
                        .collect_or_detach(Box::new(|_| {}))
                        .expect("synchronous completion");
                    cursor.record(outcome.expect("success"));
                }
                Pull::Done => return cursor.output(),
            }
        }
    }

    #[test]
    fn each_element_receives_index_and_element() {
        let mut cursor: MappedCursor<()> = MappedCursor::new(
            vec![json!("a"), json!("b")],
            Box::new(|_cx, inputs, done| {
                let index = inputs.get(0).cloned().unwrap_or_default();
                let element = inputs.get(1).cloned().unwrap_or_default();
                let _ = done.succeed(json!([index, element]));
                Ok(())
            }),
        );

        let output = drain(&mut cursor);
        assert_eq!(output, Values::one(json!([[0, "a"], [1, "b"]])));
    }

    #[test]
    fn empty_snapshot_assembles_an_empty_group() {
        let mut cursor: MappedCursor<()> = MappedCursor::new(
            Vec::new(),
            Box::new(|_cx, _inputs, done| {
                let _ = done.succeed(());
                Ok(())
            }),
        );
        assert!(matches!(cursor.next(), Pull::Done));
        assert_eq!(cursor.output(), Values::one(json!([])));
    }

    #[test]
    fn primed_input_is_ignored() {
        let mut cursor: MappedCursor<()> = MappedCursor::new(
            vec![json!(9)],
            Box::new(|_cx, inputs, done| {
                let _ = done.succeed(inputs.into_vec());
                Ok(())
            }),
        );
        cursor.prime(Values::one(json!("threaded")));

        let output = drain(&mut cursor);
        assert_eq!(output, Values::one(json!([[0, 9]])));
    }
}
