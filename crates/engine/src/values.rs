//! Positional completion values and result-slot shaping.
//!
//! A step reports zero or more positional values through its completion
//! token. The same shape travels in the other direction when a waterfall
//! sequence threads one step's output into the next step's inputs, so both
//! directions share [`Values`].

use serde_json::Value;

/// Ordered positional values attached to one step completion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Values(Vec<Value>);

impl Values {
    /// No values at all.
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Exactly one value.
    pub fn one(value: impl Into<Value>) -> Self {
        Self(vec![value.into()])
    }

    /// An arbitrary ordered list of values.
    pub fn many(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Positional access, `None` past the end.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// The first value, if any. Convenient for single-output steps.
    pub fn first(&self) -> Option<&Value> {
        self.0.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        self.0.as_slice()
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    /// Collapse into the single result slot these values occupy in an
    /// assembled sequence result: zero values become null, a single value
    /// stays bare, several values become one group.
    pub fn into_slot(self) -> Value {
        let mut values = self.0;
        match values.len() {
            0 => Value::Null,
            1 => values.remove(0),
            _ => Value::Array(values),
        }
    }
}

impl From<()> for Values {
    fn from(_: ()) -> Self {
        Self::none()
    }
}

impl From<Value> for Values {
    fn from(value: Value) -> Self {
        Self::one(value)
    }
}

impl From<Vec<Value>> for Values {
    fn from(values: Vec<Value>) -> Self {
        Self::many(values)
    }
}

impl From<&str> for Values {
    fn from(value: &str) -> Self {
        Self::one(value)
    }
}

impl From<String> for Values {
    fn from(value: String) -> Self {
        Self::one(value)
    }
}

impl FromIterator<Value> for Values {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Values {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Values;
    use serde_json::{Value, json};

    #[test]
    fn empty_values_collapse_to_null() {
        assert_eq!(Values::none().into_slot(), Value::Null);
        assert_eq!(Values::from(()).into_slot(), Value::Null);
    }

    #[test]
    fn single_value_stays_bare() {
        assert_eq!(Values::one(json!("x")).into_slot(), json!("x"));
        assert_eq!(Values::from(json!(7)).into_slot(), json!(7));
    }

    #[test]
    fn several_values_become_one_group() {
        let values = Values::many(vec![json!("a"), json!("b")]);
        assert_eq!(values.into_slot(), json!(["a", "b"]));
    }

    #[test]
    fn single_array_value_is_not_flattened() {
        // One value that happens to be an array stays a bare array slot.
        let values = Values::one(json!(["a", "b"]));
        assert_eq!(values.into_slot(), json!(["a", "b"]));
    }

    #[test]
    fn positional_access() {
        let values = Values::many(vec![json!(0), json!(1)]);
        assert_eq!(values.get(1), Some(&json!(1)));
        assert_eq!(values.get(2), None);
        assert_eq!(values.first(), Some(&json!(0)));
        assert_eq!(values.len(), 2);
    }
}
