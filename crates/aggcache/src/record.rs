use crate::value::Value;
use serde::{Deserialize, Serialize};

///
/// Record
///
/// Order-preserving field-name → value map: the in-memory representation of
/// one entity row as the lifecycle hooks receive it. A field that is not
/// present is "unset", which is distinct from a field set to `Value::Unit`;
/// the partial-save re-fetch rule depends on that distinction.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builder-style field assignment.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.iter().any(|(field, _)| field == name)
    }

    /// Set one field, replacing any previous value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some(entry) => entry.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Merge another record's fields over this one (partial-update semantics).
    pub fn merge_from(&mut self, other: &Self) {
        for (name, value) in &other.fields {
            self.set(name.clone(), value.clone());
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::Record;
    use crate::value::Value;

    #[test]
    fn set_replaces_existing_field_in_place() {
        let mut record = Record::new().with_field("rating", 3i64);
        record.set("rating", 5i64);

        assert_eq!(record.get("rating"), Some(&Value::Int(5)));
        assert_eq!(record.fields().count(), 1);
    }

    #[test]
    fn unset_field_is_distinct_from_unit() {
        let record = Record::new().with_field("post_id", Value::Unit);

        assert!(record.contains_field("post_id"));
        assert_eq!(record.get("post_id"), Some(&Value::Unit));
        assert!(!record.contains_field("rating"));
        assert_eq!(record.get("rating"), None);
    }

    #[test]
    fn merge_from_applies_partial_update_semantics() {
        let mut stored = Record::new()
            .with_field("id", 1u64)
            .with_field("rating", 3i64)
            .with_field("post_id", 10u64);
        let partial = Record::new().with_field("rating", 4i64);
        stored.merge_from(&partial);

        assert_eq!(stored.get("rating"), Some(&Value::Int(4)));
        assert_eq!(stored.get("post_id"), Some(&Value::Uint(10)));
    }
}
