use crate::value::Value;

///
/// ForeignKeySnapshot
///
/// Per-operation capture of each association's foreign-key value taken
/// before a save or delete. The value is unavailable after a delete, and
/// may change during a save; the after-hooks consume the snapshot to find
/// the previous parent. Owned by one operation, never shared.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForeignKeySnapshot {
    entries: Vec<(String, Option<Value>)>,
}

impl ForeignKeySnapshot {
    pub(crate) fn record(&mut self, association: impl Into<String>, value: Option<Value>) {
        self.entries.push((association.into(), value));
    }

    /// The foreign-key value captured for one association, if it was set.
    #[must_use]
    pub fn captured(&self, association: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == association)
            .and_then(|(_, value)| value.as_ref())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

///
/// TESTS
///
