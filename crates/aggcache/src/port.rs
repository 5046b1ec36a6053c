use crate::{
    aggregate::{AggregateQuery, AggregateRow},
    record::Record,
    value::Value,
};

///
/// HostPort
///
/// The query/persistence surface the synchronizer consumes from the host
/// runtime. The synchronizer never manages connections, transactions, or
/// locking itself; host failures propagate through the hooks unmodified via
/// the associated error type.
///

pub trait HostPort {
    type Error: std::error::Error;

    /// First row matching the query's filter, with one aggregate value per
    /// spec, grouped by the query's key. `Ok(None)` when no row matched.
    fn aggregate_first(&self, query: &AggregateQuery)
    -> Result<Option<AggregateRow>, Self::Error>;

    /// Re-fetch one child row by primary key. Used when the in-memory row
    /// handed to a hook is missing persisted fields (partial save).
    fn fetch_child(&self, entity_name: &str, id: &Value) -> Result<Option<Record>, Self::Error>;

    /// Whether the parent record identified by `id` currently exists.
    fn parent_exists(&self, target_entity: &str, id: &Value) -> Result<bool, Self::Error>;

    /// Partial update of the named fields on one parent record.
    fn write_parent_fields(
        &self,
        target_entity: &str,
        id: &Value,
        fields: &[(&str, Value)],
    ) -> Result<(), Self::Error>;
}
