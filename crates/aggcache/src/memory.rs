use crate::{
    aggregate::{AggregateQuery, AggregateRow, FoldError, fold_records},
    model::EntityModel,
    port::HostPort,
    record::Record,
    sync::{SaveOutcome, Synchronizer},
    value::Value,
};
use std::cell::RefCell;
use thiserror::Error as ThisError;

///
/// MemoryHostError
///

#[derive(Clone, Debug, ThisError)]
pub enum MemoryHostError {
    #[error("unknown entity: {entity_name}")]
    UnknownEntity { entity_name: String },

    #[error("row is missing its primary key: {entity_name}")]
    MissingPrimaryKey { entity_name: String },

    #[error("row not found: {entity_name} id={id}")]
    RowNotFound { entity_name: String, id: Value },

    #[error(transparent)]
    Fold(#[from] FoldError),
}

///
/// MemoryHost
///
/// In-memory host runtime implementing [`HostPort`] over plain record
/// tables. Filters are evaluated in process and aggregates computed by
/// [`fold_records`]; `join_depth` has no effect since conditions never span
/// tables here. Its `save_child`/`delete_child` entry points drive the full
/// capture → mutate → after-hook lifecycle, serving as executable
/// documentation of the hook protocol for real hosts.
///

#[derive(Debug, Default)]
pub struct MemoryHost {
    tables: RefCell<Vec<Table>>,
}

#[derive(Debug)]
struct Table {
    model: EntityModel,
    rows: Vec<Record>,
}

impl Table {
    fn position_of(&self, id: &Value) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.get(&self.model.primary_key) == Some(id))
    }
}

impl MemoryHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one entity table. Parents need only a name and primary key;
    /// children also declare their belongs-to associations.
    pub fn register(&self, model: EntityModel) {
        self.tables.borrow_mut().push(Table {
            model,
            rows: Vec::new(),
        });
    }

    /// Insert a row without lifecycle hooks (seeding parents, fixtures).
    pub fn insert_row(&self, entity_name: &str, record: Record) -> Result<(), MemoryHostError> {
        self.with_table_mut(entity_name, |table| {
            table.rows.push(record);
            Ok(())
        })
    }

    /// Fetch one row by primary key.
    #[must_use]
    pub fn row(&self, entity_name: &str, id: &Value) -> Option<Record> {
        let tables = self.tables.borrow();
        let table = tables
            .iter()
            .find(|table| table.model.entity_name == entity_name)?;

        table.position_of(id).map(|index| table.rows[index].clone())
    }

    /// Fetch one field of one row by primary key.
    #[must_use]
    pub fn field(&self, entity_name: &str, id: &Value, field: &str) -> Option<Value> {
        self.row(entity_name, id)
            .and_then(|record| record.get(field).cloned())
    }

    /// Save a child row and run the synchronizer's save lifecycle around it.
    ///
    /// The foreign-key snapshot is captured from the stored (pre-save) row;
    /// an update merges the given fields over the stored row, partial-save
    /// style, while the hook receives the caller's in-memory record as-is.
    pub fn save_child(
        &self,
        sync: &Synchronizer,
        entity_name: &str,
        record: Record,
    ) -> Result<(), MemoryHostError> {
        let (model, outcome, snapshot) = self.with_table_mut(entity_name, |table| {
            let model = table.model.clone();
            let id = record
                .get(&model.primary_key)
                .cloned()
                .ok_or_else(|| MemoryHostError::MissingPrimaryKey {
                    entity_name: model.entity_name.clone(),
                })?;

            match table.position_of(&id) {
                Some(index) => {
                    let snapshot = sync.capture_foreign_keys(&model, &table.rows[index]);
                    table.rows[index].merge_from(&record);
                    Ok((model, SaveOutcome::Updated, snapshot))
                }
                None => {
                    let snapshot = sync.capture_foreign_keys(&model, &Record::new());
                    table.rows.push(record.clone());
                    Ok((model, SaveOutcome::Created, snapshot))
                }
            }
        })?;

        sync.after_save(self, &model, &record, outcome, &snapshot)
    }

    /// Delete a child row and run the synchronizer's delete lifecycle.
    pub fn delete_child(
        &self,
        sync: &Synchronizer,
        entity_name: &str,
        id: &Value,
    ) -> Result<(), MemoryHostError> {
        let (model, snapshot) = self.with_table_mut(entity_name, |table| {
            let model = table.model.clone();
            let index =
                table
                    .position_of(id)
                    .ok_or_else(|| MemoryHostError::RowNotFound {
                        entity_name: model.entity_name.clone(),
                        id: id.clone(),
                    })?;
            let snapshot = sync.capture_foreign_keys(&model, &table.rows[index]);
            table.rows.remove(index);
            Ok((model, snapshot))
        })?;

        sync.after_delete(self, &model, &snapshot)
    }

    // Run one closure against a mutable table, keeping the borrow scoped so
    // hook callbacks can re-enter through the port.
    fn with_table_mut<T>(
        &self,
        entity_name: &str,
        f: impl FnOnce(&mut Table) -> Result<T, MemoryHostError>,
    ) -> Result<T, MemoryHostError> {
        let mut tables = self.tables.borrow_mut();
        let table = tables
            .iter_mut()
            .find(|table| table.model.entity_name == entity_name)
            .ok_or_else(|| MemoryHostError::UnknownEntity {
                entity_name: entity_name.to_string(),
            })?;

        f(table)
    }
}

impl HostPort for MemoryHost {
    type Error = MemoryHostError;

    fn aggregate_first(
        &self,
        query: &AggregateQuery,
    ) -> Result<Option<AggregateRow>, Self::Error> {
        let tables = self.tables.borrow();
        let table = tables
            .iter()
            .find(|table| table.model.entity_name == query.entity_name)
            .ok_or_else(|| MemoryHostError::UnknownEntity {
                entity_name: query.entity_name.clone(),
            })?;

        let matching = table.rows.iter().filter(|row| query.filter.matches(row));
        Ok(fold_records(&query.specs, matching)?)
    }

    fn fetch_child(&self, entity_name: &str, id: &Value) -> Result<Option<Record>, Self::Error> {
        let tables = self.tables.borrow();
        tables
            .iter()
            .find(|table| table.model.entity_name == entity_name)
            .ok_or_else(|| MemoryHostError::UnknownEntity {
                entity_name: entity_name.to_string(),
            })
            .map(|table| table.position_of(id).map(|index| table.rows[index].clone()))
    }

    fn parent_exists(&self, target_entity: &str, id: &Value) -> Result<bool, Self::Error> {
        let tables = self.tables.borrow();
        tables
            .iter()
            .find(|table| table.model.entity_name == target_entity)
            .ok_or_else(|| MemoryHostError::UnknownEntity {
                entity_name: target_entity.to_string(),
            })
            .map(|table| table.position_of(id).is_some())
    }

    fn write_parent_fields(
        &self,
        target_entity: &str,
        id: &Value,
        fields: &[(&str, Value)],
    ) -> Result<(), Self::Error> {
        self.with_table_mut(target_entity, |table| {
            let index = table
                .position_of(id)
                .ok_or_else(|| MemoryHostError::RowNotFound {
                    entity_name: target_entity.to_string(),
                    id: id.clone(),
                })?;
            for (field, value) in fields {
                table.rows[index].set(*field, value.clone());
            }

            Ok(())
        })
    }
}

///
/// TESTS
///
