use crate::{
    aggregate::{AggregateQuery, AggregateSpec},
    model::{AssociationModel, EntityModel},
    obs::{self, SyncEvent},
    port::HostPort,
    predicate::Predicate,
    record::Record,
    rule::{AggregateRule, RuleSet},
    snapshot::ForeignKeySnapshot,
    value::Value,
};

///
/// SaveOutcome
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaveOutcome {
    Created,
    Updated,
}

///
/// Synchronizer
///
/// Recomputes and persists cached aggregates on parent records whenever a
/// child row is created, updated, or deleted. Holds only the read-only rule
/// set; all per-operation state travels in an explicit
/// [`ForeignKeySnapshot`] owned by the caller of one save/delete, so
/// concurrent operations never share tracking state.
///
/// Every hook runs synchronously: recomputation completes before the hook
/// returns. No hook introduces failure conditions of its own; only host
/// errors propagate.
///

#[derive(Clone, Debug, Default)]
pub struct Synchronizer {
    rules: RuleSet,
}

impl Synchronizer {
    #[must_use]
    pub const fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Capture every declared association's current foreign-key value.
    ///
    /// Must run before save and before delete: a delete destroys the row
    /// the key lives on, and a save may reassign the key.
    #[must_use]
    pub fn capture_foreign_keys(&self, model: &EntityModel, row: &Record) -> ForeignKeySnapshot {
        let mut snapshot = ForeignKeySnapshot::default();
        for association in &model.associations {
            snapshot.record(
                association.name.clone(),
                row.get(&association.foreign_key).cloned(),
            );
        }

        snapshot
    }

    /// Refresh parent aggregates after a child save.
    ///
    /// For each rule whose association the entity declares, the new parent
    /// is recomputed from the saved row's foreign key. On an update whose
    /// captured key differs from the saved one, the old parent is
    /// recomputed as well so a reassigned child leaves no stale cache
    /// behind. A row missing the foreign-key field (partial save) is
    /// re-fetched through the port before the key is resolved.
    pub fn after_save<P: HostPort>(
        &self,
        port: &P,
        model: &EntityModel,
        row: &Record,
        outcome: SaveOutcome,
        snapshot: &ForeignKeySnapshot,
    ) -> Result<(), P::Error> {
        // One re-fetch serves every rule of the operation.
        let mut refetched: Option<Option<Record>> = None;

        for rule in &self.rules {
            let Some(association) = model.association(&rule.association) else {
                obs::emit(SyncEvent::RuleSkipped {
                    entity_name: model.entity_name.clone(),
                    association: rule.association.clone(),
                });
                continue;
            };

            let saved_key = self.resolve_foreign_key(port, model, row, &mut refetched, association)?;
            if let Some(key) = &saved_key {
                self.recompute_and_store(port, model, rule, association, key)?;
            }

            if outcome == SaveOutcome::Updated
                && let Some(previous) = snapshot.captured(&association.name)
                && saved_key.as_ref() != Some(previous)
            {
                self.recompute_and_store(port, model, rule, association, previous)?;
            }
        }

        Ok(())
    }

    /// Refresh parent aggregates after a child delete.
    ///
    /// The child row is gone; the parent is identified solely by the
    /// pre-delete snapshot.
    pub fn after_delete<P: HostPort>(
        &self,
        port: &P,
        model: &EntityModel,
        snapshot: &ForeignKeySnapshot,
    ) -> Result<(), P::Error> {
        for rule in &self.rules {
            let Some(association) = model.association(&rule.association) else {
                obs::emit(SyncEvent::RuleSkipped {
                    entity_name: model.entity_name.clone(),
                    association: rule.association.clone(),
                });
                continue;
            };

            if let Some(previous) = snapshot.captured(&association.name) {
                self.recompute_and_store(port, model, rule, association, previous)?;
            }
        }

        Ok(())
    }

    // Resolve the saved row's foreign key, re-fetching the child once when
    // the in-memory row lacks the field. A child that cannot be re-fetched
    // (no primary key on the row, or already deleted) resolves to no key.
    fn resolve_foreign_key<P: HostPort>(
        &self,
        port: &P,
        model: &EntityModel,
        row: &Record,
        refetched: &mut Option<Option<Record>>,
        association: &AssociationModel,
    ) -> Result<Option<Value>, P::Error> {
        if row.contains_field(&association.foreign_key) {
            return Ok(row.get(&association.foreign_key).cloned());
        }

        if refetched.is_none() {
            let fetched = match row.get(&model.primary_key) {
                Some(id) => port.fetch_child(&model.entity_name, id)?,
                None => None,
            };
            *refetched = Some(fetched);
        }

        Ok(refetched
            .as_ref()
            .and_then(|fetched| fetched.as_ref())
            .and_then(|record| record.get(&association.foreign_key))
            .cloned())
    }

    // Recompute one rule's aggregates for one parent group and persist the
    // destination fields. Null keys and vanished parents are silent no-ops.
    fn recompute_and_store<P: HostPort>(
        &self,
        port: &P,
        model: &EntityModel,
        rule: &AggregateRule,
        association: &AssociationModel,
        foreign_id: &Value,
    ) -> Result<(), P::Error> {
        if foreign_id.is_unit() {
            return Ok(());
        }

        let conditions = rule
            .conditions
            .clone()
            .unwrap_or_else(|| association.conditions.clone());
        let filter =
            Predicate::eq(association.foreign_key.clone(), foreign_id.clone()) & conditions;
        let query = AggregateQuery {
            entity_name: model.entity_name.clone(),
            filter,
            group_by: association.foreign_key.clone(),
            specs: rule
                .outputs
                .iter()
                .map(|(function, _)| AggregateSpec::new(*function, rule.source_field.clone()))
                .collect(),
            join_depth: rule.join_depth,
        };

        obs::emit(SyncEvent::Recompute {
            entity_name: model.entity_name.clone(),
            association: association.name.clone(),
        });
        let result = port.aggregate_first(&query)?;

        if !port.parent_exists(&association.target_entity, foreign_id)? {
            obs::emit(SyncEvent::ParentMissing {
                target_entity: association.target_entity.clone(),
            });
            return Ok(());
        }

        let fields: Vec<(&str, Value)> = rule
            .outputs
            .iter()
            .enumerate()
            .map(|(index, (function, destination))| {
                let value = result
                    .as_ref()
                    .and_then(|row| row.value_at(index))
                    .cloned()
                    .unwrap_or_else(|| function.empty_value());
                (destination.as_str(), value)
            })
            .collect();

        port.write_parent_fields(&association.target_entity, foreign_id, &fields)?;
        obs::emit(SyncEvent::CacheWrite {
            target_entity: association.target_entity.clone(),
            fields: fields.len(),
        });

        Ok(())
    }
}

///
/// TESTS
///
