//! Aggcache: rule-driven aggregate cache synchronization for entity
//! save/delete lifecycles.
//!
//! A host runtime declares belongs-to associations on its child entities,
//! loads a [`rule::RuleSet`] mapping child fields to cached aggregate fields
//! on the parent, and calls the [`sync::Synchronizer`] hooks around its own
//! save/delete. The synchronizer recomputes min/max/avg/sum/count for the
//! affected parent group through the [`port::HostPort`] boundary and writes
//! the results back as a partial update.
#![warn(unreachable_pub)]

pub mod aggregate;
pub mod memory;
pub mod model;
pub mod obs;
pub mod port;
pub mod predicate;
pub mod record;
pub mod rule;
pub mod snapshot;
pub mod sync;
pub mod value;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, sinks, or host implementations are re-exported here.
///

pub mod prelude {
    pub use crate::{
        aggregate::AggregateFn,
        model::{AssociationModel, EntityModel},
        port::HostPort,
        predicate::Predicate,
        record::Record,
        rule::{RuleConfig, RuleSet},
        snapshot::ForeignKeySnapshot,
        sync::{SaveOutcome, Synchronizer},
        value::Value,
    };
}
