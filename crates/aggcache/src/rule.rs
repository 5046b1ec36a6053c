use crate::{aggregate::AggregateFn, predicate::Predicate};
use derive_more::{Deref, IntoIterator};
use serde::Deserialize;

///
/// RuleConfig
///
/// One raw configuration entry before validation. The entry key in the
/// surrounding rule map doubles as the source field when `field` is not
/// given; `model` names the belongs-to association that stores the cached
/// values; each function key names the parent field that caches its result.
/// `join_depth` is the association-traversal hint forwarded to the
/// aggregate query.
///

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub field: Option<String>,
    pub model: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub avg: Option<String>,
    pub sum: Option<String>,
    pub count: Option<String>,
    pub conditions: Option<Predicate>,
    pub join_depth: Option<u32>,
}

impl RuleConfig {
    fn destination(&self, function: AggregateFn) -> Option<&String> {
        match function {
            AggregateFn::Min => self.min.as_ref(),
            AggregateFn::Max => self.max.as_ref(),
            AggregateFn::Avg => self.avg.as_ref(),
            AggregateFn::Sum => self.sum.as_ref(),
            AggregateFn::Count => self.count.as_ref(),
        }
    }
}

///
/// AggregateRule
///
/// One validated, immutable rule: aggregate `source_field` over the child
/// rows grouped under `association`, writing each function's result into
/// its destination field on the parent.
///

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateRule {
    pub source_field: String,
    pub association: String,
    pub outputs: Vec<(AggregateFn, String)>,
    pub conditions: Option<Predicate>,
    pub join_depth: Option<u32>,
}

///
/// RuleSet
///
/// Ordered, read-only sequence of validated rules for one child entity.
///

#[derive(Clone, Debug, Default, Deref, IntoIterator)]
pub struct RuleSet {
    #[deref]
    #[into_iterator(owned, ref)]
    rules: Vec<AggregateRule>,
}

impl RuleSet {
    /// Build a rule set from keyed configuration entries.
    ///
    /// Malformed entries are tolerated, not reported: an entry missing both
    /// `field` and a usable key-derived field name, an entry missing
    /// `model`, or an entry mapping no function at all is silently dropped.
    /// Entry order is preserved for the surviving rules.
    #[must_use]
    pub fn load(entries: impl IntoIterator<Item = (String, RuleConfig)>) -> Self {
        let rules = entries
            .into_iter()
            .filter_map(|(key, config)| Self::validate(key, config))
            .collect();

        Self { rules }
    }

    fn validate(key: String, config: RuleConfig) -> Option<AggregateRule> {
        let source_field = match &config.field {
            Some(field) if !field.is_empty() => field.clone(),
            _ if !key.is_empty() => key,
            _ => return None,
        };
        let association = match &config.model {
            Some(model) if !model.is_empty() => model.clone(),
            _ => return None,
        };

        let outputs: Vec<(AggregateFn, String)> = AggregateFn::ALL
            .into_iter()
            .filter_map(|function| {
                config
                    .destination(function)
                    .map(|destination| (function, destination.clone()))
            })
            .collect();
        if outputs.is_empty() {
            return None;
        }

        Some(AggregateRule {
            source_field,
            association,
            outputs,
            conditions: config.conditions,
            join_depth: config.join_depth,
        })
    }
}

///
/// TESTS
///
