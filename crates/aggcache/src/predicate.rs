use crate::{record::Record, value::Value};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, ops::BitAnd};

///
/// Predicate AST
///
/// Pure representation of aggregate-query filters. Rule conditions and
/// association default conditions are expressed in this form; hosts either
/// push it down to their own query layer or evaluate it in process via
/// [`Predicate::matches`].
///

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

///
/// ComparePredicate
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ComparePredicate {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

impl ComparePredicate {
    fn new(field: String, op: CompareOp, value: Value) -> Self {
        Self { field, op, value }
    }

    #[must_use]
    pub fn eq(field: String, value: Value) -> Self {
        Self::new(field, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn ne(field: String, value: Value) -> Self {
        Self::new(field, CompareOp::Ne, value)
    }

    #[must_use]
    pub fn lt(field: String, value: Value) -> Self {
        Self::new(field, CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(field: String, value: Value) -> Self {
        Self::new(field, CompareOp::Lte, value)
    }

    #[must_use]
    pub fn gt(field: String, value: Value) -> Self {
        Self::new(field, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(field: String, value: Value) -> Self {
        Self::new(field, CompareOp::Gte, value)
    }

    /// Evaluate against one record under strict same-variant ordering.
    /// A missing field or a cross-variant comparison never matches.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let Some(actual) = record.get(&self.field) else {
            return false;
        };
        let Some(ordering) = Value::strict_order_cmp(actual, &self.value) else {
            return false;
        };

        match self.op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
        }
    }
}

///
/// Predicate
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum Predicate {
    #[default]
    True,
    And(Vec<Self>),
    Compare(ComparePredicate),
}

impl Predicate {
    #[must_use]
    pub const fn and(preds: Vec<Self>) -> Self {
        Self::And(preds)
    }

    #[must_use]
    pub fn eq(field: String, value: Value) -> Self {
        Self::Compare(ComparePredicate::eq(field, value))
    }

    #[must_use]
    pub fn ne(field: String, value: Value) -> Self {
        Self::Compare(ComparePredicate::ne(field, value))
    }

    #[must_use]
    pub fn lt(field: String, value: Value) -> Self {
        Self::Compare(ComparePredicate::lt(field, value))
    }

    #[must_use]
    pub fn lte(field: String, value: Value) -> Self {
        Self::Compare(ComparePredicate::lte(field, value))
    }

    #[must_use]
    pub fn gt(field: String, value: Value) -> Self {
        Self::Compare(ComparePredicate::gt(field, value))
    }

    #[must_use]
    pub fn gte(field: String, value: Value) -> Self {
        Self::Compare(ComparePredicate::gte(field, value))
    }

    /// Evaluate against one record.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::True => true,
            Self::And(preds) => preds.iter().all(|pred| pred.matches(record)),
            Self::Compare(compare) => compare.matches(record),
        }
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::Predicate;
    use crate::{record::Record, value::Value};

    fn visible_comment(rating: i64, visible: bool) -> Record {
        Record::new()
            .with_field("rating", rating)
            .with_field("visible", visible)
    }

    #[test]
    fn compare_predicates_evaluate_ordering_ops() {
        let record = visible_comment(3, true);

        assert!(Predicate::eq("rating".into(), Value::Int(3)).matches(&record));
        assert!(Predicate::ne("rating".into(), Value::Int(4)).matches(&record));
        assert!(Predicate::lt("rating".into(), Value::Int(4)).matches(&record));
        assert!(Predicate::gte("rating".into(), Value::Int(3)).matches(&record));
        assert!(!Predicate::gt("rating".into(), Value::Int(3)).matches(&record));
    }

    #[test]
    fn missing_field_never_matches() {
        let record = Record::new();

        assert!(!Predicate::eq("rating".into(), Value::Int(3)).matches(&record));
        assert!(!Predicate::ne("rating".into(), Value::Int(3)).matches(&record));
    }

    #[test]
    fn cross_variant_comparison_never_matches() {
        let record = Record::new().with_field("rating", 3i64);

        assert!(!Predicate::eq("rating".into(), Value::Uint(3)).matches(&record));
        assert!(!Predicate::ne("rating".into(), Value::Uint(4)).matches(&record));
    }

    #[test]
    fn bitand_composes_conjunctions() {
        let filter = Predicate::gte("rating".into(), Value::Int(2))
            & Predicate::eq("visible".into(), Value::Bool(true));

        assert!(filter.matches(&visible_comment(3, true)));
        assert!(!filter.matches(&visible_comment(3, false)));
        assert!(!filter.matches(&visible_comment(1, true)));
    }

    #[test]
    fn conditions_deserialize_from_config_json() {
        let filter: Predicate = serde_json::from_value(serde_json::json!({
            "Compare": { "field": "visible", "op": "eq", "value": { "Bool": true } }
        }))
        .expect("compare predicate should deserialize");

        assert!(filter.matches(&visible_comment(5, true)));
        assert!(!filter.matches(&visible_comment(5, false)));
    }
}
