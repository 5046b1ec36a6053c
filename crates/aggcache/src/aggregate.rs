use crate::{predicate::Predicate, record::Record, value::Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error as ThisError;

///
/// AggregateFn
///
/// The supported aggregate functions as a closed tagged enum. Configuration
/// maps each requested function to the parent field that caches its result.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFn {
    Min,
    Max,
    Avg,
    Sum,
    Count,
}

impl AggregateFn {
    /// Declaration order used when expanding configuration entries.
    pub const ALL: [Self; 5] = [Self::Min, Self::Max, Self::Avg, Self::Sum, Self::Count];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::Avg => "avg",
            Self::Sum => "sum",
            Self::Count => "count",
        }
    }

    /// The cached value written when no child row matches the group.
    ///
    /// Count and sum have a natural zero; min/max/avg have no defined empty
    /// semantics, so zero is the convention rather than null.
    #[must_use]
    pub const fn empty_value(self) -> Value {
        match self {
            Self::Count => Value::Uint(0),
            Self::Sum | Self::Avg => Value::Float64(0.0),
            Self::Min | Self::Max => Value::Int(0),
        }
    }
}

///
/// AggregateSpec
///
/// One aggregate expression: a function applied to a source field.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregateSpec {
    pub function: AggregateFn,
    pub source_field: String,
}

impl AggregateSpec {
    #[must_use]
    pub fn new(function: AggregateFn, source_field: impl Into<String>) -> Self {
        Self {
            function,
            source_field: source_field.into(),
        }
    }
}

///
/// AggregateQuery
///
/// The query shape the synchronizer hands to the host port: first row
/// matching the filter, with one aggregate expression per spec, grouped by
/// the foreign key. `join_depth` is a pass-through association-traversal
/// hint for hosts whose condition evaluation can span related tables.
///

#[derive(Clone, Debug, PartialEq)]
pub struct AggregateQuery {
    pub entity_name: String,
    pub filter: Predicate,
    pub group_by: String,
    pub specs: Vec<AggregateSpec>,
    pub join_depth: Option<u32>,
}

///
/// AggregateRow
///
/// Computed aggregate values for one parent group, positionally aligned
/// with the query's specs.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregateRow {
    values: Vec<Value>,
}

impl AggregateRow {
    #[must_use]
    pub const fn from_values(values: Vec<Value>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

///
/// FoldError
///
/// Typed extraction/comparison errors raised while folding child rows.
///

#[derive(Clone, Debug, ThisError)]
pub enum FoldError {
    #[error("aggregate source field is not numeric: {field} value={value:?}")]
    NonNumericSourceValue { field: String, value: Box<Value> },

    #[error(
        "aggregate source field values are incomparable under strict ordering: {field} left={left:?} right={right:?}"
    )]
    IncomparableSourceValues {
        field: String,
        left: Box<Value>,
        right: Box<Value>,
    },
}

// Per-spec accumulator state for the single-pass fold.
enum Accumulator {
    Count(u64),
    Sum { total: f64, seen: bool },
    Avg { total: f64, non_null: u64 },
    Extremum { keep_max: bool, value: Option<Value> },
}

impl Accumulator {
    const fn for_function(function: AggregateFn) -> Self {
        match function {
            AggregateFn::Count => Self::Count(0),
            AggregateFn::Sum => Self::Sum {
                total: 0.0,
                seen: false,
            },
            AggregateFn::Avg => Self::Avg {
                total: 0.0,
                non_null: 0,
            },
            AggregateFn::Min => Self::Extremum {
                keep_max: false,
                value: None,
            },
            AggregateFn::Max => Self::Extremum {
                keep_max: true,
                value: None,
            },
        }
    }

    fn absorb(&mut self, field: &str, source: Option<&Value>) -> Result<(), FoldError> {
        // Unset and null source values are skipped by every function,
        // SQL-style: count(field) excludes them too.
        match self {
            Self::Count(count) => {
                if present(source).is_some() {
                    *count += 1;
                }
            }
            Self::Sum { total, seen } => {
                if let Some(value) = present(source) {
                    *total += numeric(field, value)?;
                    *seen = true;
                }
            }
            Self::Avg { total, non_null } => {
                if let Some(value) = present(source) {
                    *total += numeric(field, value)?;
                    *non_null += 1;
                }
            }
            Self::Extremum { keep_max, value } => {
                if let Some(candidate) = present(source) {
                    match value {
                        None => *value = Some(candidate.clone()),
                        Some(current) => {
                            let Some(ordering) = Value::strict_order_cmp(candidate, current) else {
                                return Err(FoldError::IncomparableSourceValues {
                                    field: field.to_string(),
                                    left: Box::new(candidate.clone()),
                                    right: Box::new(current.clone()),
                                });
                            };
                            let replace = if *keep_max {
                                ordering == Ordering::Greater
                            } else {
                                ordering == Ordering::Less
                            };
                            if replace {
                                *value = Some(candidate.clone());
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn finish(self) -> Value {
        match self {
            Self::Count(count) => Value::Uint(count),
            Self::Sum { total, seen } => {
                if seen {
                    Value::Float64(total)
                } else {
                    Value::Unit
                }
            }
            Self::Avg { total, non_null } => {
                if non_null == 0 {
                    Value::Unit
                } else {
                    Value::Float64(total / non_null as f64)
                }
            }
            Self::Extremum { value, .. } => value.unwrap_or(Value::Unit),
        }
    }
}

fn present(source: Option<&Value>) -> Option<&Value> {
    source.filter(|value| !value.is_unit())
}

fn numeric(field: &str, value: &Value) -> Result<f64, FoldError> {
    value
        .to_numeric_f64()
        .ok_or_else(|| FoldError::NonNumericSourceValue {
            field: field.to_string(),
            value: Box::new(value.clone()),
        })
}

/// Fold matching child rows into one aggregate row.
///
/// Returns `Ok(None)` when no row matched; the caller applies the
/// empty-group zero convention. A matched row with a null/unset source
/// value is skipped by every function, count included.
pub fn fold_records<'a>(
    specs: &[AggregateSpec],
    rows: impl IntoIterator<Item = &'a Record>,
) -> Result<Option<AggregateRow>, FoldError> {
    let mut accumulators: Vec<Accumulator> = specs
        .iter()
        .map(|spec| Accumulator::for_function(spec.function))
        .collect();

    let mut matched = false;
    for row in rows {
        matched = true;
        for (spec, accumulator) in specs.iter().zip(accumulators.iter_mut()) {
            accumulator.absorb(&spec.source_field, row.get(&spec.source_field))?;
        }
    }

    if !matched {
        return Ok(None);
    }

    Ok(Some(AggregateRow::from_values(
        accumulators
            .into_iter()
            .map(Accumulator::finish)
            .collect(),
    )))
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::{AggregateFn, AggregateRow, AggregateSpec, FoldError, fold_records};
    use crate::{record::Record, value::Value};
    use proptest::prelude::*;

    fn rating_rows(ratings: &[i64]) -> Vec<Record> {
        ratings
            .iter()
            .map(|rating| Record::new().with_field("rating", *rating))
            .collect()
    }

    fn all_function_specs() -> Vec<AggregateSpec> {
        AggregateFn::ALL
            .into_iter()
            .map(|function| AggregateSpec::new(function, "rating"))
            .collect()
    }

    #[test]
    fn fold_computes_every_function_over_int_ratings() {
        let rows = rating_rows(&[1, 2, 3]);
        let row = fold_records(&all_function_specs(), &rows)
            .expect("fold over int ratings should succeed")
            .expect("non-empty group should produce a row");

        assert_eq!(
            row,
            AggregateRow::from_values(vec![
                Value::Int(1),       // min
                Value::Int(3),       // max
                Value::Float64(2.0), // avg
                Value::Float64(6.0), // sum
                Value::Uint(3),      // count
            ])
        );
    }

    #[test]
    fn fold_over_no_rows_yields_none() {
        let rows: Vec<Record> = Vec::new();
        let row = fold_records(&all_function_specs(), &rows).expect("empty fold should succeed");

        assert_eq!(row, None);
    }

    #[test]
    fn null_and_unset_source_values_are_skipped_by_every_function() {
        let rows = vec![
            Record::new().with_field("rating", 4i64),
            Record::new().with_field("rating", Value::Unit),
            Record::new(),
        ];
        let row = fold_records(&all_function_specs(), &rows)
            .expect("null-skipping fold should succeed")
            .expect("group with rows should produce a row");

        assert_eq!(row.value_at(0), Some(&Value::Int(4))); // min
        assert_eq!(row.value_at(3), Some(&Value::Float64(4.0))); // sum
        // count(field) semantics: only the non-null rating is counted.
        assert_eq!(row.value_at(4), Some(&Value::Uint(1)));
    }

    #[test]
    fn all_null_source_values_yield_unit_and_a_zero_count() {
        let rows = vec![Record::new().with_field("rating", Value::Unit)];
        let row = fold_records(&all_function_specs(), &rows)
            .expect("all-null fold should succeed")
            .expect("group with rows should produce a row");

        assert_eq!(row.value_at(0), Some(&Value::Unit)); // min
        assert_eq!(row.value_at(2), Some(&Value::Unit)); // avg
        assert_eq!(row.value_at(3), Some(&Value::Unit)); // sum
        assert_eq!(row.value_at(4), Some(&Value::Uint(0))); // count
    }

    #[test]
    fn non_numeric_source_value_fails_sum() {
        let rows = vec![Record::new().with_field("rating", "high")];
        let err = fold_records(&[AggregateSpec::new(AggregateFn::Sum, "rating")], &rows)
            .expect_err("text source value must be rejected for sum");

        assert!(matches!(err, FoldError::NonNumericSourceValue { .. }));
    }

    #[test]
    fn cross_variant_source_values_fail_extrema() {
        let rows = vec![
            Record::new().with_field("rating", 1i64),
            Record::new().with_field("rating", 2u64),
        ];
        let err = fold_records(&[AggregateSpec::new(AggregateFn::Max, "rating")], &rows)
            .expect_err("mixed int/uint extremum must be rejected");

        assert!(matches!(err, FoldError::IncomparableSourceValues { .. }));
    }

    #[test]
    fn empty_value_convention_per_function() {
        assert_eq!(AggregateFn::Count.empty_value(), Value::Uint(0));
        assert_eq!(AggregateFn::Sum.empty_value(), Value::Float64(0.0));
        assert_eq!(AggregateFn::Avg.empty_value(), Value::Float64(0.0));
        assert_eq!(AggregateFn::Min.empty_value(), Value::Int(0));
        assert_eq!(AggregateFn::Max.empty_value(), Value::Int(0));
    }

    proptest! {
        #[test]
        fn fold_sum_and_count_match_naive_computation(ratings in proptest::collection::vec(-1000i64..1000, 1..50)) {
            let rows = rating_rows(&ratings);
            let specs = [
                AggregateSpec::new(AggregateFn::Sum, "rating"),
                AggregateSpec::new(AggregateFn::Count, "rating"),
            ];
            let row = fold_records(&specs, &rows)
                .expect("fold should succeed")
                .expect("non-empty group should produce a row");

            let expected_sum: i64 = ratings.iter().sum();
            prop_assert_eq!(row.value_at(0), Some(&Value::Float64(expected_sum as f64)));
            prop_assert_eq!(row.value_at(1), Some(&Value::Uint(ratings.len() as u64)));
        }

        #[test]
        fn fold_is_deterministic_over_repeated_runs(ratings in proptest::collection::vec(-100i64..100, 0..20)) {
            let rows = rating_rows(&ratings);
            let specs = all_function_specs();
            let first = fold_records(&specs, &rows).expect("first fold should succeed");
            let second = fold_records(&specs, &rows).expect("second fold should succeed");

            prop_assert_eq!(first, second);
        }
    }
}
