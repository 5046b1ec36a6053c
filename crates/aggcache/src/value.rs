use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

///
/// Value
///
/// Runtime scalar carried through records, filters, and aggregate results.
/// `Unit` is the null marker; a field that is absent from a record entirely
/// is a different state (unset) and is represented by the record, not here.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float64(f64),
    Text(String),
}

impl Value {
    #[must_use]
    pub const fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }

    /// Compare two values under strict same-variant ordering.
    ///
    /// Cross-variant comparisons return `None`; floats order via `total_cmp`
    /// so the result is deterministic for every bit pattern.
    #[must_use]
    pub fn strict_order_cmp(left: &Self, right: &Self) -> Option<Ordering> {
        match (left, right) {
            (Self::Unit, Self::Unit) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Uint(a), Self::Uint(b)) => Some(a.cmp(b)),
            (Self::Float64(a), Self::Float64(b)) => Some(a.total_cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// True when the value can participate in sum/avg arithmetic.
    #[must_use]
    pub const fn supports_numeric_coercion(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Uint(_) | Self::Float64(_))
    }

    /// Coerce a numeric value to `f64` for aggregate arithmetic.
    #[must_use]
    pub fn to_numeric_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Uint(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::Value;
    use std::cmp::Ordering;

    #[test]
    fn strict_order_cmp_orders_same_variant_values() {
        assert_eq!(
            Value::strict_order_cmp(&Value::Int(1), &Value::Int(2)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::strict_order_cmp(&Value::Text("b".into()), &Value::Text("a".into())),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::strict_order_cmp(&Value::Unit, &Value::Unit),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn strict_order_cmp_rejects_cross_variant_values() {
        assert_eq!(
            Value::strict_order_cmp(&Value::Int(1), &Value::Uint(1)),
            None
        );
        assert_eq!(
            Value::strict_order_cmp(&Value::Text("1".into()), &Value::Int(1)),
            None
        );
    }

    #[test]
    fn strict_order_cmp_is_total_over_floats() {
        assert_eq!(
            Value::strict_order_cmp(&Value::Float64(f64::NAN), &Value::Float64(1.0)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::strict_order_cmp(&Value::Float64(-0.0), &Value::Float64(0.0)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn numeric_coercion_covers_numeric_variants_only() {
        assert_eq!(Value::Int(-3).to_numeric_f64(), Some(-3.0));
        assert_eq!(Value::Uint(7).to_numeric_f64(), Some(7.0));
        assert_eq!(Value::Float64(1.5).to_numeric_f64(), Some(1.5));
        assert_eq!(Value::Text("7".into()).to_numeric_f64(), None);
        assert_eq!(Value::Unit.to_numeric_f64(), None);
        assert!(!Value::Bool(true).supports_numeric_coercion());
    }
}
