use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Attribute value carried by a feature
///
/// Values are compared structurally with no cross-type coercion:
/// `Integer(1)` never equals `Real(1.0)`. `Real` hashes and compares by bit
/// pattern so it can be used as a join key.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    String(String),
    Date(String),
    Binary(Vec<u8>),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `None` for `Null`, so absent and null attributes read the same
    pub fn non_null(&self) -> Option<&Value> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Real(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::Binary(v) => write!(f, "<{} bytes>", v.len()),
            Value::Null => write!(f, "NULL"),
        }
    }
}

/// Bit pattern used for hashing and equality; both zeros share one key
fn real_key_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Integer(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            Value::Real(v) => {
                1u8.hash(state);
                real_key_bits(*v).hash(state);
            }
            Value::Boolean(v) => {
                2u8.hash(state);
                v.hash(state);
            }
            Value::String(v) => {
                3u8.hash(state);
                v.hash(state);
            }
            Value::Date(v) => {
                4u8.hash(state);
                v.hash(state);
            }
            Value::Binary(v) => {
                5u8.hash(state);
                v.hash(state);
            }
            Value::Null => {
                6u8.hash(state);
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => real_key_bits(*a) == real_key_bits(*b),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhash::FxHashSet;

    #[test]
    fn test_no_cross_type_equality() {
        assert_ne!(Value::Integer(1), Value::Real(1.0));
        assert_ne!(Value::String("2024-01-01".into()), Value::Date("2024-01-01".into()));
        assert_eq!(Value::from("32"), Value::String("32".to_string()));
    }

    #[test]
    fn test_real_values_usable_as_keys() {
        let mut set = FxHashSet::default();
        set.insert(Value::Real(59.03));
        assert!(set.contains(&Value::Real(59.03)));
        assert!(!set.contains(&Value::Real(59.04)));
    }

    #[test]
    fn test_signed_zeros_are_one_key() {
        assert_eq!(Value::Real(0.0), Value::Real(-0.0));

        let mut set = FxHashSet::default();
        set.insert(Value::Real(-0.0));
        assert!(set.contains(&Value::Real(0.0)));
        assert_ne!(Value::Real(-0.0), Value::Integer(0));
    }

    #[test]
    fn test_null_handling() {
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::Null.non_null(), None);
        assert_eq!(Value::Integer(3).non_null(), Some(&Value::Integer(3)));
    }
}
