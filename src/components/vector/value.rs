use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute cell of a [GeoTable](super::GeoTable).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Infers the type of a text cell: empty, integer, float, boolean or text.
    pub fn parse(cell: &str) -> Value {
        let cell = cell.trim();
        if cell.is_empty() {
            Value::Null
        } else if let Ok(int) = cell.parse::<i64>() {
            Value::Int(int)
        } else if let Ok(float) = cell.parse::<f64>() {
            Value::Float(float)
        } else if cell.eq_ignore_ascii_case("true") {
            Value::Bool(true)
        } else if cell.eq_ignore_ascii_case("false") {
            Value::Bool(false)
        } else {
            Value::Text(cell.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(int) => Some(*int as f64),
            Value::Float(float) => Some(*float),
            Value::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integral numbers only.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(int) => Some(*int),
            Value::Float(float) if float.fract() == 0. => Some(*float as i64),
            Value::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Integral floats become integers, as spreadsheets store all numbers as floats.
    pub(crate) fn normalized(self) -> Value {
        match self {
            Value::Float(float) if float.fract() == 0. && float.abs() < i64::MAX as f64 => {
                Value::Int(float as i64)
            }
            other => other,
        }
    }
}

/// Numbers compare by value across `Int` and `Float`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(lhs), Value::Bool(rhs)) => lhs == rhs,
            (Value::Text(lhs), Value::Text(rhs)) => lhs == rhs,
            (Value::Int(lhs), Value::Int(rhs)) => lhs == rhs,
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", Value::Null)]
    #[case("12", Value::Int(12))]
    #[case("-1.5", Value::Float(-1.5))]
    #[case("True", Value::Bool(true))]
    #[case("Chile", Value::Text("Chile".into()))]
    fn infer_cells(#[case] cell: &str, #[case] expected: Value) {
        assert_eq!(Value::parse(cell), expected);
    }

    #[test]
    fn numeric_equality() {
        assert_eq!(Value::Int(1), Value::Float(1.));
        assert_ne!(Value::Int(1), Value::Text("1".into()));
        assert_eq!(Value::Float(3.).normalized(), Value::Int(3));
        assert_eq!(Value::Float(2.5).as_i64(), None);
        assert_eq!(Value::Text(" 7 ".into()).as_i64(), Some(7));
        assert_eq!(Value::Float(2.0).to_string(), "2");
    }
}
