use serde_yaml::Value;

use crate::error::{ErrorKind, Result};

/// A leaf value with its native YAML type preserved.
///
/// `get`/`set` never stringify a non-string replacement — a `set` of an
/// `Int` stays an unquoted number when the document is serialized back out.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Null,
}

impl Scalar {
    pub fn from_value(path: &str, v: &Value) -> Result<Scalar> {
        match v {
            Value::Null => Ok(Scalar::Null),
            Value::Bool(b) => Ok(Scalar::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Scalar::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Scalar::Float(f))
                } else {
                    Err(ErrorKind::WrongType(path.to_string()).into())
                }
            }
            Value::String(s) => Ok(Scalar::String(s.clone())),
            Value::Sequence(_) | Value::Mapping(_) => {
                Err(ErrorKind::WrongType(path.to_string()).into())
            }
            #[allow(unreachable_patterns)]
            _ => Err(ErrorKind::WrongType(path.to_string()).into()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Int(i) => Value::Number(i.into()),
            Scalar::Float(f) => Value::Number(serde_yaml::Number::from(f)),
            Scalar::String(s) => Value::String(s),
            Scalar::Null => Value::Null,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Scalar {
        Scalar::Bool(b)
    }
}
impl From<i64> for Scalar {
    fn from(i: i64) -> Scalar {
        Scalar::Int(i)
    }
}
impl From<f64> for Scalar {
    fn from(f: f64) -> Scalar {
        Scalar::Float(f)
    }
}
impl From<String> for Scalar {
    fn from(s: String) -> Scalar {
        Scalar::String(s)
    }
}
impl<'a> From<&'a str> for Scalar {
    fn from(s: &'a str) -> Scalar {
        Scalar::String(s.to_string())
    }
}
