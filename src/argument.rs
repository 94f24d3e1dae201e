//! Format arguments and their classification
//!
//! Every argument is classified once per call into an [`ArgumentKind`], which
//! decides what it contributes to the placeholder namespace:
//!
//! | Kind     | Positional placeholder | Named placeholders | Current object |
//! |----------|------------------------|--------------------|----------------|
//! | `Error`  | yes                    | no                 | no             |
//! | `Named`  | yes                    | one per key        | no             |
//! | `Record` | yes                    | no                 | yes (last wins)|
//! | `Scalar` | yes                    | no                 | no             |

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::value::{Map, Record, RecordError, Value};

/// Named arguments: an ordered list of key/value pairs
///
/// Each key becomes a placeholder of the same name.
///
/// ```rust
/// use formatter::{format, args, Named};
///
/// let out = format("{greeting}, {name}!", &args![
///     Named::new().with("greeting", "Hello").with("name", "Ann"),
/// ]).unwrap();
/// assert_eq!(out, "Hello, Ann!");
/// ```
pub type Named = Map;

/// Shape of an argument, decided once per format call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// An error value: positional placeholder only
    Error,
    /// A string-keyed mapping: contributes named placeholders
    Named,
    /// A struct-like value: candidate for the current object
    Record,
    /// Anything else, including nil
    Scalar,
}

/// One element of the argument list passed to a format call
#[derive(Clone)]
pub enum Argument {
    Error(Arc<dyn Error + Send + Sync>),
    Value(Value),
}

impl Argument {
    /// Wrap an error
    pub fn error<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Argument::Error(Arc::new(error))
    }

    /// Serialize a struct into a record argument
    pub fn record<T: Serialize + ?Sized>(value: &T) -> Result<Self, RecordError> {
        Record::from_serialize(value).map(|r| Argument::Value(Value::Record(r)))
    }

    pub fn kind(&self) -> ArgumentKind {
        match self {
            Argument::Error(_) => ArgumentKind::Error,
            Argument::Value(Value::Map(_)) => ArgumentKind::Named,
            Argument::Value(Value::Record(_)) => ArgumentKind::Record,
            Argument::Value(_) => ArgumentKind::Scalar,
        }
    }

    /// The value a placeholder yields for this argument
    ///
    /// Errors yield their message.
    pub fn value(&self) -> Value {
        match self {
            Argument::Error(error) => Value::String(error.to_string()),
            Argument::Value(value) => value.clone(),
        }
    }

    /// The argument as a value reference, if it is not an error
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Argument::Error(_) => None,
            Argument::Value(value) => Some(value),
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Error(error) => write!(f, "{}", error),
            Argument::Value(value) => write!(f, "{}", value),
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Error(error) => f.debug_tuple("Error").field(&error.to_string()).finish(),
            Argument::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

macro_rules! impl_from_value_source {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Argument {
                fn from(v: $t) -> Self {
                    Argument::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_from_value_source!(
    Value, Map, Record, bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64, &str,
    String, serde_json::Value
);

impl<T: Into<Value>> From<Vec<T>> for Argument {
    fn from(v: Vec<T>) -> Self {
        Argument::Value(Value::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Argument {
    fn from(v: Option<T>) -> Self {
        Argument::Value(Value::from(v))
    }
}

/// Build a `Vec<Argument>` from heterogeneous values
///
/// ```rust
/// use formatter::{args, format};
///
/// assert_eq!(format("{p} is {p}", &args!["x", 42]).unwrap(), "x is 42");
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Argument>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Argument::from($arg)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_classification() {
        assert_eq!(Argument::error(Boom).kind(), ArgumentKind::Error);
        assert_eq!(Argument::from(Named::new()).kind(), ArgumentKind::Named);
        assert_eq!(Argument::from(Record::new()).kind(), ArgumentKind::Record);
        assert_eq!(Argument::from("x").kind(), ArgumentKind::Scalar);
        assert_eq!(Argument::from(vec![1, 2]).kind(), ArgumentKind::Scalar);
    }

    #[test]
    fn test_null_reference_is_scalar() {
        let absent: Option<Record> = None;
        let arg = Argument::from(absent);
        assert_eq!(arg.kind(), ArgumentKind::Scalar);
        assert_eq!(arg.to_string(), "<nil>");
    }

    #[test]
    fn test_present_reference_is_record() {
        let present = Some(Record::new().field("a", 1));
        assert_eq!(Argument::from(present).kind(), ArgumentKind::Record);
    }

    #[test]
    fn test_error_value_is_message() {
        let arg = Argument::error(Boom);
        assert_eq!(arg.value(), Value::from("boom"));
        assert_eq!(arg.to_string(), "boom");
        assert!(arg.as_value().is_none());
    }

    #[test]
    fn test_args_macro() {
        let args = args!["a", 1, 2.5, true];
        assert_eq!(args.len(), 4);
        assert_eq!(args[1].value(), Value::Int(1));
        assert!(args![].is_empty());
    }

    #[derive(Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn test_record_argument() {
        let arg = Argument::record(&Point { x: 1, y: 2 }).expect("Should serialize");
        assert_eq!(arg.kind(), ArgumentKind::Record);
        assert_eq!(arg.to_string(), "{1 2}");
    }
}
