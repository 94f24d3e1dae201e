//! Runtime values passed as arguments and produced while executing templates
//!
//! A [`Value`] is the closed set of shapes the formatter understands. Its
//! [`Display`](std::fmt::Display) implementation is the "natural print form"
//! used both when a template prints a value and when an unused argument is
//! appended to the output.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Errors raised while turning a serializable type into a [`Record`]
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("record must serialize to an object, found {found}")]
    NotAnObject { found: &'static str },
}

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value (a null reference, or an exhausted automatic placeholder)
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    /// String-keyed mapping
    Map(Map),
    /// Struct-like value with named fields
    Record(Record),
}

impl Value {
    /// Short name of the value's shape, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Truth value used by conditionals and the boolean helpers
    ///
    /// Zero, nil, false and empty strings/lists/maps are false. Records are
    /// always true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Record(_) => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("<nil>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write_float(f, *x),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                write_spaced(f, items.iter())?;
                f.write_str("]")
            }
            Value::Map(map) => write!(f, "{}", map),
            Value::Record(record) => write!(f, "{}", record),
        }
    }
}

/// Shortest round-trip digits; exponent form when the decimal exponent is
/// below -4 or at least 6, with a signed two-digit exponent (`1e+06`)
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        return f.write_str("NaN");
    }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "+Inf" } else { "-Inf" });
    }

    let scientific = format!("{:e}", x);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if x != 0.0 && !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        write!(f, "{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        write!(f, "{}", x)
    }
}

fn write_spaced<'a>(
    f: &mut fmt::Formatter<'_>,
    values: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, value) in values.enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", value)?;
    }
    Ok(())
}

/// Insertion-ordered, string-keyed mapping
///
/// Inserting a key that is already present replaces its value in place, so
/// the first insertion decides the position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous value for the key if any
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Entries ordered by key
    pub fn sorted(&self) -> Vec<(&str, &Value)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("map[")?;
        for (i, (key, value)) in self.sorted().into_iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}:{}", key, value)?;
        }
        f.write_str("]")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Map {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Struct-like value whose fields are reachable with `.Field` in templates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    name: Option<String>,
    fields: Map,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record carrying a type name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            fields: Map::new(),
        }
    }

    /// Builder-style field insert
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn fields(&self) -> &Map {
        &self.fields
    }

    /// Build a record from any serializable struct
    ///
    /// Fields keep their declaration order. The record is named after the
    /// type's last path segment.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, RecordError> {
        let name = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .map(str::to_string);

        match serde_json::to_value(value)? {
            serde_json::Value::Object(object) => Ok(Self {
                name,
                fields: object
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            }),
            other => Err(RecordError::NotAnObject {
                found: Value::from(other).kind_name(),
            }),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        write_spaced(f, self.fields.values())?;
        f.write_str("}")
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => Value::Map(
                object
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        i64::try_from(v).map(Value::Int).unwrap_or(Value::Float(v as f64))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        i64::try_from(v).map(Value::Int).unwrap_or(Value::Float(v as f64))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
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

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Map(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[test]
    fn test_scalar_display() {
        assert_eq!(Value::Nil.to_string(), "<nil>");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(-42).to_string(), "-42");
        assert_eq!(Value::from(2.5).to_string(), "2.5");
        assert_eq!(Value::from("text").to_string(), "text");
    }

    #[test]
    fn test_float_display() {
        assert_eq!(Value::from(1e21).to_string(), "1e+21");
        assert_eq!(Value::from(1e6).to_string(), "1e+06");
        assert_eq!(Value::from(1234567.0).to_string(), "1.234567e+06");
        assert_eq!(Value::from(123456.0).to_string(), "123456");
        assert_eq!(Value::from(0.0001).to_string(), "0.0001");
        assert_eq!(Value::from(0.00001).to_string(), "1e-05");
        assert_eq!(Value::from(-1.5e-7).to_string(), "-1.5e-07");
        assert_eq!(Value::from(0.0).to_string(), "0");
        assert_eq!(Value::from(f64::INFINITY).to_string(), "+Inf");
        assert_eq!(Value::from(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn test_list_display() {
        let list = Value::from(vec![1, 2, 3]);
        assert_eq!(list.to_string(), "[1 2 3]");
        assert_eq!(Value::List(vec![]).to_string(), "[]");
    }

    #[test]
    fn test_map_display_sorted_by_key() {
        let map = Map::new().with("b", 2).with("a", 1);
        assert_eq!(Value::from(map).to_string(), "map[a:1 b:2]");
    }

    #[test]
    fn test_record_display_in_field_order() {
        let record = Record::named("Person").field("name", "Ann").field("age", 30);
        assert_eq!(Value::from(record).to_string(), "{Ann 30}");
    }

    #[test]
    fn test_map_insert_replaces_in_place() {
        let mut map = Map::new().with("x", 1).with("y", 2);
        let previous = map.insert("x", 10);
        assert_eq!(previous, Some(Value::Int(1)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(map.get("x"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Record(Record::new()).is_truthy());
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Nil);
        assert_eq!(Value::from(Some("a")), Value::String("a".to_string()));
    }

    #[derive(Serialize)]
    struct Person {
        name: String,
        age: u32,
        tags: Vec<String>,
    }

    #[test]
    fn test_record_from_serialize_keeps_field_order() {
        let person = Person {
            name: "Ann".to_string(),
            age: 30,
            tags: vec!["admin".to_string()],
        };
        let record = Record::from_serialize(&person).expect("Should serialize");
        assert_eq!(record.name(), Some("Person"));
        assert_eq!(
            record.fields().keys().collect::<Vec<_>>(),
            vec!["name", "age", "tags"]
        );
        assert_eq!(record.get("age"), Some(&Value::Int(30)));
    }

    #[test]
    fn test_record_from_serialize_rejects_scalars() {
        let result = Record::from_serialize(&42);
        assert!(matches!(
            result,
            Err(RecordError::NotAnObject { found: "int" })
        ));
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"a": [1, 2.5, null], "b": "x"});
        let value = Value::from(json);
        match value {
            Value::Map(map) => {
                assert_eq!(
                    map.get("a"),
                    Some(&Value::List(vec![
                        Value::Int(1),
                        Value::Float(2.5),
                        Value::Nil
                    ]))
                );
                assert_eq!(map.get("b"), Some(&Value::from("x")));
            }
            other => panic!("Expected map, got {:?}", other),
        }
    }
}
