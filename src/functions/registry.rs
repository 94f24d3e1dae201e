//! Registry of user-defined template functions

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Error returned by a template function
///
/// Any error type converts into it, and so does a plain message:
/// `Err("negative input".into())`.
pub type FunctionError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A callable addressable from templates
pub type Function = Arc<dyn Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync>;

/// Name to function mapping owned by a formatter
#[derive(Clone, Default)]
pub struct Functions {
    functions: HashMap<String, Function>,
}

impl Functions {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.insert(name, function);
        self
    }

    /// Register a function, replacing any function with the same name
    pub fn insert<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Register an already shared function
    pub fn insert_shared(&mut self, name: impl Into<String>, function: Function) {
        self.functions.insert(name.into(), function);
    }

    /// Merge another registry into this one; entries from `other` win
    pub fn extend(&mut self, other: Functions) {
        self.functions.extend(other.functions);
    }

    /// Remove a function. Removing an unknown name is a no-op.
    pub fn remove(&mut self, name: &str) -> Option<Function> {
        self.functions.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.functions.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Function)> {
        self.functions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn clear(&mut self) {
        self.functions.clear();
    }
}

impl fmt::Debug for Functions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Function)> for Functions {
    fn from_iter<I: IntoIterator<Item = (K, Function)>>(iter: I) -> Self {
        Self {
            functions: iter.into_iter().map(|(k, f)| (k.into(), f)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: &'static str) -> impl Fn(&[Value]) -> Result<Value, FunctionError> {
        move |_| Ok(Value::from(value))
    }

    #[test]
    fn test_insert_and_get() {
        let mut functions = Functions::new();
        functions.insert("hello", constant("hi"));
        assert!(functions.contains("hello"));
        let f = functions.get("hello").expect("Should be registered");
        assert_eq!(f(&[]).unwrap(), Value::from("hi"));
    }

    #[test]
    fn test_insert_replaces() {
        let functions = Functions::new()
            .with("f", constant("first"))
            .with("f", constant("second"));
        assert_eq!(functions.len(), 1);
        assert_eq!((functions.get("f").unwrap())(&[]).unwrap(), Value::from("second"));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut functions = Functions::new().with("a", constant("a"));
        assert!(functions.remove("missing").is_none());
        assert_eq!(functions.len(), 1);
        assert!(functions.remove("a").is_some());
        assert!(functions.is_empty());
    }

    #[test]
    fn test_extend_later_wins() {
        let mut base = Functions::new()
            .with("a", constant("base"))
            .with("b", constant("b"));
        base.extend(Functions::new().with("a", constant("override")));
        assert_eq!(base.names(), vec!["a", "b"]);
        assert_eq!((base.get("a").unwrap())(&[]).unwrap(), Value::from("override"));
    }

    #[test]
    fn test_debug_lists_names() {
        let functions = Functions::new().with("b", constant("")).with("a", constant(""));
        assert_eq!(format!("{:?}", functions), r#"{"a", "b"}"#);
    }
}
