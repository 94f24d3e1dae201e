//! The [`Formatter`] façade

use std::io::Write;

use tracing::{debug, instrument};

use crate::argument::Argument;
use crate::config::{
    FormatterConfig, DEFAULT_LEFT_DELIMITER, DEFAULT_PLACEHOLDER, DEFAULT_RIGHT_DELIMITER,
};
use crate::error::FormatError;
use crate::functions::{Function, FunctionError, Functions};
use crate::resolver::ResolutionContext;
use crate::template::Template;
use crate::value::Value;

/// Renders message templates against argument lists
///
/// Setters return `&mut Self` so calls can be chained. A formatter holds no
/// per-call state, so `&self` methods may run concurrently; mutating it
/// requires exclusive access.
///
/// ```rust
/// use formatter::{args, Formatter};
///
/// let mut f = Formatter::new();
/// f.set_delimiters("<", ">").set_placeholder("arg");
/// assert_eq!(f.format("<arg1>, <arg0>", &args!["world", "Hello"]).unwrap(), "Hello, world");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Formatter {
    config: FormatterConfig,
}

impl Formatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatterConfig {
        &self.config
    }

    pub fn placeholder(&self) -> &str {
        &self.config.placeholder
    }

    /// Set the automatic placeholder name; positional ones are this plus an index
    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) -> &mut Self {
        self.config.placeholder = placeholder.into();
        self
    }

    pub fn reset_placeholder(&mut self) -> &mut Self {
        self.set_placeholder(DEFAULT_PLACEHOLDER)
    }

    pub fn left_delimiter(&self) -> &str {
        &self.config.left_delimiter
    }

    pub fn right_delimiter(&self) -> &str {
        &self.config.right_delimiter
    }

    pub fn delimiters(&self) -> (&str, &str) {
        (self.left_delimiter(), self.right_delimiter())
    }

    /// An empty delimiter selects the template engine's `{{`/`}}`
    pub fn set_left_delimiter(&mut self, delimiter: impl Into<String>) -> &mut Self {
        self.config.left_delimiter = delimiter.into();
        self
    }

    pub fn set_right_delimiter(&mut self, delimiter: impl Into<String>) -> &mut Self {
        self.config.right_delimiter = delimiter.into();
        self
    }

    pub fn set_delimiters(
        &mut self,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> &mut Self {
        self.set_left_delimiter(left).set_right_delimiter(right)
    }

    pub fn reset_left_delimiter(&mut self) -> &mut Self {
        self.set_left_delimiter(DEFAULT_LEFT_DELIMITER)
    }

    pub fn reset_right_delimiter(&mut self) -> &mut Self {
        self.set_right_delimiter(DEFAULT_RIGHT_DELIMITER)
    }

    pub fn reset_delimiters(&mut self) -> &mut Self {
        self.reset_left_delimiter().reset_right_delimiter()
    }

    /// Register a function, replacing any previous one with the same name
    pub fn add_function<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.config.functions.insert(name, function);
        self
    }

    /// Merge `functions` into the registry; entries of `functions` win
    pub fn add_functions(&mut self, functions: Functions) -> &mut Self {
        self.config.functions.extend(functions);
        self
    }

    /// Remove a function; unknown names are ignored
    pub fn remove_function(&mut self, name: &str) -> &mut Self {
        self.config.functions.remove(name);
        self
    }

    pub fn remove_functions<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.config.functions.remove(name.as_ref());
        }
        self
    }

    pub fn reset_functions(&mut self) -> &mut Self {
        self.config.functions.clear();
        self
    }

    /// Replace the whole registry
    pub fn set_functions(&mut self, functions: Functions) -> &mut Self {
        self.config.functions = functions;
        self
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.config.functions.get(name)
    }

    pub fn functions(&self) -> &Functions {
        &self.config.functions
    }

    /// Restore the default placeholder and delimiters and drop all functions
    pub fn reset(&mut self) -> &mut Self {
        self.config = FormatterConfig::default();
        self
    }

    /// Render `message` with `args` and return the result
    ///
    /// Arguments the template never read are appended, each preceded by a
    /// space. On error no partial output is returned.
    pub fn format(&self, message: &str, args: &[Argument]) -> Result<String, FormatError> {
        let mut buf = Vec::with_capacity(message.len());
        self.format_writer(&mut buf, message, args)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Like [`format`](Self::format), but panics on error
    ///
    /// Intended for templates that are fixed at compile time, where a
    /// failure is a bug in the calling code.
    pub fn must_format(&self, message: &str, args: &[Argument]) -> String {
        match self.format(message, args) {
            Ok(out) => out,
            Err(err) => panic!("{}", err),
        }
    }

    /// Render `message` with `args` into `writer`
    ///
    /// Output is streamed: on an execution or write error, `writer` keeps
    /// whatever was written before the failure. Syntax errors are reported
    /// before anything is written.
    #[instrument(skip(self, writer, args), fields(args = args.len()))]
    pub fn format_writer<W: Write>(
        &self,
        mut writer: W,
        message: &str,
        args: &[Argument],
    ) -> Result<(), FormatError> {
        let template = Template::parse(
            message,
            &self.config.left_delimiter,
            &self.config.right_delimiter,
        )?;

        let ctx = ResolutionContext::new(args);
        let funcs = ctx.functions(&self.config.placeholder, &self.config.functions);
        debug!(functions = funcs.len(), "Executing template");

        template.execute(&mut writer, &funcs, ctx.current_object())?;
        ctx.append_unused(&mut writer)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let f = Formatter::new();
        assert_eq!(f.placeholder(), "p");
        assert_eq!(f.delimiters(), ("{", "}"));
        assert!(f.functions().is_empty());
    }

    #[test]
    fn test_setters_chain() {
        let mut f = Formatter::new();
        f.set_placeholder("arg")
            .set_delimiters("<<", ">>")
            .add_function("one", |_: &[Value]| Ok(Value::from(1)));

        assert_eq!(f.placeholder(), "arg");
        assert_eq!(f.delimiters(), ("<<", ">>"));
        assert!(f.function("one").is_some());
    }

    #[test]
    fn test_individual_resets() {
        let mut f = Formatter::new();
        f.set_placeholder("x").set_delimiters("[", "]");

        f.reset_left_delimiter();
        assert_eq!(f.delimiters(), ("{", "]"));
        f.reset_right_delimiter().reset_placeholder();
        assert_eq!(f.delimiters(), ("{", "}"));
        assert_eq!(f.placeholder(), "p");
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut f = Formatter::new();
        f.set_placeholder("x")
            .set_delimiters("[", "]")
            .add_function("f", |_: &[Value]| Ok(Value::Nil));
        f.reset();

        assert_eq!(f.placeholder(), "p");
        assert_eq!(f.delimiters(), ("{", "}"));
        assert!(f.functions().is_empty());
    }

    #[test]
    fn test_function_registry_operations() {
        let mut f = Formatter::new();
        f.add_functions(
            Functions::new()
                .with("a", |_: &[Value]| Ok(Value::from("a")))
                .with("b", |_: &[Value]| Ok(Value::from("b")))
                .with("c", |_: &[Value]| Ok(Value::from("c"))),
        );
        assert_eq!(f.functions().names(), vec!["a", "b", "c"]);

        f.remove_function("missing").remove_functions(["a", "b"]);
        assert_eq!(f.functions().names(), vec!["c"]);

        f.set_functions(Functions::new().with("d", |_: &[Value]| Ok(Value::Nil)));
        assert_eq!(f.functions().names(), vec!["d"]);

        f.reset_functions();
        assert!(f.functions().is_empty());
    }

    #[test]
    fn test_format_with_user_function() {
        let mut f = Formatter::new();
        f.add_function("double", |args: &[Value]| {
            let n = args
                .first()
                .and_then(Value::as_int)
                .ok_or("double: expected an integer")?;
            Ok(Value::from(n * 2))
        });

        assert_eq!(f.format("{p | double}", &args![21]).unwrap(), "42");
    }

    #[test]
    fn test_with_config() {
        let config = FormatterConfig::from_str("[formatter]\nplaceholder = \"v\"\n")
            .expect("Should parse");
        let f = Formatter::with_config(config);
        assert_eq!(f.format("{v0}-{v}", &args!["x"]).unwrap(), "x-x");
    }

    #[test]
    fn test_syntax_error_writes_nothing() {
        let f = Formatter::new();
        let mut out = Vec::new();
        let result = f.format_writer(&mut out, "{p", &args!["a"]);

        assert!(matches!(result, Err(FormatError::Syntax(_))));
        assert!(out.is_empty());
    }

    #[test]
    #[should_panic(expected = "function \"missing\" not defined")]
    fn test_must_format_panics() {
        Formatter::new().must_format("{missing}", &[]);
    }
}
