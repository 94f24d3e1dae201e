//! Formatter - string interpolation with placeholders resolved from arguments
//!
//! A message is a template whose actions name placeholders. Every argument
//! is reachable through a positional placeholder (`{p0}`, `{p1}`, ...), the
//! automatic placeholder `{p}` hands arguments out in order, the keys of a
//! [`Named`] argument become placeholders of their own, and the last record
//! argument is the current object whose fields are read with `{.Field}`.
//! Arguments the template never reads are appended to the output.
//!
//! # Example
//!
//! ```rust
//! use formatter::{args, format, Named};
//!
//! assert_eq!(format("{p} + {p}", &args![1, 2]).unwrap(), "1 + 2");
//! assert_eq!(format("{p1} before {p0}", &args!["a", "b"]).unwrap(), "b before a");
//! assert_eq!(format("{p0}", &args!["a", "b"]).unwrap(), "a b");
//!
//! let named = Named::new().with("name", "Ann");
//! assert_eq!(format("Hi {name}", &args![named]).unwrap(), "Hi Ann");
//! ```
//!
//! # Current object
//!
//! When several record arguments are passed, only the last one is the
//! current object. Earlier records remain reachable through their
//! positional placeholder only, which can be surprising.

pub mod argument;
pub mod config;
pub mod error;
pub mod formatter;
pub mod functions;
pub mod resolver;
pub mod template;
pub mod value;

pub use argument::{Argument, ArgumentKind, Named};
pub use config::{
    ConfigError, FormatterConfig, DEFAULT_LEFT_DELIMITER, DEFAULT_PLACEHOLDER,
    DEFAULT_RIGHT_DELIMITER,
};
pub use error::{FormatError, SyntaxError};
pub use formatter::Formatter;
pub use functions::{Function, FunctionError, Functions};
pub use resolver::ResolutionContext;
pub use template::ExecError;
pub use value::{Map, Record, RecordError, Value};

use std::io::Write;

/// Format `message` with a default-configured [`Formatter`]
///
/// # Example
///
/// ```rust
/// use formatter::{args, format, Record};
///
/// let user = Record::named("User").field("Name", "Ann").field("Age", 31);
/// let out = format("{.Name} is {.Age}", &args![user]).unwrap();
/// assert_eq!(out, "Ann is 31");
/// ```
pub fn format(message: &str, args: &[Argument]) -> Result<String, FormatError> {
    Formatter::new().format(message, args)
}

/// Format `message` into `writer` with a default-configured [`Formatter`]
///
/// On error, `writer` keeps the output produced before the failure.
pub fn format_writer<W: Write>(
    writer: W,
    message: &str,
    args: &[Argument],
) -> Result<(), FormatError> {
    Formatter::new().format_writer(writer, message, args)
}

/// Format `message` with a default-configured [`Formatter`], panicking on error
///
/// # Panics
///
/// Panics if the template does not compile or fails to execute.
pub fn must_format(message: &str, args: &[Argument]) -> String {
    Formatter::new().must_format(message, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_literal_text() {
        assert_eq!(format("plain", &[]).unwrap(), "plain");
    }

    #[test]
    fn test_format_appends_unused() {
        assert_eq!(format("msg", &args!["a", 1, true]).unwrap(), "msg a 1 true");
    }

    #[test]
    fn test_format_writer_streams() {
        let mut out = Vec::new();
        format_writer(&mut out, "{p}!", &args!["hi"]).unwrap();
        assert_eq!(out, b"hi!");
    }

    #[test]
    fn test_must_format_ok() {
        assert_eq!(must_format("{p0}{p0}", &args!["x"]), "xx");
    }

    #[test]
    fn test_format_undefined_is_execution_error() {
        let err = format("{nope}", &[]).unwrap_err();
        assert!(matches!(err, FormatError::Execution(ExecError::UndefinedFunction { .. })));
    }
}
