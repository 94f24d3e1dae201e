//! Template functions
//!
//! Functions are callables addressed by name from inside a template. Each
//! [`Formatter`](crate::Formatter) owns a [`Functions`] registry of user
//! functions; a fixed table of built-in helpers is shared by every formatter.
//!
//! When a template executes, the namespace is assembled in increasing order
//! of precedence: built-ins, then argument placeholders, then user functions.
//! A user function therefore shadows a placeholder of the same name, which in
//! turn shadows a built-in.

mod builtins;
mod registry;

pub use builtins::{builtin, builtin_names, Builtin};
pub(crate) use builtins::all as all_builtins;
pub use registry::{Function, FunctionError, Functions};
