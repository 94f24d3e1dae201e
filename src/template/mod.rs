//! Template engine used to render messages
//!
//! Templates are literal text interleaved with actions between a left and a
//! right delimiter. Inside an action:
//!
//! ```text
//! {p}                       call the function `p` and print its result
//! {p0 | upper}              pipe a value into the next command as its last argument
//! {join .Tags ", "}         call with arguments
//! {.Owner.Name}             fields of the current object
//! {if p}..{else if q}..{else}..{end}
//! {with .Owner}{.Name}{end} rebind the current object
//! {range .Tags}{.}{end}     iterate lists, or map values in key order
//! {/* comment */}
//! ```
//!
//! `{- ` and ` -}` trim surrounding whitespace. Compilation fails before any
//! output is produced; execution streams output and stops at the first error.

pub mod ast;
mod exec;
mod grammar;
pub mod lexer;
mod scanner;

pub use exec::{
    ExecError, Func, FuncMap, ShortCircuit, Template, DEFAULT_LEFT_DELIMITER, DEFAULT_RIGHT_DELIMITER,
};
