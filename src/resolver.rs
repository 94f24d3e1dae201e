//! Argument resolution: placeholders, current object and consumption
//!
//! A [`ResolutionContext`] lives for one format call. It classifies every
//! argument once, hands the template engine a table of placeholder
//! callables, records which arguments the template actually read, and
//! afterwards appends whatever was left unread.

use std::cell::Cell;
use std::io::{self, Write};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::argument::{Argument, ArgumentKind};
use crate::functions::{all_builtins, FunctionError, Functions};
use crate::template::{FuncMap, ShortCircuit};
use crate::value::Value;

/// Per-call resolution state
pub struct ResolutionContext<'a> {
    args: &'a [Argument],
    /// Next argument handed out by the automatic placeholder
    cursor: Cell<usize>,
    consumed: Vec<Cell<bool>>,
    /// Index of the argument used as the current object
    current: Option<usize>,
}

impl<'a> ResolutionContext<'a> {
    /// Classify `args` and pick the current object
    ///
    /// Named and record arguments count as consumed from the start. When
    /// several records are given, the last one becomes the current object
    /// and the others are reachable only through their positional
    /// placeholder.
    pub fn new(args: &'a [Argument]) -> Self {
        let mut current = None;
        let consumed = args
            .iter()
            .enumerate()
            .map(|(position, arg)| match arg.kind() {
                ArgumentKind::Record => {
                    current = Some(position);
                    Cell::new(true)
                }
                ArgumentKind::Named => Cell::new(true),
                ArgumentKind::Error | ArgumentKind::Scalar => Cell::new(false),
            })
            .collect();

        debug!(args = args.len(), current = ?current, "Resolved arguments");

        Self {
            args,
            cursor: Cell::new(0),
            consumed,
            current,
        }
    }

    pub fn args(&self) -> &'a [Argument] {
        self.args
    }

    /// The value field references resolve against, if any argument is a record
    pub fn current_object(&self) -> Option<&'a Value> {
        self.current.and_then(|position| self.args[position].as_value())
    }

    /// Position of the argument chosen as current object
    pub fn current_position(&self) -> Option<usize> {
        self.current
    }

    /// Read the next argument in order, or nil once all were handed out
    ///
    /// Positional reads do not move this cursor.
    pub fn next_automatic(&self) -> Value {
        let position = self.cursor.get();
        match self.args.get(position) {
            Some(arg) => {
                self.cursor.set(position + 1);
                self.mark(position);
                arg.value()
            }
            None => {
                trace!(position, "Automatic placeholder exhausted");
                Value::Nil
            }
        }
    }

    /// Read the argument at `position`
    pub fn positional(&self, position: usize) -> Value {
        match self.args.get(position) {
            Some(arg) => {
                self.mark(position);
                arg.value()
            }
            None => Value::Nil,
        }
    }

    fn mark(&self, position: usize) {
        if let Some(flag) = self.consumed.get(position) {
            if !flag.replace(true) {
                trace!(position, "Argument consumed");
            }
        }
    }

    pub fn is_consumed(&self, position: usize) -> bool {
        self.consumed.get(position).is_some_and(Cell::get)
    }

    /// Arguments never read, in their original order
    pub fn unconsumed(&self) -> impl Iterator<Item = (usize, &'a Argument)> + '_ {
        self.args
            .iter()
            .enumerate()
            .filter(|(position, _)| !self.is_consumed(*position))
    }

    /// Placeholder callables, registered in order: the automatic
    /// placeholder, then for each argument its positional placeholder
    /// followed by its named placeholders
    ///
    /// A later registration replaces an earlier one with the same name.
    pub fn placeholders(&self, prefix: &str) -> FuncMap<'_> {
        let mut funcs = FuncMap::new();
        self.register_placeholders(&mut funcs, prefix);
        funcs
    }

    /// The complete function namespace for one execution
    ///
    /// Built-ins are shadowed by placeholders, which are shadowed by user
    /// functions.
    pub fn functions(&self, prefix: &str, user: &Functions) -> FuncMap<'_> {
        let mut funcs = FuncMap::new();

        for (name, builtin) in all_builtins() {
            match *name {
                "and" => funcs.insert_short_circuit(*name, ShortCircuit::And, *builtin),
                "or" => funcs.insert_short_circuit(*name, ShortCircuit::Or, *builtin),
                _ => funcs.insert(*name, *builtin),
            }
        }

        self.register_placeholders(&mut funcs, prefix);

        for (name, function) in user.iter() {
            let function = Arc::clone(function);
            funcs.insert(name, move |args: &[Value]| function(args));
        }

        funcs
    }

    fn register_placeholders<'c>(&'c self, funcs: &mut FuncMap<'c>, prefix: &str) {
        let automatic = prefix.to_string();
        funcs.insert(prefix, move |args: &[Value]| {
            no_arguments(&automatic, args)?;
            Ok(self.next_automatic())
        });

        for (position, arg) in self.args.iter().enumerate() {
            let name = format!("{}{}", prefix, position);
            let placeholder = name.clone();
            funcs.insert(name, move |args: &[Value]| {
                no_arguments(&placeholder, args)?;
                Ok(self.positional(position))
            });

            if let Argument::Value(Value::Map(named)) = arg {
                for (key, value) in named.iter() {
                    let placeholder = key.to_string();
                    funcs.insert(key, move |args: &[Value]| {
                        no_arguments(&placeholder, args)?;
                        self.mark(position);
                        Ok(value.clone())
                    });
                }
            }
        }
    }

    /// Write `" " + value` for every unconsumed argument, in order
    pub fn append_unused(&self, out: &mut dyn Write) -> io::Result<()> {
        let fallback = self.fallback();
        if !fallback.is_empty() {
            out.write_all(fallback.as_bytes())?;
        }
        Ok(())
    }

    /// Text appended after execution for the unconsumed arguments
    pub fn fallback(&self) -> String {
        let mut text = String::new();
        for (position, arg) in self.unconsumed() {
            debug!(position, "Appending unused argument");
            text.push(' ');
            text.push_str(&arg.to_string());
        }
        text
    }
}

fn no_arguments(name: &str, args: &[Value]) -> Result<(), FunctionError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("wrong number of args for {}: want 0 got {}", name, args.len()).into())
    }
}
