//! Template execution against a function table and a current object

use std::collections::HashMap;
use std::io::{self, Write};

use thiserror::Error;

use super::ast::{Command, Node, Operand, Pipeline, Span, Spanned};
use super::grammar;
use crate::error::SyntaxError;
use crate::functions::FunctionError;
use crate::value::Value;

/// Left delimiter used when an empty one is configured
pub const DEFAULT_LEFT_DELIMITER: &str = "{{";

/// Right delimiter used when an empty one is configured
pub const DEFAULT_RIGHT_DELIMITER: &str = "}}";

static NIL: Value = Value::Nil;

/// Errors raised while executing a compiled template
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("function \"{name}\" not defined")]
    UndefinedFunction { name: String, span: Span },

    #[error("record has no field {field}")]
    MissingField { field: String, span: Span },

    #[error("nil data; no entry for field {field}")]
    NilData { field: String, span: Span },

    #[error("can't evaluate field {field} in type {kind}")]
    NotAnObject {
        field: String,
        kind: &'static str,
        span: Span,
    },

    #[error("can't give argument to non-function")]
    NotAFunction { span: Span },

    #[error("range can't iterate over {kind}")]
    NotIterable { kind: &'static str, span: Span },

    #[error("error calling {name}: {source}")]
    Function {
        name: String,
        source: FunctionError,
        span: Span,
    },

    #[error("write failed: {0}")]
    Write(#[from] io::Error),
}

impl ExecError {
    /// Template span that was executing, if the error came from the template
    pub fn span(&self) -> Option<&Span> {
        match self {
            ExecError::UndefinedFunction { span, .. }
            | ExecError::MissingField { span, .. }
            | ExecError::NilData { span, .. }
            | ExecError::NotAnObject { span, .. }
            | ExecError::NotAFunction { span }
            | ExecError::NotIterable { span, .. }
            | ExecError::Function { span, .. } => Some(span),
            ExecError::Write(_) => None,
        }
    }
}

/// A function as seen by the executor; may borrow per-call state
pub type Func<'a> = Box<dyn Fn(&[Value]) -> Result<Value, FunctionError> + 'a>;

/// Which operand value ends a short-circuiting call early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortCircuit {
    /// Stop at the first falsy operand
    And,
    /// Stop at the first truthy operand
    Or,
}

/// Function namespace for one execution
///
/// Inserting a name twice replaces the earlier function, which is how
/// tables of different precedence are layered.
#[derive(Default)]
pub struct FuncMap<'a> {
    funcs: HashMap<String, Func<'a>>,
    short_circuit: HashMap<String, ShortCircuit>,
}

impl<'a> FuncMap<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + 'a,
    {
        let name = name.into();
        self.short_circuit.remove(&name);
        self.funcs.insert(name, Box::new(function));
    }

    /// Insert a function whose operands are evaluated left to right only
    /// until one decides the result
    ///
    /// `function` is still called when there are no operands, so it can
    /// report the arity error.
    pub fn insert_short_circuit<F>(&mut self, name: impl Into<String>, mode: ShortCircuit, function: F)
    where
        F: Fn(&[Value]) -> Result<Value, FunctionError> + 'a,
    {
        let name = name.into();
        self.funcs.insert(name.clone(), Box::new(function));
        self.short_circuit.insert(name, mode);
    }

    pub fn get(&self, name: &str) -> Option<&Func<'a>> {
        self.funcs.get(name)
    }

    pub fn short_circuit(&self, name: &str) -> Option<ShortCircuit> {
        self.short_circuit.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }
}

/// A compiled template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Compile `source` using the given delimiters
    ///
    /// An empty delimiter stands for the default `{{` or `}}`.
    pub fn parse(source: &str, left: &str, right: &str) -> Result<Self, SyntaxError> {
        let left = if left.is_empty() {
            DEFAULT_LEFT_DELIMITER
        } else {
            left
        };
        let right = if right.is_empty() {
            DEFAULT_RIGHT_DELIMITER
        } else {
            right
        };

        Ok(Self {
            nodes: grammar::parse(source, left, right)?,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Render into `out`, resolving identifiers through `funcs` and fields
    /// against `data`
    ///
    /// Output is written as execution proceeds; on error, whatever was
    /// written so far stays in `out`.
    pub fn execute(
        &self,
        out: &mut dyn Write,
        funcs: &FuncMap<'_>,
        data: Option<&Value>,
    ) -> Result<(), ExecError> {
        let mut executor = Executor { out, funcs };
        executor.walk(&self.nodes, data.unwrap_or(&NIL))
    }
}

struct Executor<'o, 'f, 'a> {
    out: &'o mut dyn Write,
    funcs: &'f FuncMap<'a>,
}

impl Executor<'_, '_, '_> {
    fn walk(&mut self, nodes: &[Node], dot: &Value) -> Result<(), ExecError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.out.write_all(text.as_bytes())?,
                Node::Output(pipeline) => {
                    let value = self.pipeline(&pipeline.node, dot)?;
                    self.print(&value)?;
                }
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let mut taken = None;
                    for (condition, body) in branches {
                        if self.pipeline(&condition.node, dot)?.is_truthy() {
                            taken = Some(body);
                            break;
                        }
                    }
                    self.walk(taken.unwrap_or(otherwise), dot)?;
                }
                Node::With {
                    pipeline,
                    body,
                    otherwise,
                } => {
                    let value = self.pipeline(&pipeline.node, dot)?;
                    if value.is_truthy() {
                        self.walk(body, &value)?;
                    } else {
                        self.walk(otherwise, dot)?;
                    }
                }
                Node::Range {
                    pipeline,
                    body,
                    otherwise,
                } => {
                    let items = match self.pipeline(&pipeline.node, dot)? {
                        Value::List(items) => items,
                        Value::Map(map) => map.sorted().into_iter().map(|(_, v)| v.clone()).collect(),
                        Value::Nil => Vec::new(),
                        other => {
                            return Err(ExecError::NotIterable {
                                kind: other.kind_name(),
                                span: pipeline.span.clone(),
                            })
                        }
                    };
                    if items.is_empty() {
                        self.walk(otherwise, dot)?;
                    }
                    for item in &items {
                        self.walk(body, item)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Nil prints as nothing; everything else uses its natural print form
    fn print(&mut self, value: &Value) -> io::Result<()> {
        match value {
            Value::Nil => Ok(()),
            Value::String(s) => self.out.write_all(s.as_bytes()),
            other => write!(self.out, "{}", other),
        }
    }

    fn pipeline(&self, pipeline: &Pipeline, dot: &Value) -> Result<Value, ExecError> {
        let mut piped = None;
        for command in &pipeline.commands {
            piped = Some(self.command(command, dot, piped)?);
        }
        Ok(piped.unwrap_or(Value::Nil))
    }

    fn command(
        &self,
        command: &Spanned<Command>,
        dot: &Value,
        piped: Option<Value>,
    ) -> Result<Value, ExecError> {
        let Some((head, rest)) = command.node.operands.split_first() else {
            return Ok(piped.unwrap_or(Value::Nil));
        };

        match &head.node {
            Operand::Identifier(name) => {
                if let Some(mode) = self.funcs.short_circuit(name) {
                    return self.short_circuit(name, mode, rest, piped, dot, &head.span);
                }
                let mut args = rest
                    .iter()
                    .map(|operand| self.operand(operand, dot))
                    .collect::<Result<Vec<_>, _>>()?;
                args.extend(piped);
                self.call(name, &args, &head.span)
            }
            _ if !rest.is_empty() || piped.is_some() => Err(ExecError::NotAFunction {
                span: command.span.clone(),
            }),
            _ => self.operand(head, dot),
        }
    }

    /// The piped value was evaluated before the call and counts as the
    /// last operand
    fn short_circuit(
        &self,
        name: &str,
        mode: ShortCircuit,
        operands: &[Spanned<Operand>],
        piped: Option<Value>,
        dot: &Value,
        span: &Span,
    ) -> Result<Value, ExecError> {
        if operands.is_empty() && piped.is_none() {
            return self.call(name, &[], span);
        }

        let stop_when = mode == ShortCircuit::Or;
        let mut last = None;
        for operand in operands {
            let value = self.operand(operand, dot)?;
            if value.is_truthy() == stop_when {
                return Ok(value);
            }
            last = Some(value);
        }
        Ok(piped.or(last).unwrap_or(Value::Nil))
    }

    fn operand(&self, operand: &Spanned<Operand>, dot: &Value) -> Result<Value, ExecError> {
        match &operand.node {
            Operand::Identifier(name) => self.call(name, &[], &operand.span),
            Operand::Field(path) => fields(dot, path, &operand.span),
            Operand::Dot => Ok(dot.clone()),
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Nested(pipeline, path) => {
                let value = self.pipeline(pipeline, dot)?;
                fields(&value, path, &operand.span)
            }
        }
    }

    fn call(&self, name: &str, args: &[Value], span: &Span) -> Result<Value, ExecError> {
        let function = self
            .funcs
            .get(name)
            .ok_or_else(|| ExecError::UndefinedFunction {
                name: name.to_string(),
                span: span.clone(),
            })?;

        function(args).map_err(|source| ExecError::Function {
            name: name.to_string(),
            source,
            span: span.clone(),
        })
    }
}

fn fields(root: &Value, path: &[String], span: &Span) -> Result<Value, ExecError> {
    let mut current = root;
    for field in path {
        current = lookup(current, field, span)?;
    }
    Ok(current.clone())
}

/// Missing record fields are errors; missing map keys read as nil
fn lookup<'v>(value: &'v Value, field: &str, span: &Span) -> Result<&'v Value, ExecError> {
    match value {
        Value::Record(record) => record.get(field).ok_or_else(|| ExecError::MissingField {
            field: field.to_string(),
            span: span.clone(),
        }),
        Value::Map(map) => Ok(map.get(field).unwrap_or(&NIL)),
        Value::Nil => Err(ExecError::NilData {
            field: field.to_string(),
            span: span.clone(),
        }),
        other => Err(ExecError::NotAnObject {
            field: field.to_string(),
            kind: other.kind_name(),
            span: span.clone(),
        }),
    }
}
