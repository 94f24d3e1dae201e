//! Syntax tree for compiled templates

use crate::value::Value;

/// Byte range in template source
pub type Span = std::ops::Range<usize>;

/// Node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A compiled template body
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text copied to the output
    Text(String),
    /// `{pipeline}`: evaluate and print
    Output(Spanned<Pipeline>),
    /// `{if c}..{else if d}..{else}..{end}`
    If {
        branches: Vec<(Spanned<Pipeline>, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
    /// `{with v}..{else}..{end}`: rebinds dot when the value is truthy
    With {
        pipeline: Spanned<Pipeline>,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
    /// `{range v}..{else}..{end}`: rebinds dot to each element
    Range {
        pipeline: Spanned<Pipeline>,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// Commands joined by `|`; each result feeds the next command's last argument
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub commands: Vec<Spanned<Command>>,
}

/// An operand list; a leading identifier makes it a function call
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub operands: Vec<Spanned<Operand>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Function name (a zero-argument call when not in head position)
    Identifier(String),
    /// `.A.B` rooted at dot
    Field(Vec<String>),
    /// `.`
    Dot,
    /// String, number, boolean or nil literal
    Literal(Value),
    /// `(pipeline).A.B`
    Nested(Box<Pipeline>, Vec<String>),
}

/// One parsed action, before block structure is assembled
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Output(Pipeline),
    If(Pipeline),
    ElseIf(Pipeline),
    Else,
    With(Pipeline),
    Range(Pipeline),
    End,
}
