//! Parser implementation using chumsky
//!
//! Each action is parsed on its own into an [`Action`]; the block structure
//! (`if`/`with`/`range` ... `end`) is then assembled from the action sequence.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::ast::{Action, Command, Node, Operand, Pipeline, Spanned};
use super::lexer::{self, Token};
use super::scanner::{self, Segment};
use crate::error::SyntaxError;
use crate::value::Value;

/// Parse template source into nodes
pub fn parse(source: &str, left: &str, right: &str) -> Result<Vec<Node>, SyntaxError> {
    let mut builder = TreeBuilder::default();

    for segment in scanner::scan(source, left, right)? {
        match segment {
            Segment::Text(text) => builder.push(Node::Text(text.to_string())),
            Segment::Action { text, offset, span } => {
                let action = parse_action(text, offset)?;
                builder.action(action, span)?;
            }
        }
    }

    builder.finish()
}

/// Parse the text of a single action
pub fn parse_action(text: &str, offset: usize) -> Result<Action, SyntaxError> {
    let end = offset + text.len();

    let tokens = lexer::lex(text, offset).map_err(|span| SyntaxError::Syntax {
        span,
        message: "Unexpected character".to_string(),
        expected: Vec::new(),
    })?;

    // Turn the token list into a stream that chumsky can use
    let token_stream = Stream::from_iter(tokens.into_iter().map(|(tok, span)| (tok, span.into())))
        // Split (Token, SimpleSpan) into token and span parts
        .map((end..end).into(), |(t, s): (_, _)| (t, s));

    action_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| match errs.into_iter().next() {
            Some(err) => err.into(),
            None => SyntaxError::Syntax {
                span: offset..end,
                message: "Invalid action".to_string(),
                expected: Vec::new(),
            },
        })
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn action_parser<'a, I>() -> impl Parser<'a, I, Action, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let pipeline = recursive(|pipeline| {
        let literal = select! {
            Token::String(s) => Value::String(s),
            Token::Int(n) => Value::Int(n),
            Token::Float(n) => Value::Float(n),
            Token::True => Value::Bool(true),
            Token::False => Value::Bool(false),
            Token::Nil => Value::Nil,
        };

        let field = select! {
            Token::Field(path) => path.split('.').map(str::to_string).collect::<Vec<_>>(),
        };

        // (pipeline).A.B
        let nested = pipeline
            .delimited_by(just(Token::ParenOpen), just(Token::ParenClose))
            .then(field.clone().or_not())
            .map(|(inner, fields)| Operand::Nested(Box::new(inner), fields.unwrap_or_default()));

        let operand = choice((
            select! { Token::Ident(name) => Operand::Identifier(name) },
            field.clone().map(Operand::Field),
            just(Token::Dot).to(Operand::Dot),
            literal.map(Operand::Literal),
            nested,
        ))
        .map_with(|op, e| Spanned::new(op, span_range(&e.span())));

        let command = operand
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .map_with(|operands, e| Spanned::new(Command { operands }, span_range(&e.span())));

        command
            .separated_by(just(Token::Pipe))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(|commands| Pipeline { commands })
            .boxed()
    });

    // Order matters: `else if` must be tried before bare `else`
    choice((
        just(Token::If)
            .ignore_then(pipeline.clone())
            .map(Action::If),
        just(Token::Else)
            .ignore_then(just(Token::If))
            .ignore_then(pipeline.clone())
            .map(Action::ElseIf),
        just(Token::Else).to(Action::Else),
        just(Token::End).to(Action::End),
        just(Token::With)
            .ignore_then(pipeline.clone())
            .map(Action::With),
        just(Token::Range)
            .ignore_then(pipeline.clone())
            .map(Action::Range),
        pipeline.map(Action::Output),
    ))
    .then_ignore(end())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    With,
    Range,
}

/// An open block awaiting its `end`
#[derive(Debug)]
struct Frame {
    kind: BlockKind,
    open: std::ops::Range<usize>,
    finished: Vec<(Spanned<Pipeline>, Vec<Node>)>,
    head: Spanned<Pipeline>,
    body: Vec<Node>,
    otherwise: Option<Vec<Node>>,
}

impl Frame {
    fn new(kind: BlockKind, head: Pipeline, span: std::ops::Range<usize>) -> Self {
        Self {
            kind,
            open: span.clone(),
            finished: Vec::new(),
            head: Spanned::new(head, span),
            body: Vec::new(),
            otherwise: None,
        }
    }

    fn into_node(self) -> Node {
        let otherwise = self.otherwise.unwrap_or_default();
        match self.kind {
            BlockKind::If => {
                let mut branches = self.finished;
                branches.push((self.head, self.body));
                Node::If {
                    branches,
                    otherwise,
                }
            }
            BlockKind::With => Node::With {
                pipeline: self.head,
                body: self.body,
                otherwise,
            },
            BlockKind::Range => Node::Range {
                pipeline: self.head,
                body: self.body,
                otherwise,
            },
        }
    }
}

#[derive(Debug, Default)]
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn push(&mut self, node: Node) {
        let body = match self.stack.last_mut() {
            Some(frame) => match frame.otherwise.as_mut() {
                Some(otherwise) => otherwise,
                None => &mut frame.body,
            },
            None => &mut self.root,
        };
        body.push(node);
    }

    fn action(&mut self, action: Action, span: std::ops::Range<usize>) -> Result<(), SyntaxError> {
        match action {
            Action::Output(pipeline) => self.push(Node::Output(Spanned::new(pipeline, span))),
            Action::If(pipeline) => self.stack.push(Frame::new(BlockKind::If, pipeline, span)),
            Action::With(pipeline) => self.stack.push(Frame::new(BlockKind::With, pipeline, span)),
            Action::Range(pipeline) => {
                self.stack.push(Frame::new(BlockKind::Range, pipeline, span))
            }
            Action::ElseIf(pipeline) => match self.stack.last_mut() {
                Some(frame) if frame.kind == BlockKind::If && frame.otherwise.is_none() => {
                    let head = std::mem::replace(&mut frame.head, Spanned::new(pipeline, span));
                    let body = std::mem::take(&mut frame.body);
                    frame.finished.push((head, body));
                }
                _ => {
                    return Err(SyntaxError::UnexpectedKeyword {
                        keyword: "else if",
                        span,
                    })
                }
            },
            Action::Else => match self.stack.last_mut() {
                Some(frame) if frame.otherwise.is_none() => frame.otherwise = Some(Vec::new()),
                _ => {
                    return Err(SyntaxError::UnexpectedKeyword {
                        keyword: "else",
                        span,
                    })
                }
            },
            Action::End => {
                let frame = self.stack.pop().ok_or(SyntaxError::UnexpectedKeyword {
                    keyword: "end",
                    span,
                })?;
                self.push(frame.into_node());
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<Vec<Node>, SyntaxError> {
        match self.stack.last() {
            Some(frame) => Err(SyntaxError::MissingEnd {
                span: frame.open.clone(),
            }),
            None => Ok(self.root),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(source: &str) -> Pipeline {
        match parse_action(source, 0).expect("Should parse") {
            Action::Output(p) => p,
            other => panic!("Expected output action, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_identifier() {
        let p = output("p");
        assert_eq!(p.commands.len(), 1);
        assert_eq!(
            p.commands[0].node.operands[0].node,
            Operand::Identifier("p".to_string())
        );
    }

    #[test]
    fn test_parse_call_with_arguments() {
        let p = output(r#"join p0 ", ""#);
        let operands = &p.commands[0].node.operands;
        assert_eq!(operands.len(), 3);
        assert_eq!(
            operands[2].node,
            Operand::Literal(Value::String(", ".to_string()))
        );
    }

    #[test]
    fn test_parse_field_chain() {
        let p = output(".Owner.Name");
        assert_eq!(
            p.commands[0].node.operands[0].node,
            Operand::Field(vec!["Owner".to_string(), "Name".to_string()])
        );
    }

    #[test]
    fn test_separate_fields_are_separate_operands() {
        let p = output("eq .A .B");
        assert_eq!(p.commands[0].node.operands.len(), 3);
    }

    #[test]
    fn test_parse_pipeline() {
        let p = output("p0 | upper | printf");
        assert_eq!(p.commands.len(), 3);
    }

    #[test]
    fn test_parse_nested_with_field() {
        let p = output("(index p0 1).Name");
        match &p.commands[0].node.operands[0].node {
            Operand::Nested(inner, fields) => {
                assert_eq!(inner.commands[0].node.operands.len(), 3);
                assert_eq!(fields, &vec!["Name".to_string()]);
            }
            other => panic!("Expected nested pipeline, got {:?}", other),
        }
    }

    #[test]
    fn test_operand_spans_include_offset() {
        let p = match parse_action("p0 p1", 10).expect("Should parse") {
            Action::Output(p) => p,
            other => panic!("Expected output, got {:?}", other),
        };
        assert_eq!(p.commands[0].node.operands[1].span, 13..15);
    }

    #[test]
    fn test_parse_control_actions() {
        assert!(matches!(parse_action("if p", 0), Ok(Action::If(_))));
        assert!(matches!(parse_action("else if p", 0), Ok(Action::ElseIf(_))));
        assert!(matches!(parse_action("else", 0), Ok(Action::Else)));
        assert!(matches!(parse_action("end", 0), Ok(Action::End)));
        assert!(matches!(parse_action("range .Items", 0), Ok(Action::Range(_))));
        assert!(matches!(parse_action("with .Owner", 0), Ok(Action::With(_))));
    }

    #[test]
    fn test_empty_action_is_error() {
        assert!(matches!(
            parse_action("", 0),
            Err(SyntaxError::Syntax { .. })
        ));
    }

    #[test]
    fn test_unbalanced_parens_is_error() {
        assert!(parse_action("(p0", 0).is_err());
        assert!(parse_action("p0)", 0).is_err());
    }

    #[test]
    fn test_invalid_character_is_error() {
        match parse_action("p # q", 5) {
            Err(SyntaxError::Syntax { span, .. }) => assert_eq!(span, 7..8),
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_template_blocks() {
        let nodes = parse("{if p}yes{else}no{end}!", "{", "}").expect("Should parse");
        assert_eq!(nodes.len(), 2);
        match &nodes[0] {
            Node::If {
                branches,
                otherwise,
            } => {
                assert_eq!(branches.len(), 1);
                assert_eq!(branches[0].1, vec![Node::Text("yes".to_string())]);
                assert_eq!(otherwise, &vec![Node::Text("no".to_string())]);
            }
            other => panic!("Expected if node, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_else_if_chain() {
        let nodes = parse("{if a}1{else if b}2{else if c}3{end}", "{", "}").expect("Should parse");
        match &nodes[0] {
            Node::If {
                branches,
                otherwise,
            } => {
                assert_eq!(branches.len(), 3);
                assert!(otherwise.is_empty());
            }
            other => panic!("Expected if node, got {:?}", other),
        }
    }

    #[test]
    fn test_stray_end() {
        let result = parse("a{end}", "{", "}");
        assert_eq!(
            result,
            Err(SyntaxError::UnexpectedKeyword {
                keyword: "end",
                span: 1..6
            })
        );
    }

    #[test]
    fn test_missing_end() {
        let result = parse("{range p}x", "{", "}");
        assert_eq!(result, Err(SyntaxError::MissingEnd { span: 0..9 }));
    }

    #[test]
    fn test_else_if_on_range_is_error() {
        let result = parse("{range p}{else if q}{end}", "{", "}");
        assert!(matches!(
            result,
            Err(SyntaxError::UnexpectedKeyword {
                keyword: "else if",
                ..
            })
        ));
    }
}
