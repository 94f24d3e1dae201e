//! Error types for template compilation and formatting

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::template::ast::Span;
use crate::template::lexer::Token;
use crate::template::ExecError;

/// Errors raised while compiling a template, before any output is written
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("syntax error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },

    #[error("unclosed action at {span:?}")]
    UnclosedAction { span: Span },

    #[error("unclosed comment at {span:?}")]
    UnclosedComment { span: Span },

    #[error("unexpected '{keyword}' at {span:?}")]
    UnexpectedKeyword { keyword: &'static str, span: Span },

    #[error("missing 'end' for block opened at {span:?}")]
    MissingEnd { span: Span },
}

impl SyntaxError {
    /// Byte range of the offending template text
    pub fn span(&self) -> &Span {
        match self {
            SyntaxError::Syntax { span, .. }
            | SyntaxError::UnclosedAction { span }
            | SyntaxError::UnclosedComment { span }
            | SyntaxError::UnexpectedKeyword { span, .. }
            | SyntaxError::MissingEnd { span } => span,
        }
    }

    fn label_message(&self) -> String {
        match self {
            SyntaxError::Syntax {
                message, expected, ..
            } => {
                if expected.is_empty() {
                    message.clone()
                } else {
                    format!("{}\nExpected: {}", message, expected.join(", "))
                }
            }
            SyntaxError::UnclosedAction { .. } => "action is never closed".to_string(),
            SyntaxError::UnclosedComment { .. } => "comment is never closed".to_string(),
            SyntaxError::UnexpectedKeyword { keyword, .. } => {
                format!("'{}' without a matching block", keyword)
            }
            SyntaxError::MissingEnd { .. } => "block is never closed with 'end'".to_string(),
        }
    }

    /// Format the error with template context using ariadne
    pub fn report(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        let span = self.span().clone();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(self.label_message())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for SyntaxError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of action".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of action".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        SyntaxError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &Token) -> String {
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::Field(s) => format!("field '.{}'", s),
        Token::String(s) => format!("string \"{}\"", s),
        Token::Int(n) => format!("number {}", n),
        Token::Float(n) => format!("number {}", n),
        Token::Pipe => "'|'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::Dot => "'.'".to_string(),
        Token::If => "keyword 'if'".to_string(),
        Token::Else => "keyword 'else'".to_string(),
        Token::End => "keyword 'end'".to_string(),
        Token::With => "keyword 'with'".to_string(),
        Token::Range => "keyword 'range'".to_string(),
        Token::True => "'true'".to_string(),
        Token::False => "'false'".to_string(),
        Token::Nil => "'nil'".to_string(),
    }
}

/// Errors returned by the format operations
#[derive(Debug, Error)]
pub enum FormatError {
    /// The template could not be compiled; nothing was written
    #[error("template syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// Rendering failed; a streaming sink may hold partial output
    #[error("template execution error: {0}")]
    Execution(ExecError),

    /// The output sink refused a write
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExecError> for FormatError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Write(io) => FormatError::Io(io),
            other => FormatError::Execution(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_mentions_location() {
        let source = "Hello {p";
        let err = SyntaxError::UnclosedAction { span: 6..8 };
        let report = err.report(source, "message");
        assert!(report.contains("unclosed action"));
        assert!(report.contains("message"));
    }

    #[test]
    fn test_span_accessor() {
        let err = SyntaxError::UnexpectedKeyword {
            keyword: "end",
            span: 3..8,
        };
        assert_eq!(err.span(), &(3..8));
        assert_eq!(err.to_string(), "unexpected 'end' at 3..8");
    }

    #[test]
    fn test_write_errors_become_io() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err = FormatError::from(ExecError::Write(io));
        assert!(matches!(err, FormatError::Io(_)));
    }
}
