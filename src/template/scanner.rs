//! Splits template source into literal text and delimited actions

use super::ast::Span;
use crate::error::SyntaxError;

/// A piece of template source
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'a> {
    Text(&'a str),
    Action {
        /// Text between the delimiters, trim markers removed
        text: &'a str,
        /// Byte offset of `text` in the template
        offset: usize,
        /// Whole action including delimiters
        span: Span,
    },
}

/// Scan `source` with the given delimiter pair
///
/// `{- ` trims whitespace before an action and ` -}` trims whitespace after
/// it. Actions holding only a `/* ... */` comment produce no segment.
pub fn scan<'a>(source: &'a str, left: &str, right: &str) -> Result<Vec<Segment<'a>>, SyntaxError> {
    let mut segments = Vec::new();
    let mut pos = 0;
    let mut trim_next = false;

    while let Some(found) = source[pos..].find(left) {
        let start = pos + found;
        let mut text = &source[pos..start];
        if trim_next {
            text = text.trim_start();
        }

        let mut inner_start = start + left.len();
        if has_left_trim_marker(&source[inner_start..]) {
            text = text.trim_end();
            inner_start += 1;
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }

        let inner_end = find_action_end(source, inner_start, right)
            .ok_or(SyntaxError::UnclosedAction {
                span: start..source.len(),
            })?;
        let mut inner = &source[inner_start..inner_end];
        trim_next = has_right_trim_marker(inner);
        if trim_next {
            inner = &inner[..inner.len() - 1];
        }

        let span = start..inner_end + right.len();
        let trimmed = inner.trim();
        if trimmed.starts_with("/*") {
            if trimmed.len() < 4 || !trimmed.ends_with("*/") {
                return Err(SyntaxError::UnclosedComment { span });
            }
        } else {
            segments.push(Segment::Action {
                text: inner,
                offset: inner_start,
                span,
            });
        }

        pos = inner_end + right.len();
    }

    let mut tail = &source[pos..];
    if trim_next {
        tail = tail.trim_start();
    }
    if !tail.is_empty() {
        segments.push(Segment::Text(tail));
    }

    Ok(segments)
}

fn has_left_trim_marker(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

fn has_right_trim_marker(inner: &str) -> bool {
    inner
        .strip_suffix('-')
        .and_then(|before| before.chars().next_back())
        .is_some_and(char::is_whitespace)
}

/// Byte position of the right delimiter closing an action, skipping over
/// quoted strings
fn find_action_end(source: &str, from: usize, right: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    let right = right.as_bytes();
    let mut i = from;

    while i < bytes.len() {
        if bytes[i..].starts_with(right) {
            return Some(i);
        }
        match bytes[i] {
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i += 1;
            }
            b'`' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'`' {
                    i += 1;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }

    None
}
