//! Lexer for the inside of template actions using logos

use logos::Logos;

use super::ast::Span;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Control keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("end")]
    End,
    #[token("with")]
    With,
    #[token("range")]
    Range,

    // Literal keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("nil")]
    Nil,

    #[token("|")]
    Pipe,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(".")]
    Dot,

    // `.Name` or a chain such as `.A.B`, stored without the leading dot
    #[regex(r"(\.[a-zA-Z_][a-zA-Z0-9_]*)+", |lex| lex.slice()[1..].to_string())]
    Field(String),

    // Identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"`[^`]*`", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    String(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][-+]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
}

/// Strip quotes and resolve backslash escapes of a double-quoted literal
fn unescape(quoted: &str) -> Option<String> {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            _ => return None,
        }
    }
    Some(out)
}

/// Lex action text into tokens with spans
///
/// Spans are shifted by `offset` so they point into the whole template.
/// Returns the span of the first unrecognised input on failure.
pub fn lex(input: &str, offset: usize) -> Result<Vec<(Token, Span)>, Span> {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| {
            let span = span.start + offset..span.end + offset;
            match tok {
                Ok(t) => Ok((t, span)),
                Err(()) => Err(span),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input, 0)
            .expect("Should lex")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokens("if else end with range"),
            vec![Token::If, Token::Else, Token::End, Token::With, Token::Range]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(
            tokens("iffy ending"),
            vec![
                Token::Ident("iffy".to_string()),
                Token::Ident("ending".to_string())
            ]
        );
    }

    #[test]
    fn test_placeholder_identifiers() {
        assert_eq!(
            tokens("p p0 p12 name"),
            vec![
                Token::Ident("p".to_string()),
                Token::Ident("p0".to_string()),
                Token::Ident("p12".to_string()),
                Token::Ident("name".to_string()),
            ]
        );
    }

    #[test]
    fn test_fields_and_dot() {
        assert_eq!(
            tokens(". .Name .A.B .C"),
            vec![
                Token::Dot,
                Token::Field("Name".to_string()),
                Token::Field("A.B".to_string()),
                Token::Field("C".to_string()),
            ]
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            tokens(r#""a\"b" `raw\n` 42 -7 2.5 true false nil"#),
            vec![
                Token::String("a\"b".to_string()),
                Token::String("raw\\n".to_string()),
                Token::Int(42),
                Token::Int(-7),
                Token::Float(2.5),
                Token::True,
                Token::False,
                Token::Nil,
            ]
        );
    }

    #[test]
    fn test_pipe_and_parens() {
        assert_eq!(
            tokens("(p0) | upper"),
            vec![
                Token::ParenOpen,
                Token::Ident("p0".to_string()),
                Token::ParenClose,
                Token::Pipe,
                Token::Ident("upper".to_string()),
            ]
        );
    }

    #[test]
    fn test_offset_spans() {
        let lexed = lex("p0", 10).expect("Should lex");
        assert_eq!(lexed[0].1, 10..12);
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(lex("p # q", 3), Err(5..6));
    }

    #[test]
    fn test_invalid_escape() {
        assert!(lex(r#""\q""#, 0).is_err());
    }
}
