//! Tokenizer for the rule script language.

use crate::error::ScriptFault;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Text(String),
    Ident(String),
    Let,
    Const,
    Var,
    If,
    Else,
    Return,
    True,
    False,
    Null,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semicolon,
    Question,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Assign,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

fn syntax(offset: usize, message: impl Into<String>) -> ScriptFault {
    ScriptFault::Syntax {
        offset,
        message: message.into(),
    }
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ScriptFault> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        // Comments.
        if c == b'/' && bytes.get(i + 1) == Some(&b'/') {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if c == b'/' && bytes.get(i + 1) == Some(&b'*') {
            i += 2;
            loop {
                if i + 1 >= bytes.len() {
                    return Err(syntax(start, "unterminated block comment"));
                }
                if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                    i += 2;
                    break;
                }
                i += 1;
            }
            continue;
        }

        if c.is_ascii_digit() || (c == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            let literal = &source[start..i];
            let value = literal
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| syntax(start, format!("invalid number `{literal}`")))?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                offset: start,
            });
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' || c == b'$' {
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'$')
            {
                i += 1;
            }
            let word = &source[start..i];
            let kind = match word {
                "let" => TokenKind::Let,
                "const" => TokenKind::Const,
                "var" => TokenKind::Var,
                "if" => TokenKind::If,
                "else" => TokenKind::Else,
                "return" => TokenKind::Return,
                "true" => TokenKind::True,
                "false" => TokenKind::False,
                "null" | "undefined" => TokenKind::Null,
                _ => TokenKind::Ident(word.to_owned()),
            };
            tokens.push(Token {
                kind,
                offset: start,
            });
            continue;
        }

        if c == b'"' || c == b'\'' {
            let quote = c;
            i += 1;
            let mut text = String::new();
            loop {
                let Some(&b) = bytes.get(i) else {
                    return Err(syntax(start, "unterminated string literal"));
                };
                if b == quote {
                    i += 1;
                    break;
                }
                if b == b'\\' {
                    let escaped = bytes
                        .get(i + 1)
                        .ok_or_else(|| syntax(i, "unterminated escape"))?;
                    text.push(match escaped {
                        b'n' => '\n',
                        b't' => '\t',
                        b'\\' => '\\',
                        b'\'' => '\'',
                        b'"' => '"',
                        other => return Err(syntax(i, format!("unknown escape `\\{}`", *other as char))),
                    });
                    i += 2;
                    continue;
                }
                // Copy whole UTF-8 sequences.
                let ch = source[i..]
                    .chars()
                    .next()
                    .ok_or_else(|| syntax(i, "invalid character"))?;
                text.push(ch);
                i += ch.len_utf8();
            }
            tokens.push(Token {
                kind: TokenKind::Text(text),
                offset: start,
            });
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let third = bytes.get(i + 2).copied();
        let (kind, width) = match (c, next, third) {
            (b'=', Some(b'='), Some(b'=')) => (TokenKind::Eq, 3),
            (b'!', Some(b'='), Some(b'=')) => (TokenKind::NotEq, 3),
            (b'=', Some(b'='), _) => (TokenKind::Eq, 2),
            (b'!', Some(b'='), _) => (TokenKind::NotEq, 2),
            (b'<', Some(b'='), _) => (TokenKind::LessEq, 2),
            (b'>', Some(b'='), _) => (TokenKind::GreaterEq, 2),
            (b'&', Some(b'&'), _) => (TokenKind::And, 2),
            (b'|', Some(b'|'), _) => (TokenKind::Or, 2),
            (b'(', _, _) => (TokenKind::LParen, 1),
            (b')', _, _) => (TokenKind::RParen, 1),
            (b'{', _, _) => (TokenKind::LBrace, 1),
            (b'}', _, _) => (TokenKind::RBrace, 1),
            (b',', _, _) => (TokenKind::Comma, 1),
            (b'.', _, _) => (TokenKind::Dot, 1),
            (b';', _, _) => (TokenKind::Semicolon, 1),
            (b'?', _, _) => (TokenKind::Question, 1),
            (b':', _, _) => (TokenKind::Colon, 1),
            (b'+', _, _) => (TokenKind::Plus, 1),
            (b'-', _, _) => (TokenKind::Minus, 1),
            (b'*', _, _) => (TokenKind::Star, 1),
            (b'/', _, _) => (TokenKind::Slash, 1),
            (b'%', _, _) => (TokenKind::Percent, 1),
            (b'!', _, _) => (TokenKind::Bang, 1),
            (b'=', _, _) => (TokenKind::Assign, 1),
            (b'<', _, _) => (TokenKind::Less, 1),
            (b'>', _, _) => (TokenKind::Greater, 1),
            _ => {
                let ch = source[i..].chars().next().unwrap_or('?');
                return Err(syntax(start, format!("unexpected character `{ch}`")));
            }
        };
        tokens.push(Token {
            kind,
            offset: start,
        });
        i += width;
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        offset: source.len(),
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenizes_expression() {
        assert_eq!(
            kinds("roll(20) >= 12.5"),
            vec![
                TokenKind::Ident("roll".to_owned()),
                TokenKind::LParen,
                TokenKind::Number(20.0),
                TokenKind::RParen,
                TokenKind::GreaterEq,
                TokenKind::Number(12.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strict_and_loose_equality_share_a_token() {
        assert_eq!(kinds("a === b")[1], TokenKind::Eq);
        assert_eq!(kinds("a == b")[1], TokenKind::Eq);
        assert_eq!(kinds("a !== b")[1], TokenKind::NotEq);
    }

    #[test]
    fn test_skips_comments_and_reads_strings() {
        assert_eq!(
            kinds("// note\n'hit' /* inline */ + \"s\\n\""),
            vec![
                TokenKind::Text("hit".to_owned()),
                TokenKind::Plus,
                TokenKind::Text("s\n".to_owned()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string_reports_offset() {
        let err = tokenize("1 + 'oops").unwrap_err();
        assert_eq!(
            err,
            ScriptFault::Syntax {
                offset: 4,
                message: "unterminated string literal".to_owned(),
            }
        );
    }

    #[test]
    fn test_rejects_number_literals_that_overflow() {
        let literal = "9".repeat(400);
        let err = tokenize(&literal).unwrap_err();
        assert!(matches!(err, ScriptFault::Syntax { offset: 0, .. }));
    }

    #[test]
    fn test_rejects_unknown_characters() {
        assert!(tokenize("a # b").is_err());
        assert!(tokenize("a[0]").is_err());
    }
}
