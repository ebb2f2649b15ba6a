use super::EvalError;

#[derive(Clone, Debug, PartialEq)]
pub(super) enum TokenKind {
    Int(i64),
    Float(f64),
    Name(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Eof,
}

#[derive(Clone, Debug, PartialEq)]
pub(super) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token in the source.
    pub pos: usize,
}

pub(super) fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
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

        if c.is_ascii_digit() || (c == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            let (kind, end) = lex_number(source, start)?;
            tokens.push(Token { kind, pos: start });
            i = end;
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Name(source[start..i].to_string()),
                pos: start,
            });
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let (kind, width) = match (c, next) {
            (b'*', Some(b'*')) => (TokenKind::DoubleStar, 2),
            (b'/', Some(b'/')) => (TokenKind::DoubleSlash, 2),
            (b'+', _) => (TokenKind::Plus, 1),
            (b'-', _) => (TokenKind::Minus, 1),
            (b'*', _) => (TokenKind::Star, 1),
            (b'/', _) => (TokenKind::Slash, 1),
            (b'%', _) => (TokenKind::Percent, 1),
            (b'(', _) => (TokenKind::LParen, 1),
            (b')', _) => (TokenKind::RParen, 1),
            (b'[', _) => (TokenKind::LBracket, 1),
            (b']', _) => (TokenKind::RBracket, 1),
            (b',', _) => (TokenKind::Comma, 1),
            (b'.', _) => (TokenKind::Dot, 1),
            _ => {
                let ch = source[start..].chars().next().unwrap_or('?');
                return Err(EvalError::Syntax {
                    pos: start,
                    message: format!("unexpected character '{ch}'"),
                });
            }
        };
        tokens.push(Token { kind, pos: start });
        i += width;
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        pos: source.len(),
    });
    Ok(tokens)
}

/// Lex an integer or float literal starting at `start`. `_` digit separators
/// are accepted between digits.
fn lex_number(source: &str, start: usize) -> Result<(TokenKind, usize), EvalError> {
    let bytes = source.as_bytes();
    let mut i = start;
    let mut is_float = false;

    let digits = |i: &mut usize| {
        while *i < bytes.len() && (bytes[*i].is_ascii_digit() || bytes[*i] == b'_') {
            *i += 1;
        }
    };

    digits(&mut i);
    if i < bytes.len() && bytes[i] == b'.' {
        is_float = true;
        i += 1;
        digits(&mut i);
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            is_float = true;
            i = j;
            digits(&mut i);
        }
    }

    let text = &source[start..i];
    if text.ends_with('_') || text.contains("__") || text.contains("_.") || text.contains("._") {
        return Err(EvalError::Syntax {
            pos: start,
            message: format!("invalid decimal literal '{text}'"),
        });
    }
    let cleaned = text.replace('_', "");

    let kind = if is_float {
        let value = cleaned.parse::<f64>().map_err(|_| EvalError::Syntax {
            pos: start,
            message: format!("invalid decimal literal '{text}'"),
        })?;
        TokenKind::Float(value)
    } else {
        let value = cleaned.parse::<i64>().map_err(|_| EvalError::Overflow)?;
        TokenKind::Int(value)
    };

    Ok((kind, i))
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
    fn lexes_operators_greedily() {
        assert_eq!(
            kinds("2**3//4"),
            vec![
                TokenKind::Int(2),
                TokenKind::DoubleStar,
                TokenKind::Int(3),
                TokenKind::DoubleSlash,
                TokenKind::Int(4),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_float_forms() {
        assert_eq!(kinds("1.")[0], TokenKind::Float(1.0));
        assert_eq!(kinds(".5")[0], TokenKind::Float(0.5));
        assert_eq!(kinds("1e-3")[0], TokenKind::Float(0.001));
        assert_eq!(kinds("1_000")[0], TokenKind::Int(1000));
    }

    #[test]
    fn dotted_name_is_three_tokens() {
        assert_eq!(
            kinds("math.pi"),
            vec![
                TokenKind::Name("math".into()),
                TokenKind::Dot,
                TokenKind::Name("pi".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = tokenize("1 + $").unwrap_err();
        assert!(matches!(err, EvalError::Syntax { pos: 4, .. }), "got: {err:?}");
    }
}
