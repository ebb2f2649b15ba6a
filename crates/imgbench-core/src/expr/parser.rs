use super::lexer::{Token, TokenKind};
use super::EvalError;
use crate::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Neg => "-",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Pow => "** or pow()",
        }
    }
}

/// Expression tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),
    Name(String),
    Attribute {
        target: Box<Expr>,
        name: String,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

/// Recursive-descent parser with conventional arithmetic precedence:
///
/// ```text
/// top     := expr (',' expr)* [',']
/// expr    := term (('+' | '-') term)*
/// term    := factor (('*' | '/' | '//' | '%') factor)*
/// factor  := ('+' | '-') factor | power
/// power   := primary ['**' factor]
/// primary := atom ('.' NAME | '(' [args] ')')*
/// atom    := NUMBER | NAME | '(' ... ')' | '[' ... ']'
/// ```
pub(super) struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    pub fn parse_all(mut self) -> Result<Expr, EvalError> {
        if self.peek() == &TokenKind::Eof {
            return Err(self.error("unexpected end of input"));
        }

        let first = self.parse_expr()?;
        let expr = if self.peek() == &TokenKind::Comma {
            let mut items = vec![first];
            while self.eat(&TokenKind::Comma) {
                if self.peek() == &TokenKind::Eof {
                    break;
                }
                items.push(self.parse_expr()?);
            }
            Expr::Tuple(items)
        } else {
            first
        };

        if self.peek() != &TokenKind::Eof {
            return Err(self.error("unexpected token"));
        }
        Ok(expr)
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.cursor.min(self.tokens.len() - 1)].kind
    }

    fn pos(&self) -> usize {
        self.tokens[self.cursor.min(self.tokens.len() - 1)].pos
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.cursor < self.tokens.len() - 1 {
            self.cursor += 1;
        }
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<(), EvalError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{what}'")))
        }
    }

    fn error(&self, message: &str) -> EvalError {
        EvalError::Syntax {
            pos: self.pos(),
            message: message.to_string(),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
    }

    fn parse_term(&mut self) -> Result<Expr, EvalError> {
        let mut left = self.parse_factor()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::DoubleSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_factor()?;
            left = binary(op, left, right);
        }
    }

    fn parse_factor(&mut self) -> Result<Expr, EvalError> {
        let op = match self.peek() {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.parse_factor()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_power(&mut self) -> Result<Expr, EvalError> {
        let base = self.parse_primary()?;
        if self.eat(&TokenKind::DoubleStar) {
            // Right-associative, and binds tighter than a unary minus on its left.
            let exponent = self.parse_factor()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.eat(&TokenKind::Dot) {
                match self.advance() {
                    TokenKind::Name(name) => {
                        expr = Expr::Attribute {
                            target: Box::new(expr),
                            name,
                        };
                    }
                    _ => return Err(self.error("expected attribute name after '.'")),
                }
            } else if self.eat(&TokenKind::LParen) {
                let args = self.parse_sequence(&TokenKind::RParen, ")")?.0;
                expr = Expr::Call {
                    func: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, EvalError> {
        let pos = self.pos();
        match self.advance() {
            TokenKind::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            TokenKind::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            TokenKind::Name(name) => Ok(match name.as_str() {
                "True" | "true" => Expr::Literal(Value::Bool(true)),
                "False" | "false" => Expr::Literal(Value::Bool(false)),
                "None" => Expr::Literal(Value::None),
                _ => Expr::Name(name),
            }),
            TokenKind::LParen => {
                let (items, trailing_comma) = self.parse_sequence(&TokenKind::RParen, ")")?;
                if items.len() == 1 && !trailing_comma {
                    Ok(items.into_iter().next().unwrap_or(Expr::Tuple(vec![])))
                } else {
                    Ok(Expr::Tuple(items))
                }
            }
            TokenKind::LBracket => {
                let items = self.parse_sequence(&TokenKind::RBracket, "]")?.0;
                Ok(Expr::List(items))
            }
            TokenKind::Eof => Err(EvalError::Syntax {
                pos,
                message: "unexpected end of input".to_string(),
            }),
            _ => Err(EvalError::Syntax {
                pos,
                message: "unexpected token".to_string(),
            }),
        }
    }

    /// Comma-separated expressions up to `close`. Returns the items and
    /// whether a trailing comma was present.
    fn parse_sequence(
        &mut self,
        close: &TokenKind,
        close_text: &str,
    ) -> Result<(Vec<Expr>, bool), EvalError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        while self.peek() != close {
            items.push(self.parse_expr()?);
            trailing_comma = self.eat(&TokenKind::Comma);
            if !trailing_comma {
                break;
            }
        }
        self.expect(close, close_text)?;
        Ok((items, trailing_comma))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
