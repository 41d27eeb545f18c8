//! Recursive-descent parser producing the script syntax tree.

use crate::error::ScriptFault;
use crate::lexer::{Token, TokenKind, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
    Ident(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
    Declare {
        name: String,
        value: Expr,
        constant: bool,
    },
    Assign {
        name: String,
        value: Expr,
    },
    If {
        condition: Expr,
        then: Vec<Stmt>,
        otherwise: Vec<Stmt>,
    },
    Return(Expr),
    Expr(Expr),
}

pub(crate) fn parse(source: &str, max_depth: usize) -> Result<Vec<Stmt>, ScriptFault> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        position: 0,
        depth: 0,
        max_depth,
    };
    let mut program = Vec::new();
    while !parser.at(&TokenKind::Eof) {
        program.push(parser.statement()?);
    }
    Ok(program)
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The token stream always ends with Eof.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &TokenKind {
        &self.tokens[(self.position + 1).min(self.tokens.len() - 1)].kind
    }

    fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, ScriptFault> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    fn error(&self, message: String) -> ScriptFault {
        ScriptFault::Syntax {
            offset: self.peek().offset,
            message,
        }
    }

    fn enter(&mut self) -> Result<(), ScriptFault> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ScriptFault::LimitExceeded(format!(
                "nesting deeper than {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Counts one more link of a left-nested chain (`a + b + c`, `a.b.c`).
    /// The tree grows a level per link even though the parser loops.
    fn link(&mut self, links: &mut usize) -> Result<(), ScriptFault> {
        self.enter()?;
        *links += 1;
        Ok(())
    }

    fn unlink(&mut self, links: usize) {
        self.depth -= links;
    }

    fn ident(&mut self) -> Result<String, ScriptFault> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error("expected identifier".to_owned()))
        }
    }

    fn end_of_statement(&mut self) {
        self.eat(&TokenKind::Semicolon);
    }

    fn statement(&mut self) -> Result<Stmt, ScriptFault> {
        self.enter()?;
        let stmt = self.statement_inner();
        self.leave();
        stmt
    }

    fn statement_inner(&mut self) -> Result<Stmt, ScriptFault> {
        match self.peek().kind.clone() {
            TokenKind::Let | TokenKind::Var | TokenKind::Const => {
                let constant = self.advance().kind == TokenKind::Const;
                let name = self.ident()?;
                self.expect(&TokenKind::Assign, "`=` after variable name")?;
                let value = self.expression()?;
                self.end_of_statement();
                Ok(Stmt::Declare {
                    name,
                    value,
                    constant,
                })
            }
            TokenKind::If => {
                self.advance();
                self.expect(&TokenKind::LParen, "`(` after `if`")?;
                let condition = self.expression()?;
                self.expect(&TokenKind::RParen, "`)` after condition")?;
                let then = self.block_or_statement()?;
                let otherwise = if self.eat(&TokenKind::Else) {
                    self.block_or_statement()?
                } else {
                    Vec::new()
                };
                Ok(Stmt::If {
                    condition,
                    then,
                    otherwise,
                })
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.at(&TokenKind::Semicolon)
                    || self.at(&TokenKind::RBrace)
                    || self.at(&TokenKind::Eof)
                {
                    Expr::Null
                } else {
                    self.expression()?
                };
                self.end_of_statement();
                Ok(Stmt::Return(value))
            }
            TokenKind::Ident(name) if self.peek_next() == &TokenKind::Assign => {
                self.advance();
                self.advance();
                let value = self.expression()?;
                self.end_of_statement();
                Ok(Stmt::Assign { name, value })
            }
            _ => {
                let expr = self.expression()?;
                self.end_of_statement();
                Ok(Stmt::Expr(expr))
            }
        }
    }

    fn block_or_statement(&mut self) -> Result<Vec<Stmt>, ScriptFault> {
        if self.eat(&TokenKind::LBrace) {
            let mut body = Vec::new();
            while !self.at(&TokenKind::RBrace) {
                if self.at(&TokenKind::Eof) {
                    return Err(self.error("expected `}`".to_owned()));
                }
                body.push(self.statement()?);
            }
            self.advance();
            Ok(body)
        } else {
            Ok(vec![self.statement()?])
        }
    }

    fn expression(&mut self) -> Result<Expr, ScriptFault> {
        self.enter()?;
        let expr = self.conditional();
        self.leave();
        expr
    }

    fn conditional(&mut self) -> Result<Expr, ScriptFault> {
        let condition = self.logical_or()?;
        if self.eat(&TokenKind::Question) {
            let then = self.expression()?;
            self.expect(&TokenKind::Colon, "`:` in conditional expression")?;
            let otherwise = self.expression()?;
            return Ok(Expr::Conditional {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(condition)
    }

    fn logical_or(&mut self) -> Result<Expr, ScriptFault> {
        let mut left = self.logical_and()?;
        let mut links = 0;
        while self.eat(&TokenKind::Or) {
            self.link(&mut links)?;
            let right = self.logical_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.unlink(links);
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Expr, ScriptFault> {
        let mut left = self.equality()?;
        let mut links = 0;
        while self.eat(&TokenKind::And) {
            self.link(&mut links)?;
            let right = self.equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.unlink(links);
        Ok(left)
    }

    fn binary_level(
        &mut self,
        operators: &[(TokenKind, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, ScriptFault>,
    ) -> Result<Expr, ScriptFault> {
        let mut left = next(self)?;
        let mut links = 0;
        'outer: loop {
            for (kind, op) in operators {
                if self.eat(kind) {
                    self.link(&mut links)?;
                    let right = next(self)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            self.unlink(links);
            return Ok(left);
        }
    }

    fn equality(&mut self) -> Result<Expr, ScriptFault> {
        self.binary_level(
            &[
                (TokenKind::Eq, BinaryOp::Eq),
                (TokenKind::NotEq, BinaryOp::NotEq),
            ],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr, ScriptFault> {
        self.binary_level(
            &[
                (TokenKind::LessEq, BinaryOp::LessEq),
                (TokenKind::GreaterEq, BinaryOp::GreaterEq),
                (TokenKind::Less, BinaryOp::Less),
                (TokenKind::Greater, BinaryOp::Greater),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, ScriptFault> {
        self.binary_level(
            &[
                (TokenKind::Plus, BinaryOp::Add),
                (TokenKind::Minus, BinaryOp::Subtract),
            ],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr, ScriptFault> {
        self.binary_level(
            &[
                (TokenKind::Star, BinaryOp::Multiply),
                (TokenKind::Slash, BinaryOp::Divide),
                (TokenKind::Percent, BinaryOp::Remainder),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, ScriptFault> {
        let op = if self.eat(&TokenKind::Bang) {
            Some(UnaryOp::Not)
        } else if self.eat(&TokenKind::Minus) {
            Some(UnaryOp::Negate)
        } else if self.eat(&TokenKind::Plus) {
            None
        } else {
            return self.postfix();
        };
        self.enter()?;
        let operand = self.unary();
        self.leave();
        let operand = operand?;
        Ok(match op {
            Some(op) => Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            None => operand,
        })
    }

    fn postfix(&mut self) -> Result<Expr, ScriptFault> {
        let mut expr = self.primary()?;
        let mut links = 0;
        loop {
            if self.eat(&TokenKind::Dot) {
                self.link(&mut links)?;
                let property = self.ident()?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                };
            } else if self.eat(&TokenKind::LParen) {
                self.link(&mut links)?;
                let mut args = Vec::new();
                if !self.at(&TokenKind::RParen) {
                    loop {
                        args.push(self.expression()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&TokenKind::RParen, "`)` after arguments")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                self.unlink(links);
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ScriptFault> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Text(s) => Ok(Expr::Text(s)),
            TokenKind::True => Ok(Expr::Bool(true)),
            TokenKind::False => Ok(Expr::Bool(false)),
            TokenKind::Null => Ok(Expr::Null),
            TokenKind::Ident(name) => Ok(Expr::Ident(name)),
            TokenKind::LParen => {
                let expr = self.expression()?;
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(expr)
            }
            TokenKind::Eof => Err(ScriptFault::Syntax {
                offset: token.offset,
                message: "unexpected end of script".to_owned(),
            }),
            other => Err(ScriptFault::Syntax {
                offset: token.offset,
                message: format!("unexpected token {other:?}"),
            }),
        }
    }
}
