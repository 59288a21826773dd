//! Precedence-climbing parser producing [`Expr`] and [`Statement`] trees.

use super::ast::{BinaryOp, Expr, Statement, UnaryOp};
use super::error::ExprError;
use super::lexer::{tokenize, Token, TokenKind};

/// Deepest nesting of groups, operands and operator chains a binding may use.
pub const MAX_NESTING: usize = 128;

/// Parse a single expression fragment.
pub fn parse_expression(source: &str) -> Result<Expr, ExprError> {
    let mut parser = Parser::new(tokenize(source)?);
    if parser.at(&TokenKind::Eof) {
        return Err(ExprError::parse("empty expression", 1));
    }
    let expr = parser.expression()?;
    parser.expect_eof()?;
    Ok(expr)
}

/// Parse a `;`-separated statement list, as used by trigger bindings.
pub fn parse_statements(source: &str) -> Result<Vec<Statement>, ExprError> {
    let mut parser = Parser::new(tokenize(source)?);
    let mut statements = Vec::new();
    loop {
        while parser.eat(&TokenKind::Semicolon) {}
        if parser.at(&TokenKind::Eof) {
            break;
        }
        let target = parser.expression()?;
        if parser.eat(&TokenKind::Assign) {
            if target.as_reference().is_none() {
                return Err(ExprError::parse(
                    "left side of assignment must be a property path",
                    parser.column(),
                ));
            }
            let value = parser.expression()?;
            statements.push(Statement::Assign { target, value });
        } else {
            statements.push(Statement::Expr(target));
        }
        if !parser.eat(&TokenKind::Semicolon) && !parser.at(&TokenKind::Eof) {
            return Err(parser.unexpected("';'"));
        }
    }
    Ok(statements)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn too_deep(&self) -> ExprError {
        ExprError::parse(
            format!("expression nests deeper than {} levels", MAX_NESTING),
            self.column(),
        )
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, ExprError>) -> Result<T, ExprError> {
        if self.depth >= MAX_NESTING {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Count one more link of a left-nested chain (`a + b + c`, `a.b.c`).
    fn link(&self, links: &mut usize) -> Result<(), ExprError> {
        *links += 1;
        if self.depth + *links > MAX_NESTING {
            return Err(self.too_deep());
        }
        Ok(())
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn column(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].column
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ExprError> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_eof(&self) -> Result<(), ExprError> {
        if self.at(&TokenKind::Eof) {
            Ok(())
        } else {
            Err(self.unexpected("end of expression"))
        }
    }

    fn unexpected(&self, expected: &str) -> ExprError {
        let found = match self.peek() {
            TokenKind::Eof => "end of input".to_string(),
            other => format!("{:?}", other),
        };
        ExprError::parse(format!("expected {}, found {}", expected, found), self.column())
    }

    fn expression(&mut self) -> Result<Expr, ExprError> {
        self.nested(Self::conditional)
    }

    fn conditional(&mut self) -> Result<Expr, ExprError> {
        let test = self.binary(0)?;
        if self.eat(&TokenKind::Question) {
            let consequent = self.expression()?;
            self.expect(TokenKind::Colon, "':'")?;
            let alternate = self.expression()?;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            });
        }
        Ok(test)
    }

    fn binary(&mut self, min_prec: u8) -> Result<Expr, ExprError> {
        let mut left = self.unary()?;
        let mut links = 0;
        while let Some((op, prec)) = binary_op(self.peek()) {
            if prec < min_prec {
                break;
            }
            self.link(&mut links)?;
            self.advance();
            let right = self.binary(prec + 1)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek() {
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => {
                self.advance();
                return self.nested(Self::unary);
            }
            _ => return self.postfix(),
        };
        self.advance();
        let operand = self.nested(Self::unary)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        let mut links = 0;
        loop {
            if matches!(self.peek(), TokenKind::Dot | TokenKind::LBracket | TokenKind::LParen) {
                self.link(&mut links)?;
            }
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let TokenKind::Ident(property) = self.advance() else {
                        return Err(ExprError::parse("expected property name after '.'", self.column()));
                    };
                    expr = Expr::Member {
                        object: Box::new(expr),
                        property,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.expression()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.list(TokenKind::RParen, "')'")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn list(&mut self, close: TokenKind, what: &str) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        if self.eat(&close) {
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            if self.eat(&TokenKind::Comma) {
                if self.eat(&close) {
                    return Ok(items);
                }
                continue;
            }
            self.expect(close, what)?;
            return Ok(items);
        }
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let column = self.column();
        match self.advance() {
            TokenKind::Number(n) => Ok(Expr::Number(n)),
            TokenKind::Str(s) => Ok(Expr::Str(s)),
            TokenKind::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" | "undefined" => Expr::Null,
                "this" => Expr::This,
                _ => Expr::Ident(name),
            }),
            TokenKind::LParen => {
                let inner = self.expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::LBracket => Ok(Expr::Array(self.list(TokenKind::RBracket, "']'")?)),
            TokenKind::LBrace => self.object(),
            TokenKind::Eof => Err(ExprError::parse("unexpected end of expression", column)),
            other => Err(ExprError::parse(format!("unexpected token {:?}", other), column)),
        }
    }

    fn object(&mut self) -> Result<Expr, ExprError> {
        let mut fields = Vec::new();
        if self.eat(&TokenKind::RBrace) {
            return Ok(Expr::Object(fields));
        }
        loop {
            let key = match self.advance() {
                TokenKind::Ident(name) | TokenKind::Str(name) => name,
                TokenKind::Number(n) => super::value::format_number(n),
                _ => return Err(ExprError::parse("expected object key", self.column())),
            };
            self.expect(TokenKind::Colon, "':'")?;
            fields.push((key, self.expression()?));
            if self.eat(&TokenKind::Comma) {
                if self.eat(&TokenKind::RBrace) {
                    break;
                }
                continue;
            }
            self.expect(TokenKind::RBrace, "'}'")?;
            break;
        }
        Ok(Expr::Object(fields))
    }
}

fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    Some(match kind {
        TokenKind::OrOr => (BinaryOp::Or, 1),
        TokenKind::AndAnd => (BinaryOp::And, 2),
        TokenKind::EqEq => (BinaryOp::Eq, 3),
        TokenKind::NotEq => (BinaryOp::NotEq, 3),
        TokenKind::EqEqEq => (BinaryOp::StrictEq, 3),
        TokenKind::NotEqEq => (BinaryOp::StrictNotEq, 3),
        TokenKind::Lt => (BinaryOp::Lt, 4),
        TokenKind::LtEq => (BinaryOp::LtEq, 4),
        TokenKind::Gt => (BinaryOp::Gt, 4),
        TokenKind::GtEq => (BinaryOp::GtEq, 4),
        TokenKind::Plus => (BinaryOp::Add, 5),
        TokenKind::Minus => (BinaryOp::Sub, 5),
        TokenKind::Star => (BinaryOp::Mul, 6),
        TokenKind::Slash => (BinaryOp::Div, 6),
        TokenKind::Percent => (BinaryOp::Rem, 6),
        _ => return None,
    })
}
