//! Expression parsing using precedence climbing.

use minijava_core::{ParseError, ParseErrorKind};

use super::parser::Parser;
use super::{
    BinaryExpr, BinaryOp, CallExpr, ClassType, Expr, IndexExpr, Literal, LiteralExpr,
    NewArrayExpr, NewObjectExpr, Reference, TypeDenoter, UnaryExpr, UnaryOp,
};
use crate::lexer::TokenKind;

type Result<T> = std::result::Result<T, ParseError>;

impl<'src> Parser<'src> {
    /// Parse an expression.
    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_binary(1)
    }

    /// Parse binary operators binding at least as tightly as `min_prec`.
    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr> {
        let mut left = self.parse_unary()?;

        while let Some(op) = BinaryOp::from_token(self.peek().kind) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();
            let right = self.parse_binary(prec + 1)?;
            let span = left.span().merge(right.span());
            left = Expr::Binary(BinaryExpr {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            });
        }

        Ok(left)
    }

    /// Parse `('!' | '-') Unary | Primary`.
    fn parse_unary(&mut self) -> Result<Expr> {
        if let Some(op) = UnaryOp::from_token(self.peek().kind) {
            let start = self.advance().span;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary(UnaryExpr {
                op,
                operand: Box::new(operand),
                span: self.span_from(start),
            }));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = *self.peek();
        match token.kind {
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::IntLiteral => {
                self.advance();
                let value = token.lexeme.parse::<i32>().map_err(|err| {
                    ParseError::new(
                        ParseErrorKind::ExpectedExpression,
                        token.span,
                        format!("invalid integer literal '{}': {err}", token.lexeme),
                    )
                })?;
                Ok(literal(Literal::Int(value), token.span))
            }
            TokenKind::True => {
                self.advance();
                Ok(literal(Literal::Bool(true), token.span))
            }
            TokenKind::False => {
                self.advance();
                Ok(literal(Literal::Bool(false), token.span))
            }
            TokenKind::Null => {
                self.advance();
                Ok(literal(Literal::Null, token.span))
            }
            TokenKind::New => self.parse_new(),
            TokenKind::This | TokenKind::Identifier => {
                let start = token.span;
                let reference = self.parse_reference()?;
                match self.peek().kind {
                    TokenKind::LeftBracket => {
                        self.advance();
                        let index = self.parse_expr()?;
                        self.expect(TokenKind::RightBracket)?;
                        Ok(Expr::Index(IndexExpr {
                            base: reference,
                            index: Box::new(index),
                            span: self.span_from(start),
                        }))
                    }
                    TokenKind::LeftParen => {
                        let args = self.parse_arguments()?;
                        Ok(Expr::Call(CallExpr {
                            callee: reference,
                            args,
                            span: self.span_from(start),
                        }))
                    }
                    _ => Ok(Expr::Ref(reference)),
                }
            }
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedExpression,
                token.span,
                format!("expected expression, found {}", token.kind),
            )),
        }
    }

    /// Parse `'new' (id '(' Args? ')' | 'int' '[' Expr ']' | id '[' Expr ']')`.
    fn parse_new(&mut self) -> Result<Expr> {
        let start = self.expect(TokenKind::New)?.span;

        let element = if self.eat(TokenKind::Int).is_some() {
            TypeDenoter::Int
        } else {
            let name = self.expect_identifier()?;
            if self.check(TokenKind::LeftParen) {
                let args = self.parse_arguments()?;
                return Ok(Expr::NewObject(NewObjectExpr {
                    class: ClassType::new(name),
                    args,
                    span: self.span_from(start),
                }));
            }
            TypeDenoter::Class(ClassType::new(name))
        };

        self.expect(TokenKind::LeftBracket)?;
        let size = self.parse_expr()?;
        self.expect(TokenKind::RightBracket)?;
        Ok(Expr::NewArray(NewArrayExpr {
            element,
            size: Box::new(size),
            span: self.span_from(start),
        }))
    }

    /// Parse `('this' | id) ('.' id)*`.
    pub(super) fn parse_reference(&mut self) -> Result<Reference> {
        let mut reference = match self.eat(TokenKind::This) {
            Some(token) => Reference::this(token.span),
            None => Reference::id(self.expect_identifier()?),
        };

        while self.eat(TokenKind::Dot).is_some() {
            if let Some(token) = self.eat(TokenKind::This) {
                return Err(ParseError::new(
                    ParseErrorKind::ExpectedIdentifier,
                    token.span,
                    "'this' cannot follow '.'",
                ));
            }
            let id = self.expect_identifier()?;
            reference = Reference::qualified(reference, id);
        }

        Ok(reference)
    }

    /// Parse `'(' (Expr (',' Expr)*)? ')'`.
    pub(super) fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        self.expect(TokenKind::LeftParen)?;
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expr()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;
        Ok(args)
    }
}

fn literal(value: Literal, span: minijava_core::Span) -> Expr {
    Expr::Literal(LiteralExpr { value, span })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expr {
        let mut parser = Parser::new(source);
        let expr = parser
            .parse_expr()
            .unwrap_or_else(|err| panic!("parse failed: {err}"));
        assert!(parser.is_eof(), "trailing tokens after '{source}'");
        expr
    }

    fn binary(expr: &Expr) -> (&Expr, BinaryOp, &Expr) {
        match expr {
            Expr::Binary(b) => (&b.left, b.op, &b.right),
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter() {
        let e = expr("1 + 2 * 3");
        let (left, op, right) = binary(&e);
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(left, Expr::Literal(_)));
        assert_eq!(binary(right).1, BinaryOp::Mul);
    }

    #[test]
    fn left_associative() {
        let e = expr("10 - 3 - 2");
        let (left, op, _) = binary(&e);
        assert_eq!(op, BinaryOp::Sub);
        assert_eq!(binary(left).1, BinaryOp::Sub);
    }

    #[test]
    fn logical_precedence() {
        let e = expr("a || b && c == d < e");
        let (_, op, right) = binary(&e);
        assert_eq!(op, BinaryOp::Or);
        let (_, op, right) = binary(right);
        assert_eq!(op, BinaryOp::And);
        let (_, op, right) = binary(right);
        assert_eq!(op, BinaryOp::Equal);
        assert_eq!(binary(right).1, BinaryOp::Less);
    }

    #[test]
    fn parentheses_override() {
        let e = expr("(1 + 2) * 3");
        let (left, op, _) = binary(&e);
        assert_eq!(op, BinaryOp::Mul);
        assert_eq!(binary(left).1, BinaryOp::Add);
    }

    #[test]
    fn unary_operators() {
        let e = expr("!-x");
        let Expr::Unary(not) = &e else {
            panic!("expected unary");
        };
        assert_eq!(not.op, UnaryOp::Not);
        assert!(matches!(&*not.operand, Expr::Unary(neg) if neg.op == UnaryOp::Neg));
    }

    #[test]
    fn literals() {
        assert!(matches!(
            expr("42"),
            Expr::Literal(LiteralExpr { value: Literal::Int(42), .. })
        ));
        assert!(matches!(
            expr("null"),
            Expr::Literal(LiteralExpr { value: Literal::Null, .. })
        ));
    }

    #[test]
    fn references_index_and_calls() {
        assert!(matches!(expr("a.b.c"), Expr::Ref(Reference::Qualified(_))));
        assert!(matches!(expr("this"), Expr::Ref(Reference::This(_))));
        assert!(matches!(expr("xs[i + 1]"), Expr::Index(_)));
        let Expr::Call(call) = expr("o.f(1, g())") else {
            panic!("expected call");
        };
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.callee.name(), "f");
    }

    #[test]
    fn new_forms() {
        let Expr::NewObject(obj) = expr("new Point(1, 2)") else {
            panic!("expected new object");
        };
        assert_eq!(obj.class.name.name, "Point");
        assert_eq!(obj.args.len(), 2);

        let Expr::NewArray(ints) = expr("new int[10]") else {
            panic!("expected new array");
        };
        assert!(matches!(ints.element, TypeDenoter::Int));

        let Expr::NewArray(points) = expr("new Point[n]") else {
            panic!("expected new array");
        };
        assert!(matches!(points.element, TypeDenoter::Class(_)));
    }

    #[test]
    fn this_after_dot_is_error() {
        let mut parser = Parser::new("a.this");
        assert!(parser.parse_expr().is_err());
    }

    #[test]
    fn spans_cover_operands() {
        let e = expr("a + bc");
        assert_eq!(e.span().start, 0);
        assert_eq!(e.span().end, 6);
    }
}
