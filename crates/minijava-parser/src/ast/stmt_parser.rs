//! Statement parsing.

use minijava_core::{ParseError, ParseErrorKind};

use super::parser::Parser;
use super::{
    AssignStmt, BlockStmt, CallExpr, ForStmt, IfStmt, IndexAssignStmt, ReturnStmt, Stmt,
    VarDeclStmt, WhileStmt,
};
use crate::lexer::TokenKind;

type Result<T> = std::result::Result<T, ParseError>;

/// Which statement forms a simple statement may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SimpleContext {
    /// A full statement, or a `for` init clause.
    Any,
    /// A `for` update clause: no declarations.
    Update,
}

impl<'src> Parser<'src> {
    /// Parse statements until `}` or end of input, recovering from errors.
    pub(super) fn parse_statements(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_eof() {
            let before = self.position;
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    self.error(err);
                    self.synchronize_statement();
                    if self.position == before {
                        self.advance();
                    }
                }
            }
        }
        stmts
    }

    /// Parse a single statement.
    pub(super) fn parse_statement(&mut self) -> Result<Stmt> {
        match self.peek().kind {
            TokenKind::LeftBrace => self.parse_block(),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            _ => {
                let stmt = self.parse_simple_statement(SimpleContext::Any)?;
                self.expect(TokenKind::Semicolon)?;
                Ok(stmt)
            }
        }
    }

    /// Parse `'{' Stmt* '}'`.
    fn parse_block(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::LeftBrace)?.span;
        let stmts = self.parse_statements();
        self.expect(TokenKind::RightBrace)?;
        Ok(Stmt::Block(BlockStmt {
            stmts,
            span: self.span_from(start),
        }))
    }

    /// Parse `'return' Expr? ';'`.
    fn parse_return(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::Return)?.span;
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::Return(ReturnStmt {
            value,
            span: self.span_from(start),
        }))
    }

    /// Parse `'if' '(' Expr ')' Stmt ('else' Stmt)?`.
    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::If)?.span;
        self.expect(TokenKind::LeftParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RightParen)?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.eat(TokenKind::Else).is_some() {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt {
            cond,
            then_branch,
            else_branch,
            span: self.span_from(start),
        }))
    }

    /// Parse `'while' '(' Expr ')' Stmt`.
    fn parse_while(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::While)?.span;
        self.expect(TokenKind::LeftParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RightParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::While(WhileStmt {
            cond,
            body,
            span: self.span_from(start),
        }))
    }

    /// Parse `'for' '(' Init? ';' Expr? ';' Update? ')' Stmt`.
    fn parse_for(&mut self) -> Result<Stmt> {
        let start = self.expect(TokenKind::For)?.span;
        self.expect(TokenKind::LeftParen)?;

        let init = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_simple_statement(SimpleContext::Any)?))
        };
        self.expect(TokenKind::Semicolon)?;

        let cond = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semicolon)?;

        let update = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(Box::new(self.parse_simple_statement(SimpleContext::Update)?))
        };
        self.expect(TokenKind::RightParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::For(ForStmt {
            init,
            cond,
            update,
            body,
            span: self.span_from(start),
        }))
    }

    /// Parse a declaration, assignment, indexed assignment or call, without
    /// the trailing `;`.
    fn parse_simple_statement(&mut self, context: SimpleContext) -> Result<Stmt> {
        let start = self.peek().span;

        if self.at_var_decl() {
            if context == SimpleContext::Update {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidStatement,
                    start,
                    "a variable declaration cannot be a 'for' update",
                ));
            }
            let ty = self.parse_type()?;
            let name = self.expect_identifier()?;
            self.expect(TokenKind::Equal)?;
            let init = self.parse_expr()?;
            let decl = self.declare_local(name, ty);
            return Ok(Stmt::VarDecl(VarDeclStmt {
                decl,
                init,
                span: self.span_from(start),
            }));
        }

        if !matches!(self.peek().kind, TokenKind::This | TokenKind::Identifier) {
            let token = *self.peek();
            return Err(ParseError::new(
                ParseErrorKind::ExpectedStatement,
                token.span,
                format!("expected statement, found {}", token.kind),
            ));
        }

        let target = self.parse_reference()?;
        match self.peek().kind {
            TokenKind::Equal => {
                self.advance();
                let value = self.parse_expr()?;
                Ok(Stmt::Assign(AssignStmt {
                    target,
                    value,
                    span: self.span_from(start),
                }))
            }
            TokenKind::LeftBracket => {
                self.advance();
                let index = self.parse_expr()?;
                self.expect(TokenKind::RightBracket)?;
                self.expect(TokenKind::Equal)?;
                let value = self.parse_expr()?;
                Ok(Stmt::IndexAssign(IndexAssignStmt {
                    target,
                    index,
                    value,
                    span: self.span_from(start),
                }))
            }
            TokenKind::LeftParen => {
                let args = self.parse_arguments()?;
                Ok(Stmt::Call(CallExpr {
                    callee: target,
                    args,
                    span: self.span_from(start),
                }))
            }
            kind => Err(ParseError::expected_token(
                self.peek().span,
                "'=', '[' or '('",
                kind.description(),
            )),
        }
    }
}
