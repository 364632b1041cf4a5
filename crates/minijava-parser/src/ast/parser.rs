//! Parser infrastructure for MiniJava.
//!
//! Provides the main [`Parser`] struct with token navigation, error recording
//! and panic-mode recovery. The grammar lives in `decl_parser`,
//! `stmt_parser` and `expr_parser`.

use log::debug;
use minijava_core::{ParseError, ParseErrorKind, ParseErrors, Span};

use super::{DeclArena, Identifier, Package};
use crate::lexer::{Lexer, Token, TokenKind};

/// The main parser for MiniJava source code.
///
/// The whole source is tokenized up front; the parser then walks the token
/// buffer with arbitrary lookahead.
pub struct Parser<'src> {
    /// Tokenized source, always ending with `Eof`.
    pub(super) buffer: Vec<Token<'src>>,
    /// Current position in the buffer
    pub(super) position: usize,
    /// Accumulated parse errors
    pub(super) errors: ParseErrors,
    /// Declarations created while parsing
    pub(super) decls: DeclArena,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source code.
    pub fn new(source: &'src str) -> Self {
        let (buffer, lex_errors) = Lexer::new(source).tokenize();
        let mut errors = ParseErrors::new();
        for error in lex_errors {
            errors.push(error.into());
        }

        Self {
            buffer,
            position: 0,
            errors,
            decls: DeclArena::with_builtins(),
        }
    }

    /// Parse a complete program.
    ///
    /// Returns every error found if any occurred.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &'src str) -> Result<Package, ParseErrors> {
        let mut parser = Parser::new(source);
        let package = parser.parse_package();
        if parser.has_errors() {
            debug!("parsing failed with {} error(s)", parser.errors.len());
            Err(parser.take_errors())
        } else {
            debug!("parsed {} class(es)", package.classes.len());
            Ok(package)
        }
    }

    /// Parse leniently, returning the (possibly partial) package alongside
    /// any errors.
    pub fn parse_lenient(source: &'src str) -> (Package, ParseErrors) {
        let mut parser = Parser::new(source);
        let package = parser.parse_package();
        (package, parser.take_errors())
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take the errors, leaving an empty error collection.
    pub fn take_errors(&mut self) -> ParseErrors {
        std::mem::take(&mut self.errors)
    }

    // ========================================================================
    // Token Navigation
    // ========================================================================

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> &Token<'src> {
        self.peek_nth(0)
    }

    /// Peek ahead n tokens without consuming. Past the end this keeps
    /// returning `Eof`.
    pub fn peek_nth(&self, n: usize) -> &Token<'src> {
        let index = (self.position + n).min(self.buffer.len() - 1);
        &self.buffer[index]
    }

    /// Get the current token and advance to the next.
    pub fn advance(&mut self) -> Token<'src> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    /// The most recently consumed token's span.
    pub fn previous_span(&self) -> Span {
        if self.position == 0 {
            self.peek().span
        } else {
            self.buffer[self.position - 1].span
        }
    }

    /// Span from `start` through the most recently consumed token.
    pub fn span_from(&self, start: Span) -> Span {
        start.merge(self.previous_span())
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// If the current token matches the given kind, consume it and return Some.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Expect the current token to be of the given kind.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let token = *self.peek();
            Err(ParseError::expected_token(
                token.span,
                kind.description(),
                token.kind.description(),
            ))
        }
    }

    /// Expect an identifier and turn it into an unbound [`Identifier`].
    pub fn expect_identifier(&mut self) -> Result<Identifier, ParseError> {
        let token = *self.peek();
        if token.kind == TokenKind::Identifier {
            self.advance();
            Ok(Identifier::new(token.lexeme, token.span))
        } else {
            Err(ParseError::new(
                ParseErrorKind::ExpectedIdentifier,
                token.span,
                format!("expected identifier, found {}", token.kind),
            ))
        }
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Record a parse error.
    pub fn error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Skip tokens until a statement boundary.
    ///
    /// Consumes a trailing `;`; stops before `}` or a token that starts a
    /// statement.
    pub fn synchronize_statement(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Eof | TokenKind::RightBrace => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::If | TokenKind::While | TokenKind::For | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Skip tokens until the start of the next class member or the end of
    /// the class body.
    pub fn synchronize_member(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Eof => return,
                TokenKind::LeftBrace => depth += 1,
                TokenKind::RightBrace if depth == 0 => return,
                TokenKind::RightBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::Public | TokenKind::Private | TokenKind::Static if depth == 0 => {
                    return;
                }
                TokenKind::Class => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip tokens until the next `class` keyword.
    pub fn synchronize_class(&mut self) {
        while !self.is_eof() && !self.check(TokenKind::Class) {
            self.advance();
        }
    }
}
