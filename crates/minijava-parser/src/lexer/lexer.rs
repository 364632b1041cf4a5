//! Main lexer implementation for MiniJava.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s, dispatching
//! on the first character of each token.

use minijava_core::{LexError, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for MiniJava source code.
pub struct Lexer<'src> {
    /// Low-level character cursor.
    cursor: Cursor<'src>,
    /// Accumulated errors.
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            errors: Vec::new(),
        }
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Tokenize the whole input, ending with an `Eof` token.
    pub fn tokenize(mut self) -> (Vec<Token<'src>>, Vec<LexError>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        (tokens, self.errors)
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        loop {
            self.skip_whitespace();

            if self.cursor.is_eof() {
                return self.make_eof();
            }

            let start = self.start();

            let Some(c) = self.cursor.peek() else {
                return self.make_eof();
            };

            return match c {
                '/' => match self.cursor.peek_nth(1) {
                    Some('/') => {
                        self.skip_line_comment();
                        continue;
                    }
                    Some('*') => match self.skip_block_comment(start) {
                        Some(token) => token,
                        None => continue,
                    },
                    _ => {
                        self.cursor.advance();
                        self.make_token(TokenKind::Slash, start)
                    }
                },
                c if c.is_ascii_digit() => self.scan_number(start),
                c if is_ident_start(c) => self.scan_identifier(start),
                _ => self.scan_operator(start),
            };
        }
    }

    // =========================================
    // Internal: helpers
    // =========================================

    fn start(&self) -> (u32, u32, u32) {
        (self.cursor.offset(), self.cursor.line(), self.cursor.column())
    }

    fn span_from(&self, (offset, line, col): (u32, u32, u32)) -> Span {
        Span::new(offset, self.cursor.offset(), line, col)
    }

    fn skip_whitespace(&mut self) {
        self.cursor.eat_while(|c| c.is_ascii_whitespace());
    }

    fn make_eof(&self) -> Token<'src> {
        let span = Span::point(self.cursor.offset(), self.cursor.line(), self.cursor.column());
        Token::new(TokenKind::Eof, "", span)
    }

    fn make_token(&self, kind: TokenKind, start: (u32, u32, u32)) -> Token<'src> {
        let span = self.span_from(start);
        let lexeme = &self.cursor.source()[span.start as usize..span.end as usize];
        Token::new(kind, lexeme, span)
    }

    fn make_error(&mut self, error: LexError) -> Token<'src> {
        let span = error.span();
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }

    // =========================================
    // Scanning: comments
    // =========================================

    fn skip_line_comment(&mut self) {
        self.cursor.eat_while(|c| c != '\n');
    }

    /// Skip a block comment, returning an error token if it never closes.
    fn skip_block_comment(&mut self, start: (u32, u32, u32)) -> Option<Token<'src>> {
        self.cursor.advance();
        self.cursor.advance();
        loop {
            match self.cursor.advance() {
                None => {
                    let span = self.span_from(start);
                    return Some(self.make_error(LexError::UnterminatedComment { span }));
                }
                Some('*') if self.cursor.eat('/') => return None,
                Some(_) => {}
            }
        }
    }

    // =========================================
    // Scanning: literals and names
    // =========================================

    fn scan_number(&mut self, start: (u32, u32, u32)) -> Token<'src> {
        let digits = self.cursor.eat_while(|c| c.is_ascii_digit());
        if digits.parse::<i32>().is_err() {
            let span = self.span_from(start);
            return self.make_error(LexError::InvalidNumber {
                span,
                detail: format!("'{digits}' does not fit in an int"),
            });
        }
        self.make_token(TokenKind::IntLiteral, start)
    }

    fn scan_identifier(&mut self, start: (u32, u32, u32)) -> Token<'src> {
        let text = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start)
    }

    // =========================================
    // Scanning: operators and punctuation
    // =========================================

    fn scan_operator(&mut self, start: (u32, u32, u32)) -> Token<'src> {
        let Some(c) = self.cursor.advance() else {
            return self.make_eof();
        };

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '<' if self.cursor.eat('=') => TokenKind::LessEqual,
            '<' => TokenKind::Less,
            '>' if self.cursor.eat('=') => TokenKind::GreaterEqual,
            '>' => TokenKind::Greater,
            '=' if self.cursor.eat('=') => TokenKind::EqualEqual,
            '=' => TokenKind::Equal,
            '!' if self.cursor.eat('=') => TokenKind::BangEqual,
            '!' => TokenKind::Bang,
            '&' if self.cursor.eat('&') => TokenKind::AmpAmp,
            '|' if self.cursor.eat('|') => TokenKind::PipePipe,
            ch => {
                let span = self.span_from(start);
                return self.make_error(LexError::UnexpectedChar { ch, span });
            }
        };

        self.make_token(kind, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::new(source).tokenize();
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_is_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
        assert_eq!(kinds("   \n\t"), vec![TokenKind::Eof]);
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("class Main { static int x; }"),
            vec![
                TokenKind::Class,
                TokenKind::Identifier,
                TokenKind::LeftBrace,
                TokenKind::Static,
                TokenKind::Int,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::RightBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            kinds("<= >= == != && || < > = !"),
            vec![
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Equal,
                TokenKind::Bang,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("a // line\n/* block\n comment */ b / c"),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Slash,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn spans_track_lines() {
        let (tokens, _) = Lexer::new("x\n  yy").tokenize();
        assert_eq!(tokens[1].lexeme, "yy");
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.col, 3);
        assert_eq!(tokens[1].span.start, 4);
        assert_eq!(tokens[1].span.end, 6);
    }

    #[test]
    fn unterminated_comment_is_error() {
        let (tokens, errors) = Lexer::new("a /* never closed").tokenize();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], LexError::UnterminatedComment { .. }));
        assert_eq!(tokens[1].kind, TokenKind::Error);
    }

    #[test]
    fn single_ampersand_is_error() {
        let (_, errors) = Lexer::new("a & b").tokenize();
        assert!(matches!(
            errors[0],
            LexError::UnexpectedChar { ch: '&', .. }
        ));
    }

    #[test]
    fn overflowing_literal_is_error() {
        let (_, errors) = Lexer::new("2147483648").tokenize();
        assert!(matches!(errors[0], LexError::InvalidNumber { .. }));

        let (tokens, errors) = Lexer::new("2147483647").tokenize();
        assert!(errors.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
    }
}
