//! Token types and definitions for the MiniJava lexer.

use minijava_core::Span;
use std::fmt;

/// A token from the source code.
///
/// The lexeme borrows from the source string being lexed.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'src> {
    /// The type of token.
    pub kind: TokenKind,
    /// The source text of this token.
    pub lexeme: &'src str,
    /// Location in source.
    pub span: Span,
}

impl<'src> Token<'src> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'src str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All possible token types in MiniJava.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals and names
    // =========================================
    /// Integer literal: `42`
    IntLiteral,
    /// Identifier: `count`, `Main`
    Identifier,

    // =========================================
    // Keywords
    // =========================================
    Class,
    Void,
    Public,
    Private,
    Static,
    Int,
    Boolean,
    This,
    Return,
    If,
    Else,
    While,
    For,
    True,
    False,
    New,
    Null,

    // =========================================
    // Operators
    // =========================================
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `==`
    EqualEqual,
    /// `!=`
    BangEqual,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `!`
    Bang,
    /// `=`
    Equal,

    // =========================================
    // Punctuation
    // =========================================
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Semicolon,
    Comma,
    Dot,

    // =========================================
    // Special
    // =========================================
    /// End of input.
    Eof,
    /// A lexical error; the error itself is held by the lexer.
    Error,
}

impl TokenKind {
    /// Human-readable description used in "expected X, found Y" messages.
    pub fn description(&self) -> &'static str {
        use TokenKind::*;
        match self {
            IntLiteral => "integer literal",
            Identifier => "identifier",
            Class => "'class'",
            Void => "'void'",
            Public => "'public'",
            Private => "'private'",
            Static => "'static'",
            Int => "'int'",
            Boolean => "'boolean'",
            This => "'this'",
            Return => "'return'",
            If => "'if'",
            Else => "'else'",
            While => "'while'",
            For => "'for'",
            True => "'true'",
            False => "'false'",
            New => "'new'",
            Null => "'null'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            Less => "'<'",
            LessEqual => "'<='",
            Greater => "'>'",
            GreaterEqual => "'>='",
            EqualEqual => "'=='",
            BangEqual => "'!='",
            AmpAmp => "'&&'",
            PipePipe => "'||'",
            Bang => "'!'",
            Equal => "'='",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBracket => "'['",
            RightBracket => "']'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Semicolon => "';'",
            Comma => "','",
            Dot => "'.'",
            Eof => "end of file",
            Error => "invalid token",
        }
    }

    /// Whether this token can begin a type.
    pub fn starts_type(&self) -> bool {
        matches!(
            self,
            TokenKind::Int | TokenKind::Boolean | TokenKind::Identifier
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Map a keyword string to its [`TokenKind`], or `None` if not a keyword.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match ident {
        "class" => Class,
        "void" => Void,
        "public" => Public,
        "private" => Private,
        "static" => Static,
        "int" => Int,
        "boolean" => Boolean,
        "this" => This,
        "return" => Return,
        "if" => If,
        "else" => Else,
        "while" => While,
        "for" => For,
        "true" => True,
        "false" => False,
        "new" => New,
        "null" => Null,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_recognized() {
        assert_eq!(lookup_keyword("class"), Some(TokenKind::Class));
        assert_eq!(lookup_keyword("null"), Some(TokenKind::Null));
        assert_eq!(lookup_keyword("String"), None);
        assert_eq!(lookup_keyword("bool"), None);
    }

    #[test]
    fn description_is_quoted() {
        assert_eq!(TokenKind::LeftBrace.to_string(), "'{'");
        assert_eq!(TokenKind::Identifier.to_string(), "identifier");
    }
}
