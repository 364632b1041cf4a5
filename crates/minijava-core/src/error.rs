//! Unified error types for MiniJava.
//!
//! This module provides a consistent error type hierarchy for every phase of
//! processing: lexing, parsing, semantic analysis, code generation and execution.
//!
//! ## Error Hierarchy
//!
//! ```text
//! MiniJavaError (top-level wrapper)
//! ├── LexError          - Lexer/tokenization errors
//! ├── ParseError        - Parser errors (with ParseErrorKind)
//! ├── CompilationError  - Identification, type checking and code generation errors
//! └── RuntimeError      - Virtual machine errors
//! ```

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur during lexical analysis (tokenization).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// An unexpected character was encountered.
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    /// A block comment was not properly terminated.
    #[error("unterminated comment at {span}")]
    UnterminatedComment { span: Span },

    /// A numeric literal could not be parsed.
    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },
}

impl LexError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedComment { span } => *span,
            LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// An expression was expected.
    ExpectedExpression,
    /// A type was expected.
    ExpectedType,
    /// A statement was expected.
    ExpectedStatement,
    /// The statement is not allowed in this position.
    InvalidStatement,
    /// A class member was expected.
    ExpectedClassMember,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// The declaration is invalid.
    InvalidDeclaration,
    /// Invalid modifier for this context.
    InvalidModifier,
    /// Error reported by the lexer.
    InvalidSyntax,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::InvalidStatement => "invalid statement",
            ParseErrorKind::ExpectedClassMember => "expected class member",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::InvalidDeclaration => "invalid declaration",
            ParseErrorKind::InvalidModifier => "invalid modifier",
            ParseErrorKind::InvalidSyntax => "invalid syntax",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(
            ParseErrorKind::InvalidSyntax,
            err.span(),
            format!("lexer error: {err}"),
        )
    }
}

/// A collection of parse errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error.
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Whether no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// All recorded errors in report order.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Consume the collection.
    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

// ============================================================================
// Compilation Errors
// ============================================================================

/// Broad category of a compilation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Name resolution, duplicates, `this` misuse, visibility.
    Binding,
    /// Missing or duplicate program entry point.
    Structural,
    /// Operand, argument, return or index type mismatches.
    Type,
    /// A non-void method can fall off its end.
    Reachability,
    /// Code generation failures and free-form messages.
    Internal,
}

/// Errors reported by the semantic passes and the code generator.
///
/// Type names are carried as display strings because types are defined by the
/// AST crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    // ------------------------------------------------------------------
    // Binding
    // ------------------------------------------------------------------
    /// Two declarations of the same kind share a name in one scope.
    #[error("at {span}: duplicate {what} '{name}'")]
    Duplicate {
        what: &'static str,
        name: String,
        span: Span,
    },

    /// A local would hide a parameter or an enclosing local.
    #[error("at {span}: variable '{name}' is already defined in this method")]
    IllegalShadowing { name: String, span: Span },

    /// A type names a class that does not exist.
    #[error("at {span}: undefined class '{name}'")]
    UndefinedClass { name: String, span: Span },

    /// A name matches no local, parameter, field (or class, for chain heads).
    #[error("at {span}: '{name}' cannot be resolved")]
    UndefinedName { name: String, span: Span },

    /// A qualified name has no such field in the class on its left.
    #[error("at {span}: '{name}' is not a field of class '{class}'")]
    UndefinedField {
        name: String,
        class: String,
        span: Span,
    },

    /// A call names no method of the target class.
    #[error("at {span}: '{name}' is not a method of class '{class}'")]
    UndefinedMethod {
        name: String,
        class: String,
        span: Span,
    },

    /// The name is being declared and is read in its own initializer.
    #[error("at {span}: cannot use '{name}' in the midst of declaring it")]
    SelfReference { name: String, span: Span },

    /// `this` in a static method or static field initializer.
    #[error("at {span}: 'this' cannot be used in a static context")]
    ThisInStaticContext { span: Span },

    /// `this` on the left of an assignment or used as a callee.
    #[error("at {span}: 'this' cannot be {usage}")]
    IllegalThis { usage: &'static str, span: Span },

    /// An instance member used from a static context without an object.
    #[error("at {span}: cannot reference instance {what} '{name}' from a static context")]
    InstanceInStaticContext {
        what: &'static str,
        name: String,
        span: Span,
    },

    /// An instance member reached through a class name.
    #[error("at {span}: instance {what} '{name}' cannot be reached through class '{class}'")]
    InstanceThroughClass {
        what: &'static str,
        name: String,
        class: String,
        span: Span,
    },

    /// A private member accessed from another class.
    #[error("at {span}: '{name}' is private to class '{class}'")]
    PrivateAccess {
        name: String,
        class: String,
        span: Span,
    },

    /// A member access on something that is not an object.
    #[error("at {span}: cannot access member '{name}' of a non-object value")]
    NotAnObject { name: String, span: Span },

    /// An indexed reference whose declaration is not an array.
    #[error("at {span}: '{name}' is not an array")]
    NotAnArray { name: String, span: Span },

    /// `.length` used as an assignment target or callee.
    #[error("at {span}: array length cannot be {usage}")]
    ArrayLengthMisuse { usage: &'static str, span: Span },

    /// Instance fields may not carry initializers.
    #[error("at {span}: instance field '{name}' cannot have an initializer")]
    InstanceFieldInitializer { name: String, span: Span },

    /// A variable declaration as the sole body of `if`, `while` or `for`.
    #[error("at {span}: a variable declaration cannot be the body of a conditional statement")]
    ConditionalDeclaration { span: Span },

    /// A `for` clause holding a statement kind it does not allow.
    #[error("at {span}: invalid {clause} clause in 'for' statement")]
    InvalidForClause { clause: &'static str, span: Span },

    // ------------------------------------------------------------------
    // Structural
    // ------------------------------------------------------------------
    /// The program has no `public static void main(String[])`.
    #[error("program has no main method")]
    MissingMain,

    /// More than one method has the main shape.
    #[error("at {span}: duplicate main method")]
    DuplicateMain { span: Span },

    // ------------------------------------------------------------------
    // Type
    // ------------------------------------------------------------------
    /// A value's type does not match the expected type.
    #[error("at {span}: type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch {
        expected: String,
        found: String,
        span: Span,
    },

    /// Binary operator applied to operands it does not accept.
    #[error("at {span}: operator '{op}' cannot be applied to '{left}' and '{right}'")]
    InvalidOperands {
        op: String,
        left: String,
        right: String,
        span: Span,
    },

    /// Unary operator applied to an operand it does not accept.
    #[error("at {span}: operator '{op}' cannot be applied to '{operand}'")]
    InvalidOperand {
        op: String,
        operand: String,
        span: Span,
    },

    /// Call with the wrong number of arguments.
    #[error("at {span}: '{name}' expects {expected} argument(s), found {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    /// Indexing a value that is not an array.
    #[error("at {span}: cannot index a value of type '{ty}'")]
    NotIndexable { ty: String, span: Span },

    /// A condition that is not boolean.
    #[error("at {span}: condition must be 'boolean', found '{found}'")]
    NonBooleanCondition { found: String, span: Span },

    /// `return expr;` in a void method or constructor.
    #[error("at {span}: '{name}' is void and cannot return a value")]
    UnexpectedReturnValue { name: String, span: Span },

    /// `return;` in a method that must produce a value.
    #[error("at {span}: '{name}' must return a value of type '{expected}'")]
    MissingReturnValue {
        name: String,
        expected: String,
        span: Span,
    },

    // ------------------------------------------------------------------
    // Reachability
    // ------------------------------------------------------------------
    /// A non-void method has a path that falls off its end.
    #[error("at {span}: method '{name}' needs a return statement of type '{ty}'")]
    MissingReturn { name: String, ty: String, span: Span },

    // ------------------------------------------------------------------
    // Internal / free-form
    // ------------------------------------------------------------------
    /// A call target whose address was never emitted.
    #[error("unresolved call to '{name}' at code address {address}")]
    UnresolvedPatch { name: String, address: usize },

    /// A free-form message.
    #[error("at {span}: {message}")]
    Other { message: String, span: Span },
}

impl CompilationError {
    /// Get the span where this error occurred, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            CompilationError::Duplicate { span, .. }
            | CompilationError::IllegalShadowing { span, .. }
            | CompilationError::UndefinedClass { span, .. }
            | CompilationError::UndefinedName { span, .. }
            | CompilationError::UndefinedField { span, .. }
            | CompilationError::UndefinedMethod { span, .. }
            | CompilationError::SelfReference { span, .. }
            | CompilationError::ThisInStaticContext { span }
            | CompilationError::IllegalThis { span, .. }
            | CompilationError::InstanceInStaticContext { span, .. }
            | CompilationError::InstanceThroughClass { span, .. }
            | CompilationError::PrivateAccess { span, .. }
            | CompilationError::NotAnObject { span, .. }
            | CompilationError::NotAnArray { span, .. }
            | CompilationError::ArrayLengthMisuse { span, .. }
            | CompilationError::InstanceFieldInitializer { span, .. }
            | CompilationError::ConditionalDeclaration { span }
            | CompilationError::InvalidForClause { span, .. }
            | CompilationError::DuplicateMain { span }
            | CompilationError::TypeMismatch { span, .. }
            | CompilationError::InvalidOperands { span, .. }
            | CompilationError::InvalidOperand { span, .. }
            | CompilationError::ArgumentCount { span, .. }
            | CompilationError::NotIndexable { span, .. }
            | CompilationError::NonBooleanCondition { span, .. }
            | CompilationError::UnexpectedReturnValue { span, .. }
            | CompilationError::MissingReturnValue { span, .. }
            | CompilationError::MissingReturn { span, .. }
            | CompilationError::Other { span, .. } => Some(*span),
            CompilationError::MissingMain | CompilationError::UnresolvedPatch { .. } => None,
        }
    }

    /// The taxonomy bucket this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CompilationError::MissingMain | CompilationError::DuplicateMain { .. } => {
                ErrorCategory::Structural
            }
            CompilationError::TypeMismatch { .. }
            | CompilationError::InvalidOperands { .. }
            | CompilationError::InvalidOperand { .. }
            | CompilationError::ArgumentCount { .. }
            | CompilationError::NotIndexable { .. }
            | CompilationError::NonBooleanCondition { .. }
            | CompilationError::UnexpectedReturnValue { .. }
            | CompilationError::MissingReturnValue { .. } => ErrorCategory::Type,
            CompilationError::MissingReturn { .. } => ErrorCategory::Reachability,
            CompilationError::UnresolvedPatch { .. } | CompilationError::Other { .. } => {
                ErrorCategory::Internal
            }
            _ => ErrorCategory::Binding,
        }
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors raised by the virtual machine while executing a program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// A null object or array was dereferenced.
    #[error("null pointer dereference at code address {pc}")]
    NullPointer { pc: usize },

    /// An array index outside `0..len`.
    #[error("array index {index} out of bounds for length {len} at code address {pc}")]
    IndexOutOfBounds { index: i32, len: i32, pc: usize },

    /// `new T[n]` with a negative `n`.
    #[error("negative array size {size} at code address {pc}")]
    NegativeArraySize { size: i32, pc: usize },

    /// Integer division by zero.
    #[error("division by zero at code address {pc}")]
    DivisionByZero { pc: usize },

    /// The stack ran into the heap.
    #[error("stack overflow at code address {pc}")]
    StackOverflow { pc: usize },

    /// The heap ran into the stack.
    #[error("heap exhausted at code address {pc}")]
    HeapExhausted { pc: usize },

    /// A memory access outside the machine's data store.
    #[error("invalid data address {address} at code address {pc}")]
    InvalidAddress { address: i32, pc: usize },

    /// A malformed instruction or a jump outside the code segment.
    #[error("invalid instruction at code address {pc}: {detail}")]
    InvalidInstruction { pc: usize, detail: String },

    /// The configured step limit was reached.
    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },

    /// Writing program output failed.
    #[error("output error: {message}")]
    Output { message: String },
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// The unified error type for all MiniJava operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MiniJavaError {
    /// A lexer error.
    #[error(transparent)]
    Lex(#[from] LexError),

    /// One or more parse errors.
    #[error(transparent)]
    Parse(#[from] ParseErrors),

    /// Errors from identification, type checking or code generation.
    #[error("compilation failed with {} error(s)", .0.len())]
    Compilation(Vec<CompilationError>),

    /// A runtime error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl MiniJavaError {
    /// Check if this is a lexer error.
    pub fn is_lex(&self) -> bool {
        matches!(self, MiniJavaError::Lex(_))
    }

    /// Check if this is a parse error.
    pub fn is_parse(&self) -> bool {
        matches!(self, MiniJavaError::Parse(_))
    }

    /// Check if this is a compilation error.
    pub fn is_compilation(&self) -> bool {
        matches!(self, MiniJavaError::Compilation(_))
    }

    /// Check if this is a runtime error.
    pub fn is_runtime(&self) -> bool {
        matches!(self, MiniJavaError::Runtime(_))
    }
}

impl From<Vec<CompilationError>> for MiniJavaError {
    fn from(errors: Vec<CompilationError>) -> Self {
        MiniJavaError::Compilation(errors)
    }
}
