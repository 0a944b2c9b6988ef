//! Errors raised while building pattern tables.
//!
//! Two classes, both fatal at start-up:
//!
//! - [`CompileError::Syntax`]: the pattern document does not lex or parse.
//! - [`CompileError::Definition`]: the document parses, but a pattern is
//!   malformed (unknown operation, unresolved backreference, ...). These are
//!   authoring defects in the pattern file, never user errors.

use tessel_ir::Operation;

use crate::lexer::Span;

/// A lexer or parser error with its location.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {}..{}", span.start, span.end)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxErrorKind {
    #[error("invalid character `{0}`")]
    InvalidCharacter(String),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    #[error("expected {expected}, found end of input")]
    UnexpectedEof { expected: &'static str },
}

/// A pattern authoring defect, located by group, ordinal and span.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("in `{group}` alternative {ordinal}: {kind}")]
pub struct DefinitionError {
    pub group: String,
    pub ordinal: usize,
    pub span: Span,
    pub kind: DefinitionErrorKind,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionErrorKind {
    #[error("backreference `{ident}` does not name an identifier introduced earlier in the pattern")]
    UnresolvedBackreference { ident: String },
    #[error("unknown operation `{name}`")]
    UnknownOperation { name: String },
    #[error("`{op}` takes {expected} argument(s), pattern gives {found}")]
    ArityMismatch {
        op: Operation,
        expected: usize,
        found: usize,
    },
    #[error("`{op}` has no fixed shape and cannot appear in a pattern")]
    NotMatchable { op: Operation },
    #[error("identifier `{ident}` is introduced more than once")]
    DuplicateIdentifier { ident: String },
    #[error("`{ident}` is reserved and cannot be captured")]
    ReservedIdentifier { ident: String },
    #[error("template refers to unknown identifier `{ident}`")]
    UnknownIdentifier { ident: String },
    #[error("unknown type `{name}`")]
    UnknownType { name: String },
    #[error("`<{ident}> {name}` includes an unknown group `{name}`")]
    UnknownGroup { ident: String, name: String },
    #[error("unknown condition code `{name}`")]
    UnknownCondition { name: String },
    #[error("invalid scale {scale}; expected 1, 2, 4 or 8")]
    InvalidScale { scale: i64 },
    #[error("`{mnemonic}` has {found} operands; at most 2 are allowed")]
    TooManyOperands { mnemonic: String, found: usize },
    #[error("invalid memory operand: {reason}")]
    InvalidMemoryOperand { reason: &'static str },
    #[error("numeric literal is only allowed as the argument of CONSTANT")]
    UnexpectedLiteral,
    #[error("`{shape}` takes {expected}")]
    MalformedSpecial {
        shape: &'static str,
        expected: &'static str,
    },
}

/// Failure to build pattern tables from a document.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("pattern definitions contain {} syntax error(s)", .0.len())]
    Syntax(Vec<SyntaxError>),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn definition_error_names_its_location() {
        let err = DefinitionError {
            group: "arith".to_owned(),
            ordinal: 2,
            span: Span::new(4, 9),
            kind: DefinitionErrorKind::UnresolvedBackreference {
                ident: "addr".to_owned(),
            },
        };
        assert_eq!(
            err.to_string(),
            "in `arith` alternative 2: backreference `addr` does not name an \
             identifier introduced earlier in the pattern"
        );
    }

    #[test]
    fn syntax_error_counts() {
        let err = CompileError::Syntax(vec![
            SyntaxError {
                kind: SyntaxErrorKind::InvalidCharacter("$".to_owned()),
                span: Span::new(0, 1),
            },
            SyntaxError {
                kind: SyntaxErrorKind::UnexpectedEof { expected: "`;`" },
                span: Span::new(10, 10),
            },
        ]);
        assert_eq!(err.to_string(), "pattern definitions contain 2 syntax error(s)");
    }

    #[test]
    fn arity_mismatch_message() {
        let kind = DefinitionErrorKind::ArityMismatch {
            op: Operation::Add,
            expected: 2,
            found: 3,
        };
        assert_eq!(kind.to_string(), "`ADD` takes 2 argument(s), pattern gives 3");
    }
}
