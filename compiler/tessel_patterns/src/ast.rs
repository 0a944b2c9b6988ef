//! Parse tree of a pattern-definition document.
//!
//! The tree is purely syntactic: operation names are unresolved strings,
//! `LOCAL`/`CONSTANT` are ordinary operations, and a bare identifier may be
//! either a group inclusion or a backreference. The pattern compiler gives
//! all of this meaning.

use crate::lexer::Span;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub groups: Vec<GroupDef>,
}

/// `name: conversion | conversion ... ;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupDef {
    pub name: String,
    pub span: Span,
    pub conversions: Vec<Conversion>,
}

/// `expr -> template`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    pub expr: Expr,
    pub template: Vec<Item>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// `(<capture> TYPE OP args...)`
    Op {
        capture: Option<String>,
        ty: Option<(String, Span)>,
        op: String,
        args: Vec<Expr>,
        span: Span,
    },
    /// `<capture> name` or bare `name`.
    Name {
        capture: Option<String>,
        name: String,
        span: Span,
    },
    /// Numeric argument (only meaningful under `CONSTANT`).
    Number { value: i64, span: Span },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Op { span, .. } | Expr::Name { span, .. } | Expr::Number { span, .. } => *span,
        }
    }
}

/// One bracketed template item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    Instruction {
        mnemonic: String,
        condition: Option<(String, Span)>,
        operands: Vec<Operand>,
        span: Span,
    },
    Label {
        name: String,
        span: Span,
    },
    Operand(Operand),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    /// `<a.b.lo:I16>`
    Reference {
        path: Vec<String>,
        ty: Option<(String, Span)>,
        span: Span,
    },
    /// `[term + term ...]`
    Memory { terms: Vec<MemTerm>, span: Span },
    /// Indexed-addressing shorthand `atom * scale`.
    Scaled {
        index: Box<Operand>,
        scale: i64,
        span: Span,
    },
    Number { value: i64, span: Span },
    Name { name: String, span: Span },
    Label { name: String, span: Span },
}

impl Operand {
    pub fn span(&self) -> Span {
        match self {
            Operand::Reference { span, .. }
            | Operand::Memory { span, .. }
            | Operand::Scaled { span, .. }
            | Operand::Number { span, .. }
            | Operand::Name { span, .. }
            | Operand::Label { span, .. } => *span,
        }
    }
}

/// A memory term: an atom with an optional `* scale`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemTerm {
    pub atom: Operand,
    pub scale: Option<i64>,
}
