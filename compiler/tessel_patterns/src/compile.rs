//! Semantic pass: parse tree to [`Pattern`]s.
//!
//! Group names are collected before any conversion is compiled, so a group
//! may include groups defined later in the file. Within one conversion,
//! identifiers are introduced in a left-to-right walk of the expression
//! (an operation's own capture after its arguments), and a backreference
//! must name one introduced before it.

use rustc_hash::{FxHashMap, FxHashSet};
use tessel_ir::{AsmPart, Condition, Instruction, Memory, Operation, Reference, Register, ValueType};
use tracing::debug;

use crate::ast::{Conversion, Document, Expr, Item, MemTerm, Operand};
use crate::errors::{DefinitionError, DefinitionErrorKind};
use crate::lexer::Span;
use crate::model::{is_reserved, Pattern, PatternNode, TempRef};

/// Compile every conversion of `document`, in file order.
///
/// Alternatives of groups that share a name are numbered consecutively
/// across all their definitions.
pub fn compile_document(document: &Document) -> Result<Vec<Pattern>, DefinitionError> {
    let groups: FxHashSet<&str> = document.groups.iter().map(|g| g.name.as_str()).collect();
    let mut ordinals: FxHashMap<&str, usize> = FxHashMap::default();
    let mut patterns = Vec::new();

    for group in &document.groups {
        for conversion in &group.conversions {
            let ordinal = ordinals.entry(group.name.as_str()).or_insert(0);
            let compiler = ConversionCompiler {
                groups: &groups,
                group: &group.name,
                ordinal: *ordinal,
                introduced: FxHashSet::default(),
            };
            patterns.push(compiler.compile(conversion)?);
            *ordinal += 1;
        }
    }

    debug!(
        groups = groups.len(),
        patterns = patterns.len(),
        "compiled pattern document"
    );
    Ok(patterns)
}

fn is_valid_scale(scale: i64) -> bool {
    matches!(scale, 1 | 2 | 4 | 8)
}

struct ConversionCompiler<'a> {
    groups: &'a FxHashSet<&'a str>,
    group: &'a str,
    ordinal: usize,
    introduced: FxHashSet<String>,
}

type CResult<T> = Result<T, DefinitionError>;

impl ConversionCompiler<'_> {
    fn compile(mut self, conversion: &Conversion) -> CResult<Pattern> {
        let root = self.expr(&conversion.expr)?;
        let template = conversion
            .template
            .iter()
            .map(|item| self.item(item))
            .collect::<CResult<Vec<_>>>()?;
        Ok(Pattern::new(self.group, self.ordinal, root, template))
    }

    fn error(&self, span: Span, kind: DefinitionErrorKind) -> DefinitionError {
        DefinitionError {
            group: self.group.to_owned(),
            ordinal: self.ordinal,
            span,
            kind,
        }
    }

    fn introduce(&mut self, ident: &str, span: Span) -> CResult<()> {
        if is_reserved(ident) {
            return Err(self.error(
                span,
                DefinitionErrorKind::ReservedIdentifier {
                    ident: ident.to_owned(),
                },
            ));
        }
        if !self.introduced.insert(ident.to_owned()) {
            return Err(self.error(
                span,
                DefinitionErrorKind::DuplicateIdentifier {
                    ident: ident.to_owned(),
                },
            ));
        }
        Ok(())
    }

    fn resolve_type(&self, ty: Option<&(String, Span)>) -> CResult<Option<ValueType>> {
        ty.map(|(name, span)| {
            ValueType::from_name(name).ok_or_else(|| {
                self.error(*span, DefinitionErrorKind::UnknownType { name: name.clone() })
            })
        })
        .transpose()
    }

    // ── Expressions ─────────────────────────────────────────────────

    fn expr(&mut self, expr: &Expr) -> CResult<PatternNode> {
        match expr {
            Expr::Number { span, .. } => {
                Err(self.error(*span, DefinitionErrorKind::UnexpectedLiteral))
            }
            Expr::Name {
                capture,
                name,
                span,
            } => self.name(capture.as_deref(), name, *span),
            Expr::Op {
                capture,
                ty,
                op,
                args,
                span,
            } => {
                let ty = self.resolve_type(ty.as_ref())?;
                let node = match op.as_str() {
                    "LOCAL" => {
                        if !args.is_empty() {
                            return Err(self.error(
                                *span,
                                DefinitionErrorKind::MalformedSpecial {
                                    shape: "LOCAL",
                                    expected: "no arguments",
                                },
                            ));
                        }
                        PatternNode::Local {
                            ident: capture.clone(),
                            ty,
                        }
                    }
                    "CONSTANT" => {
                        let value = match args.as_slice() {
                            [] => None,
                            [Expr::Number { value, .. }] => Some(*value),
                            _ => {
                                return Err(self.error(
                                    *span,
                                    DefinitionErrorKind::MalformedSpecial {
                                        shape: "CONSTANT",
                                        expected: "at most one numeric argument",
                                    },
                                ))
                            }
                        };
                        PatternNode::Constant {
                            ident: capture.clone(),
                            ty,
                            value,
                        }
                    }
                    name => {
                        let op = self.operation(name, args.len(), *span)?;
                        let args = args
                            .iter()
                            .map(|arg| self.expr(arg))
                            .collect::<CResult<Vec<_>>>()?;
                        PatternNode::Node {
                            ident: capture.clone(),
                            ty,
                            op,
                            args,
                        }
                    }
                };
                if let Some(ident) = capture {
                    self.introduce(ident, *span)?;
                }
                Ok(node)
            }
        }
    }

    fn operation(&self, name: &str, found: usize, span: Span) -> CResult<Operation> {
        let op = Operation::from_name(name).ok_or_else(|| {
            self.error(
                span,
                DefinitionErrorKind::UnknownOperation {
                    name: name.to_owned(),
                },
            )
        })?;
        match op.arity() {
            None => Err(self.error(span, DefinitionErrorKind::NotMatchable { op })),
            Some(expected) if expected != found => Err(self.error(
                span,
                DefinitionErrorKind::ArityMismatch {
                    op,
                    expected,
                    found,
                },
            )),
            Some(_) => Ok(op),
        }
    }

    /// A bare name: group inclusion if a group has that name, otherwise a
    /// backreference.
    fn name(&mut self, capture: Option<&str>, name: &str, span: Span) -> CResult<PatternNode> {
        if self.groups.contains(name) {
            let ident = capture.unwrap_or(name);
            self.introduce(ident, span)?;
            return Ok(PatternNode::Subpattern {
                ident: ident.to_owned(),
                group: name.to_owned(),
            });
        }
        if let Some(ident) = capture {
            return Err(self.error(
                span,
                DefinitionErrorKind::UnknownGroup {
                    ident: ident.to_owned(),
                    name: name.to_owned(),
                },
            ));
        }
        if !self.introduced.contains(name) {
            return Err(self.error(
                span,
                DefinitionErrorKind::UnresolvedBackreference {
                    ident: name.to_owned(),
                },
            ));
        }
        Ok(PatternNode::Backreference {
            ident: name.to_owned(),
        })
    }

    // ── Templates ───────────────────────────────────────────────────

    fn item(&self, item: &Item) -> CResult<AsmPart> {
        match item {
            Item::Label { name, .. } => Ok(AsmPart::Label(name.clone())),
            Item::Operand(operand) => self.operand(operand),
            Item::Instruction {
                mnemonic,
                condition,
                operands,
                span,
            } => {
                if operands.len() > 2 {
                    return Err(self.error(
                        *span,
                        DefinitionErrorKind::TooManyOperands {
                            mnemonic: mnemonic.clone(),
                            found: operands.len(),
                        },
                    ));
                }
                let condition = condition
                    .as_ref()
                    .map(|(name, span)| {
                        Condition::from_name(name).ok_or_else(|| {
                            self.error(
                                *span,
                                DefinitionErrorKind::UnknownCondition { name: name.clone() },
                            )
                        })
                    })
                    .transpose()?;
                let mut inst = Instruction::new(
                    mnemonic.clone(),
                    operands
                        .iter()
                        .map(|op| self.operand(op))
                        .collect::<CResult<Vec<_>>>()?,
                );
                inst.condition = condition;
                Ok(AsmPart::Instruction(inst))
            }
        }
    }

    fn operand(&self, operand: &Operand) -> CResult<AsmPart> {
        match operand {
            Operand::Number { value, .. } => Ok(AsmPart::imm(*value)),
            Operand::Label { name, .. } => Ok(AsmPart::Label(name.clone())),
            Operand::Name { name, .. } => Ok(Register::from_name(name)
                .map_or_else(|| AsmPart::Symbol(name.clone()), AsmPart::Register)),
            Operand::Reference { path, ty, span } => self.reference(path, ty.as_ref(), *span),
            Operand::Scaled { index, scale, span } => {
                let index = self.operand(index)?;
                let scale = self.scale(*scale, *span)?;
                Ok(AsmPart::Memory(Memory::default().with_index(index, scale)))
            }
            Operand::Memory { terms, span } => self.memory(terms, *span),
        }
    }

    fn reference(
        &self,
        path: &[String],
        ty: Option<&(String, Span)>,
        span: Span,
    ) -> CResult<AsmPart> {
        let mut path = path.to_vec();
        let half = match path.last().map(String::as_str) {
            Some("lo") if path.len() > 1 => Some(tessel_ir::Half::Low),
            Some("hi") if path.len() > 1 => Some(tessel_ir::Half::High),
            _ => None,
        };
        if half.is_some() {
            path.pop();
        }

        let head = path.first().map_or("", String::as_str);
        let known =
            head == "out" || TempRef::parse(head).is_some() || self.introduced.contains(head);
        if !known {
            return Err(self.error(
                span,
                DefinitionErrorKind::UnknownIdentifier {
                    ident: head.to_owned(),
                },
            ));
        }

        let mut reference = Reference::new(path);
        reference.half = half;
        reference.ty = self.resolve_type(ty)?;
        Ok(AsmPart::Reference(reference))
    }

    fn scale(&self, scale: i64, span: Span) -> CResult<u8> {
        if is_valid_scale(scale) {
            Ok(u8::try_from(scale).unwrap_or(1))
        } else {
            Err(self.error(span, DefinitionErrorKind::InvalidScale { scale }))
        }
    }

    /// `[base + index*scale + offset]`: a numeric or symbolic term is the
    /// displacement, a scaled term the index, and unscaled registers or
    /// references fill base, then index.
    fn memory(&self, terms: &[MemTerm], span: Span) -> CResult<AsmPart> {
        let invalid =
            |reason| self.error(span, DefinitionErrorKind::InvalidMemoryOperand { reason });
        let mut memory = Memory {
            scale: 1,
            ..Memory::default()
        };

        for term in terms {
            if matches!(
                term.atom,
                Operand::Memory { .. } | Operand::Scaled { .. }
            ) {
                return Err(invalid("nested memory operand"));
            }
            if matches!(term.atom, Operand::Label { .. }) {
                return Err(invalid("label inside memory operand"));
            }
            let part = self.operand(&term.atom)?;

            if let Some(scale) = term.scale {
                if memory.index.is_some() {
                    return Err(invalid("more than one index"));
                }
                let scale = self.scale(scale, span)?;
                memory = memory.with_index(part, scale);
            } else if part.is_constant() {
                if memory.offset.is_some() {
                    return Err(invalid("more than one displacement"));
                }
                memory.offset = Some(Box::new(part));
            } else if memory.base.is_none() {
                memory.base = Some(Box::new(part));
            } else if memory.index.is_none() {
                memory = memory.with_index(part, 1);
            } else {
                return Err(invalid("more than two registers"));
            }
        }

        Ok(AsmPart::Memory(memory))
    }
}
