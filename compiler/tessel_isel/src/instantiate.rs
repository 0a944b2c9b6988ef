//! Template substitution.
//!
//! A match may carry several successful alternatives per subpattern
//! identifier, and each alternative may itself instantiate several ways.
//! [`Instantiations`] walks the Cartesian product of those choices lazily,
//! one combination per `next()`, substituting the template once for each.
//!
//! A combination whose substitution fails (a half of a link-time symbol,
//! a multi-part output used as an operand, ...) is dropped and logged; the
//! other combinations are unaffected.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tessel_ir::{AsmPart, Immediate, Instruction, Memory, NodeId, Reference, ValueType};
use tessel_patterns::{PatternNode, TempRef};
use tracing::trace;

use crate::context::BlockCx;
use crate::errors::SubstError;
use crate::match_data::MatchData;
use crate::slice::slice;
use crate::stack::ensure_sufficient_stack;
use crate::tile::{Tile, TileSource};

/// One substituted template for one combination of sub-choices.
#[derive(Debug)]
pub struct Instantiation<'m, 'p> {
    pub data: &'m MatchData<'p>,
    pub parts: Vec<AsmPart>,
    pub covered: BTreeSet<NodeId>,
    pub inputs: BTreeSet<NodeId>,
    /// The sub-instantiation chosen for each subpattern identifier.
    pub chosen: BTreeMap<String, Rc<Instantiation<'m, 'p>>>,
}

impl Instantiation<'_, '_> {
    pub fn into_tile(self) -> Tile {
        Tile {
            root: self.data.root,
            covered: self.covered,
            inputs: self.inputs,
            parts: self.parts,
            source: TileSource::Pattern {
                group: self.data.pattern.group.clone(),
                ordinal: self.data.pattern.ordinal,
            },
        }
    }
}

/// Lazy enumeration of every instantiation of a match.
pub struct Instantiations<'m, 'p, 'c> {
    cx: &'c BlockCx<'c>,
    data: &'m MatchData<'p>,
    idents: Vec<&'m str>,
    choices: Vec<Vec<Rc<Instantiation<'m, 'p>>>>,
    odometer: Vec<usize>,
    exhausted: bool,
}

impl<'m, 'p, 'c> Instantiations<'m, 'p, 'c> {
    pub fn new(cx: &'c BlockCx<'c>, data: &'m MatchData<'p>) -> Self {
        let mut idents = Vec::with_capacity(data.submatches.len());
        let mut choices = Vec::with_capacity(data.submatches.len());
        for (ident, alternatives) in &data.submatches {
            let options: Vec<_> = alternatives
                .iter()
                .flat_map(|alt| {
                    ensure_sufficient_stack(|| Instantiations::new(cx, alt).collect::<Vec<_>>())
                })
                .map(Rc::new)
                .collect();
            idents.push(ident.as_str());
            choices.push(options);
        }
        let exhausted = choices.iter().any(Vec::is_empty);
        Self {
            cx,
            data,
            odometer: vec![0; idents.len()],
            idents,
            choices,
            exhausted,
        }
    }

    /// Step to the next combination; the rightmost identifier varies fastest.
    fn advance(&mut self) {
        for (digit, options) in self.odometer.iter_mut().zip(&self.choices).rev() {
            *digit += 1;
            if *digit < options.len() {
                return;
            }
            *digit = 0;
        }
        self.exhausted = true;
    }
}

impl<'m, 'p> Iterator for Instantiations<'m, 'p, '_> {
    type Item = Instantiation<'m, 'p>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            let chosen: BTreeMap<String, Rc<Instantiation<'m, 'p>>> = self
                .idents
                .iter()
                .zip(&self.odometer)
                .zip(&self.choices)
                .map(|((ident, &i), options)| ((*ident).to_owned(), Rc::clone(&options[i])))
                .collect();
            self.advance();

            match substitute(self.cx, self.data, chosen) {
                Ok(inst) => return Some(inst),
                Err(err) => trace!(
                    node = %self.data.root,
                    group = %self.data.pattern.group,
                    ordinal = self.data.pattern.ordinal,
                    %err,
                    "dropped combination"
                ),
            }
        }
        None
    }
}

fn substitute<'m, 'p>(
    cx: &BlockCx<'_>,
    data: &'m MatchData<'p>,
    chosen: BTreeMap<String, Rc<Instantiation<'m, 'p>>>,
) -> Result<Instantiation<'m, 'p>, SubstError> {
    let mut subst = Substituter {
        cx,
        data,
        chosen: &chosen,
        temps: FxHashMap::default(),
    };
    let parts = data
        .pattern
        .template
        .iter()
        .map(|part| subst.part(part))
        .collect::<Result<Vec<_>, _>>()?;

    let mut covered = data.covered.clone();
    let mut inputs = data.inputs.clone();
    for sub in chosen.values() {
        covered.extend(sub.covered.iter().copied());
        inputs.extend(sub.inputs.iter().copied());
    }
    inputs.retain(|n| !covered.contains(n));

    Ok(Instantiation {
        data,
        parts,
        covered,
        inputs,
        chosen,
    })
}

// ── Substitution ────────────────────────────────────────────────────

struct Substituter<'s, 'm, 'p> {
    cx: &'s BlockCx<'s>,
    data: &'m MatchData<'p>,
    chosen: &'s BTreeMap<String, Rc<Instantiation<'m, 'p>>>,
    /// Temporaries by full name, for this combination only.
    temps: FxHashMap<String, AsmPart>,
}

impl Substituter<'_, '_, '_> {
    fn part(&mut self, part: &AsmPart) -> Result<AsmPart, SubstError> {
        match part {
            AsmPart::Instruction(inst) => {
                let operands = inst
                    .operands
                    .iter()
                    .map(|op| self.part(op))
                    .collect::<Result<_, _>>()?;
                Ok(AsmPart::Instruction(Instruction {
                    mnemonic: inst.mnemonic.clone(),
                    condition: inst.condition,
                    operands,
                }))
            }
            AsmPart::Memory(mem) => self.memory(mem),
            AsmPart::Reference(r) => self.reference(r),
            other => Ok(other.clone()),
        }
    }

    fn reference(&mut self, r: &Reference) -> Result<AsmPart, SubstError> {
        let head = r.head();
        let resolved = match TempRef::parse(head) {
            Some(temp) => {
                if let Some(member) = r.path.get(1) {
                    return Err(SubstError::NotASubpattern {
                        ident: head.to_owned(),
                        member: member.clone(),
                    });
                }
                self.temp(head, temp)
            }
            None => resolve(self.cx, self.data, self.chosen, &r.path)?,
        };
        let resolved = match r.half {
            Some(half) => slice(&resolved, half)?,
            None => resolved,
        };
        Ok(match r.ty {
            Some(ty) => retype(resolved, ty),
            None => resolved,
        })
    }

    fn temp(&mut self, name: &str, temp: TempRef) -> AsmPart {
        if let Some(existing) = self.temps.get(name) {
            return existing.clone();
        }
        let ty = temp
            .width
            .or_else(|| self.cx.type_of(self.data.root))
            .unwrap_or(ValueType::I32);
        let fresh = self.cx.fresh_temp(ty);
        self.temps.insert(name.to_owned(), fresh.clone());
        fresh
    }

    /// Substitute the components of a memory template independently.
    fn memory(&mut self, mem: &Memory) -> Result<AsmPart, SubstError> {
        if mem.is_lone_base() {
            if let Some(base) = &mem.base {
                return match self.part(base)? {
                    AsmPart::Memory(inner) => Ok(AsmPart::Memory(inner)),
                    p if p.is_constant() => Ok(AsmPart::Memory(Memory {
                        scale: 1,
                        ..Memory::default()
                    }
                    .with_offset(p))),
                    p if p.is_register_like() => Ok(AsmPart::Memory(Memory::base(p))),
                    p => Err(invalid_memory(&p, "not an address component")),
                };
            }
        }

        let mut out = Memory {
            scale: 1,
            ..Memory::default()
        };
        let mut displacements = Vec::new();

        if let Some(base) = &mem.base {
            match self.part(base)? {
                p if p.is_constant() => displacements.push(p),
                p if p.is_register_like() => out.base = Some(Box::new(p)),
                p => return Err(invalid_memory(&p, "not a base register")),
            }
        }

        if let Some(index) = &mem.index {
            match self.part(index)? {
                AsmPart::Memory(inner) if inner.is_scaled_index() => {
                    if mem.scale != 1 {
                        return Err(invalid_memory(
                            &AsmPart::Memory(inner),
                            "scaled index is scaled again",
                        ));
                    }
                    out.index = inner.index;
                    out.scale = inner.scale;
                }
                AsmPart::Imm { value, ty } => displacements.push(AsmPart::Imm {
                    value: value.wrapping_mul(i64::from(mem.scale)),
                    ty,
                }),
                p if p.is_constant() && mem.scale == 1 => displacements.push(p),
                p if p.is_register_like() => {
                    out.index = Some(Box::new(p));
                    out.scale = mem.scale;
                }
                p => return Err(invalid_memory(&p, "not an index register")),
            }
        }

        if let Some(offset) = &mem.offset {
            match self.part(offset)? {
                p if p.is_constant() => displacements.push(p),
                p => return Err(invalid_memory(&p, "displacement is not a constant")),
            }
        }

        out.offset = fold_displacements(displacements)?.map(Box::new);
        if out.base.is_none() && out.index.is_none() && out.offset.is_none() {
            return Err(SubstError::InvalidMemory {
                part: "[]".to_owned(),
                reason: "empty memory operand",
            });
        }
        Ok(AsmPart::Memory(out))
    }
}

fn invalid_memory(part: &AsmPart, reason: &'static str) -> SubstError {
    SubstError::InvalidMemory {
        part: part.to_string(),
        reason,
    }
}

/// Sum constant displacements. Immediates fold; a symbol may only stand
/// alone.
fn fold_displacements(parts: Vec<AsmPart>) -> Result<Option<AsmPart>, SubstError> {
    let mut iter = parts.into_iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };
    iter.try_fold(first, |acc, next| match (&acc, &next) {
        (AsmPart::Imm { value: a, .. }, AsmPart::Imm { value: b, .. }) => {
            Ok(AsmPart::imm(a.wrapping_add(*b)))
        }
        _ => Err(invalid_memory(&next, "cannot combine with another displacement")),
    })
    .map(Some)
}

/// Apply a `:TYPE` override.
fn retype(part: AsmPart, ty: ValueType) -> AsmPart {
    match part {
        AsmPart::Value { value, half, .. } => AsmPart::Value { value, ty, half },
        AsmPart::Temp { id, half, .. } => AsmPart::Temp { id, ty, half },
        AsmPart::Imm { value, .. } => AsmPart::Imm {
            value,
            ty: Some(ty),
        },
        other => other,
    }
}

/// Resolve an identifier chain against one match and its chosen
/// sub-instantiations.
fn resolve(
    cx: &BlockCx<'_>,
    data: &MatchData<'_>,
    chosen: &BTreeMap<String, Rc<Instantiation<'_, '_>>>,
    path: &[String],
) -> Result<AsmPart, SubstError> {
    let Some((head, rest)) = path.split_first() else {
        return Err(SubstError::Unbound {
            ident: String::new(),
        });
    };

    if head == "out" {
        if let Some(member) = rest.first() {
            return Err(SubstError::NotASubpattern {
                ident: head.clone(),
                member: member.clone(),
            });
        }
        return cx
            .value_of(data.root)
            .ok_or(SubstError::NoValue { node: data.root });
    }
    if TempRef::parse(head).is_some() {
        return Err(SubstError::NestedTemporary);
    }

    if data.submatches.contains_key(head) {
        let sub = chosen.get(head).ok_or_else(|| SubstError::NoInstantiation {
            ident: head.clone(),
        })?;
        if rest.is_empty() {
            return match sub.parts.as_slice() {
                [single] => Ok(single.clone()),
                parts => Err(SubstError::MultiPartOperand {
                    ident: head.clone(),
                    parts: parts.len(),
                }),
            };
        }
        return resolve(cx, sub.data, &sub.chosen, rest);
    }

    if let Some(&node) = data.bindings.get(head) {
        if let Some(member) = rest.first() {
            return Err(SubstError::NotASubpattern {
                ident: head.clone(),
                member: member.clone(),
            });
        }
        return match data.pattern.lookup(head) {
            Some(PatternNode::Constant { .. }) => constant(cx, node),
            _ => cx.value_of(node).ok_or(SubstError::NoValue { node }),
        };
    }

    if data.pattern.lookup(head).is_some() {
        Err(SubstError::Unbound {
            ident: head.clone(),
        })
    } else {
        Err(SubstError::UnknownIdentifier {
            ident: head.clone(),
            group: data.pattern.group.clone(),
        })
    }
}

/// A node captured by a `CONSTANT` shape: literals and symbols inline.
fn constant(cx: &BlockCx<'_>, node: NodeId) -> Result<AsmPart, SubstError> {
    match &cx.node(node).imm {
        Some(Immediate::Int(value)) => Ok(AsmPart::Imm {
            value: *value,
            ty: cx.type_of(node),
        }),
        Some(Immediate::Symbol(name)) => Ok(AsmPart::Symbol(name.clone())),
        _ => cx.value_of(node).ok_or(SubstError::NoValue { node }),
    }
}

#[cfg(test)]
mod tests;
