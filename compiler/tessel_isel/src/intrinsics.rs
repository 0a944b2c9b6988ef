//! Fixed lowerings for operations that patterns do not describe.
//!
//! Leaves (arguments, literals, globals, stack slots), `SELECT`, calls and
//! control flow have one obvious lowering each. They bypass matching and
//! produce their tile directly; `SELECT` also offers a wider tile that
//! folds in the comparison feeding its condition.
//!
//! Calling convention: cdecl-style. Arguments are pushed right to left,
//! the caller pops them, the result comes back in `eax` (`edx:eax` for
//! 64-bit values). Incoming arguments sit at `[ebp + 8 + 4*i]`.

use std::collections::BTreeSet;

use tessel_ir::{
    AsmPart, Condition, DagNode, Half, Immediate, Instruction, Memory, NodeId, Operation,
    Register, ValueType,
};

use crate::context::BlockCx;
use crate::slice::slice;
use crate::tile::{IntrinsicKind, Tile, TileSource};

/// Intrinsic tiles for `id`, or `None` if its operation has no intrinsic
/// (or the node lacks what the intrinsic needs).
pub fn lower(cx: &BlockCx<'_>, id: NodeId) -> Option<Vec<Tile>> {
    let node = cx.node(id);
    let tiles = match node.op {
        Operation::Arg => vec![arg(cx, id, node)?],
        Operation::Constant => vec![constant(cx, id, node)?],
        Operation::Slot => vec![slot(cx, id, node)?],
        Operation::Select => select(cx, id, node)?,
        Operation::Call | Operation::CallVoid => vec![call(cx, id, node)?],
        Operation::Jump => vec![jump(id, node)?],
        Operation::Branch => vec![branch(cx, id, node)?],
        Operation::Return => vec![ret(cx, id, node)?],
        Operation::Entry => vec![tile(id, IntrinsicKind::Entry, [id], [], Vec::new())],
        _ => return None,
    };
    Some(tiles)
}

/// Condition code under which a comparison holds.
pub fn condition_of(op: Operation) -> Option<Condition> {
    Some(match op {
        Operation::Eq => Condition::Eq,
        Operation::Ne => Condition::Ne,
        Operation::Slt => Condition::Lt,
        Operation::Sle => Condition::Le,
        Operation::Sgt => Condition::Gt,
        Operation::Sge => Condition::Ge,
        Operation::Ult => Condition::B,
        Operation::Ule => Condition::Be,
        Operation::Ugt => Condition::A,
        Operation::Uge => Condition::Ae,
        _ => return None,
    })
}

// ── Helpers ─────────────────────────────────────────────────────────

fn tile(
    root: NodeId,
    kind: IntrinsicKind,
    covered: impl IntoIterator<Item = NodeId>,
    inputs: impl IntoIterator<Item = NodeId>,
    parts: Vec<AsmPart>,
) -> Tile {
    let covered: BTreeSet<NodeId> = covered.into_iter().collect();
    let inputs = inputs.into_iter().filter(|n| !covered.contains(n)).collect();
    Tile {
        root,
        covered,
        inputs,
        parts,
        source: TileSource::Intrinsic(kind),
    }
}

fn inst<const N: usize>(mnemonic: &str, operands: [AsmPart; N]) -> AsmPart {
    AsmPart::Instruction(Instruction::new(mnemonic, operands))
}

fn cond_inst<const N: usize>(mnemonic: &str, cond: Condition, operands: [AsmPart; N]) -> AsmPart {
    AsmPart::Instruction(Instruction::new(mnemonic, operands).with_condition(cond))
}

fn reg(r: Register) -> AsmPart {
    AsmPart::Register(r)
}

fn frame(offset: i64) -> AsmPart {
    AsmPart::Memory(Memory::base(reg(Register::EBP)).with_offset(AsmPart::imm(offset)))
}

/// `MOV dst, src`, split into two moves for 64-bit operands.
fn mov(parts: &mut Vec<AsmPart>, dst: &AsmPart, src: &AsmPart) -> Option<()> {
    if matches!(dst, AsmPart::Value { ty: ValueType::I64, .. }) {
        for half in [Half::Low, Half::High] {
            parts.push(inst("MOV", [slice(dst, half).ok()?, slice(src, half).ok()?]));
        }
    } else {
        parts.push(inst("MOV", [dst.clone(), src.clone()]));
    }
    Some(())
}

// ── Leaves ──────────────────────────────────────────────────────────

fn arg(cx: &BlockCx<'_>, id: NodeId, node: &DagNode) -> Option<Tile> {
    let Some(Immediate::Arg(index)) = node.imm else {
        return None;
    };
    let out = cx.value_of(id)?;
    let offset = 8 + 4 * i64::from(index);
    let mut parts = Vec::new();
    if cx.type_of(id) == Some(ValueType::I64) {
        parts.push(inst("MOV", [slice(&out, Half::Low).ok()?, frame(offset)]));
        parts.push(inst("MOV", [slice(&out, Half::High).ok()?, frame(offset + 4)]));
    } else {
        parts.push(inst("MOV", [out, frame(offset)]));
    }
    Some(tile(id, IntrinsicKind::Arg, [id], [], parts))
}

fn constant(cx: &BlockCx<'_>, id: NodeId, node: &DagNode) -> Option<Tile> {
    let out = cx.value_of(id)?;
    let src = match node.imm.as_ref()? {
        Immediate::Int(value) => AsmPart::Imm {
            value: *value,
            ty: cx.type_of(id),
        },
        Immediate::Symbol(name) => AsmPart::Symbol(name.clone()),
        Immediate::Arg(_) | Immediate::Slot { .. } => return None,
    };
    let mut parts = Vec::new();
    mov(&mut parts, &out, &src)?;
    Some(tile(id, IntrinsicKind::Constant, [id], [], parts))
}

fn slot(cx: &BlockCx<'_>, id: NodeId, node: &DagNode) -> Option<Tile> {
    let Some(Immediate::Slot { offset }) = node.imm else {
        return None;
    };
    let out = cx.value_of(id)?;
    let parts = vec![inst("LEA", [out, frame(i64::from(offset))])];
    Some(tile(id, IntrinsicKind::Slot, [id], [], parts))
}

// ── SELECT ──────────────────────────────────────────────────────────

/// `SELECT cond, a, b`: `out = cond ? a : b`.
fn select(cx: &BlockCx<'_>, id: NodeId, node: &DagNode) -> Option<Vec<Tile>> {
    let [cond, a, b] = node.inputs.as_slice() else {
        return None;
    };
    let (cond, a, b) = (*cond, *a, *b);
    let out = cx.value_of(id)?;
    let a_val = cx.value_of(a)?;
    let b_val = cx.value_of(b)?;
    let c_val = cx.value_of(cond)?;

    let mut tiles = vec![tile(
        id,
        IntrinsicKind::Select,
        [id],
        [cond, a, b],
        vec![
            inst("MOV", [out.clone(), b_val.clone()]),
            inst("TEST", [c_val.clone(), c_val]),
            cond_inst("CMOV", Condition::Ne, [out.clone(), a_val.clone()]),
        ],
    )];

    // Fold the comparison when the condition is computed in this block.
    let cmp = cx.node(cond);
    if let (Some(cc), [x, y]) = (condition_of(cmp.op), cmp.inputs.as_slice()) {
        if let (Some(x_val), Some(y_val)) = (cx.value_of(*x), cx.value_of(*y)) {
            tiles.push(tile(
                id,
                IntrinsicKind::SelectCompare,
                [id, cond],
                [a, b, *x, *y],
                vec![
                    inst("MOV", [out.clone(), b_val]),
                    inst("CMP", [x_val, y_val]),
                    cond_inst("CMOV", cc, [out, a_val]),
                ],
            ));
        }
    }
    Some(tiles)
}

// ── Calls ───────────────────────────────────────────────────────────

/// `CALL`/`CALLV`. A direct call names its target in the node's symbol
/// and every input is an argument; an indirect call takes the target as
/// its first input.
fn call(cx: &BlockCx<'_>, id: NodeId, node: &DagNode) -> Option<Tile> {
    let (target, args, mut inputs) = match &node.imm {
        Some(Immediate::Symbol(name)) => {
            (AsmPart::Symbol(name.clone()), &node.inputs[..], Vec::new())
        }
        _ => {
            let (&callee, args) = node.inputs.split_first()?;
            (cx.value_of(callee)?, args, vec![callee])
        }
    };
    inputs.extend_from_slice(args);

    let mut parts = Vec::new();
    for &arg in args.iter().rev() {
        let value = cx.value_of(arg)?;
        if matches!(value, AsmPart::Value { ty: ValueType::I64, .. }) {
            parts.push(inst("PUSH", [slice(&value, Half::High).ok()?]));
            parts.push(inst("PUSH", [slice(&value, Half::Low).ok()?]));
        } else {
            parts.push(inst("PUSH", [value]));
        }
    }
    parts.push(inst("CALL", [target]));

    let pushed: i64 = args
        .iter()
        .map(|&a| if cx.type_of(a) == Some(ValueType::I64) { 8 } else { 4 })
        .sum();
    if pushed > 0 {
        parts.push(inst("ADD", [reg(Register::ESP), AsmPart::imm(pushed)]));
    }

    if node.op == Operation::Call {
        let out = cx.value_of(id)?;
        if cx.type_of(id) == Some(ValueType::I64) {
            parts.push(inst("MOV", [slice(&out, Half::Low).ok()?, reg(Register::EAX)]));
            parts.push(inst("MOV", [slice(&out, Half::High).ok()?, reg(Register::EDX)]));
        } else {
            parts.push(inst("MOV", [out, reg(Register::EAX)]));
        }
    }

    Some(tile(id, IntrinsicKind::Call, [id], inputs, parts))
}

// ── Control flow ────────────────────────────────────────────────────

fn label(name: &str) -> AsmPart {
    AsmPart::Label(name.to_owned())
}

fn jump(id: NodeId, node: &DagNode) -> Option<Tile> {
    let target = node.targets().first()?;
    let parts = vec![inst("JMP", [label(target)])];
    Some(tile(id, IntrinsicKind::Jump, [id], [], parts))
}

/// `BRANCH cond` to `targets[0]` when non-zero, else `targets[1]`.
fn branch(cx: &BlockCx<'_>, id: NodeId, node: &DagNode) -> Option<Tile> {
    let cond = node.condition()?;
    let [then_target, else_target] = node.targets() else {
        return None;
    };
    let c = cx.value_of(cond)?;
    let parts = vec![
        inst("TEST", [c.clone(), c]),
        cond_inst("J", Condition::Ne, [label(then_target)]),
        inst("JMP", [label(else_target)]),
    ];
    Some(tile(id, IntrinsicKind::Branch, [id], [cond], parts))
}

fn ret(cx: &BlockCx<'_>, id: NodeId, node: &DagNode) -> Option<Tile> {
    let mut parts = Vec::new();
    match node.inputs.as_slice() {
        [] => {}
        [value] => {
            let v = cx.value_of(*value)?;
            if cx.type_of(*value) == Some(ValueType::I64) {
                parts.push(inst("MOV", [reg(Register::EAX), slice(&v, Half::Low).ok()?]));
                parts.push(inst("MOV", [reg(Register::EDX), slice(&v, Half::High).ok()?]));
            } else {
                parts.push(inst("MOV", [reg(Register::EAX), v]));
            }
        }
        _ => return None,
    }
    parts.push(inst("RET", []));
    Some(tile(id, IntrinsicKind::Return, [id], node.inputs.iter().copied(), parts))
}
