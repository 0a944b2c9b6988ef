use pretty_assertions::assert_eq;
use tessel_ir::{Operation, ValueType};
use tessel_patterns::PatternTables;

use super::*;
use crate::matcher::Matcher;
use crate::test_helpers::{builder, tables};

fn expand(
    tables: &PatternTables,
    cx: &BlockCx<'_>,
    group: &str,
    ordinal: usize,
    node: NodeId,
) -> Vec<Tile> {
    let matcher = Matcher::new(tables, cx);
    let pattern = &tables.group(group)[ordinal];
    let Some(data) = matcher.match_pattern(node, pattern) else {
        return Vec::new();
    };
    Instantiations::new(cx, &data)
        .map(Instantiation::into_tile)
        .collect()
}

fn asm(tiles: &[Tile]) -> Vec<Vec<String>> {
    tiles.iter().map(Tile::asm).collect()
}

const SRC: &str = "
src: (<r> LOCAL) -> [<r>] | (<c> CONSTANT) -> [<c>];
";

#[test]
fn plain_substitution() {
    let t = tables("add: (ADD (<a> LOCAL) (<b> LOCAL)) -> [MOV <out>, <a>] [ADD <out>, <b>];");
    let mut b = builder();
    let x = b.arg(0, ValueType::I32);
    let y = b.arg(1, ValueType::I32);
    let add = b.op(Operation::Add, ValueType::I32, &[x, y]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    let tiles = expand(&t, &cx, "add", 0, add);
    assert_eq!(asm(&tiles), vec![vec!["MOV %2, %0", "ADD %2, %1"]]);
    assert_eq!(tiles[0].covered, BTreeSet::from([add]));
    assert_eq!(tiles[0].inputs, BTreeSet::from([x, y]));
    assert_eq!(
        tiles[0].source,
        TileSource::Pattern {
            group: "add".to_owned(),
            ordinal: 0
        }
    );
}

#[test]
fn locals_substitute_their_value_even_for_literals() {
    let t = tables(
        "by_value: (NEG (<a> LOCAL)) -> [MOV <out>, <a>]; \
         inline: (NEG (<c> CONSTANT)) -> [MOV <out>, <c>];",
    );
    let mut b = builder();
    let five = b.int(5, ValueType::I32);
    let neg = b.op(Operation::Neg, ValueType::I32, &[five]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    let by_value = expand(&t, &cx, "by_value", 0, neg);
    assert_eq!(asm(&by_value), vec![vec!["MOV %1, %0"]]);
    assert_eq!(by_value[0].covered, BTreeSet::from([neg]));
    assert_eq!(by_value[0].inputs, BTreeSet::from([five]));

    let inline = expand(&t, &cx, "inline", 0, neg);
    assert_eq!(asm(&inline), vec![vec!["MOV %1, 5"]]);
    assert_eq!(inline[0].covered, BTreeSet::from([neg, five]));
    assert!(inline[0].inputs.is_empty());
}

#[test]
fn every_alternative_of_a_subpattern_instantiates() {
    let t = tables(&format!(
        "{SRC} add: (ADD (<a> LOCAL) <b> src) -> [MOV <out>, <a>] [ADD <out>, <b>];"
    ));
    let mut b = builder();
    let x = b.arg(0, ValueType::I32);
    let five = b.int(5, ValueType::I32);
    let add = b.op(Operation::Add, ValueType::I32, &[x, five]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    let tiles = expand(&t, &cx, "add", 0, add);
    assert_eq!(
        asm(&tiles),
        vec![
            vec!["MOV %2, %0", "ADD %2, %1"],
            vec!["MOV %2, %0", "ADD %2, 5"],
        ]
    );
    // The constant is read in the first tile and folded into the second.
    assert_eq!(tiles[0].covered, BTreeSet::from([add]));
    assert_eq!(tiles[0].inputs, BTreeSet::from([x, five]));
    assert_eq!(tiles[1].covered, BTreeSet::from([add, five]));
    assert_eq!(tiles[1].inputs, BTreeSet::from([x]));
}

#[test]
fn distinct_identifiers_multiply() {
    let t = tables(&format!(
        "{SRC} add: (ADD <x> src <y> src) -> [MOV <out>, <x>] [ADD <out>, <y>];"
    ));
    let mut b = builder();
    let c3 = b.int(3, ValueType::I32);
    let c4 = b.int(4, ValueType::I32);
    let add = b.op(Operation::Add, ValueType::I32, &[c3, c4]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    assert_eq!(
        asm(&expand(&t, &cx, "add", 0, add)),
        vec![
            vec!["MOV %2, %0", "ADD %2, %1"],
            vec!["MOV %2, %0", "ADD %2, 4"],
            vec!["MOV %2, 3", "ADD %2, %1"],
            vec!["MOV %2, 3", "ADD %2, 4"],
        ]
    );
}

#[test]
fn a_repeated_identifier_uses_one_choice() {
    let t = tables(&format!(
        "{SRC} sub: (SUB <x> src x) -> [MOV <out>, <x>] [SUB <out>, <x>];"
    ));
    let mut b = builder();
    let c = b.int(3, ValueType::I32);
    let sub = b.op(Operation::Sub, ValueType::I32, &[c, c]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    assert_eq!(
        asm(&expand(&t, &cx, "sub", 0, sub)),
        vec![
            vec!["MOV %1, %0", "SUB %1, %0"],
            vec!["MOV %1, 3", "SUB %1, 3"],
        ]
    );
}

#[test]
fn temporaries_are_shared_per_name() {
    let t = tables(
        "rmw: (ADD (<a> LOCAL) (<b> LOCAL))
            -> [MOV <tmp>, <a>] [ADD <tmp>, <b>] [MOV <out>, <tmp>] [MOV <tmp8_flag>, 0];",
    );
    let mut b = builder();
    let x = b.arg(0, ValueType::I16);
    let y = b.arg(1, ValueType::I16);
    let add = b.op(Operation::Add, ValueType::I16, &[x, y]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    let tiles = expand(&t, &cx, "rmw", 0, add);
    assert_eq!(
        asm(&tiles),
        vec![vec!["MOV t0, %0", "ADD t0, %1", "MOV %2, t0", "MOV t1, 0"]]
    );
    let widths: Vec<_> = tiles[0]
        .parts
        .iter()
        .filter_map(|p| match p {
            AsmPart::Instruction(inst) => match inst.operands.first() {
                Some(AsmPart::Temp { ty, .. }) => Some(*ty),
                _ => None,
            },
            _ => None,
        })
        .collect();
    assert_eq!(widths, vec![ValueType::I16, ValueType::I16, ValueType::I8]);
}

#[test]
fn halves_fold_constants_and_refuse_symbols() {
    let t = tables(
        "wide: (I64 ADD (<a> LOCAL) (<c> CONSTANT))
            -> [MOV <out.lo>, <c.lo>] [MOV <out.hi>, <c.hi>];",
    );
    let mut b = builder();
    let x = b.arg(0, ValueType::I64);
    let k = b.int(0x1_0000_0002, ValueType::I64);
    let add = b.op(Operation::Add, ValueType::I64, &[x, k]);
    let g = b.global("table");
    let add_sym = b.op(Operation::Add, ValueType::I64, &[x, g]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    assert_eq!(
        asm(&expand(&t, &cx, "wide", 0, add)),
        vec![vec!["MOV %2.lo, 2", "MOV %2.hi, 1"]]
    );
    assert!(expand(&t, &cx, "wide", 0, add_sym).is_empty());
}

#[test]
fn type_overrides() {
    let t = tables("trunc: (I8 TRUNC (<a> I32 LOCAL)) -> [MOV <out>, <a:I8>];");
    let mut b = builder();
    let x = b.arg(0, ValueType::I32);
    let tr = b.op(Operation::Trunc, ValueType::I8, &[x]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    let tiles = expand(&t, &cx, "trunc", 0, tr);
    let Some(AsmPart::Instruction(inst)) = tiles.first().and_then(|t| t.parts.first()) else {
        panic!("expected one instruction, got {tiles:?}");
    };
    assert_eq!(
        inst.operands[1],
        AsmPart::Value {
            value: tessel_ir::ValueId::new(0),
            ty: ValueType::I8,
            half: None
        }
    );
}

const ADDR: &str = "
addr:
    (<p> LOCAL) -> [[<p>]]
  | (ADD (<b> LOCAL) <i> index4) -> [[<b> + <i>]]
  | (ADD (<b> LOCAL) (<d> CONSTANT)) -> [[<b> + <d> + 4]]
  ;
index4: (SHL (<i> LOCAL) (CONSTANT 2)) -> [<i>*4];
load: (LOAD <m> addr) -> [MOV <out>, <m>];
";

#[test]
fn memory_operands() {
    let t = tables(ADDR);
    let mut b = builder();
    let base = b.arg(0, ValueType::I32);
    let i = b.arg(1, ValueType::I32);
    let two = b.int(2, ValueType::I32);
    let shl = b.op(Operation::Shl, ValueType::I32, &[i, two]);
    let scaled = b.op(Operation::Add, ValueType::I32, &[base, shl]);
    let load = b.load(ValueType::I32, scaled, None);
    let eight = b.int(8, ValueType::I32);
    let displaced = b.op(Operation::Add, ValueType::I32, &[base, eight]);
    let load2 = b.load(ValueType::I32, displaced, None);
    let g = b.global("counter");
    let load3 = b.load(ValueType::I32, g, None);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    let tiles = expand(&t, &cx, "load", 0, load);
    assert_eq!(
        asm(&tiles),
        vec![vec!["MOV %5, [%4]"], vec!["MOV %5, [%0 + %1*4]"]]
    );
    assert_eq!(tiles[1].covered, BTreeSet::from([load, scaled, shl, two]));
    assert_eq!(tiles[1].inputs, BTreeSet::from([base, i]));

    assert_eq!(
        asm(&expand(&t, &cx, "load", 0, load2)),
        vec![vec!["MOV %8, [%7]"], vec!["MOV %8, [%0 + 12]"]]
    );
    assert_eq!(
        asm(&expand(&t, &cx, "load", 0, load3)),
        vec![vec!["MOV %10, [%9]"]]
    );
}

#[test]
fn lone_constant_in_memory_is_a_displacement() {
    let t = tables("abs: (LOAD (<c> CONSTANT)) -> [MOV <out>, [<c>]];");
    let mut b = builder();
    let g = b.global("counter");
    let load = b.load(ValueType::I32, g, None);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    assert_eq!(
        asm(&expand(&t, &cx, "abs", 0, load)),
        vec![vec!["MOV %1, [counter]"]]
    );
}

#[test]
fn nested_members_resolve_through_the_subpattern() {
    let t = tables(
        "index4: (SHL (<i> LOCAL) (CONSTANT 2)) -> [<i>*4];
         mul: (MUL (<a> LOCAL) <s> index4) -> [MOV <out>, <a>] [IMUL <out>, <s.i>] [SHL <out>, 2];",
    );
    let mut b = builder();
    let x = b.arg(0, ValueType::I32);
    let i = b.arg(1, ValueType::I32);
    let two = b.int(2, ValueType::I32);
    let shl = b.op(Operation::Shl, ValueType::I32, &[i, two]);
    let mul = b.op(Operation::Mul, ValueType::I32, &[x, shl]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    assert_eq!(
        asm(&expand(&t, &cx, "mul", 0, mul)),
        vec![vec!["MOV %4, %0", "IMUL %4, %1", "SHL %4, 2"]]
    );
}

#[test]
fn multi_part_outputs_are_not_operands() {
    let t = tables(
        "frag: (NEG (<a> LOCAL)) -> [MOV <out>, <a>] [NEG <out>];
         top: (NOT <f> frag) -> [NOT <f>];",
    );
    let mut b = builder();
    let x = b.arg(0, ValueType::I32);
    let neg = b.op(Operation::Neg, ValueType::I32, &[x]);
    let not = b.op(Operation::Not, ValueType::I32, &[neg]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    assert!(expand(&t, &cx, "top", 0, not).is_empty());
}

#[test]
fn displacements_fold() {
    assert_eq!(
        fold_displacements(vec![AsmPart::imm(8), AsmPart::imm(-3)]),
        Ok(Some(AsmPart::imm(5)))
    );
    assert_eq!(fold_displacements(Vec::new()), Ok(None));
    assert!(fold_displacements(vec![AsmPart::Symbol("g".to_owned()), AsmPart::imm(4)]).is_err());
}
