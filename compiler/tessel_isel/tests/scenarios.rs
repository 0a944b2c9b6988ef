//! End-to-end selection on small hand-built blocks.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use tessel_ir::{BlockContext, DagBuilder, NodeId, Operation, ValueType};
use tessel_isel::{
    BlockCx, Instantiation, Instantiations, Matcher, SelectConfig, Selector, Tile, TileSource,
};
use tessel_patterns::PatternTables;

fn builder() -> DagBuilder {
    DagBuilder::new(BlockContext {
        module: "demo".to_owned(),
        function: "sum".to_owned(),
        block: "entry".to_owned(),
    })
}

fn tables(source: &str) -> PatternTables {
    match PatternTables::from_source(source) {
        Ok(tables) => tables,
        Err(err) => panic!("patterns do not compile: {err}"),
    }
}

fn asm(tiles: &[Tile]) -> Vec<Vec<String>> {
    tiles.iter().map(Tile::asm).collect()
}

// ── Scenario A ──────────────────────────────────────────────────────

#[test]
fn single_add_yields_one_tile() {
    let t = tables("add: (<x> I32 ADD (<a> LOCAL) (<b> LOCAL)) -> [ADD <a>, <b>];");
    let mut b = builder();
    let x = b.arg(0, ValueType::I32);
    let y = b.arg(1, ValueType::I32);
    let add = b.op(Operation::Add, ValueType::I32, &[x, y]);
    let (dag, types) = b.finish();

    let selector = Selector::new(&t, SelectConfig::default());
    let Ok(tiles) = selector.select_block(&dag, &types) else {
        panic!("block should be covered");
    };
    let add_tiles = &tiles[&add];
    assert_eq!(asm(add_tiles), vec![vec!["ADD %0, %1"]]);
    assert_eq!(add_tiles[0].covered, BTreeSet::from([add]));
    assert_eq!(add_tiles[0].inputs, BTreeSet::from([x, y]));
    assert_eq!(
        add_tiles[0].source,
        TileSource::Pattern {
            group: "add".to_owned(),
            ordinal: 0
        }
    );
}

// ── Scenario B ──────────────────────────────────────────────────────

#[test]
fn store_of_add_is_found_through_the_store_index() {
    let t = tables(
        "src: (<r> LOCAL) -> [<r>];
         rmw: (STORE (<p> LOCAL) (I32 ADD (LOAD p) <b> src)) -> [ADD [<p>], <b>];",
    );
    assert_eq!(t.by_root(Operation::Store).len(), 0);
    assert_eq!(t.store_by_value(Operation::Add).len(), 1);

    let mut b = builder();
    let p = b.arg(0, ValueType::POINTER);
    let old = b.load(ValueType::I32, p, None);
    let inc = b.arg(1, ValueType::I32);
    let sum = b.op(Operation::Add, ValueType::I32, &[old, inc]);
    let st = b.store(p, sum, Some(old));
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    let tiles = Selector::new(&t, SelectConfig::default()).select_node(&cx, st);
    assert_eq!(asm(&tiles), vec![vec!["ADD [%0], %2"]]);
    assert_eq!(tiles[0].covered, BTreeSet::from([old, sum, st]));
    assert_eq!(tiles[0].inputs, BTreeSet::from([p, inc]));
}

// ── Scenario C ──────────────────────────────────────────────────────

#[test]
fn bare_memory_templates_never_stand_alone() {
    let t = tables(
        "frag: (ADD (<a> LOCAL) (<b> LOCAL)) -> [[<a> + <b>]];
         real: (ADD (<a> LOCAL) (<b> LOCAL)) -> [LEA <out>, [<a> + <b>]];",
    );
    let frag = &t.group("frag")[0];
    assert!(!frag.produces_instructions());
    assert_eq!(t.by_root(Operation::Add).len(), 1);

    let mut b = builder();
    let x = b.arg(0, ValueType::I32);
    let y = b.arg(1, ValueType::I32);
    let add = b.op(Operation::Add, ValueType::I32, &[x, y]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    let tiles = Selector::new(&t, SelectConfig::default()).select_node(&cx, add);
    assert_eq!(asm(&tiles), vec![vec!["LEA %2, [%0 + %1]"]]);
}

// ── Scenario D ──────────────────────────────────────────────────────

#[test]
fn uncovered_node_is_reported() {
    let t = tables("add: (ADD (<a> LOCAL) (<b> LOCAL)) -> [ADD <a>, <b>];");
    let mut b = builder();
    let x = b.arg(0, ValueType::I32);
    let n = b.op(Operation::Not, ValueType::I32, &[x]);
    let (dag, types) = b.finish();

    let Err(err) = Selector::new(&t, SelectConfig::default()).select_block(&dag, &types) else {
        panic!("NOT has no lowering");
    };
    assert_eq!(err.node, n);
    assert_eq!(err.op, Operation::Not);
    assert_eq!(
        err.to_string(),
        "no tile covers node n1 (NOT) in block `entry` of function `sum` in module `demo`"
    );
}

// ── Combinatorial completeness ──────────────────────────────────────

/// `ex` has two alternatives at a `NEG` node, each with two
/// instantiations through `leaf`.
const NESTED: &str = "
leaf: (<r> LOCAL) -> [<r>] | (<c> CONSTANT) -> [<c>];
ex: (NEG <y> leaf) -> [<y>] | (NEG <y> leaf) -> [[<y>]];
twice: (ADD <x> ex x) -> [MOV <out>, <x>] [ADD <out>, <x>];
pair: (ADD <x> ex <z> ex) -> [MOV <out>, <x>] [ADD <out>, <z>];
";

fn doubled_neg() -> (tessel_ir::BlockDag, tessel_ir::TypeMap, NodeId) {
    let mut b = builder();
    let c = b.int(5, ValueType::I32);
    let neg = b.op(Operation::Neg, ValueType::I32, &[c]);
    let add = b.op(Operation::Add, ValueType::I32, &[neg, neg]);
    let (dag, types) = b.finish();
    (dag, types, add)
}

fn instantiate(t: &PatternTables, cx: &BlockCx<'_>, group: &str, node: NodeId) -> Vec<Tile> {
    let matcher = Matcher::new(t, cx);
    let Some(data) = matcher.match_pattern(node, &t.group(group)[0]) else {
        panic!("{group} should match");
    };
    Instantiations::new(cx, &data)
        .map(Instantiation::into_tile)
        .collect()
}

#[test]
fn a_reused_identifier_keeps_one_choice() {
    let t = tables(NESTED);
    let (dag, types, add) = doubled_neg();
    let cx = BlockCx::new(&dag, &types);

    // n = 2 alternatives, m = 2 instantiations each.
    assert_eq!(
        asm(&instantiate(&t, &cx, "twice", add)),
        vec![
            vec!["MOV %2, %0", "ADD %2, %0"],
            vec!["MOV %2, 5", "ADD %2, 5"],
            vec!["MOV %2, [%0]", "ADD %2, [%0]"],
            vec!["MOV %2, [5]", "ADD %2, [5]"],
        ]
    );
}

#[test]
fn distinct_identifiers_form_the_full_product() {
    let t = tables(NESTED);
    let (dag, types, add) = doubled_neg();
    let cx = BlockCx::new(&dag, &types);

    let tiles = instantiate(&t, &cx, "pair", add);
    assert_eq!(tiles.len(), 16);
    let distinct: BTreeSet<Vec<String>> = tiles.iter().map(Tile::asm).collect();
    assert_eq!(distinct.len(), 16);
}

#[test]
fn chosen_subpatterns_contribute_their_nodes() {
    let t = tables(NESTED);
    let (dag, types, add) = doubled_neg();
    let cx = BlockCx::new(&dag, &types);
    let c = NodeId::new(0);
    let neg = NodeId::new(1);

    let tiles = instantiate(&t, &cx, "twice", add);
    assert_eq!(tiles[0].covered, BTreeSet::from([add, neg]));
    assert_eq!(tiles[0].inputs, BTreeSet::from([c]));
    assert_eq!(tiles[1].covered, BTreeSet::from([add, neg, c]));
    assert!(tiles[1].inputs.is_empty());
}
