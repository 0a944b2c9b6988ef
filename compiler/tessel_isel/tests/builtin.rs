//! Selection with the bundled x86 pattern set.

use pretty_assertions::assert_eq;
use tessel_ir::{BlockContext, DagBuilder, Operation, ValueType};
use tessel_isel::{BlockCx, IntrinsicKind, SelectConfig, Selector, Tile, TileSource};
use tessel_patterns::PatternTables;

fn builtin() -> &'static PatternTables {
    match PatternTables::builtin() {
        Ok(tables) => tables,
        Err(err) => panic!("bundled patterns do not compile: {err}"),
    }
}

fn builder(block: &str) -> DagBuilder {
    DagBuilder::new(BlockContext {
        module: "demo".to_owned(),
        function: "f".to_owned(),
        block: block.to_owned(),
    })
}

fn asm(tiles: &[Tile]) -> Vec<Vec<String>> {
    tiles.iter().map(Tile::asm).collect()
}

fn from(group: &str, ordinal: usize) -> TileSource {
    TileSource::Pattern {
        group: group.to_owned(),
        ordinal,
    }
}

#[test]
fn register_add() {
    let mut b = builder("entry");
    let x = b.arg(0, ValueType::I32);
    let y = b.arg(1, ValueType::I32);
    let add = b.op(Operation::Add, ValueType::I32, &[x, y]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    let tiles = Selector::new(builtin(), SelectConfig::default()).select_node(&cx, add);
    assert_eq!(asm(&tiles), vec![vec!["MOV %2, %0", "ADD %2, %1"]]);
}

#[test]
fn wide_add_uses_register_pairs() {
    let mut b = builder("entry");
    let x = b.arg(0, ValueType::I64);
    let y = b.arg(1, ValueType::I64);
    let add = b.op(Operation::Add, ValueType::I64, &[x, y]);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    let tiles = Selector::new(builtin(), SelectConfig::default()).select_node(&cx, add);
    assert_eq!(
        asm(&tiles),
        vec![vec![
            "MOV %2.lo, %0.lo",
            "MOV %2.hi, %0.hi",
            "ADD %2.lo, %1.lo",
            "ADC %2.hi, %1.hi",
        ]]
    );
}

#[test]
fn increment_in_memory() {
    let mut b = builder("entry");
    let p = b.arg(0, ValueType::POINTER);
    let old = b.load(ValueType::I32, p, None);
    let inc = b.arg(1, ValueType::I32);
    let sum = b.op(Operation::Add, ValueType::I32, &[old, inc]);
    let st = b.store(p, sum, Some(old));
    let (dag, types) = b.finish();

    let selector = Selector::new(builtin(), SelectConfig::default());
    let Ok(tiles) = selector.select_block(&dag, &types) else {
        panic!("block should be covered");
    };

    let stores = &tiles[&st];
    let sources: Vec<&TileSource> = stores.iter().map(|t| &t.source).collect();
    assert_eq!(
        sources,
        vec![&from("store", 0), &from("store_rmw", 0), &from("store_rmw", 5)]
    );
    assert_eq!(
        asm(stores),
        vec![
            vec!["MOV [%0], %3"],
            vec!["ADD [%0], %2"],
            vec!["MOV t0, %1", "ADD t0, %2", "MOV [%0], t0"],
        ]
    );

    // The load can also fold into the add.
    assert!(tiles[&sum]
        .iter()
        .any(|t| t.asm() == vec!["MOV %3, %2", "ADD %3, [%0]"]));
    assert_eq!(asm(&tiles[&old]), vec![vec!["MOV %1, [%0]"]]);
}

#[test]
fn indexed_loads() {
    let mut b = builder("entry");
    let base = b.arg(0, ValueType::POINTER);
    let i = b.arg(1, ValueType::I32);
    let two = b.int(2, ValueType::I32);
    let scaled = b.op(Operation::Shl, ValueType::I32, &[i, two]);
    let addr = b.op(Operation::Add, ValueType::POINTER, &[base, scaled]);
    let load = b.load(ValueType::I32, addr, None);
    let (dag, types) = b.finish();
    let cx = BlockCx::new(&dag, &types);

    let tiles = Selector::new(builtin(), SelectConfig::default()).select_node(&cx, load);
    assert_eq!(
        asm(&tiles),
        vec![
            vec!["MOV %5, [%4]"],
            vec!["MOV %5, [%0 + %1*4]"],
            vec!["MOV %5, [%0 + %3]"],
        ]
    );
}

#[test]
fn compare_and_select() {
    let mut b = builder("entry");
    let x = b.arg(0, ValueType::I32);
    let y = b.arg(1, ValueType::I32);
    let lt = b.op(Operation::Slt, ValueType::I1, &[x, y]);
    let min = b.op(Operation::Select, ValueType::I32, &[lt, x, y]);
    let (dag, types) = b.finish();

    let selector = Selector::new(builtin(), SelectConfig::default());
    let Ok(tiles) = selector.select_block(&dag, &types) else {
        panic!("block should be covered");
    };
    assert_eq!(asm(&tiles[&lt]), vec![vec!["CMP %0, %1", "SETL %2"]]);
    let kinds: Vec<&TileSource> = tiles[&min].iter().map(|t| &t.source).collect();
    assert_eq!(
        kinds,
        vec![
            &TileSource::Intrinsic(IntrinsicKind::Select),
            &TileSource::Intrinsic(IntrinsicKind::SelectCompare),
        ]
    );
}

#[test]
fn whole_function() {
    let mut entry = builder("entry");
    entry.terminator(Operation::Entry, &[], &[], None, None);
    let c = entry.arg(0, ValueType::I1);
    entry.terminator(Operation::Branch, &[c], &["small", "big"], None, None);

    let mut small = builder("small");
    let x = small.arg(1, ValueType::I32);
    let neg = small.op(Operation::Neg, ValueType::I32, &[x]);
    small.terminator(Operation::Return, &[neg], &[], None, None);

    let mut big = builder("big");
    let w = big.arg(2, ValueType::I64);
    let trunc = big.op(Operation::Trunc, ValueType::I32, &[w]);
    big.terminator(Operation::Return, &[trunc], &[], None, None);

    let blocks = vec![entry.finish(), small.finish(), big.finish()];
    let selector = Selector::new(builtin(), SelectConfig::default());
    let Ok(selected) = selector.select_function(&blocks) else {
        panic!("function should be covered");
    };
    assert_eq!(selected.len(), 3);
    for (tiles, (dag, _)) in selected.iter().zip(&blocks) {
        assert_eq!(tiles.len(), dag.len());
        assert!(tiles.values().all(|t| !t.is_empty()));
    }
    assert_eq!(
        asm(&selected[2][&trunc]),
        vec![vec!["MOV %1, %0.lo"]]
    );
}

#[test]
fn unsupported_operations_fail() {
    let mut b = builder("entry");
    let x = b.arg(0, ValueType::I64);
    let y = b.arg(1, ValueType::I64);
    let div = b.op(Operation::SDiv, ValueType::I64, &[x, y]);
    let (dag, types) = b.finish();

    let result = Selector::new(builtin(), SelectConfig::default()).select_block(&dag, &types);
    assert_eq!(result.map_err(|e| (e.node, e.op)), Err((div, Operation::SDiv)));
}
