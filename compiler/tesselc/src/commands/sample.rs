//! The `sample` command: run selection on a few built-in blocks.
//!
//! Useful for eyeballing a pattern file: every node of every sample is
//! printed with the tiles it can be lowered by.

use tessel_ir::{BlockContext, BlockDag, DagBuilder, Immediate, Operation, TypeMap, ValueType};
use tessel_isel::{BlockTiles, SelectConfig, Selector};
use tessel_patterns::PatternTables;

use super::{load_tables, render_compile_error};

pub struct SampleBlock {
    pub dag: BlockDag,
    pub types: TypeMap,
}

fn builder(block: &str) -> DagBuilder {
    DagBuilder::new(BlockContext {
        module: "sample".to_owned(),
        function: "demo".to_owned(),
        block: block.to_owned(),
    })
}

fn finish(b: DagBuilder) -> SampleBlock {
    let (dag, types) = b.finish();
    SampleBlock { dag, types }
}

/// Small blocks exercising arithmetic, memory, wide values, selects,
/// calls and control flow.
pub fn sample_blocks() -> Vec<SampleBlock> {
    let mut blocks = Vec::new();

    // entry: if (a < b) goto less else goto more
    let mut b = builder("entry");
    b.terminator(Operation::Entry, &[], &[], None, None);
    let a = b.arg(0, ValueType::I32);
    let c = b.arg(1, ValueType::I32);
    let lt = b.op(Operation::Slt, ValueType::I1, &[a, c]);
    b.terminator(Operation::Branch, &[lt], &["less", "more"], None, None);
    blocks.push(finish(b));

    // less: *p += a * 4; return min(a, b)
    let mut b = builder("less");
    let a = b.arg(0, ValueType::I32);
    let c = b.arg(1, ValueType::I32);
    let p = b.arg(2, ValueType::POINTER);
    let four = b.int(4, ValueType::I32);
    let scaled = b.op(Operation::Mul, ValueType::I32, &[a, four]);
    let old = b.load(ValueType::I32, p, None);
    let sum = b.op(Operation::Add, ValueType::I32, &[old, scaled]);
    b.store(p, sum, Some(old));
    let lt = b.op(Operation::Slt, ValueType::I1, &[a, c]);
    let min = b.op(Operation::Select, ValueType::I32, &[lt, a, c]);
    b.terminator(Operation::Return, &[min], &[], None, None);
    blocks.push(finish(b));

    // more: return log(x + y) with 64-bit x, y
    let mut b = builder("more");
    let x = b.arg(3, ValueType::I64);
    let y = b.arg(5, ValueType::I64);
    let wide = b.op(Operation::Add, ValueType::I64, &[x, y]);
    let logged = b.producer(
        Operation::Call,
        ValueType::I64,
        &[wide],
        Some(Immediate::Symbol("log".to_owned())),
        None,
    );
    b.terminator(Operation::Return, &[logged], &[], None, None);
    blocks.push(finish(b));

    blocks
}

/// Render one block's tiles.
pub(crate) fn format_block(block: &SampleBlock, tiles: &BlockTiles) -> String {
    let context = block.dag.context();
    let mut out = format!("block {}::{}::{}\n", context.module, context.function, context.block);
    for (id, node) in block.dag.iter() {
        let node_tiles = tiles.get(&id).map_or(&[][..], Vec::as_slice);
        out.push_str(&format!("  {id} {}: {} tile(s)\n", node.op, node_tiles.len()));
        for tile in node_tiles {
            out.push_str(&format!("    [{}] {}\n", tile.source, tile.asm().join("; ")));
        }
    }
    out
}

/// Select every sample block with the bundled patterns, or with the
/// patterns in `patterns_path`.
pub fn run_sample(patterns_path: Option<&str>, config: &SelectConfig) {
    let loaded;
    let tables: &PatternTables = match patterns_path {
        Some(path) => {
            loaded = load_tables(path);
            &loaded
        }
        None => match PatternTables::builtin() {
            Ok(tables) => tables,
            Err(err) => {
                eprint!(
                    "{}",
                    render_compile_error("<builtin>", tessel_patterns::BUILTIN_SOURCE, &err)
                );
                std::process::exit(1);
            }
        },
    };

    let blocks = sample_blocks();
    let inputs: Vec<(BlockDag, TypeMap)> = blocks
        .iter()
        .map(|b| (b.dag.clone(), b.types.clone()))
        .collect();

    let selector = Selector::new(tables, config.clone());
    match selector.select_function(&inputs) {
        Ok(selected) => {
            for (block, tiles) in blocks.iter().zip(&selected) {
                print!("{}", format_block(block, tiles));
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests;
