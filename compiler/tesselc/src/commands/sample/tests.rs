use pretty_assertions::assert_eq;

use super::*;

fn builtin() -> &'static PatternTables {
    match PatternTables::builtin() {
        Ok(tables) => tables,
        Err(err) => panic!("bundled patterns do not compile: {err}"),
    }
}

#[test]
fn the_bundled_set_covers_every_sample() {
    let selector = Selector::new(builtin(), SelectConfig::default());
    for block in sample_blocks() {
        let result = selector.select_block(&block.dag, &block.types);
        assert!(result.is_ok(), "{:?}", result.err());
    }
}

#[test]
fn blocks_render_node_by_node() {
    let selector = Selector::new(builtin(), SelectConfig::default());
    let blocks = sample_blocks();
    let entry = &blocks[0];
    let Ok(tiles) = selector.select_block(&entry.dag, &entry.types) else {
        panic!("entry should be covered");
    };

    let rendered = format_block(entry, &tiles);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[0], "block sample::demo::entry");
    assert_eq!(lines[1], "  n0 ENTRY: 1 tile(s)");
    assert_eq!(lines[2], "    [intrinsic Entry] ");
    assert_eq!(lines[3], "  n1 ARG: 1 tile(s)");
    assert_eq!(lines[4], "    [intrinsic Arg] MOV %0, [ebp + 8]");
    assert!(rendered.contains("    [compare#2] CMP %0, %1; SETL %2"), "{rendered}");
    assert!(
        rendered.contains("[intrinsic Branch] TEST %2, %2; JNE @less; JMP @more"),
        "{rendered}"
    );
}

#[test]
fn a_tight_cap_still_covers() {
    let selector = Selector::new(builtin(), SelectConfig::default().with_max_tiles(Some(1)));
    let blocks = sample_blocks();
    let inputs: Vec<_> = blocks
        .iter()
        .map(|b| (b.dag.clone(), b.types.clone()))
        .collect();
    let Ok(selected) = selector.select_function(&inputs) else {
        panic!("samples should be covered");
    };
    for tiles in &selected {
        assert!(tiles.values().all(|t| t.len() == 1));
    }
}
