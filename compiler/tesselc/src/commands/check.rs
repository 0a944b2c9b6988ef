//! The `check` and `builtin` commands: compile pattern definitions and
//! report what they contain.

use tessel_patterns::{PatternTables, BUILTIN_SOURCE};

use super::{load_tables, render_compile_error};

/// One line per group: name and alternative count.
pub(crate) fn summary(tables: &PatternTables) -> Vec<String> {
    tables
        .group_names()
        .map(|name| format!("  {name}: {}", tables.group(name).len()))
        .collect()
}

fn report(label: &str, tables: &PatternTables) {
    let groups = tables.group_names().count();
    let indexed = tables
        .iter()
        .filter(|p| p.root_op().is_some() && p.produces_instructions())
        .count();
    println!(
        "OK: {label} ({groups} groups, {} patterns, {indexed} standalone)",
        tables.len()
    );
    for line in summary(tables) {
        println!("{line}");
    }
}

/// Compile a pattern file and print its groups.
pub fn check_file(path: &str) {
    let tables = load_tables(path);
    report(path, &tables);
}

/// Compile the bundled pattern set.
pub fn check_builtin() {
    match PatternTables::builtin() {
        Ok(tables) => report("builtin", tables),
        Err(err) => {
            eprint!("{}", render_compile_error("<builtin>", BUILTIN_SOURCE, &err));
            std::process::exit(1);
        }
    }
}
