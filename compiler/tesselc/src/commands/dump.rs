//! The `dump` command: print every compiled pattern.

use super::load_tables;

pub fn dump_file(path: &str) {
    let tables = load_tables(path);
    for pattern in tables.iter() {
        let marker = if pattern.produces_instructions() { ' ' } else { '~' };
        println!("{marker} {pattern}");
    }
}
