//! Shared fixtures for unit tests.

use tessel_ir::{BlockContext, DagBuilder};
use tessel_patterns::PatternTables;

pub fn builder() -> DagBuilder {
    DagBuilder::new(BlockContext {
        module: "m".to_owned(),
        function: "f".to_owned(),
        block: "entry".to_owned(),
    })
}

pub fn tables(source: &str) -> PatternTables {
    match PatternTables::from_source(source) {
        Ok(tables) => tables,
        Err(err) => panic!("test patterns do not compile: {err}"),
    }
}
