//! Command handlers for the `tessel` CLI.
//!
//! Handlers print their results and exit with status 1 on failure, like a
//! compiler driver. Shared helpers (file reading, table loading) live here.

mod check;
mod dump;
mod report;
mod sample;

pub use check::{check_builtin, check_file};
pub use dump::dump_file;
pub use report::render_compile_error;
pub use sample::{run_sample, sample_blocks, SampleBlock};

use tessel_patterns::PatternTables;

/// Read a file, exiting with a message if it cannot be read.
pub(super) fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            let msg = match e.kind() {
                std::io::ErrorKind::NotFound => format!("cannot find file '{path}'"),
                std::io::ErrorKind::PermissionDenied => {
                    format!("permission denied reading '{path}'")
                }
                std::io::ErrorKind::InvalidData => {
                    format!("'{path}' contains invalid UTF-8 data")
                }
                _ => format!("error reading '{path}': {e}"),
            };
            eprintln!("{msg}");
            std::process::exit(1);
        }
    }
}

/// Compile a pattern file, printing every error and exiting on failure.
pub(super) fn load_tables(path: &str) -> PatternTables {
    let source = read_file(path);
    match PatternTables::from_source(&source) {
        Ok(tables) => tables,
        Err(err) => {
            eprint!("{}", render_compile_error(path, &source, &err));
            std::process::exit(1);
        }
    }
}
