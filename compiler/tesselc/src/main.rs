//! Tessel CLI.

use tessel_isel::parse_select_options;
use tesselc::commands::{check_builtin, check_file, dump_file, run_sample};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    tesselc::init_tracing(verbose);

    let command = &args[1];

    match command.as_str() {
        "check" => {
            let Some(path) = first_path(&args[2..]) else {
                eprintln!("Usage: tessel check <file.isel>");
                std::process::exit(1);
            };
            check_file(path);
        }
        "dump" => {
            let Some(path) = first_path(&args[2..]) else {
                eprintln!("Usage: tessel dump <file.isel>");
                std::process::exit(1);
            };
            dump_file(path);
        }
        "builtin" => {
            check_builtin();
        }
        "sample" => {
            let rest = &args[2..];
            let patterns = rest.iter().find_map(|a| a.strip_prefix("--patterns="));
            let config = parse_select_options(rest);
            run_sample(patterns, &config);
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" => {
            println!("Tessel {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}

/// First argument that is not a flag.
fn first_path(args: &[String]) -> Option<&str> {
    args.iter().map(String::as_str).find(|a| !a.starts_with('-'))
}

fn print_usage() {
    println!("Tessel instruction selector");
    println!();
    println!("Usage: tessel <command> [options]");
    println!();
    println!("Commands:");
    println!("  check <file.isel>    Compile a pattern file and report errors");
    println!("  dump <file.isel>     Print every compiled pattern");
    println!("  builtin              Check the bundled x86 pattern set");
    println!("  sample               Select tiles for built-in sample blocks");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Sample options:");
    println!("  --patterns=<file>    Use a pattern file instead of the bundled set");
    println!("  --max-tiles=<n>      Tiles kept per node (default 64, `none` for all)");
    println!("  --no-dedup           Keep duplicate tiles");
    println!();
    println!("Global options:");
    println!("  --verbose, -v        Log at debug level (RUST_LOG overrides)");
    println!();
    println!("Examples:");
    println!("  tessel check patterns/x86.isel");
    println!("  tessel sample --max-tiles=4");
    println!("  RUST_LOG=tessel_isel=trace tessel sample");
}
