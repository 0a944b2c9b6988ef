//! Plain-text rendering of pattern compile errors.

use tessel_patterns::{CompileError, Span};

/// 1-based line and column of a byte offset.
fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

fn snippet(out: &mut String, source: &str, span: Span) {
    let (line, column) = line_col(source, span.start);
    let Some(text) = source.lines().nth(line - 1) else {
        return;
    };
    let gutter = line.to_string().len();
    let width = source
        .get(span.start..span.end)
        .map_or(1, |s| s.lines().next().unwrap_or("").chars().count().max(1));
    out.push_str(&format!("{:gutter$} |\n", ""));
    out.push_str(&format!("{line} | {text}\n"));
    out.push_str(&format!(
        "{:gutter$} | {}{}\n",
        "",
        " ".repeat(column - 1),
        "^".repeat(width)
    ));
}

fn located(out: &mut String, path: &str, source: &str, span: Span, message: &str) {
    let (line, column) = line_col(source, span.start);
    out.push_str(&format!("error: {message}\n  --> {path}:{line}:{column}\n"));
    snippet(out, source, span);
}

/// Every error in `err`, each with its location and source line.
pub fn render_compile_error(path: &str, source: &str, err: &CompileError) -> String {
    let mut out = String::new();
    match err {
        CompileError::Syntax(errors) => {
            for e in errors {
                located(&mut out, path, source, e.span, &e.kind.to_string());
            }
            out.push_str(&format!("{err}\n"));
        }
        CompileError::Definition(e) => {
            located(&mut out, path, source, e.span, &e.to_string());
        }
    }
    out
}
