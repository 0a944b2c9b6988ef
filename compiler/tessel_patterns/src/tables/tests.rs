use pretty_assertions::assert_eq;

use super::*;
use crate::errors::DefinitionErrorKind;

const SOURCE: &str = "
    src: (<r> LOCAL) -> [<r>] | (<c> CONSTANT) -> [<c>];
    addr: (<p> LOCAL) -> [[<p>]];
    add:
        (<x> I32 ADD (<a> LOCAL) (<b> LOCAL)) -> [ADD <a>, <b>]
      | (ADD (<a> LOCAL) (<b> LOCAL)) -> [[<a> + <b>]]
      ;
    store:
        (STORE <m> addr (<v> LOCAL)) -> [MOV <m>, <v>]
      | (STORE (<p> LOCAL) (ADD (LOAD p) <b> src)) -> [ADD [<p>], <b>]
      ;
";

fn tables() -> PatternTables {
    match PatternTables::from_source(SOURCE) {
        Ok(tables) => tables,
        Err(err) => panic!("pattern source failed to compile: {err}"),
    }
}

fn ids(patterns: &[Arc<Pattern>]) -> Vec<(String, usize)> {
    patterns
        .iter()
        .map(|p| (p.group.clone(), p.ordinal))
        .collect()
}

#[test]
fn groups_keep_definition_order() {
    let tables = tables();
    assert_eq!(tables.len(), 7);
    assert_eq!(
        tables.group_names().collect::<Vec<_>>(),
        vec!["src", "addr", "add", "store"]
    );
    assert_eq!(tables.group("src").len(), 2);
    assert!(tables.group("missing").is_empty());
}

#[test]
fn root_index_skips_fragments() {
    let tables = tables();
    // The bare-memory ADD alternative cannot stand alone.
    assert_eq!(ids(tables.by_root(Operation::Add)), vec![("add".to_owned(), 0)]);
    assert!(tables.by_root(Operation::Load).is_empty());
}

#[test]
fn store_of_operation_goes_to_the_secondary_index_only() {
    let tables = tables();
    assert_eq!(ids(tables.by_root(Operation::Store)), vec![("store".to_owned(), 0)]);
    assert_eq!(
        ids(tables.store_by_value(Operation::Add)),
        vec![("store".to_owned(), 1)]
    );
}

#[test]
fn candidates_for_store_nodes_consult_both_indexes() {
    let tables = tables();
    let with_add: Vec<_> = tables
        .candidates(Operation::Store, Some(Operation::Add))
        .map(|p| p.ordinal)
        .collect();
    assert_eq!(with_add, vec![0, 1]);

    let with_local: Vec<_> = tables
        .candidates(Operation::Store, Some(Operation::Arg))
        .map(|p| p.ordinal)
        .collect();
    assert_eq!(with_local, vec![0]);

    // The stored-value hint only applies to stores.
    assert_eq!(tables.candidates(Operation::Add, Some(Operation::Add)).count(), 1);
}

#[test]
fn syntax_errors_are_collected() {
    let err = PatternTables::from_source("a: (<x> LOCAL) [<x>]; b: -> ;").unwrap_err();
    let CompileError::Syntax(errors) = err else {
        panic!("expected syntax errors, got {err}");
    };
    assert_eq!(errors.len(), 2);
}

#[test]
fn definition_errors_surface() {
    let err = PatternTables::from_source("g: (SUB x (<x> LOCAL)) -> [SUB <x>, <x>];").unwrap_err();
    let CompileError::Definition(err) = err else {
        panic!("expected a definition error, got {err}");
    };
    assert_eq!(
        err.kind,
        DefinitionErrorKind::UnresolvedBackreference {
            ident: "x".to_owned()
        }
    );
}

#[test]
fn builtin_set_compiles() {
    let tables = match PatternTables::builtin() {
        Ok(tables) => tables,
        Err(err) => panic!("bundled patterns failed to compile: {err}"),
    };
    assert!(!tables.is_empty());
    assert!(!tables.by_root(Operation::Add).is_empty());
    assert!(!tables.store_by_value(Operation::Add).is_empty());
    // Operand fragments are never candidates on their own.
    assert!(tables.group("src").iter().all(|p| p.root_op().is_none()));
    assert!(tables.iter().count() == tables.len());
}

#[test]
fn builtin_is_shared() {
    let a = PatternTables::builtin().map(std::ptr::from_ref);
    let b = PatternTables::builtin().map(std::ptr::from_ref);
    assert_eq!(a, b);
}
