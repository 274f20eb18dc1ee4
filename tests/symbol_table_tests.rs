use cminus::analyzer::{SymbolTable, Ty};

#[test]
fn push_and_pop_scopes() {
    let mut table = SymbolTable::new();
    assert!(table.current_scope().is_none());

    table.push_scope("global").unwrap();
    table.push_scope("f").unwrap();
    assert_eq!(table.current_scope().unwrap().name(), "f");
    assert_eq!(table.current_scope().unwrap().level(), 1);
    assert!(!table.is_global());

    table.pop_scope();
    assert_eq!(table.current_scope().unwrap().name(), "global");
    assert!(table.is_global());

    table.push_scope("g").unwrap();
    assert_eq!(table.current_scope().unwrap().level(), 1);

    // popped scopes are still recorded, in creation order
    let names = table.scopes().map(|s| s.name()).collect::<Vec<_>>();
    assert_eq!(names, vec!["global", "f", "g"]);

    table.pop_scope();
    table.pop_scope();
    table.pop_scope();
    assert!(table.current_scope().is_none());
    assert_eq!(table.scopes().count(), 3);
}

#[test]
fn insert_without_scope_is_ignored() {
    let mut table = SymbolTable::new();
    assert_eq!(table.insert("x", Ty::Integer, 1, 0).unwrap(), None);
    assert!(table.lookup("x").is_none());
}

#[test]
fn lookup_walks_enclosing_scopes() {
    let mut table = SymbolTable::new();
    table.push_scope("global").unwrap();
    table.insert("x", Ty::Integer, 1, 0).unwrap();
    table.insert("arr", Ty::IntegerArray, 2, 1).unwrap();

    table.push_scope("f").unwrap();
    table.insert("x", Ty::IntegerArray, 3, 0).unwrap();

    let x = table.lookup("x").unwrap();
    assert_eq!(x.ty, Ty::IntegerArray);
    assert_eq!(x.lines(), &[3]);

    assert!(table.lookup_local("arr").is_none());
    assert_eq!(table.lookup("arr").unwrap().memloc, 1);

    table.pop_scope();
    let x = table.lookup("x").unwrap();
    assert_eq!(x.ty, Ty::Integer);
    assert_eq!(x.memloc, 0);
    assert!(table.lookup("missing").is_none());
}

#[test]
fn duplicate_insert_appends_line() {
    let mut table = SymbolTable::new();
    table.push_scope("global").unwrap();
    let first = table.insert("x", Ty::Integer, 1, 0).unwrap();
    let second = table.insert("x", Ty::Void, 4, 7).unwrap();
    assert_eq!(first, second);

    let x = table.lookup_local("x").unwrap();
    assert_eq!(x.ty, Ty::Integer);
    assert_eq!(x.memloc, 0);
    assert_eq!(x.lines(), &[1, 4]);
    assert_eq!(table.current_scope().unwrap().entries().count(), 1);
}

#[test]
fn resolved_reference_records_lines() {
    let mut table = SymbolTable::new();
    table.push_scope("global").unwrap();
    table.insert("count", Ty::Integer, 2, 0).unwrap();
    table.push_scope("main").unwrap();

    let r = table.resolve("count").unwrap();
    table.add_line(r, 5).unwrap();
    table.add_line(r, 9).unwrap();

    assert_eq!(table.scope(r.scope()).name(), "global");
    assert_eq!(table.entry(r).lines(), &[2, 5, 9]);
    assert!(table.resolve_local("count").is_none());
}

#[test]
fn colliding_names_share_a_bucket() {
    let mut table = SymbolTable::new();
    table.push_scope("global").unwrap();
    // "p" and "ix" hash to the same bucket (112)
    table.insert("p", Ty::Integer, 1, 0).unwrap();
    table.insert("ix", Ty::Integer, 2, 1).unwrap();

    assert_eq!(table.lookup("p").unwrap().memloc, 0);
    assert_eq!(table.lookup("ix").unwrap().memloc, 1);
    let names = table
        .current_scope()
        .unwrap()
        .entries()
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["p", "ix"]);
}

#[test]
fn report_lists_every_scope() {
    let mut table = SymbolTable::new();
    table.push_scope("global").unwrap();
    table.insert("input", Ty::Integer, 0, 0).unwrap();
    table.insert("output", Ty::Void, 0, 1).unwrap();
    table.insert("main", Ty::Void, 3, 2).unwrap();
    table.push_scope("main").unwrap();
    table.insert("x", Ty::IntegerArray, 4, 0).unwrap();
    table.pop_scope();

    let report = table.report();
    let global = report.find("Scope: global (level 0)").unwrap();
    let main = report.find("Scope: main (level 1)").unwrap();
    assert!(global < main);

    assert!(report.contains("input           int        0          0\n"));
    assert!(report.contains("output          void       1          0\n"));
    assert!(report.contains("x               int[]      0          4\n"));

    // bucket order: main (24) before input (77) before output (117)
    let main_row = report.find("main            void").unwrap();
    let input_row = report.find("input           int").unwrap();
    let output_row = report.find("output          void").unwrap();
    assert!(main_row < input_row && input_row < output_row);
}
