use cminus::analyzer::{
    OperandSide, SemanticError, SemanticErrorKind, SemanticVisitor, SymbolEntry, SymbolTable, Ty,
};
use cminus::parser::{ExprKind, NodeKind, StmtKind, Tree};

fn declare(source: &str) -> (Tree, SemanticVisitor) {
    let mut tree = cminus::parse(source).unwrap();
    let mut visitor = SemanticVisitor::new();
    visitor.build_symbol_table(&mut tree).unwrap();
    (tree, visitor)
}

fn check(source: &str) -> (Tree, SemanticVisitor) {
    let (mut tree, mut visitor) = declare(source);
    assert!(visitor.errors().is_empty());
    visitor.type_check(&mut tree).unwrap();
    (tree, visitor)
}

fn kinds(visitor: &SemanticVisitor) -> Vec<SemanticErrorKind> {
    visitor.errors().iter().map(|e| e.kind()).collect()
}

fn entry<'a>(table: &'a SymbolTable, scope: &str, name: &str) -> &'a SymbolEntry {
    let scope = table.scopes().find(|s| s.name() == scope).unwrap();
    scope.entries().find(|e| e.name == name).unwrap()
}

#[test]
fn builtins_are_seeded_before_user_symbols() {
    let (_, visitor) = check("void main(void) { }");
    assert!(visitor.errors().is_empty());

    let table = visitor.symbol_table();
    let global = table.scopes().next().unwrap();
    assert_eq!(global.name(), "global");
    assert_eq!(global.level(), 0);
    assert_eq!(global.entries().count(), 3);

    let input = entry(table, "global", "input");
    assert_eq!((input.ty, input.memloc, input.lines()), (Ty::Integer, 0, &[0][..]));
    let output = entry(table, "global", "output");
    assert_eq!((output.ty, output.memloc, output.lines()), (Ty::Void, 1, &[0][..]));
    let main = entry(table, "global", "main");
    assert_eq!((main.ty, main.memloc, main.lines()), (Ty::Void, 2, &[1][..]));

    let names = table.scopes().map(|s| s.name()).collect::<Vec<_>>();
    assert_eq!(names, vec!["global", "main"]);
}

#[test]
fn duplicate_declaration_keeps_first_entry() {
    let source = "int x;
int x;
void main(void) { x = 1; }";
    let (_, visitor) = declare(source);

    assert_eq!(
        visitor.errors(),
        &[SemanticError::DuplicateDeclaration {
            name: "x".to_string(),
            line: 2
        }]
    );
    let x = entry(visitor.symbol_table(), "global", "x");
    assert_eq!(x.ty, Ty::Integer);
    assert_eq!(x.memloc, 2);
    assert_eq!(x.lines(), &[1, 2, 3]);
    // the rejected declaration did not consume a location
    assert_eq!(entry(visitor.symbol_table(), "global", "main").memloc, 3);
}

#[test]
fn local_cannot_redeclare_parameter() {
    let (_, visitor) = declare("void f(int a) { int a; }\nvoid main(void) { }");
    assert_eq!(kinds(&visitor), vec![SemanticErrorKind::DuplicateDeclaration]);
}

#[test]
fn parameter_shadows_global() {
    let source = "int x;
void f(int x) {
  x = 1;
}
void main(void) {
  x = 2;
}";
    let (_, visitor) = check(source);
    assert!(visitor.errors().is_empty());

    let table = visitor.symbol_table();
    let global_x = entry(table, "global", "x");
    assert_eq!(global_x.lines(), &[1, 6]);
    assert_eq!(global_x.memloc, 2);

    let param_x = entry(table, "f", "x");
    assert_eq!(param_x.lines(), &[2, 3]);
    assert_eq!(param_x.memloc, 0);
}

#[test]
fn references_append_lines_in_order() {
    let source = "int g;
void main(void)
{
  g = 1;
  g = g + 2;
  output(g);
}";
    let (_, visitor) = check(source);
    let table = visitor.symbol_table();

    let g = entry(table, "global", "g");
    assert_eq!(g.lines(), &[1, 4, 5, 5, 6]);
    assert!(g.lines().windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(entry(table, "global", "output").lines(), &[0, 6]);
    assert_eq!(entry(table, "global", "main").lines(), &[2]);
}

#[test]
fn memory_locations_per_frame() {
    let source = "int a;
int b;
int f(int p, int q) { int r; return p; }
void main(void) { int s; int t[4]; }";
    let (_, visitor) = check(source);
    let table = visitor.symbol_table();

    assert_eq!(entry(table, "global", "a").memloc, 2);
    assert_eq!(entry(table, "global", "b").memloc, 3);
    assert_eq!(entry(table, "global", "f").memloc, 4);
    assert_eq!(entry(table, "global", "main").memloc, 5);

    assert_eq!(entry(table, "f", "p").memloc, 0);
    assert_eq!(entry(table, "f", "q").memloc, 1);
    assert_eq!(entry(table, "f", "r").memloc, 2);
    assert_eq!(entry(table, "main", "s").memloc, 0);
    assert_eq!(entry(table, "main", "t").memloc, 1);
    assert_eq!(entry(table, "main", "t").ty, Ty::IntegerArray);
}

#[test]
fn declaration_errors() {
    let source = "void v; void arr[3];
void f(int a, int a) { }
int g;
void g(void) { }
void main(void) { y = 1; foo(); }
void main(void) { }";
    let (_, visitor) = declare(source);

    assert_eq!(
        visitor.errors(),
        &[
            SemanticError::VoidVariable {
                name: "v".to_string(),
                line: 1
            },
            SemanticError::VoidVariable {
                name: "arr".to_string(),
                line: 1
            },
            SemanticError::DuplicateParameter {
                name: "a".to_string(),
                line: 2
            },
            SemanticError::DuplicateFunction {
                name: "g".to_string(),
                line: 4
            },
            SemanticError::UndeclaredIdentifier {
                name: "y".to_string(),
                line: 5
            },
            SemanticError::UndeclaredIdentifier {
                name: "foo".to_string(),
                line: 5
            },
            SemanticError::DuplicateFunction {
                name: "main".to_string(),
                line: 6
            },
        ]
    );

    let table = visitor.symbol_table();
    assert!(table.lookup("v").is_none());
    assert!(table.lookup("arr").is_none());
    assert_eq!(entry(table, "global", "g").ty, Ty::Integer);
    assert_eq!(entry(table, "global", "g").lines(), &[3, 4]);
    // every function pushed a scope and popped it again
    assert_eq!(table.current_scope().unwrap().name(), "global");
}

#[test]
fn missing_main() {
    let (_, visitor) = check("int f(void) { return 1; }");
    assert_eq!(visitor.errors(), &[SemanticError::MissingMain]);
}

#[test]
fn main_must_be_a_function() {
    let (_, visitor) = check("int main;");
    assert_eq!(kinds(&visitor), vec![SemanticErrorKind::MissingMain]);
}

#[test]
fn void_call_as_rvalue() {
    let (_, visitor) = check("void main(void) { int x; x = output(1); }");
    assert_eq!(
        visitor.errors(),
        &[SemanticError::VoidRValue { line: 1 }]
    );
}

#[test]
fn indexing_non_array() {
    let (_, visitor) = check("void main(void) { int x; x[0] = 1; }");
    assert_eq!(
        visitor.errors(),
        &[SemanticError::IndexingNonArray {
            name: "x".to_string(),
            line: 1
        }]
    );
}

#[test]
fn array_assign_without_index() {
    let (_, visitor) = check("int arr[10];\nvoid main(void) { arr = 5; }");
    assert_eq!(
        visitor.errors(),
        &[SemanticError::ArrayAssignWithoutIndex {
            name: "arr".to_string(),
            line: 2
        }]
    );
}

#[test]
fn void_operands() {
    let source = "void main(void) {
  int x;
  x = output(1) + 1;
  x = 2 * output(3);
}";
    let (_, visitor) = check(source);
    assert_eq!(
        visitor.errors(),
        &[
            SemanticError::VoidOperand {
                side: OperandSide::Left,
                line: 3
            },
            SemanticError::VoidOperand {
                side: OperandSide::Right,
                line: 4
            },
        ]
    );
}

#[test]
fn type_errors_accumulate() {
    let source = "int a[3];
void main(void) {
  int x;
  a = x[1];
  x = output(x);
}";
    let (_, visitor) = check(source);
    assert_eq!(
        kinds(&visitor),
        vec![
            SemanticErrorKind::ArrayAssignWithoutIndex,
            SemanticErrorKind::IndexingNonArray,
            SemanticErrorKind::VoidRValue,
        ]
    );
}

#[test]
fn expressions_are_typed() {
    let source = "int a[3];
int get(int v[]) { return v[0]; }
void main(void) { int i; i = a[1] + get(a); }";
    let (tree, visitor) = check(source);
    assert!(visitor.errors().is_empty());

    let main = tree.top_level().last().unwrap();
    let body = tree.node(main).child(1).unwrap();
    let assign = tree.node(body).child(1).unwrap();
    let NodeKind::Stmt(StmtKind::Assign) = tree.node(assign).kind else {
        panic!();
    };
    let op = tree.node(assign).child(1).unwrap();
    assert_eq!(tree.node(op).ty, Ty::Integer);

    let element = tree.node(op).child(0).unwrap();
    let NodeKind::Expr(ExprKind::Id(ref name)) = tree.node(element).kind else {
        panic!();
    };
    assert_eq!(name, "a");
    assert_eq!(tree.node(element).ty, Ty::Integer);

    let call = tree.node(op).child(1).unwrap();
    assert_eq!(tree.node(call).ty, Ty::Integer);
    let whole_array = tree.node(call).child(0).unwrap();
    assert_eq!(tree.node(whole_array).ty, Ty::IntegerArray);

    let get = entry(visitor.symbol_table(), "global", "get");
    assert_eq!(get.lines(), &[2, 3]);
    assert_eq!(entry(visitor.symbol_table(), "get", "v").ty, Ty::IntegerArray);
}
