//! Indented listing of a parsed tree, used by the driver's `--ast` flag.

use crate::analyzer::Ty;

use super::{DeclKind, ExprKind, NodeId, NodeKind, StmtKind, Tree};

const INDENT: usize = 4;

pub fn render(tree: &Tree) -> String {
    let mut out = String::new();
    render_list(tree, tree.root(), INDENT, &mut out);
    out
}

fn render_list(tree: &Tree, first: Option<NodeId>, level: usize, out: &mut String) {
    for id in tree.siblings(first) {
        let node = tree.node(id);
        out.push_str(&format!("{:level$}{}\n", "", describe(&node.kind, node.ty)));
        for child in node.children {
            render_list(tree, child, level + INDENT, out);
        }
    }
}

fn describe(kind: &NodeKind, ty: Ty) -> String {
    match kind {
        NodeKind::Stmt(StmtKind::If) => "If".to_string(),
        NodeKind::Stmt(StmtKind::While) => "While".to_string(),
        NodeKind::Stmt(StmtKind::Assign) => "Assign".to_string(),
        NodeKind::Stmt(StmtKind::Return) => "Return".to_string(),
        NodeKind::Stmt(StmtKind::Compound) => "Compound Statement".to_string(),
        NodeKind::Expr(ExprKind::Op(op)) => format!("Op: {op}"),
        NodeKind::Expr(ExprKind::Const(value)) => format!("Const: {value}"),
        NodeKind::Expr(ExprKind::Id(name)) => format!("Id: {name}"),
        NodeKind::Expr(ExprKind::Call(name)) => format!("Call: {name}"),
        NodeKind::Decl(DeclKind::Var(name)) => format!("Var Declaration: {name} ({ty})"),
        NodeKind::Decl(DeclKind::Array(name, size)) => format!("Array Declaration: {name}[{size}]"),
        NodeKind::Decl(DeclKind::Func(name)) => format!("Function Declaration: {name} returns {ty}"),
        NodeKind::Decl(DeclKind::Param(name)) => format!("Parameter: {name} ({ty})"),
    }
}
