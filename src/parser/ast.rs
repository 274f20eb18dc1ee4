use std::fmt;

use crate::analyzer::{SymbolRef, Ty};

pub const MAX_CHILDREN: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Stmt(StmtKind),
    Expr(ExprKind),
    Decl(DeclKind),
}

/// Child slots: If(cond, then, else?), While(cond, body), Return(value?),
/// Compound(declarations, statements), Assign(target, value).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StmtKind {
    If,
    While,
    Return,
    Compound,
    Assign,
}

/// Child slots: Op(lhs, rhs), Id(index?), Call(first argument). Const has none.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Op(BinOpKind),
    Const(i32),
    Id(String),
    Call(String),
}

/// Child slots: Func(first parameter, body). Var, Param and Array have none.
#[derive(Clone, Debug, PartialEq)]
pub enum DeclKind {
    Var(String),
    Func(String),
    Param(String),
    Array(String, i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Equal,
    NotEqual,
}

impl BinOpKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mul => "*",
            BinOpKind::Div => "/",
            BinOpKind::LessThan => "<",
            BinOpKind::LessEqual => "<=",
            BinOpKind::GreaterThan => ">",
            BinOpKind::GreaterEqual => ">=",
            BinOpKind::Equal => "==",
            BinOpKind::NotEqual => "!=",
        }
    }
}

impl fmt::Display for BinOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: [Option<NodeId>; MAX_CHILDREN],
    pub sibling: Option<NodeId>,
    pub line: usize,
    /// Declared type for declarations; filled in by the type pass for expressions.
    pub ty: Ty,
    /// Symbol an Id or Call resolved to during the declaration pass.
    pub binding: Option<SymbolRef>,
}

impl Node {
    pub fn new(kind: NodeKind, line: usize) -> Self {
        Self {
            kind,
            children: [None; MAX_CHILDREN],
            sibling: None,
            line,
            ty: Ty::Void,
            binding: None,
        }
    }

    pub fn with_ty(mut self, ty: Ty) -> Self {
        self.ty = ty;
        self
    }

    pub fn with_child(mut self, slot: usize, child: Option<NodeId>) -> Self {
        self.children[slot] = child;
        self
    }

    pub fn child(&self, slot: usize) -> Option<NodeId> {
        self.children[slot]
    }

    /// Name carried by identifiers, calls and declarations.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Expr(ExprKind::Id(name) | ExprKind::Call(name))
            | NodeKind::Decl(
                DeclKind::Var(name)
                | DeclKind::Func(name)
                | DeclKind::Param(name)
                | DeclKind::Array(name, _),
            ) => Some(name),
            _ => None,
        }
    }
}

/// Arena holding every node of one compilation unit. The root is the first
/// top-level declaration; the rest hang off its sibling chain.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Links `ids` into one sibling chain and returns its head.
    pub fn link_siblings(&mut self, ids: &[NodeId]) -> Option<NodeId> {
        for pair in ids.windows(2) {
            self.node_mut(pair[0]).sibling = Some(pair[1]);
        }
        ids.first().copied()
    }

    /// Iterates `first` and every node reachable through its sibling links.
    pub fn siblings(&self, first: Option<NodeId>) -> Siblings<'_> {
        Siblings { tree: self, next: first }
    }

    pub fn top_level(&self) -> Siblings<'_> {
        self.siblings(self.root)
    }
}

pub struct Siblings<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Siblings<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.tree.node(id).sibling;
        Some(id)
    }
}
