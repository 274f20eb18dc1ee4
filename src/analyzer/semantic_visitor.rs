use crate::error::AllocationFailure;
use crate::parser::{DeclKind, ExprKind, NodeId, NodeKind, StmtKind, Tree};

use super::{OperandSide, SemanticError, SymbolTable, Ty};

type Proc = fn(&mut SemanticVisitor, &mut Tree, NodeId) -> Result<(), AllocationFailure>;

/// Runs the declaration pass and the type pass over one tree, accumulating
/// diagnostics instead of stopping at the first one.
#[derive(Debug, Default)]
pub struct SemanticVisitor {
    symbol_table: SymbolTable,
    global_memloc: usize,
    local_memloc: usize,
    main_declared: bool,
    errors: Vec<SemanticError>,
}

impl SemanticVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbol_table
    }

    pub fn into_symbol_table(self) -> SymbolTable {
        self.symbol_table
    }

    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn take_errors(&mut self) -> Vec<SemanticError> {
        std::mem::take(&mut self.errors)
    }

    /// Declaration pass. Pushes the global scope, seeds `input` and `output`,
    /// then binds every declaration and resolves every identifier use.
    pub fn build_symbol_table(&mut self, tree: &mut Tree) -> Result<(), AllocationFailure> {
        self.symbol_table.push_scope("global")?;
        for (name, ty) in [("input", Ty::Integer), ("output", Ty::Void)] {
            let memloc = self.next_global_memloc();
            self.symbol_table.insert(name, ty, 0, memloc)?;
        }

        let root = tree.root();
        self.traverse(tree, root, Self::insert_node, Self::after_insert_node)
    }

    /// Type pass: assigns a type to every expression, then checks them.
    /// Expects a tree whose declaration pass recorded no errors.
    pub fn type_check(&mut self, tree: &mut Tree) -> Result<(), AllocationFailure> {
        let root = tree.root();
        self.traverse(tree, root, Self::set_node_type, Self::null_proc)?;
        self.traverse(tree, root, Self::check_node, Self::null_proc)?;

        if !self.main_declared {
            self.errors.push(SemanticError::MissingMain);
        }
        Ok(())
    }

    /// Pre-order on the node, its children left to right, post-order on the
    /// node, then the same for each sibling.
    fn traverse(
        &mut self,
        tree: &mut Tree,
        first: Option<NodeId>,
        pre: Proc,
        post: Proc,
    ) -> Result<(), AllocationFailure> {
        let mut next = first;
        while let Some(id) = next {
            pre(self, tree, id)?;
            let children = tree.node(id).children;
            for child in children {
                self.traverse(tree, child, pre, post)?;
            }
            post(self, tree, id)?;
            next = tree.node(id).sibling;
        }
        Ok(())
    }

    fn null_proc(&mut self, _tree: &mut Tree, _id: NodeId) -> Result<(), AllocationFailure> {
        Ok(())
    }

    fn next_global_memloc(&mut self) -> usize {
        self.global_memloc += 1;
        self.global_memloc - 1
    }

    fn next_local_memloc(&mut self) -> usize {
        self.local_memloc += 1;
        self.local_memloc - 1
    }

    fn insert_node(&mut self, tree: &mut Tree, id: NodeId) -> Result<(), AllocationFailure> {
        let node = tree.node(id);
        let (line, ty) = (node.line, node.ty);

        match node.kind.clone() {
            NodeKind::Decl(DeclKind::Var(name) | DeclKind::Array(name, _)) => {
                if let Some(existing) = self.symbol_table.resolve_local(&name) {
                    self.symbol_table.add_line(existing, line)?;
                    self.errors
                        .push(SemanticError::DuplicateDeclaration { name, line });
                } else if ty.is_void() {
                    self.errors.push(SemanticError::VoidVariable { name, line });
                } else {
                    let memloc = if self.symbol_table.is_global() {
                        self.next_global_memloc()
                    } else {
                        self.next_local_memloc()
                    };
                    self.symbol_table.insert(&name, ty, line, memloc)?;
                }
            }
            NodeKind::Decl(DeclKind::Func(name)) => {
                if let Some(existing) = self.symbol_table.resolve(&name) {
                    self.symbol_table.add_line(existing, line)?;
                    self.errors.push(SemanticError::DuplicateFunction {
                        name: name.clone(),
                        line,
                    });
                } else {
                    let memloc = self.next_global_memloc();
                    self.symbol_table.insert(&name, ty, line, memloc)?;
                    self.main_declared |= name == "main";
                }
                // the body still gets its own scope so the matching pop stays balanced
                self.symbol_table.push_scope(&name)?;
                self.local_memloc = 0;
            }
            NodeKind::Decl(DeclKind::Param(name)) => {
                if let Some(existing) = self.symbol_table.resolve_local(&name) {
                    self.symbol_table.add_line(existing, line)?;
                    self.errors
                        .push(SemanticError::DuplicateParameter { name, line });
                } else {
                    let memloc = self.next_local_memloc();
                    self.symbol_table.insert(&name, ty, line, memloc)?;
                }
            }
            NodeKind::Expr(ExprKind::Id(name) | ExprKind::Call(name)) => {
                match self.symbol_table.resolve(&name) {
                    Some(r) => {
                        self.symbol_table.add_line(r, line)?;
                        tree.node_mut(id).binding = Some(r);
                    }
                    None => self
                        .errors
                        .push(SemanticError::UndeclaredIdentifier { name, line }),
                }
            }
            _ => (),
        }
        Ok(())
    }

    fn after_insert_node(&mut self, tree: &mut Tree, id: NodeId) -> Result<(), AllocationFailure> {
        if let NodeKind::Decl(DeclKind::Func(_)) = tree.node(id).kind {
            self.symbol_table.pop_scope();
        }
        Ok(())
    }

    fn declared_type(&self, tree: &Tree, id: NodeId) -> Option<Ty> {
        tree.node(id)
            .binding
            .map(|r| self.symbol_table.entry(r).ty)
    }

    fn set_node_type(&mut self, tree: &mut Tree, id: NodeId) -> Result<(), AllocationFailure> {
        let node = tree.node(id);
        let ty = match node.kind {
            NodeKind::Expr(ExprKind::Const(_) | ExprKind::Op(_)) => Some(Ty::Integer),
            NodeKind::Expr(ExprKind::Id(_)) => {
                let indexed = node.child(0).is_some();
                self.declared_type(tree, id).map(|ty| match ty {
                    Ty::IntegerArray if indexed => Ty::Integer,
                    ty => ty,
                })
            }
            NodeKind::Expr(ExprKind::Call(_)) => {
                Some(self.declared_type(tree, id).unwrap_or(Ty::Void))
            }
            _ => None,
        };

        if let Some(ty) = ty {
            tree.node_mut(id).ty = ty;
        }
        Ok(())
    }

    fn check_node(&mut self, tree: &mut Tree, id: NodeId) -> Result<(), AllocationFailure> {
        let node = tree.node(id);
        let line = node.line;

        match node.kind.clone() {
            NodeKind::Stmt(StmtKind::Assign) => {
                let (Some(target), Some(value)) = (node.child(0), node.child(1)) else {
                    return Ok(());
                };
                let target = tree.node(target);
                if target.ty.is_array() && target.child(0).is_none() {
                    self.errors.push(SemanticError::ArrayAssignWithoutIndex {
                        name: target.name().unwrap_or_default().to_string(),
                        line,
                    });
                }
                if tree.node(value).ty.is_void() {
                    self.errors.push(SemanticError::VoidRValue { line });
                }
            }
            NodeKind::Expr(ExprKind::Op(_)) => {
                let operands = [
                    (OperandSide::Left, node.child(0)),
                    (OperandSide::Right, node.child(1)),
                ];
                for (side, operand) in operands {
                    if operand.is_some_and(|o| tree.node(o).ty.is_void()) {
                        self.errors.push(SemanticError::VoidOperand { side, line });
                    }
                }
                tree.node_mut(id).ty = Ty::Integer;
            }
            NodeKind::Expr(ExprKind::Const(_)) => tree.node_mut(id).ty = Ty::Integer,
            NodeKind::Expr(ExprKind::Id(name)) => {
                let Some(declared) = self.declared_type(tree, id) else {
                    return Ok(());
                };
                let mut ty = declared;
                if node.child(0).is_some() {
                    if declared.is_array() {
                        ty = Ty::Integer;
                    } else {
                        self.errors
                            .push(SemanticError::IndexingNonArray { name, line });
                    }
                }
                tree.node_mut(id).ty = ty;
            }
            NodeKind::Expr(ExprKind::Call(_)) => {
                let ty = self.declared_type(tree, id).unwrap_or(Ty::Void);
                tree.node_mut(id).ty = ty;
            }
            _ => (),
        }
        Ok(())
    }
}
