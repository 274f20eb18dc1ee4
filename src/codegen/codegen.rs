use crate::{
    error::AllocationFailure,
    parser::{DeclKind, ExprKind, NodeId, NodeKind, StmtKind, Tree},
};

use super::{Instruction, Label, Operand};

/// Lowers a checked tree to three-address code. Temporaries and labels are
/// numbered across the whole unit and never reused.
#[derive(Debug, Default)]
pub struct Codegen {
    temp_index: usize,
    label_index: usize,
    code: Vec<Instruction>,
}

impl Codegen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(&mut self, tree: &Tree) -> Result<Vec<Instruction>, AllocationFailure> {
        self.gen_list(tree, tree.root())?;
        Ok(std::mem::take(&mut self.code))
    }

    fn new_temp(&mut self) -> Operand {
        let t = Operand::Temp(self.temp_index);
        self.temp_index += 1;
        t
    }

    fn new_label(&mut self) -> Label {
        let l = Label(self.label_index);
        self.label_index += 1;
        l
    }

    fn emit(&mut self, instruction: Instruction) -> Result<(), AllocationFailure> {
        self.code
            .try_reserve(1)
            .map_err(|_| AllocationFailure("emitting intermediate code"))?;
        self.code.push(instruction);
        Ok(())
    }

    fn gen_list(&mut self, tree: &Tree, first: Option<NodeId>) -> Result<(), AllocationFailure> {
        for id in tree.siblings(first) {
            self.gen_node(tree, id)?;
        }
        Ok(())
    }

    fn gen_node(&mut self, tree: &Tree, id: NodeId) -> Result<(), AllocationFailure> {
        match &tree.node(id).kind {
            NodeKind::Stmt(kind) => self.gen_stmt(tree, id, *kind),
            NodeKind::Expr(_) => self.gen_expr_stmt(tree, id),
            NodeKind::Decl(_) => self.gen_decl(tree, id),
        }
    }

    fn gen_decl(&mut self, tree: &Tree, id: NodeId) -> Result<(), AllocationFailure> {
        let node = tree.node(id);
        match &node.kind {
            NodeKind::Decl(DeclKind::Func(name)) => {
                self.emit(Instruction::Func(name.clone()))?;
                for param in tree.siblings(node.child(0)) {
                    if let Some(name) = tree.node(param).name() {
                        self.emit(Instruction::Param(Operand::Name(name.to_string())))?;
                    }
                }
                if let Some(body) = node.child(1) {
                    self.gen_node(tree, body)?;
                }
                self.emit(Instruction::EndFunc)
            }
            NodeKind::Decl(DeclKind::Array(name, size)) => self.emit(Instruction::Array {
                name: name.clone(),
                size: *size,
            }),
            _ => Ok(()),
        }
    }

    fn gen_stmt(&mut self, tree: &Tree, id: NodeId, kind: StmtKind) -> Result<(), AllocationFailure> {
        let node = tree.node(id);
        match kind {
            StmtKind::Assign => {
                let (Some(target), Some(value)) = (node.child(0), node.child(1)) else {
                    return Ok(());
                };
                let value = self.gen_expr(tree, value)?;
                let target = tree.node(target);
                let name = target.name().unwrap_or_default().to_string();
                if let Some(index) = target.child(0) {
                    let index = self.gen_expr(tree, index)?;
                    self.emit(Instruction::Store {
                        array: name,
                        index,
                        value,
                    })
                } else {
                    self.emit(Instruction::Copy {
                        dest: name,
                        src: value,
                    })
                }
            }
            StmtKind::If => self.gen_if(tree, id),
            StmtKind::While => self.gen_while(tree, id),
            StmtKind::Return => {
                let value = match node.child(0) {
                    Some(value) => Some(self.gen_expr(tree, value)?),
                    None => None,
                };
                self.emit(Instruction::Return(value))
            }
            StmtKind::Compound => self.gen_list(tree, node.child(1)),
        }
    }

    fn gen_if(&mut self, tree: &Tree, id: NodeId) -> Result<(), AllocationFailure> {
        let node = tree.node(id);
        let Some(cond) = node.child(0) else {
            return Ok(());
        };

        let test = self.gen_expr(tree, cond)?;
        let false_label = self.new_label();
        let end_label = self.new_label();

        self.emit(Instruction::IfFalse {
            cond: test,
            target: false_label,
        })?;
        if let Some(then_stmt) = node.child(1) {
            self.gen_node(tree, then_stmt)?;
        }

        if let Some(else_stmt) = node.child(2) {
            self.emit(Instruction::Goto(end_label))?;
            self.emit(Instruction::Label(false_label))?;
            self.gen_node(tree, else_stmt)?;
            self.emit(Instruction::Label(end_label))
        } else {
            self.emit(Instruction::Label(false_label))
        }
    }

    fn gen_while(&mut self, tree: &Tree, id: NodeId) -> Result<(), AllocationFailure> {
        let node = tree.node(id);
        let Some(cond) = node.child(0) else {
            return Ok(());
        };

        let start_label = self.new_label();
        let end_label = self.new_label();

        self.emit(Instruction::Label(start_label))?;
        let test = self.gen_expr(tree, cond)?;
        self.emit(Instruction::IfFalse {
            cond: test,
            target: end_label,
        })?;
        if let Some(body) = node.child(1) {
            self.gen_node(tree, body)?;
        }
        self.emit(Instruction::Goto(start_label))?;
        self.emit(Instruction::Label(end_label))
    }

    /// An expression whose value is discarded. Only calls produce code, and
    /// they get no result temporary.
    fn gen_expr_stmt(&mut self, tree: &Tree, id: NodeId) -> Result<(), AllocationFailure> {
        let node = tree.node(id);
        let NodeKind::Expr(ExprKind::Call(name)) = &node.kind else {
            return Ok(());
        };
        let argc = self.gen_args(tree, node.child(0))?;
        self.emit(Instruction::Call {
            dest: None,
            name: name.clone(),
            argc,
        })
    }

    /// Evaluates each argument left to right, pushing it right after it is computed.
    fn gen_args(&mut self, tree: &Tree, first: Option<NodeId>) -> Result<usize, AllocationFailure> {
        let mut argc = 0;
        for arg in tree.siblings(first) {
            let value = self.gen_expr(tree, arg)?;
            self.emit(Instruction::Param(value))?;
            argc += 1;
        }
        Ok(argc)
    }

    fn gen_expr(&mut self, tree: &Tree, id: NodeId) -> Result<Operand, AllocationFailure> {
        let node = tree.node(id);
        match &node.kind {
            NodeKind::Expr(ExprKind::Const(value)) => {
                let dest = self.new_temp();
                self.emit(Instruction::Const {
                    dest: dest.clone(),
                    value: *value,
                })?;
                Ok(dest)
            }
            NodeKind::Expr(ExprKind::Id(name)) => {
                let Some(index) = node.child(0) else {
                    return Ok(Operand::Name(name.clone()));
                };
                let index = self.gen_expr(tree, index)?;
                let dest = self.new_temp();
                self.emit(Instruction::Load {
                    dest: dest.clone(),
                    array: name.clone(),
                    index,
                })?;
                Ok(dest)
            }
            NodeKind::Expr(ExprKind::Op(op)) => {
                let (Some(lhs), Some(rhs)) = (node.child(0), node.child(1)) else {
                    unreachable!("operator at line {} is missing an operand", node.line);
                };
                let lhs = self.gen_expr(tree, lhs)?;
                let rhs = self.gen_expr(tree, rhs)?;
                let dest = self.new_temp();
                self.emit(Instruction::Binary {
                    dest: dest.clone(),
                    op: *op,
                    lhs,
                    rhs,
                })?;
                Ok(dest)
            }
            NodeKind::Expr(ExprKind::Call(name)) => {
                let argc = self.gen_args(tree, node.child(0))?;
                let dest = self.new_temp();
                self.emit(Instruction::Call {
                    dest: Some(dest.clone()),
                    name: name.clone(),
                    argc,
                })?;
                Ok(dest)
            }
            kind => unreachable!("{:?} is not an expression", kind),
        }
    }
}
