use std::fmt;

use crate::parser::BinOpKind;

/// Value an instruction reads or writes: a generated temporary or a source name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Temp(usize),
    Name(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Temp(index) => write!(f, "t{index}"),
            Operand::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Label(pub usize);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// One line of three-address code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `t0 = 5`
    Const { dest: Operand, value: i32 },
    /// `t2 = t0 + t1`
    Binary {
        dest: Operand,
        op: BinOpKind,
        lhs: Operand,
        rhs: Operand,
    },
    /// `x = t2`
    Copy { dest: String, src: Operand },
    /// `t1 = a[t0]`
    Load {
        dest: Operand,
        array: String,
        index: Operand,
    },
    /// `a[t0] = t1`
    Store {
        array: String,
        index: Operand,
        value: Operand,
    },
    Goto(Label),
    IfFalse { cond: Operand, target: Label },
    Label(Label),
    Func(String),
    /// Argument push before a call, or a parameter listed in a function header.
    Param(Operand),
    Call {
        dest: Option<Operand>,
        name: String,
        argc: usize,
    },
    Return(Option<Operand>),
    EndFunc,
    Array { name: String, size: i32 },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Const { dest, value } => write!(f, "{dest} = {value}"),
            Instruction::Binary { dest, op, lhs, rhs } => write!(f, "{dest} = {lhs} {op} {rhs}"),
            Instruction::Copy { dest, src } => write!(f, "{dest} = {src}"),
            Instruction::Load { dest, array, index } => write!(f, "{dest} = {array}[{index}]"),
            Instruction::Store {
                array,
                index,
                value,
            } => write!(f, "{array}[{index}] = {value}"),
            Instruction::Goto(label) => write!(f, "goto {label}"),
            Instruction::IfFalse { cond, target } => write!(f, "if_false {cond} goto {target}"),
            Instruction::Label(label) => write!(f, "{label}:"),
            Instruction::Func(name) => write!(f, "func {name}:"),
            Instruction::Param(operand) => write!(f, "param {operand}"),
            Instruction::Call {
                dest: Some(dest),
                name,
                argc,
            } => write!(f, "{dest} = call {name}, {argc}"),
            Instruction::Call {
                dest: None,
                name,
                argc,
            } => write!(f, "call {name}, {argc}"),
            Instruction::Return(Some(value)) => write!(f, "return {value}"),
            Instruction::Return(None) => f.write_str("return"),
            Instruction::EndFunc => f.write_str("endfunc"),
            Instruction::Array { name, size } => write!(f, "array {name}[{size}]"),
        }
    }
}
