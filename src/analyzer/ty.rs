use std::fmt;

/// Type attached to declarations and, after the type pass, to every expression node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ty {
    #[default]
    Void,
    Integer,
    IntegerArray,
    Boolean,
}

impl Ty {
    pub fn is_void(&self) -> bool {
        *self == Ty::Void
    }

    pub fn is_array(&self) -> bool {
        *self == Ty::IntegerArray
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Ty::Void => "void",
            Ty::Integer => "int",
            Ty::IntegerArray => "int[]",
            Ty::Boolean => "boolean",
        };
        f.write_str(s)
    }
}
