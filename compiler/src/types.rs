/// A named register in the function being compiled.
#[derive(Debug, Clone)]
pub struct Local {
    pub name: String,
    pub depth: u32,
    pub reg: u8,
    pub is_const: bool,
}

/// Where an identifier lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Local { reg: u8, is_const: bool },
    Global,
}
