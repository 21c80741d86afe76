/// Represents a single call frame in the execution stack.
///
/// Each frame tracks:
/// - `closure`: Handle to the Closure object in the heap
/// - `ip`: Instruction Pointer (current bytecode index)
/// - `base`: Base offset in the value stack for this frame's registers
/// - `slots`: Number of registers the frame owns, starting at `base`
/// - `dest_reg`: Absolute stack slot that receives the return value
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub closure: u32,
    pub ip: usize,
    pub base: usize,
    pub slots: usize,
    pub dest_reg: usize,
}

impl CallFrame {
    pub fn new(closure: u32, base: usize, slots: usize, dest_reg: usize) -> Self {
        Self {
            closure,
            ip: 0,
            base,
            slots,
            dest_reg,
        }
    }
}
