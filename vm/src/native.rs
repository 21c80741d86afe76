use memory::Value;

use crate::error::RuntimeError;
use crate::machine::VM;

/// Host function signature. `args` are the caller's argument registers.
pub type NativeFn = fn(vm: &mut VM, args: &[Value]) -> Result<Value, RuntimeError>;

/// A host function installed on every global scope.
#[derive(Clone)]
pub struct NativeObj {
    pub name: String,
    pub func: NativeFn,
    /// Exact argument count, or `None` for variadic functions.
    pub arity: Option<usize>,
}
