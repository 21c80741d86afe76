use std::io::Write;

use crate::error::RuntimeError;
use crate::machine::VM;
use memory::Value;

/// `p(...)`: print the arguments separated by spaces, then a newline.
pub fn native_p(vm: &mut VM, args: &[Value]) -> Result<Value, RuntimeError> {
    let line = args
        .iter()
        .map(|arg| vm.display_string(*arg))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(vm.output, "{line}")?;
    Ok(Value::undefined())
}
