use crate::native::{NativeFn, NativeObj};

/// Trait for native function registration
pub trait NativeRegistry {
    fn define_native(&mut self, name: &str, func: NativeFn, arity: Option<usize>);
    fn bootstrap_natives(&mut self);
}

impl NativeRegistry for super::vm::VM {
    /// Natives are installed into every scope created by `new_global`,
    /// as non-enumerable bindings.
    fn define_native(&mut self, name: &str, func: NativeFn, arity: Option<usize>) {
        self.natives.push(NativeObj {
            name: name.to_string(),
            func,
            arity,
        });
    }

    fn bootstrap_natives(&mut self) {
        self.define_native("p", crate::stdlib::core::native_p, None);
    }
}
