use std::io::{self, Write};

use crate::disasm;
use crate::error::RuntimeError;
use crate::native::NativeObj;
use crate::opcode::{instruction::*, OpCode};
use memory::{Binding, Heap, Prototype, Scope, Value};

use super::arithmetic::ArithmeticOps;
use super::compare::CompareOps;
use super::control::ControlFlowOps;
use super::frame::CallFrame;
use super::globals::GlobalOps;
use super::native::NativeRegistry;
use super::stack::StackOps;

/// The Virtual Machine struct
pub struct VM {
    pub heap: Heap,
    // Fixed-size register file shared by all frames
    pub stack: Box<[Value]>,
    pub frames: Vec<CallFrame>,
    pub natives: Vec<NativeObj>,

    /// Sink for script output (`p(...)`)
    pub output: Box<dyn Write>,

    /// Sink for the instruction trace. `None` disables tracing.
    pub trace: Option<Box<dyn Write>>,
}

pub const STACK_MAX: usize = 65_536;
pub const MAX_FRAMES: usize = 256;

impl Default for VM {
    fn default() -> Self {
        Self::new()
    }
}

impl VM {
    /// Create a new VM instance with bootstrapped native functions
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Create a VM whose script output goes to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let stack = vec![Value::undefined(); STACK_MAX].into_boxed_slice();

        let mut vm = Self {
            heap: Heap::new(),
            stack,
            frames: Vec::with_capacity(64),
            natives: Vec::new(),
            output,
            trace: None,
        };

        vm.bootstrap_natives();
        vm
    }

    /// Clears frames left behind by a failed run.
    pub fn reset(&mut self) {
        self.frames.clear();

        #[cfg(debug_assertions)]
        self.stack.fill(Value::undefined());
    }

    // ========================================================================
    // Object model
    // ========================================================================

    /// Allocate a fresh global scope with the host functions installed.
    pub fn new_global(&mut self) -> u32 {
        let mut scope = Scope::new();
        for (idx, native) in self.natives.iter().enumerate() {
            scope.define(&native.name, Value::native(idx as u32), false);
        }
        self.heap.alloc_scope(scope)
    }

    /// Install a prototype tree and return the outer function handle.
    pub fn load_prototype(&mut self, proto: &Prototype) -> u32 {
        self.heap.import_prototype(proto)
    }

    pub fn new_closure(&mut self, function: u32, parent: Option<u32>) -> u32 {
        self.heap.alloc_closure(memory::Closure { function, parent })
    }

    /// Point a closure's static link at `scope`.
    pub fn set_parent(&mut self, closure: u32, scope: u32) -> Result<(), RuntimeError> {
        if self.heap.get_scope(scope).is_none() {
            return Err(RuntimeError::InvalidOperand(format!("scope handle {scope}")));
        }
        let closure = self
            .heap
            .get_closure_mut(closure)
            .ok_or(RuntimeError::FunctionNotFound)?;
        closure.parent = Some(scope);
        Ok(())
    }

    pub fn define_global(
        &mut self,
        scope: u32,
        name: &str,
        value: Value,
        enumerable: bool,
    ) -> Result<Option<Binding>, RuntimeError> {
        let scope = self
            .heap
            .get_scope_mut(scope)
            .ok_or_else(|| RuntimeError::InvalidOperand(format!("scope handle {scope}")))?;
        Ok(scope.define(name, value, enumerable))
    }

    pub fn lookup_global(&self, scope: u32, name: &str) -> Option<Value> {
        self.heap.get_scope(scope).and_then(|s| s.get(name))
    }

    /// Name of the function behind a closure handle.
    pub fn closure_name(&self, closure: u32) -> String {
        self.heap
            .get_closure(closure)
            .and_then(|c| self.heap.get_function(c.function))
            .map(|f| f.name.clone())
            .unwrap_or_else(|| "<unknown>".into())
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run a compiled script body against `scope` and return its completion
    /// value.
    pub fn run_script(&mut self, scope: u32, function: u32) -> Result<Value, RuntimeError> {
        let closure = self.new_closure(function, Some(scope));
        self.call_value(Value::closure(closure), &[])
    }

    /// Call any callable value to completion. Missing arguments read as
    /// `undefined`; extra arguments are ignored.
    pub fn call_value(&mut self, callee: Value, args: &[Value]) -> Result<Value, RuntimeError> {
        match callee {
            Value::Native(handle) => self.call_native(handle, args),
            Value::Closure(handle) => {
                let entry_depth = self.frames.len();
                self.enter_closure(handle, args, 0)?;
                log::trace!(
                    "call {} with {} argument(s)",
                    self.closure_name(handle),
                    args.len()
                );
                let result = self.interpret(entry_depth);
                if result.is_err() {
                    self.frames.truncate(entry_depth);
                }
                result
            }
            other => Err(RuntimeError::TypeError(format!(
                "{} is not a function",
                self.display_string(other)
            ))),
        }
    }

    /// Push a frame for `closure`. `dest_reg` is the absolute stack slot
    /// that receives the return value.
    pub(super) fn enter_closure(
        &mut self,
        closure: u32,
        args: &[Value],
        dest_reg: usize,
    ) -> Result<(), RuntimeError> {
        if self.frames.len() >= MAX_FRAMES {
            return Err(RuntimeError::StackOverflow);
        }
        let function = self
            .heap
            .get_closure(closure)
            .ok_or(RuntimeError::FunctionNotFound)?
            .function;
        let (arity, slots) = {
            let func = self
                .heap
                .get_function(function)
                .ok_or(RuntimeError::FunctionNotFound)?;
            (func.arity as usize, func.max_slots as usize)
        };

        let base = self.frames.last().map_or(0, |f| f.base + f.slots);
        if base + slots > STACK_MAX {
            return Err(RuntimeError::StackOverflow);
        }

        for (i, slot) in self.stack[base..base + slots].iter_mut().enumerate() {
            *slot = if i < arity {
                args.get(i).copied().unwrap_or_default()
            } else {
                Value::undefined()
            };
        }

        self.frames.push(CallFrame::new(closure, base, slots, dest_reg));
        Ok(())
    }

    /// Pop the current frame. Returns the value when the frame that
    /// `interpret` was entered with has finished.
    pub(super) fn finish_frame(
        &mut self,
        value: Value,
        entry_depth: usize,
    ) -> Result<Option<Value>, RuntimeError> {
        let frame = self.frames.pop().ok_or(RuntimeError::FunctionNotFound)?;
        if self.frames.len() <= entry_depth {
            return Ok(Some(value));
        }
        self.set_reg(0, frame.dest_reg, value)?;
        Ok(None)
    }

    /// Load `K[idx]` from the constant pool of `function`.
    pub(super) fn constant(&self, function: u32, idx: usize) -> Result<Value, RuntimeError> {
        self.heap
            .get_function(function)
            .ok_or(RuntimeError::FunctionNotFound)?
            .constants
            .get(idx)
            .copied()
            .ok_or_else(|| RuntimeError::InvalidOperand(format!("constant index {idx}")))
    }

    /// Main interpretation loop. Runs until the frame count drops back to
    /// `entry_depth`.
    fn interpret(&mut self, entry_depth: usize) -> Result<Value, RuntimeError> {
        while self.frames.len() > entry_depth {
            let frame_idx = self.frames.len() - 1;

            let (closure_idx, ip, base) = {
                let f = &self.frames[frame_idx];
                (f.closure, f.ip, f.base)
            };

            let closure = *self
                .heap
                .get_closure(closure_idx)
                .ok_or(RuntimeError::FunctionNotFound)?;
            let func = self
                .heap
                .get_function(closure.function)
                .ok_or(RuntimeError::FunctionNotFound)?;

            let Some(&instruction) = func.chunk.get(ip) else {
                // Falling off the end returns undefined
                if let Some(value) = self.finish_frame(Value::undefined(), entry_depth)? {
                    return Ok(value);
                }
                continue;
            };

            if let Some(sink) = self.trace.as_mut() {
                let line = disasm::format_instruction(&self.heap, func, ip, instruction);
                writeln!(sink, "[{}] {}", func.name, line)?;
            }

            self.frames[frame_idx].ip += 1;

            let op_byte = decode_opcode(instruction);
            let op = OpCode::from_u8(op_byte).ok_or(RuntimeError::InvalidOpcode(op_byte))?;

            match op {
                // Arithmetic (delegated to arithmetic.rs)
                OpCode::Add
                | OpCode::Sub
                | OpCode::Mul
                | OpCode::Div
                | OpCode::Mod
                | OpCode::Neg => {
                    self.handle_arithmetic(op, instruction, base)?;
                }

                // Comparison (delegated to compare.rs)
                OpCode::Eq
                | OpCode::NotEq
                | OpCode::StrictEq
                | OpCode::StrictNotEq
                | OpCode::Lt
                | OpCode::Le
                | OpCode::Gt
                | OpCode::Ge
                | OpCode::LogNot => {
                    self.handle_compare(op, instruction, base)?;
                }

                // Calls (delegated to control.rs)
                OpCode::Call | OpCode::Return | OpCode::Closure => {
                    if let Some(value) =
                        self.handle_control(op, instruction, base, closure, entry_depth)?
                    {
                        return Ok(value);
                    }
                }

                // Globals (delegated to globals.rs)
                OpCode::DefGlobal | OpCode::DeclGlobal | OpCode::GetGlobal | OpCode::SetGlobal => {
                    self.handle_globals(op, instruction, base, closure)?;
                }

                // Control Flow - Jumps
                OpCode::Jump => {
                    let dest = decode_bx(instruction) as usize;
                    self.frames[frame_idx].ip = dest;
                }

                OpCode::JumpIfFalse | OpCode::JumpIfTrue => {
                    let a = decode_a(instruction) as usize;
                    let dest = decode_bx(instruction) as usize;
                    let val = self.get_reg(base, a)?;
                    if self.is_truthy(val) == (op == OpCode::JumpIfTrue) {
                        self.frames[frame_idx].ip = dest;
                    }
                }

                // Constants & Moves
                OpCode::LoadConst => {
                    let a = decode_a(instruction) as usize;
                    let bx = decode_bx(instruction) as usize;
                    let val = self.constant(closure.function, bx)?;
                    self.set_reg(base, a, val)?;
                }

                OpCode::LoadTrue => {
                    let a = decode_a(instruction) as usize;
                    self.set_reg(base, a, Value::bool(true))?;
                }

                OpCode::LoadFalse => {
                    let a = decode_a(instruction) as usize;
                    self.set_reg(base, a, Value::bool(false))?;
                }

                OpCode::LoadNull => {
                    let a = decode_a(instruction) as usize;
                    self.set_reg(base, a, Value::null())?;
                }

                OpCode::LoadUndef => {
                    let a = decode_a(instruction) as usize;
                    self.set_reg(base, a, Value::undefined())?;
                }

                OpCode::Move => {
                    let a = decode_a(instruction) as usize;
                    let b = decode_b(instruction) as usize;
                    let val = self.get_reg(base, b)?;
                    self.set_reg(base, a, val)?;
                }

                OpCode::Nop => { /* no-op */ }
            }
        }
        Ok(Value::undefined())
    }
}
