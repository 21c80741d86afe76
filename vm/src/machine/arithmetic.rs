use crate::error::RuntimeError;
use crate::opcode::{instruction::*, OpCode};
use memory::Value;

use super::stack::StackOps;

/// Trait for arithmetic instruction handlers
pub trait ArithmeticOps {
    fn handle_arithmetic(
        &mut self,
        op: OpCode,
        instruction: u32,
        base: usize,
    ) -> Result<(), RuntimeError>;

    /// `+`: string concatenation when either operand is a heap object
    /// (string or function), numeric addition otherwise.
    fn add_values(&mut self, lhs: Value, rhs: Value) -> Value;
}

impl ArithmeticOps for super::vm::VM {
    fn handle_arithmetic(
        &mut self,
        op: OpCode,
        instruction: u32,
        base: usize,
    ) -> Result<(), RuntimeError> {
        let a = decode_a(instruction) as usize;
        let b = decode_b(instruction) as usize;

        if op == OpCode::Neg {
            let vb = self.get_reg(base, b)?;
            let n = self.to_number(vb);
            return self.set_reg(base, a, Value::number(-n));
        }

        let c = decode_c(instruction) as usize;
        let vb = self.get_reg(base, b)?;
        let vc = self.get_reg(base, c)?;

        let res = match op {
            OpCode::Add => self.add_values(vb, vc),
            OpCode::Sub => Value::number(self.to_number(vb) - self.to_number(vc)),
            OpCode::Mul => Value::number(self.to_number(vb) * self.to_number(vc)),
            // IEEE semantics: x / 0 is ±Infinity or NaN
            OpCode::Div => Value::number(self.to_number(vb) / self.to_number(vc)),
            // f64 `%` truncates toward zero and keeps the dividend's sign
            OpCode::Mod => Value::number(self.to_number(vb) % self.to_number(vc)),
            _ => unreachable!(),
        };
        self.set_reg(base, a, res)
    }

    fn add_values(&mut self, lhs: Value, rhs: Value) -> Value {
        if lhs.is_obj() || rhs.is_obj() {
            let mut s = self.display_string(lhs);
            s.push_str(&self.display_string(rhs));
            Value::string(self.heap.alloc_string(s))
        } else {
            Value::number(self.to_number(lhs) + self.to_number(rhs))
        }
    }
}
