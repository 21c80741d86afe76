use crate::error::RuntimeError;
use crate::opcode::{instruction::*, OpCode};
use memory::Value;

use super::stack::StackOps;

/// Trait for comparison and logical-not handlers
pub trait CompareOps {
    fn handle_compare(
        &mut self,
        op: OpCode,
        instruction: u32,
        base: usize,
    ) -> Result<(), RuntimeError>;

    /// Abstract relational comparison `lhs < rhs`. `None` when either side
    /// converts to NaN, which makes every relational operator false.
    fn less_than(&self, lhs: Value, rhs: Value) -> Option<bool>;
}

impl CompareOps for super::vm::VM {
    fn handle_compare(
        &mut self,
        op: OpCode,
        instruction: u32,
        base: usize,
    ) -> Result<(), RuntimeError> {
        let a = decode_a(instruction) as usize;
        let b = decode_b(instruction) as usize;

        if op == OpCode::LogNot {
            let vb = self.get_reg(base, b)?;
            let res = !self.is_truthy(vb);
            return self.set_reg(base, a, Value::bool(res));
        }

        let c = decode_c(instruction) as usize;
        let vb = self.get_reg(base, b)?;
        let vc = self.get_reg(base, c)?;

        let res = match op {
            OpCode::Eq => self.loose_equals(vb, vc),
            OpCode::NotEq => !self.loose_equals(vb, vc),
            OpCode::StrictEq => self.strict_equals(vb, vc),
            OpCode::StrictNotEq => !self.strict_equals(vb, vc),
            OpCode::Lt => self.less_than(vb, vc) == Some(true),
            OpCode::Gt => self.less_than(vc, vb) == Some(true),
            OpCode::Le => self.less_than(vc, vb) == Some(false),
            OpCode::Ge => self.less_than(vb, vc) == Some(false),
            _ => unreachable!(),
        };
        self.set_reg(base, a, Value::bool(res))
    }

    fn less_than(&self, lhs: Value, rhs: Value) -> Option<bool> {
        if let (Some(l), Some(r)) = (self.string_value(lhs), self.string_value(rhs)) {
            return Some(l < r);
        }
        let (l, r) = (self.to_number(lhs), self.to_number(rhs));
        if l.is_nan() || r.is_nan() {
            None
        } else {
            Some(l < r)
        }
    }
}
