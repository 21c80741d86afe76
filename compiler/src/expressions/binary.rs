use crate::codegen::Compiler;
use crate::control_flow::ControlFlowCompiler;
use crate::error::CompilerError;
use crate::expressions::ExpressionCompiler;
use jsvm_parser::ast::{BinOp, Expr, UnaryOp};
use vm::opcode::OpCode;

pub trait BinaryCompiler {
    fn compile_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<u8, CompilerError>;
    fn compile_logical(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<u8, CompilerError>;
    fn compile_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<u8, CompilerError>;
}

fn opcode_for(op: BinOp) -> OpCode {
    match op {
        BinOp::Add => OpCode::Add,
        BinOp::Sub => OpCode::Sub,
        BinOp::Mul => OpCode::Mul,
        BinOp::Div => OpCode::Div,
        BinOp::Mod => OpCode::Mod,
        BinOp::Eq => OpCode::Eq,
        BinOp::Neq => OpCode::NotEq,
        BinOp::StrictEq => OpCode::StrictEq,
        BinOp::StrictNeq => OpCode::StrictNotEq,
        BinOp::Lt => OpCode::Lt,
        BinOp::Le => OpCode::Le,
        BinOp::Gt => OpCode::Gt,
        BinOp::Ge => OpCode::Ge,
        // Short-circuit operators never reach here
        BinOp::And | BinOp::Or => OpCode::Nop,
    }
}

impl BinaryCompiler for Compiler {
    fn compile_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<u8, CompilerError> {
        if matches!(op, BinOp::And | BinOp::Or) {
            return self.compile_logical(op, lhs, rhs);
        }

        // Accumulate into the left operand's register
        let left_reg = self.compile_expr(lhs)?;
        let right_reg = self.compile_expr(rhs)?;
        self.emit_abc(opcode_for(op), left_reg, left_reg, right_reg);
        self.free_reg(right_reg);
        Ok(left_reg)
    }

    /// `a && b` keeps `a` when it is falsy, `a || b` keeps `a` when it is
    /// truthy; otherwise the result is `b`.
    fn compile_logical(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<u8, CompilerError> {
        let target = self.compile_expr(lhs)?;
        let jump_op = if op == BinOp::And {
            OpCode::JumpIfFalse
        } else {
            OpCode::JumpIfTrue
        };
        let skip = self.emit_jump(jump_op, target);
        self.compile_expr_into(rhs, target)?;
        self.patch_jump(skip)?;
        Ok(target)
    }

    fn compile_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<u8, CompilerError> {
        let reg = self.compile_expr(operand)?;
        let opcode = match op {
            UnaryOp::Neg => OpCode::Neg,
            UnaryOp::Not => OpCode::LogNot,
        };
        self.emit_abc(opcode, reg, reg, 0);
        Ok(reg)
    }
}
