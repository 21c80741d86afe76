use crate::codegen::Compiler;
use crate::error::CompilerError;
use crate::functions::FunctionDefinitionCompiler;
use crate::statements::DeclarationCompiler;
use jsvm_parser::ast::Expr;
use vm::opcode::OpCode;

pub mod atoms;
pub mod binary;
pub mod postfix;

pub use atoms::AtomCompiler;
pub use binary::BinaryCompiler;
pub use postfix::PostfixCompiler;

pub trait ExpressionCompiler {
    /// Compile `expr` into a fresh register on top of the register stack.
    fn compile_expr(&mut self, expr: &Expr) -> Result<u8, CompilerError>;
    fn compile_expr_into(&mut self, expr: &Expr, target: u8) -> Result<(), CompilerError>;
}

impl ExpressionCompiler for Compiler {
    fn compile_expr(&mut self, expr: &Expr) -> Result<u8, CompilerError> {
        match expr {
            Expr::Number { value, .. } => self.compile_number(*value),
            Expr::StringLit { value, .. } => self.compile_string(value),
            Expr::Bool { value, .. } => {
                let op = if *value {
                    OpCode::LoadTrue
                } else {
                    OpCode::LoadFalse
                };
                self.compile_load(op)
            }
            Expr::Null { .. } => self.compile_load(OpCode::LoadNull),
            Expr::Undefined { .. } => self.compile_load(OpCode::LoadUndef),
            Expr::Ident { name, .. } => self.compile_identifier(name),
            Expr::BinOp { op, lhs, rhs, .. } => self.compile_binary(*op, lhs, rhs),
            Expr::UnaryOp { op, operand, .. } => self.compile_unary(*op, operand),
            Expr::Call { callee, args, .. } => self.compile_call(callee, args),
            Expr::Assign { name, value, .. } => self.compile_assign(name, value),
            Expr::FnExpr {
                name, params, body, ..
            } => {
                let name = name.as_deref().unwrap_or("");
                self.compile_fn_expr(name, params, body)
            }
        }
    }

    fn compile_expr_into(&mut self, expr: &Expr, target: u8) -> Result<(), CompilerError> {
        let reg = self.compile_expr(expr)?;
        if reg != target {
            self.emit_abc(OpCode::Move, target, reg, 0);
        }
        self.free_reg(reg);
        Ok(())
    }
}
