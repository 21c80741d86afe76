use crate::codegen::Compiler;
use crate::error::CompilerError;
use crate::expressions::ExpressionCompiler;
use jsvm_parser::ast::Expr;
use vm::opcode::OpCode;

pub trait PostfixCompiler {
    fn compile_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<u8, CompilerError>;
}

impl PostfixCompiler for Compiler {
    /// Callee lands in R[base], arguments in R[base+1..]; the result
    /// replaces the callee.
    fn compile_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<u8, CompilerError> {
        if args.len() > u8::MAX as usize {
            return Err(CompilerError::TooManyArguments { line: self.line() });
        }

        let base = self.compile_expr(callee)?;
        let mut arg_regs = Vec::with_capacity(args.len());
        for arg in args {
            arg_regs.push(self.compile_expr(arg)?);
        }

        self.emit_abc(OpCode::Call, base, base, args.len() as u8);

        for reg in arg_regs.into_iter().rev() {
            self.free_reg(reg);
        }
        Ok(base)
    }
}
