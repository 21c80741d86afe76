use crate::codegen::Compiler;
use crate::control_flow::ControlFlowCompiler;
use crate::error::CompilerError;
use crate::expressions::ExpressionCompiler;
use crate::functions::FunctionDefinitionCompiler;
use jsvm_parser::ast::Stmt;
use vm::opcode::OpCode;

pub mod declarations;

pub use declarations::DeclarationCompiler;

pub trait StatementCompiler {
    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompilerError>;
}

impl StatementCompiler for Compiler {
    fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompilerError> {
        // Track source line for error reporting
        self.current().current_line = stmt.span().line;

        match stmt {
            Stmt::VarDecl {
                kind, name, value, ..
            } => self.compile_var_decl(*kind, name, value.as_ref()),
            Stmt::FnDecl {
                name, params, body, ..
            } => self.compile_fn_decl(name, params, body),
            Stmt::Return { value, span } => {
                if self.current_ref().is_script {
                    return Err(CompilerError::ReturnOutsideFunction { line: span.line });
                }
                match value {
                    Some(expr) => {
                        let reg = self.compile_expr(expr)?;
                        self.emit_abc(OpCode::Return, reg, 1, 0);
                        self.free_reg(reg);
                    }
                    None => self.emit_abc(OpCode::Return, 0, 0, 0),
                }
                Ok(())
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => self.compile_if(condition, then_branch, else_branch.as_deref()),
            Stmt::While {
                condition, body, ..
            } => self.compile_while(condition, body),
            Stmt::Block(block) => self.compile_block(block),
            Stmt::Expr(expr) => match self.current_ref().completion_reg {
                // Script level: the last expression statement run is the
                // completion value
                Some(completion) => self.compile_expr_into(expr, completion),
                None => {
                    let reg = self.compile_expr(expr)?;
                    self.free_reg(reg);
                    Ok(())
                }
            },
            Stmt::Empty { .. } => Ok(()),
        }
    }
}
