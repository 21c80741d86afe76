use crate::codegen::Compiler;
use crate::error::CompilerError;
use crate::function_compiler::FunctionCompiler;
use crate::scopes::ScopeCompiler;
use crate::statements::StatementCompiler;
use jsvm_parser::ast::{Block, Stmt};
use memory::Prototype;
use vm::opcode::OpCode;

pub trait FunctionDefinitionCompiler {
    /// Compile a function body into a standalone prototype.
    fn compile_function(
        &mut self,
        name: &str,
        params: &[String],
        body: &Block,
    ) -> Result<Prototype, CompilerError>;

    /// Function expression: the closure lands in a fresh register.
    fn compile_fn_expr(
        &mut self,
        name: &str,
        params: &[String],
        body: &Block,
    ) -> Result<u8, CompilerError>;

    /// Function declaration: a global in the script, a local elsewhere.
    fn compile_fn_decl(
        &mut self,
        name: &str,
        params: &[String],
        body: &Block,
    ) -> Result<(), CompilerError>;

    /// Declare every function in `stmts` before anything else runs.
    fn hoist_functions(&mut self, stmts: &[Stmt]) -> Result<(), CompilerError>;
}

impl FunctionDefinitionCompiler for Compiler {
    fn compile_function(
        &mut self,
        name: &str,
        params: &[String],
        body: &Block,
    ) -> Result<Prototype, CompilerError> {
        let line = self.line();
        let depth = self.compilers.len();

        // The parser caps parameter lists at 255
        let mut fc = FunctionCompiler::new(name, params.len() as u8);
        fc.current_line = line;
        self.compilers.push(fc);

        for (i, param) in params.iter().enumerate() {
            self.declare_local(param, i as u8, false)?;
        }

        self.begin_scope();
        self.hoist_functions(&body.stmts)?;
        for stmt in &body.stmts {
            if !matches!(stmt, Stmt::FnDecl { .. }) {
                self.compile_stmt(stmt)?;
            }
        }

        // Falling off the end returns undefined
        self.emit_abc(OpCode::Return, 0, 0, 0);

        let proto = self.compilers.remove(depth).into_prototype();
        log::trace!(
            "compiled function {:?}: {} instruction(s), {} slot(s)",
            proto.name,
            proto.code.len(),
            proto.max_slots
        );
        Ok(proto)
    }

    fn compile_fn_expr(
        &mut self,
        name: &str,
        params: &[String],
        body: &Block,
    ) -> Result<u8, CompilerError> {
        let proto = self.compile_function(name, params, body)?;
        let idx = self.current().add_proto(proto)?;
        let reg = self.alloc_reg()?;
        self.emit_abx(OpCode::Closure, reg, idx);
        Ok(reg)
    }

    fn compile_fn_decl(
        &mut self,
        name: &str,
        params: &[String],
        body: &Block,
    ) -> Result<(), CompilerError> {
        let reg = self.compile_fn_expr(name, params, body)?;
        if self.current_ref().is_script {
            let idx = self.name_constant(name)?;
            self.emit_abx(OpCode::DefGlobal, reg, idx);
            self.free_reg(reg);
            Ok(())
        } else {
            self.declare_local(name, reg, false)
        }
    }

    fn hoist_functions(&mut self, stmts: &[Stmt]) -> Result<(), CompilerError> {
        for stmt in stmts {
            if let Stmt::FnDecl {
                name,
                params,
                body,
                span,
            } = stmt
            {
                self.current().current_line = span.line;
                self.compile_fn_decl(name, params, body)?;
            }
        }
        Ok(())
    }
}
