use crate::codegen::Compiler;
use crate::error::CompilerError;
use crate::expressions::{AtomCompiler, ExpressionCompiler};
use crate::scopes::ScopeCompiler;
use crate::types::Resolved;
use jsvm_parser::ast::{DeclKind, Expr};
use vm::opcode::OpCode;

pub trait DeclarationCompiler {
    fn compile_var_decl(
        &mut self,
        kind: DeclKind,
        name: &str,
        value: Option<&Expr>,
    ) -> Result<(), CompilerError>;
    fn compile_assign(&mut self, name: &str, value: &Expr) -> Result<u8, CompilerError>;
}

impl DeclarationCompiler for Compiler {
    fn compile_var_decl(
        &mut self,
        kind: DeclKind,
        name: &str,
        value: Option<&Expr>,
    ) -> Result<(), CompilerError> {
        if self.current_ref().is_script {
            let idx = self.name_constant(name)?;
            match (kind, value) {
                // `var x;` never clobbers an existing binding
                (DeclKind::Var, None) => self.emit_abx(OpCode::DeclGlobal, 0, idx),
                (_, value) => {
                    let reg = match value {
                        Some(expr) => self.compile_expr(expr)?,
                        None => self.compile_load(OpCode::LoadUndef)?,
                    };
                    self.emit_abx(OpCode::DefGlobal, reg, idx);
                    self.free_reg(reg);
                }
            }
            return Ok(());
        }

        // A repeated `var` in a function is a plain assignment
        if kind == DeclKind::Var && self.current_ref().resolve_local(name).is_some() {
            if let Some(expr) = value {
                let reg = self.compile_assign(name, expr)?;
                self.free_reg(reg);
            }
            return Ok(());
        }

        let reg = match value {
            Some(expr) => self.compile_expr(expr)?,
            None => self.compile_load(OpCode::LoadUndef)?,
        };
        self.declare_local(name, reg, kind == DeclKind::Const)
    }

    fn compile_assign(&mut self, name: &str, value: &Expr) -> Result<u8, CompilerError> {
        let resolved = self.resolve_name(name)?;
        let is_const = match resolved {
            Resolved::Local { is_const, .. } => is_const,
            Resolved::Global => self.global_consts.contains(name),
        };
        if is_const {
            return Err(CompilerError::AssignToConst {
                name: name.to_string(),
                line: self.line(),
            });
        }

        let reg = self.compile_expr(value)?;
        match resolved {
            Resolved::Local { reg: local, .. } => {
                self.emit_abc(OpCode::Move, local, reg, 0);
            }
            Resolved::Global => {
                let idx = self.name_constant(name)?;
                self.emit_abx(OpCode::SetGlobal, reg, idx);
            }
        }
        Ok(reg)
    }
}
