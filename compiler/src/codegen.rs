use std::collections::HashSet;

use crate::error::CompilerError;
use crate::function_compiler::FunctionCompiler;
use crate::functions::FunctionDefinitionCompiler;
use crate::statements::StatementCompiler;
use jsvm_parser::ast::{DeclKind, Program, Stmt};
use jsvm_parser::parse_program;
use memory::{Constant, Prototype};
use vm::opcode::OpCode;

/// Name given to the top-level script body.
pub const SCRIPT_NAME: &str = "<script>";

/// Output of [`compile_image`]: one script plus the top-level functions it
/// refers to by name.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledImage {
    pub functions: Vec<Prototype>,
    pub script: Prototype,
}

/// Compile source text into a single script. Top-level function
/// declarations are hoisted into the script body.
pub fn compile_script(source: &str) -> Result<Prototype, CompilerError> {
    let program = parse_program(source)?;
    Compiler::new().compile_program(&program)
}

/// Compile source text into a script and one auxiliary unit per top-level
/// function declaration.
pub fn compile_image(source: &str) -> Result<CompiledImage, CompilerError> {
    let program = parse_program(source)?;
    Compiler::new().compile_image_program(&program)
}

pub struct Compiler {
    // Stack of function compilers; index 0 is the script
    pub compilers: Vec<FunctionCompiler>,

    // Top-level `const` names, known before any body is compiled
    pub global_consts: HashSet<String>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self {
            compilers: vec![FunctionCompiler::script(SCRIPT_NAME)],
            global_consts: HashSet::new(),
        }
    }

    pub fn compile_program(mut self, program: &Program) -> Result<Prototype, CompilerError> {
        self.collect_global_consts(&program.stmts);
        self.hoist_functions(&program.stmts)?;
        self.compile_script_body(&program.stmts)?;
        self.finish_script()
    }

    pub fn compile_image_program(
        mut self,
        program: &Program,
    ) -> Result<CompiledImage, CompilerError> {
        self.collect_global_consts(&program.stmts);

        let mut functions = Vec::new();
        for stmt in &program.stmts {
            if let Stmt::FnDecl {
                name, params, body, span,
            } = stmt
            {
                self.current().current_line = span.line;
                functions.push(self.compile_function(name, params, body)?);
            }
        }
        log::debug!("compiled {} auxiliary function(s)", functions.len());

        self.compile_script_body(&program.stmts)?;
        let script = self.finish_script()?;
        Ok(CompiledImage { functions, script })
    }

    fn collect_global_consts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if let Stmt::VarDecl {
                kind: DeclKind::Const,
                name,
                ..
            } = stmt
            {
                self.global_consts.insert(name.clone());
            }
        }
    }

    /// Statements of the script body. Top-level function declarations were
    /// already handled by the caller.
    fn compile_script_body(&mut self, stmts: &[Stmt]) -> Result<(), CompilerError> {
        for stmt in stmts {
            if matches!(stmt, Stmt::FnDecl { .. }) {
                continue;
            }
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn finish_script(mut self) -> Result<Prototype, CompilerError> {
        let completion = self.current_ref().completion_reg.unwrap_or(0);
        self.emit_abc(OpCode::Return, completion, 1, 0);
        debug_assert_eq!(self.compilers.len(), 1, "unbalanced function compilers");
        Ok(self.compilers.swap_remove(0).into_prototype())
    }

    // --- Access to the function being compiled ---

    pub fn current(&mut self) -> &mut FunctionCompiler {
        // The script compiler is only popped by `finish_script`
        let last = self.compilers.len() - 1;
        &mut self.compilers[last]
    }

    pub fn current_ref(&self) -> &FunctionCompiler {
        let last = self.compilers.len() - 1;
        &self.compilers[last]
    }

    pub fn line(&self) -> usize {
        self.current_ref().current_line
    }

    pub fn alloc_reg(&mut self) -> Result<u8, CompilerError> {
        self.current().alloc_reg()
    }

    pub fn free_reg(&mut self, reg: u8) {
        self.current().free_reg(reg)
    }

    pub fn emit_abc(&mut self, op: OpCode, a: u8, b: u8, c: u8) {
        self.current().emit_abc(op, a, b, c)
    }

    pub fn emit_abx(&mut self, op: OpCode, a: u8, bx: u16) {
        self.current().emit_abx(op, a, bx)
    }

    pub fn add_constant(&mut self, constant: Constant) -> Result<u16, CompilerError> {
        self.current().add_constant(constant)
    }

    /// Constant-pool index of a global's name.
    pub fn name_constant(&mut self, name: &str) -> Result<u16, CompilerError> {
        self.add_constant(Constant::String(name.to_string()))
    }
}
