use crate::codegen::Compiler;
use crate::error::CompilerError;
use crate::types::{Local, Resolved};

pub trait ScopeCompiler {
    fn begin_scope(&mut self);
    fn end_scope(&mut self);
    fn declare_local(&mut self, name: &str, reg: u8, is_const: bool) -> Result<(), CompilerError>;
    fn resolve_name(&self, name: &str) -> Result<Resolved, CompilerError>;
}

impl ScopeCompiler for Compiler {
    fn begin_scope(&mut self) {
        self.current().scope_depth += 1;
    }

    fn end_scope(&mut self) {
        let func = self.current();
        func.scope_depth -= 1;
        let depth = func.scope_depth;

        // Locals are ordered by creation, so the out-of-scope ones are a
        // suffix and the last one popped holds the lowest register.
        while let Some(local) = func.locals.last() {
            if local.depth <= depth {
                break;
            }
            func.reg_top = local.reg;
            func.locals.pop();
        }
    }

    fn declare_local(&mut self, name: &str, reg: u8, is_const: bool) -> Result<(), CompilerError> {
        let line = self.line();
        let func = self.current();
        let depth = func.scope_depth;
        let clash = func
            .locals
            .iter()
            .rev()
            .take_while(|l| l.depth == depth)
            .any(|l| l.name == name);
        if clash {
            return Err(CompilerError::Redeclaration {
                name: name.to_string(),
                line,
            });
        }
        func.locals.push(Local {
            name: name.to_string(),
            depth,
            reg,
            is_const,
        });
        Ok(())
    }

    fn resolve_name(&self, name: &str) -> Result<Resolved, CompilerError> {
        if let Some(local) = self.current_ref().resolve_local(name) {
            return Ok(Resolved::Local {
                reg: local.reg,
                is_const: local.is_const,
            });
        }

        // Enclosing functions' locals are not reachable at run time
        let enclosing = &self.compilers[..self.compilers.len() - 1];
        if enclosing.iter().any(|f| f.resolve_local(name).is_some()) {
            return Err(CompilerError::CaptureNotSupported {
                name: name.to_string(),
                line: self.line(),
            });
        }

        Ok(Resolved::Global)
    }
}
