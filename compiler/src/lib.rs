pub mod codegen;
pub mod control_flow;
pub mod error;
pub mod expressions;
pub mod function_compiler;
pub mod functions;
pub mod scopes;
pub mod statements;
pub mod types;

pub use codegen::{compile_image, compile_script, CompiledImage, Compiler, SCRIPT_NAME};
pub use error::CompilerError;
