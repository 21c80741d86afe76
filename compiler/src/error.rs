use jsvm_parser::ParseError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CompilerError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("line {line}: too many constants in one function")]
    TooManyConstants { line: usize },
    #[error("line {line}: too many nested functions in one function")]
    TooManyFunctions { line: usize },
    #[error("line {line}: expression needs more than 255 registers")]
    RegisterOverflow { line: usize },
    #[error("line {line}: function body too large for a jump")]
    JumpTooFar { line: usize },
    #[error("line {line}: too many arguments in call (max 255)")]
    TooManyArguments { line: usize },
    #[error("line {line}: `{name}` belongs to an enclosing function; only globals can be captured")]
    CaptureNotSupported { name: String, line: usize },
    #[error("line {line}: assignment to constant `{name}`")]
    AssignToConst { name: String, line: usize },
    #[error("line {line}: `{name}` has already been declared")]
    Redeclaration { name: String, line: usize },
    #[error("line {line}: return outside of a function")]
    ReturnOutsideFunction { line: usize },
}
