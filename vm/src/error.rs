use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("stack overflow")]
    StackOverflow,
    #[error("invalid opcode {0:#04x}")]
    InvalidOpcode(u8),
    #[error("function not found")]
    FunctionNotFound,
    #[error("invalid operand: {0}")]
    InvalidOperand(String),
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("ReferenceError: {0} is not defined")]
    ReferenceError(String),
    #[error("function `{0}` is not bound to a scope")]
    UnboundScope(String),
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}
