pub mod compile;
pub mod disassemble;
pub mod run;
