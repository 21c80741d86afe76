pub mod heap;
pub mod proto;
pub mod value;


pub use heap::{Arena, Binding, Closure, Function, Heap, Scope};
pub use proto::{Constant, Prototype};
pub use value::{format_number, Value};
