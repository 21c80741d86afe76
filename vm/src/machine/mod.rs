//! Machine module - VM implementation
//!
//! This module contains the Virtual Machine implementation segmented into
//! focused submodules for maintainability.

mod arithmetic;
mod coerce;
mod compare;
mod control;
mod frame;
mod globals;
mod native;
mod stack;
mod vm;

// Public API
pub use frame::CallFrame;
pub use vm::{MAX_FRAMES, STACK_MAX, VM};
