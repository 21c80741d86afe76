//! The capability interface a script engine offers the loader.
//!
//! The container layer never looks inside functions, scripts, scopes or
//! values; it only moves them between these operations.

use std::io::Write;

use thiserror::Error;

use crate::cursor::Cursor;
use crate::driver::RunConfig;

/// Failure reported by an engine operation. The message is shown to the
/// user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A compiled body to disassemble.
pub enum Unit<'a, F, S> {
    Function(&'a F),
    Script(&'a S),
}

pub trait Engine {
    /// Global scope handle.
    type Scope;
    /// Decoded function, before and after linking.
    type Function;
    /// Top-level script body.
    type Script;
    /// Runtime value.
    type Value;

    /// Tag an image must start with.
    fn container_magic(&self) -> u32;

    /// A fresh global scope with the engine's built-ins installed.
    fn new_global(&mut self) -> Self::Scope;

    fn compile_text(&mut self, source: &str, filename: &str) -> Result<Self::Script, EngineError>;

    /// Decode one function record at the cursor, returning the name
    /// embedded in the record. On success the cursor sits just past the
    /// record.
    fn decode_function(
        &mut self,
        cursor: &mut Cursor<'_>,
    ) -> Result<(String, Self::Function), EngineError>;

    /// Decode the script record at the cursor.
    fn decode_script(&mut self, cursor: &mut Cursor<'_>) -> Result<Self::Script, EngineError>;

    /// Make `scope` the scope `function` resolves free names in. This is
    /// the first hook a decoded function reaches, so an engine may defer
    /// installing it until here and update the handle in place.
    fn set_static_parent(
        &mut self,
        function: &mut Self::Function,
        scope: &Self::Scope,
    ) -> Result<(), EngineError>;

    /// Runtime value of a function whose static parent has been set.
    fn function_value(&self, function: &Self::Function) -> Self::Value;

    /// Bind `name` as an enumerable property of `scope`. Returns `true` when
    /// an existing binding was replaced.
    fn define_global(
        &mut self,
        scope: &Self::Scope,
        name: &str,
        value: Self::Value,
    ) -> Result<bool, EngineError>;

    /// `None` when `name` is unbound or bound to `undefined` or `null`.
    fn lookup_global(&self, scope: &Self::Scope, name: &str) -> Option<Self::Value>;

    /// The function behind `value`, if it is one.
    fn as_function(&self, value: &Self::Value) -> Option<Self::Function>;

    fn run_script(
        &mut self,
        scope: &Self::Scope,
        script: &Self::Script,
        config: &RunConfig,
    ) -> Result<Self::Value, EngineError>;

    fn disassemble(
        &mut self,
        unit: Unit<'_, Self::Function, Self::Script>,
        out: &mut dyn Write,
    ) -> Result<(), EngineError>;

    fn value_to_display_string(&mut self, value: &Self::Value) -> Result<String, EngineError>;
}
