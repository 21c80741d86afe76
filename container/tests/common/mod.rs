//! A tiny engine with a trivial record format, for exercising the
//! container layer without a real VM.
//!
//! Function record: `b'F'`, name length `u8`, name bytes, result `u8`.
//! Script record:   `b'S'`, then either `0, value u8` (evaluates to
//! `value`) or `1, name length u8, name bytes` (calls global `name`).
//! Source text:     `value N` or `call NAME`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;

use container::{Cursor, Engine, EngineError, RunConfig, Unit};

pub const MOCK_MAGIC: u32 = u32::from_le_bytes(*b"MOCK");

#[derive(Debug, Clone, PartialEq)]
pub enum MockValue {
    Undefined,
    Null,
    Number(f64),
    Function(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockScript {
    Value(u8),
    Call(String),
}

#[derive(Debug, Default)]
pub struct MockFunction {
    pub name: String,
    pub result: u8,
    pub parent: Option<usize>,
}

#[derive(Default)]
pub struct MockEngine {
    pub scopes: Vec<HashMap<String, MockValue>>,
    pub functions: Vec<MockFunction>,
    pub events: Vec<String>,
    pub traced: bool,
}

pub fn function_record(name: &str, result: u8) -> Vec<u8> {
    let mut rec = vec![b'F', name.len() as u8];
    rec.extend_from_slice(name.as_bytes());
    rec.push(result);
    rec
}

pub fn value_script(value: u8) -> Vec<u8> {
    vec![b'S', 0, value]
}

pub fn call_script(name: &str) -> Vec<u8> {
    let mut rec = vec![b'S', 1, name.len() as u8];
    rec.extend_from_slice(name.as_bytes());
    rec
}

fn err(e: impl ToString) -> EngineError {
    EngineError::new(e.to_string())
}

fn read_name(cursor: &mut Cursor<'_>) -> Result<String, EngineError> {
    let len = cursor.read_u8().map_err(err)? as usize;
    let bytes = cursor.read_bytes(len).map_err(err)?;
    String::from_utf8(bytes.to_vec()).map_err(err)
}

fn expect_kind(cursor: &mut Cursor<'_>, kind: u8) -> Result<(), EngineError> {
    let found = cursor.read_u8().map_err(err)?;
    if found == kind {
        Ok(())
    } else {
        Err(EngineError::new(format!("unexpected record kind {found:#04x}")))
    }
}

impl Engine for MockEngine {
    type Scope = usize;
    type Function = usize;
    type Script = MockScript;
    type Value = MockValue;

    fn container_magic(&self) -> u32 {
        MOCK_MAGIC
    }

    fn new_global(&mut self) -> usize {
        self.scopes.push(HashMap::new());
        self.events.push("new_global".into());
        self.scopes.len() - 1
    }

    fn compile_text(&mut self, source: &str, _filename: &str) -> Result<MockScript, EngineError> {
        let mut words = source.split_whitespace();
        match (words.next(), words.next()) {
            (Some("value"), Some(n)) => n.parse().map(MockScript::Value).map_err(err),
            (Some("call"), Some(name)) => Ok(MockScript::Call(name.to_string())),
            _ => Err(EngineError::new(format!("cannot compile {source:?}"))),
        }
    }

    fn decode_function(&mut self, cursor: &mut Cursor<'_>) -> Result<(String, usize), EngineError> {
        expect_kind(cursor, b'F')?;
        let name = read_name(cursor)?;
        let result = cursor.read_u8().map_err(err)?;
        self.functions.push(MockFunction {
            name: name.clone(),
            result,
            parent: None,
        });
        Ok((name, self.functions.len() - 1))
    }

    fn decode_script(&mut self, cursor: &mut Cursor<'_>) -> Result<MockScript, EngineError> {
        expect_kind(cursor, b'S')?;
        match cursor.read_u8().map_err(err)? {
            0 => Ok(MockScript::Value(cursor.read_u8().map_err(err)?)),
            1 => Ok(MockScript::Call(read_name(cursor)?)),
            other => Err(EngineError::new(format!("bad script mode {other}"))),
        }
    }

    fn set_static_parent(&mut self, function: &mut usize, scope: &usize) -> Result<(), EngineError> {
        self.events.push(format!("parent {function}"));
        self.functions[*function].parent = Some(*scope);
        Ok(())
    }

    fn function_value(&self, function: &usize) -> MockValue {
        MockValue::Function(*function)
    }

    fn define_global(
        &mut self,
        scope: &usize,
        name: &str,
        value: MockValue,
    ) -> Result<bool, EngineError> {
        self.events.push(format!("define {name}"));
        Ok(self.scopes[*scope].insert(name.to_string(), value).is_some())
    }

    fn lookup_global(&self, scope: &usize, name: &str) -> Option<MockValue> {
        match self.scopes[*scope].get(name)? {
            MockValue::Undefined | MockValue::Null => None,
            other => Some(other.clone()),
        }
    }

    fn as_function(&self, value: &MockValue) -> Option<usize> {
        match value {
            MockValue::Function(f) => Some(*f),
            _ => None,
        }
    }

    fn run_script(
        &mut self,
        scope: &usize,
        script: &MockScript,
        config: &RunConfig,
    ) -> Result<MockValue, EngineError> {
        self.traced = config.trace;
        match script {
            MockScript::Value(n) => Ok(MockValue::Number(*n as f64)),
            MockScript::Call(name) => {
                let callee = self
                    .lookup_global(scope, name)
                    .ok_or_else(|| EngineError::new(format!("ReferenceError: {name} is not defined")))?;
                let f = self
                    .as_function(&callee)
                    .ok_or_else(|| EngineError::new(format!("TypeError: {name} is not a function")))?;
                let function = &self.functions[f];
                if function.parent != Some(*scope) {
                    return Err(EngineError::new(format!("{name} is not bound to this scope")));
                }
                Ok(MockValue::Number(function.result as f64))
            }
        }
    }

    fn disassemble(
        &mut self,
        unit: Unit<'_, usize, MockScript>,
        out: &mut dyn Write,
    ) -> Result<(), EngineError> {
        match unit {
            Unit::Script(MockScript::Value(n)) => {
                writeln!(out, "0000 LOAD {n}").map_err(err)?;
                writeln!(out, "0001 RETURN").map_err(err)
            }
            Unit::Script(MockScript::Call(name)) => {
                writeln!(out, "0000 GET {name}").map_err(err)?;
                writeln!(out, "0001 CALL").map_err(err)?;
                writeln!(out, "0002 RETURN").map_err(err)
            }
            Unit::Function(f) => {
                let function = &self.functions[*f];
                writeln!(out, "; function {}", function.name).map_err(err)?;
                writeln!(out, "0000 LOAD {}", function.result).map_err(err)?;
                writeln!(out, "0001 RETURN").map_err(err)
            }
        }
    }

    fn value_to_display_string(&mut self, value: &MockValue) -> Result<String, EngineError> {
        Ok(match value {
            MockValue::Undefined => "undefined".into(),
            MockValue::Null => "null".into(),
            MockValue::Number(n) => n.to_string(),
            MockValue::Function(f) => format!("function {}", self.functions[*f].name),
        })
    }
}
