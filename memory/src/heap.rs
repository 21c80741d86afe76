use crate::proto::{Constant, Prototype};
use crate::Value;
use std::collections::HashMap;

/// A compiled function body living on the heap.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub arity: u8,
    pub max_slots: u16,
    pub chunk: Vec<u32>,
    pub constants: Vec<Value>,
    /// Handles of nested function bodies, indexed by the CLOSURE operand.
    pub protos: Vec<u32>,
}

/// A callable instance of a [`Function`].
///
/// `parent` is the static link: the scope global names are resolved
/// against while this closure runs. A closure decoded from an image has no
/// parent until the linker sets one.
#[derive(Debug, Clone, Copy)]
pub struct Closure {
    pub function: u32,
    pub parent: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub value: Value,
    pub enumerable: bool,
}

/// A property bag used as an execution scope (the global object).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: HashMap<String, Binding>,
    // First-definition order, for enumeration.
    order: Vec<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or overwrite `name`. Returns the previous binding, if any.
    pub fn define(&mut self, name: &str, value: Value, enumerable: bool) -> Option<Binding> {
        let prev = self
            .bindings
            .insert(name.to_string(), Binding { value, enumerable });
        if prev.is_none() {
            self.order.push(name.to_string());
        }
        prev
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).map(|b| b.value)
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Names of enumerable bindings in definition order.
    pub fn enumerable_names(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .filter(|name| self.bindings.get(name.as_str()).is_some_and(|b| b.enumerable))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Arena<T> {
    pub data: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn alloc(&mut self, item: T) -> u32 {
        let index = self.data.len() as u32;
        self.data.push(item);
        index
    }

    pub fn get(&self, handle: u32) -> Option<&T> {
        self.data.get(handle as usize)
    }

    pub fn get_mut(&mut self, handle: u32) -> Option<&mut T> {
        self.data.get_mut(handle as usize)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Typed arenas for every heap object kind.
///
/// Objects live for the lifetime of the heap; a driver run is short-lived
/// and owns exactly one heap, so there is no collector.
#[derive(Debug, Default)]
pub struct Heap {
    pub strings: Arena<String>,
    pub functions: Arena<Function>,
    pub closures: Arena<Closure>,
    pub scopes: Arena<Scope>,
    pub bytes_allocated: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_string(&mut self, s: String) -> u32 {
        self.bytes_allocated += s.capacity();
        self.strings.alloc(s)
    }

    pub fn alloc_function(&mut self, f: Function) -> u32 {
        self.bytes_allocated += f.chunk.len() * 4 + f.constants.len() * std::mem::size_of::<Value>();
        self.functions.alloc(f)
    }

    pub fn alloc_closure(&mut self, c: Closure) -> u32 {
        self.closures.alloc(c)
    }

    pub fn alloc_scope(&mut self, s: Scope) -> u32 {
        self.scopes.alloc(s)
    }

    pub fn get_string(&self, handle: u32) -> Option<&String> {
        self.strings.get(handle)
    }

    pub fn get_function(&self, handle: u32) -> Option<&Function> {
        self.functions.get(handle)
    }

    pub fn get_closure(&self, handle: u32) -> Option<&Closure> {
        self.closures.get(handle)
    }

    pub fn get_closure_mut(&mut self, handle: u32) -> Option<&mut Closure> {
        self.closures.get_mut(handle)
    }

    pub fn get_scope(&self, handle: u32) -> Option<&Scope> {
        self.scopes.get(handle)
    }

    pub fn get_scope_mut(&mut self, handle: u32) -> Option<&mut Scope> {
        self.scopes.get_mut(handle)
    }

    /// Materialize a constant into a runtime value.
    pub fn alloc_constant(&mut self, c: &Constant) -> Value {
        match c {
            Constant::Undefined => Value::undefined(),
            Constant::Null => Value::null(),
            Constant::Bool(b) => Value::bool(*b),
            Constant::Number(n) => Value::number(*n),
            Constant::String(s) => Value::string(self.alloc_string(s.clone())),
        }
    }

    /// Install a prototype tree on the heap, nested bodies first.
    /// Returns the handle of the outermost function.
    pub fn import_prototype(&mut self, proto: &Prototype) -> u32 {
        let protos = proto
            .protos
            .iter()
            .map(|nested| self.import_prototype(nested))
            .collect();
        let constants = proto
            .constants
            .iter()
            .map(|c| self.alloc_constant(c))
            .collect();
        self.alloc_function(Function {
            name: proto.name.clone(),
            arity: proto.arity,
            max_slots: proto.max_slots,
            chunk: proto.code.clone(),
            constants,
            protos,
        })
    }
}
