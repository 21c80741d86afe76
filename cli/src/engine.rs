//! `container::Engine` backed by the register VM.

use std::io::{self, Write};

use container::{Cursor, Engine, EngineError, RunConfig, Unit};
use memory::{Prototype, Value};
use vm::xdr::{self, UnitKind};
use vm::VM;

/// A function as the loader sees it.
#[derive(Debug, Clone)]
pub enum VmFunction {
    /// Decoded from an image. Nothing is allocated in the heap until the
    /// linker gives it a parent, so a failed decode leaves the VM untouched.
    Decoded(Box<Prototype>),
    /// A callable already in the heap: a closure or a native.
    Loaded(Value),
}

/// Scopes are heap handles. Scripts stay as prototypes until they are run
/// or disassembled.
pub struct VmEngine {
    pub vm: VM,
}

impl Default for VmEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl VmEngine {
    pub fn new() -> Self {
        Self { vm: VM::new() }
    }

    /// Engine whose script output (`p(...)`) goes to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self {
            vm: VM::with_output(output),
        }
    }

    fn disassemble_function(&self, handle: u32, out: &mut dyn Write) -> Result<(), EngineError> {
        let function = self
            .vm
            .heap
            .get_function(handle)
            .ok_or_else(|| EngineError::new(format!("function handle {handle} is not loaded")))?;
        vm::disasm::disassemble(&self.vm.heap, function, out).map_err(io_error)
    }
}

fn io_error(e: io::Error) -> EngineError {
    EngineError::new(format!("output error: {e}"))
}

fn xdr_error(e: xdr::XdrError) -> EngineError {
    EngineError::new(e.to_string())
}

impl Engine for VmEngine {
    type Scope = u32;
    type Function = VmFunction;
    type Script = Prototype;
    type Value = Value;

    fn container_magic(&self) -> u32 {
        vm::CONTAINER_MAGIC
    }

    fn new_global(&mut self) -> u32 {
        self.vm.new_global()
    }

    fn compile_text(&mut self, source: &str, filename: &str) -> Result<Prototype, EngineError> {
        compiler::compile_script(source).map_err(|e| EngineError::new(format!("{filename}: {e}")))
    }

    fn decode_function(
        &mut self,
        cursor: &mut Cursor<'_>,
    ) -> Result<(String, VmFunction), EngineError> {
        let proto = xdr::read_unit(cursor, UnitKind::Function).map_err(xdr_error)?;
        Ok((proto.name.clone(), VmFunction::Decoded(Box::new(proto))))
    }

    fn decode_script(&mut self, cursor: &mut Cursor<'_>) -> Result<Prototype, EngineError> {
        xdr::read_unit(cursor, UnitKind::Script).map_err(xdr_error)
    }

    fn set_static_parent(
        &mut self,
        function: &mut VmFunction,
        scope: &u32,
    ) -> Result<(), EngineError> {
        match function {
            VmFunction::Decoded(proto) => {
                if self.vm.heap.get_scope(*scope).is_none() {
                    return Err(EngineError::new(format!("scope handle {scope} is not loaded")));
                }
                let handle = self.vm.load_prototype(proto);
                let closure = self.vm.new_closure(handle, Some(*scope));
                *function = VmFunction::Loaded(Value::closure(closure));
                Ok(())
            }
            VmFunction::Loaded(Value::Closure(handle)) => self
                .vm
                .set_parent(*handle, *scope)
                .map_err(|e| EngineError::new(e.to_string())),
            VmFunction::Loaded(other) => Err(EngineError::new(format!(
                "cannot bind a {} to a scope",
                other.type_name()
            ))),
        }
    }

    fn function_value(&self, function: &VmFunction) -> Value {
        match function {
            VmFunction::Loaded(value) => *value,
            // Unreachable through the linker, which sets the parent first
            VmFunction::Decoded(_) => Value::undefined(),
        }
    }

    fn define_global(&mut self, scope: &u32, name: &str, value: Value) -> Result<bool, EngineError> {
        self.vm
            .define_global(*scope, name, value, true)
            .map(|previous| previous.is_some())
            .map_err(|e| EngineError::new(e.to_string()))
    }

    fn lookup_global(&self, scope: &u32, name: &str) -> Option<Value> {
        self.vm
            .lookup_global(*scope, name)
            .filter(|value| !value.is_nullish())
    }

    fn as_function(&self, value: &Value) -> Option<VmFunction> {
        value.is_callable().then_some(VmFunction::Loaded(*value))
    }

    fn run_script(
        &mut self,
        scope: &u32,
        script: &Prototype,
        config: &RunConfig,
    ) -> Result<Value, EngineError> {
        let function = self.vm.load_prototype(script);
        if config.trace {
            self.vm.trace = Some(Box::new(io::stderr()));
        }
        let result = self.vm.run_script(*scope, function);
        self.vm.trace = None;
        result.map_err(|e| {
            self.vm.reset();
            EngineError::new(e.to_string())
        })
    }

    fn disassemble(
        &mut self,
        unit: Unit<'_, VmFunction, Prototype>,
        out: &mut dyn Write,
    ) -> Result<(), EngineError> {
        match unit {
            Unit::Script(script) => {
                let handle = self.vm.load_prototype(script);
                self.disassemble_function(handle, out)
            }
            Unit::Function(VmFunction::Loaded(Value::Closure(closure))) => {
                let function = self
                    .vm
                    .heap
                    .get_closure(*closure)
                    .map(|c| c.function)
                    .ok_or_else(|| EngineError::new(format!("closure handle {closure} is not loaded")))?;
                self.disassemble_function(function, out)
            }
            Unit::Function(VmFunction::Loaded(Value::Native(handle))) => {
                let name = self
                    .vm
                    .natives
                    .get(*handle as usize)
                    .map_or("<unknown>", |n| n.name.as_str());
                writeln!(out, "; native function {name}").map_err(io_error)
            }
            Unit::Function(VmFunction::Loaded(other)) => Err(EngineError::new(format!(
                "cannot disassemble a {}",
                other.type_name()
            ))),
            Unit::Function(VmFunction::Decoded(proto)) => Err(EngineError::new(format!(
                "function `{}` has not been linked",
                proto.name
            ))),
        }
    }

    fn value_to_display_string(&mut self, value: &Value) -> Result<String, EngineError> {
        Ok(self.vm.display_string(*value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> VmEngine {
        VmEngine::with_output(Box::new(io::sink()))
    }

    #[test]
    fn test_compile_and_run_text() {
        let mut engine = engine();
        let script = engine.compile_text("6 * 7;", "t.js").unwrap();
        let global = engine.new_global();
        let value = engine
            .run_script(&global, &script, &RunConfig::default())
            .unwrap();
        assert_eq!(engine.value_to_display_string(&value).unwrap(), "42");
    }

    #[test]
    fn test_compile_error_names_file() {
        let err = engine().compile_text("let = ;", "bad.js").unwrap_err();
        assert!(err.message.starts_with("bad.js: "), "{}", err.message);
    }

    #[test]
    fn test_lookup_hides_nullish() {
        let mut engine = engine();
        let global = engine.new_global();
        engine
            .define_global(&global, "u", Value::undefined())
            .unwrap();
        engine.define_global(&global, "n", Value::null()).unwrap();
        engine
            .define_global(&global, "x", Value::number(1.0))
            .unwrap();
        assert!(engine.lookup_global(&global, "u").is_none());
        assert!(engine.lookup_global(&global, "n").is_none());
        assert!(engine.lookup_global(&global, "missing").is_none());
        assert_eq!(engine.lookup_global(&global, "x"), Some(Value::number(1.0)));
    }

    #[test]
    fn test_define_reports_rebind() {
        let mut engine = engine();
        let global = engine.new_global();
        assert!(!engine.define_global(&global, "a", Value::number(1.0)).unwrap());
        assert!(engine.define_global(&global, "a", Value::number(2.0)).unwrap());
    }

    #[test]
    fn test_native_is_a_function() {
        let mut engine = engine();
        let global = engine.new_global();
        let p = engine.vm.lookup_global(global, "p").unwrap();
        let function = engine.as_function(&p).unwrap();
        assert!(engine.as_function(&Value::number(1.0)).is_none());

        let mut out = Vec::new();
        engine.disassemble(Unit::Function(&function), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "; native function p\n");
    }

    #[test]
    fn test_failed_run_leaves_engine_usable() {
        let mut engine = engine();
        let global = engine.new_global();
        let bad = engine.compile_text("missing();", "t.js").unwrap();
        let err = engine
            .run_script(&global, &bad, &RunConfig::default())
            .unwrap_err();
        assert_eq!(err.message, "ReferenceError: missing is not defined");

        let good = engine.compile_text("1 + 1;", "t.js").unwrap();
        let value = engine
            .run_script(&global, &good, &RunConfig::default())
            .unwrap();
        assert_eq!(value, Value::number(2.0));
    }

    fn image(source: &str) -> Vec<u8> {
        let compiled = compiler::compile_image(source).unwrap();
        let mut builder = container::ImageBuilder::new(vm::CONTAINER_MAGIC);
        for function in &compiled.functions {
            builder.function(xdr::encode_unit(UnitKind::Function, function).unwrap());
        }
        builder.script(xdr::encode_unit(UnitKind::Script, &compiled.script).unwrap());
        builder.finish()
    }

    fn heap_sizes(engine: &VmEngine) -> (usize, usize, usize) {
        let heap = &engine.vm.heap;
        (heap.functions.len(), heap.closures.len(), heap.strings.len())
    }

    #[test]
    fn test_failed_decode_allocates_nothing() {
        let mut engine = engine();
        let before = heap_sizes(&engine);

        let mut bytes = image("function a() { return 'a'; }\nfunction b() { return 'b'; }\na();\n");
        bytes.push(0);
        let err = container::decode(bytes.into(), &mut engine).unwrap_err();
        assert!(matches!(err, container::ImageError::TrailingData { remaining: 1 }));

        let mut bytes = image("function a() { return 1; }\na();\n");
        bytes.truncate(bytes.len() - 2);
        assert!(container::decode(bytes.into(), &mut engine).is_err());

        assert_eq!(heap_sizes(&engine), before);
    }

    #[test]
    fn test_linking_installs_decoded_functions() {
        let mut engine = engine();
        let decoded = container::decode(
            image("function addOne(x) { return x + 1; }\naddOne(41);\n").into(),
            &mut engine,
        )
        .unwrap();
        assert!(matches!(decoded.functions[0].1, VmFunction::Decoded(_)));
        let (functions_before, closures_before, _) = heap_sizes(&engine);

        let global = engine.new_global();
        container::link(&mut engine, &global, decoded.functions).unwrap();
        let (functions_after, closures_after, _) = heap_sizes(&engine);
        assert_eq!(functions_after, functions_before + 1);
        assert_eq!(closures_after, closures_before + 1);

        let value = engine
            .run_script(&global, &decoded.script, &RunConfig::default())
            .unwrap();
        assert_eq!(value, Value::number(42.0));
    }

    #[test]
    fn test_unlinked_function_cannot_be_disassembled() {
        let mut engine = engine();
        let function = VmFunction::Decoded(Box::new(Prototype::new("f", 0)));
        let err = engine
            .disassemble(Unit::Function(&function), &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.message, "function `f` has not been linked");
    }
}
