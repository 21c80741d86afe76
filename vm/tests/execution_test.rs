use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use compiler::{compile_image, compile_script};
use memory::Value;
use vm::{RuntimeError, VM};

#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Helper: compile + run a source string in a fresh global scope.
fn run(source: &str) -> (VM, u32, Result<Value, RuntimeError>, SharedBuf) {
    let proto = compile_script(source).expect("compilation failed");
    let out = SharedBuf::default();
    let mut vm = VM::with_output(Box::new(out.clone()));
    let global = vm.new_global();
    let function = vm.load_prototype(&proto);
    let result = vm.run_script(global, function);
    (vm, global, result, out)
}

/// Helper: display string of the completion value.
fn eval(source: &str) -> String {
    let (vm, _, result, _) = run(source);
    let value = result.expect("runtime error");
    vm.display_string(value)
}

fn output(source: &str) -> String {
    let (_, _, result, out) = run(source);
    result.expect("runtime error");
    out.text()
}

fn eval_err(source: &str) -> RuntimeError {
    let (_, _, result, _) = run(source);
    result.expect_err("expected runtime error")
}

#[test]
fn test_completion_value() {
    assert_eq!(eval("1 + 2;"), "3");
    assert_eq!(eval("var x = 5; x * 2; var y = 1;"), "10");
    assert_eq!(eval("var x = 1;"), "undefined");
    assert_eq!(eval(""), "undefined");
}

#[test]
fn test_add_one_scenario() {
    let src = "function addOne(x) { return x + 1; }\nvar r = addOne(41);\nr;";
    assert_eq!(eval(src), "42");
}

#[test]
fn test_print_native() {
    assert_eq!(output("p('hello', 1 + 1, null);"), "hello 2 null\n");
    assert_eq!(output("p(); p(true);"), "\ntrue\n");
}

#[test]
fn test_native_is_not_enumerable() {
    let (vm, global, result, _) = run("var a = 1;");
    result.unwrap();
    let scope = vm.heap.get_scope(global).unwrap();
    let names: Vec<&str> = scope.enumerable_names().collect();
    assert_eq!(names, ["a"]);
    assert!(scope.contains("p"));
}

#[test]
fn test_recursion() {
    let src = "function fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }\nfib(15);";
    assert_eq!(eval(src), "610");
}

#[test]
fn test_while_loop_and_assignment() {
    let src = "var i = 0; var sum = 0; while (i < 10) { sum = sum + i; i = i + 1; } sum;";
    assert_eq!(eval(src), "45");
}

#[test]
fn test_if_else_completion() {
    assert_eq!(eval("var x = 3; if (x > 2) { 'big'; } else { 'small'; }"), "big");
    assert_eq!(eval("var x = 1; if (x > 2) { 'big'; } else { 'small'; }"), "small");
}

#[test]
fn test_function_locals_and_expressions() {
    let src = "var twice = function(f, x) { let y = f(x); return f(y); };\n\
               function inc(n) { return n + 1; }\n\
               twice(inc, 5);";
    assert_eq!(eval(src), "7");
}

#[test]
fn test_missing_arguments_are_undefined() {
    assert_eq!(eval("function f(a, b) { return b; } f(1);"), "undefined");
    assert_eq!(eval("function f(a) { return a; } f(1, 2, 3);"), "1");
}

#[test]
fn test_function_without_return_yields_undefined() {
    assert_eq!(eval("function f() { 1; } f();"), "undefined");
}

#[test]
fn test_var_does_not_clobber() {
    assert_eq!(eval("var x = 7; var x; x;"), "7");
}

#[test]
fn test_functions_display() {
    assert_eq!(eval("function f() {} f;"), "function f() { [bytecode] }");
    assert_eq!(eval("p;"), "function p() { [native code] }");
}

#[test]
fn test_undefined_global_is_reference_error() {
    let err = eval_err("missing + 1;");
    assert!(matches!(err, RuntimeError::ReferenceError(ref n) if n == "missing"));
    assert_eq!(err.to_string(), "ReferenceError: missing is not defined");
}

#[test]
fn test_calling_non_function_is_type_error() {
    let err = eval_err("var x = 1; x();");
    assert!(matches!(err, RuntimeError::TypeError(_)));
}

#[test]
fn test_unbounded_recursion_overflows() {
    let err = eval_err("function f(n) { return f(n + 1); } f(0);");
    assert!(matches!(err, RuntimeError::StackOverflow));
}

#[test]
fn test_vm_recovers_after_error() {
    let (mut vm, global, result, _) = run("function f() { return g(); } f();");
    assert!(result.is_err());
    vm.reset();

    let proto = compile_script("1 + 1;").unwrap();
    let function = vm.load_prototype(&proto);
    let value = vm.run_script(global, function).unwrap();
    assert_eq!(vm.display_string(value), "2");
    assert!(vm.frames.is_empty());
}

#[test]
fn test_unlinked_function_has_no_scope() {
    let image = compile_image("function f() { return x; }").unwrap();
    let mut vm = VM::with_output(Box::new(SharedBuf::default()));
    let function = vm.load_prototype(&image.functions[0]);
    let closure = vm.new_closure(function, None);

    let err = vm.call_value(Value::closure(closure), &[]).unwrap_err();
    assert!(matches!(err, RuntimeError::UnboundScope(ref name) if name == "f"));
}

#[test]
fn test_linked_image_functions_share_globals() {
    let image = compile_image(
        "function addOne(x) { return x + 1; }\n\
         function twice(x) { return addOne(addOne(x)); }\n\
         twice(40);",
    )
    .unwrap();

    let mut vm = VM::with_output(Box::new(SharedBuf::default()));
    let global = vm.new_global();
    for proto in &image.functions {
        let function = vm.load_prototype(proto);
        let closure = vm.new_closure(function, None);
        vm.set_parent(closure, global).unwrap();
        vm.define_global(global, &proto.name, Value::closure(closure), true)
            .unwrap();
    }

    let script = vm.load_prototype(&image.script);
    let value = vm.run_script(global, script).unwrap();
    assert_eq!(vm.display_string(value), "42");
}

#[test]
fn test_trace_lists_executed_instructions() {
    let proto = compile_script("1 + 2;").unwrap();
    let trace = SharedBuf::default();
    let mut vm = VM::with_output(Box::new(SharedBuf::default()));
    vm.trace = Some(Box::new(trace.clone()));

    let global = vm.new_global();
    let function = vm.load_prototype(&proto);
    vm.run_script(global, function).unwrap();

    let text = trace.text();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), proto.code.len());
    assert!(lines[0].starts_with("[<script>] 0000 LOAD_CONST"));
    assert!(lines.last().unwrap().contains("RETURN"));
}
