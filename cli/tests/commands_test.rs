use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::Parser;
use cli::args::Cli;
use cli::commands::{compile, disassemble, run};
use cli::VmEngine;
use container::{Error, ImageError, RunConfig, RunMode};
use tempfile::{NamedTempFile, TempDir};

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

fn write_temp_source(content: &str) -> NamedTempFile {
    let mut f = NamedTempFile::with_suffix(".js").unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

/// Compile `content` into `<dir>/prog.jsc`.
fn emit_image(dir: &TempDir, content: &str) -> PathBuf {
    let src = write_temp_source(content);
    let out = dir.path().join("prog.jsc");
    compile::compile_file(src.path(), &out).expect("compile_file failed");
    out
}

/// Run `path` and return (program output, `p` output).
fn run_path(path: &Path, mode: RunMode) -> anyhow::Result<(String, String)> {
    let printed = SharedBuf::default();
    let mut engine = VmEngine::with_output(Box::new(printed.clone()));
    let mut out = Vec::new();
    run::run_file(&mut engine, path, mode, &RunConfig::default(), &mut out)?;
    Ok((String::from_utf8(out).unwrap(), printed.text()))
}

fn disassemble_path(path: &Path, function: Option<&str>) -> anyhow::Result<String> {
    let mut engine = VmEngine::with_output(Box::new(std::io::sink()));
    let mut out = Vec::new();
    disassemble::disassemble_file(&mut engine, path, function, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn container_error(err: &anyhow::Error) -> &Error {
    err.downcast_ref::<Error>()
        .unwrap_or_else(|| panic!("expected a container error, got: {err:#}"))
}

// ======================================================================
// run_file
// ======================================================================

#[test]
fn run_source_with_print() {
    let src = write_temp_source("var x = 20;\nx + 22;\n");
    let (out, _) = run_path(src.path(), RunMode::ExecuteAndPrint).unwrap();
    assert_eq!(out, "42\n");
}

#[test]
fn run_source_without_print_is_silent() {
    let src = write_temp_source("1 + 1;");
    let (out, printed) = run_path(src.path(), RunMode::Execute).unwrap();
    assert_eq!(out, "");
    assert_eq!(printed, "");
}

#[test]
fn run_source_p_goes_to_script_output() {
    let src = write_temp_source("p('a', 1 + 1); p(true);");
    let (out, printed) = run_path(src.path(), RunMode::ExecuteAndPrint).unwrap();
    assert_eq!(printed, "a 2\ntrue\n");
    // `p` returns undefined, and so does the script
    assert_eq!(out, "undefined\n");
}

#[test]
fn run_source_runtime_error_prints_nothing() {
    let src = write_temp_source("p('before'); missing();");
    let printed = SharedBuf::default();
    let mut engine = VmEngine::with_output(Box::new(printed.clone()));
    let mut out = Vec::new();
    let err = run::run_file(
        &mut engine,
        src.path(),
        RunMode::ExecuteAndPrint,
        &RunConfig::default(),
        &mut out,
    )
    .unwrap_err();

    match container_error(&err) {
        Error::Runtime(e) => assert_eq!(e.message, "ReferenceError: missing is not defined"),
        other => panic!("expected a runtime error, got {other:?}"),
    }
    assert!(out.is_empty());
    assert_eq!(printed.text(), "before\n");
}

#[test]
fn run_source_compile_error() {
    let src = write_temp_source("var = ;");
    let err = run_path(src.path(), RunMode::Execute).unwrap_err();
    assert!(matches!(container_error(&err), Error::Compile(_)));
}

#[test]
fn run_unknown_extension() {
    let src = NamedTempFile::with_suffix(".txt").unwrap();
    let err = run_path(src.path(), RunMode::Execute).unwrap_err();
    assert!(matches!(container_error(&err), Error::UnknownFileType { .. }));
}

#[test]
fn run_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = run_path(&dir.path().join("nope.jsc"), RunMode::Execute).unwrap_err();
    assert!(matches!(container_error(&err), Error::Source(_)));
}

// ======================================================================
// images
// ======================================================================

#[test]
fn image_script_only_prints_value() {
    let dir = TempDir::new().unwrap();
    let path = emit_image(&dir, "'hello' + ' ' + 'world';");

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..4], b"JSC\x01");
    assert_eq!(&bytes[4..8], &1u32.to_le_bytes());

    let (out, _) = run_path(&path, RunMode::ExecuteAndPrint).unwrap();
    assert_eq!(out, "hello world\n");
}

#[test]
fn image_links_functions_before_the_script_runs() {
    let dir = TempDir::new().unwrap();
    let path = emit_image(&dir, "function addOne(x) { return x + 1; }\naddOne(41);\n");

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[4..8], &2u32.to_le_bytes());

    let (out, _) = run_path(&path, RunMode::Execute).unwrap();
    assert_eq!(out, "");
    let (out, _) = run_path(&path, RunMode::ExecuteAndPrint).unwrap();
    assert_eq!(out, "42\n");
}

#[test]
fn image_functions_call_each_other_through_globals() {
    let dir = TempDir::new().unwrap();
    let path = emit_image(
        &dir,
        "function double(x) { return x * 2; }\n\
         function quad(x) { return double(double(x)); }\n\
         quad(5);\n",
    );
    let (out, _) = run_path(&path, RunMode::ExecuteAndPrint).unwrap();
    assert_eq!(out, "20\n");
}

#[test]
fn image_with_trailing_byte_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = emit_image(&dir, "1;");
    let mut bytes = std::fs::read(&path).unwrap();
    bytes.push(0);
    std::fs::write(&path, &bytes).unwrap();

    let err = run_path(&path, RunMode::ExecuteAndPrint).unwrap_err();
    assert!(matches!(
        container_error(&err),
        Error::Image(ImageError::TrailingData { remaining: 1 })
    ));
}

#[test]
fn image_with_wrong_magic_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = emit_image(&dir, "1;");
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[0] = b'X';
    std::fs::write(&path, &bytes).unwrap();

    let err = run_path(&path, RunMode::Execute).unwrap_err();
    assert!(matches!(
        container_error(&err),
        Error::Image(ImageError::BadMagic { .. })
    ));
}

#[test]
fn image_cut_short_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = emit_image(&dir, "function f() { return 1; }\nf();\n");
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

    let err = run_path(&path, RunMode::Execute).unwrap_err();
    assert!(matches!(
        container_error(&err),
        Error::Image(ImageError::Corrupt { .. })
    ));
}

#[test]
fn compile_rejects_image_input() {
    let dir = TempDir::new().unwrap();
    let path = emit_image(&dir, "1;");
    let err = compile::compile_file(&path, &dir.path().join("again.jsc")).unwrap_err();
    assert!(err.to_string().contains("only .js sources"), "{err}");
}

#[test]
fn compile_reports_source_errors() {
    let dir = TempDir::new().unwrap();
    let src = write_temp_source("function f() { return g; }\nfunction g() { var y = 1; return function () { return y; }; }\n");
    let err = compile::compile_file(src.path(), &dir.path().join("out.jsc")).unwrap_err();
    assert!(format!("{err:#}").contains("compile failed"), "{err:#}");
}

// ======================================================================
// disassemble_file
// ======================================================================

#[test]
fn disassemble_script_lists_every_instruction() {
    let source = "var a = 1;\na + 2;\n";
    let src = write_temp_source(source);
    let expected = compiler::compile_script(source).unwrap().code.len();

    let listing = disassemble_path(src.path(), None).unwrap();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), expected + 1);
    assert!(lines[0].starts_with("; function <script>"), "{}", lines[0]);
    assert!(lines[1].starts_with("0000 "), "{}", lines[1]);
}

#[test]
fn disassemble_named_function_from_image() {
    let dir = TempDir::new().unwrap();
    let path = emit_image(&dir, "function addOne(x) { return x + 1; }\naddOne(41);\n");
    let listing = disassemble_path(&path, Some("addOne")).unwrap();
    assert!(
        listing.starts_with("; function addOne (arity 1,"),
        "{listing}"
    );
    assert!(listing.contains("RETURN"), "{listing}");
}

#[test]
fn disassemble_native_function() {
    let src = write_temp_source("1;");
    let listing = disassemble_path(src.path(), Some("p")).unwrap();
    assert_eq!(listing, "; native function p\n");
}

#[test]
fn disassemble_undefined_name() {
    let dir = TempDir::new().unwrap();
    let path = emit_image(&dir, "function addOne(x) { return x + 1; }\naddOne(41);\n");
    let err = disassemble_path(&path, Some("missing")).unwrap_err();
    match container_error(&err) {
        Error::UndefinedName { name } => assert_eq!(name, "missing"),
        other => panic!("expected UndefinedName, got {other:?}"),
    }
    assert_eq!(err.to_string(), "missing is not defined");
}

#[test]
fn disassemble_does_not_run_the_script() {
    // Script-level bindings only exist once the script has run
    let src = write_temp_source("var n = 3;");
    let err = disassemble_path(src.path(), Some("n")).unwrap_err();
    assert!(matches!(container_error(&err), Error::UndefinedName { .. }));
}

// ======================================================================
// execute
// ======================================================================

#[test]
fn execute_dispatches_on_flags() {
    let dir = TempDir::new().unwrap();
    let src = write_temp_source("function sq(x) { return x * x; }\nsq(9);\n");
    let image = dir.path().join("sq.jsc");
    let src_arg = src.path().to_str().unwrap();
    let image_arg = image.to_str().unwrap();

    let mut engine = VmEngine::with_output(Box::new(std::io::sink()));
    let mut out = Vec::new();

    let emit = Cli::try_parse_from(["jsvm", "-o", image_arg, src_arg]).unwrap();
    cli::execute(&emit, &mut engine, &mut out).unwrap();
    assert!(out.is_empty());
    assert!(image.exists());

    let print = Cli::try_parse_from(["jsvm", "-p", image_arg]).unwrap();
    cli::execute(&print, &mut engine, &mut out).unwrap();
    assert_eq!(String::from_utf8(out.clone()).unwrap(), "81\n");

    out.clear();
    let disasm = Cli::try_parse_from(["jsvm", "-d", image_arg, "sq"]).unwrap();
    cli::execute(&disasm, &mut engine, &mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().starts_with("; function sq"));
}
