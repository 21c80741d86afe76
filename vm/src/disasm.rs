//! Human-readable bytecode listings.
//!
//! A listing is one `;` header line followed by exactly one line per
//! instruction: `offset MNEMONIC operands`. Nested function bodies are not
//! expanded; `CLOSURE` lines name the prototype they instantiate.

use std::io::{self, Write};

use crate::opcode::{instruction::*, Format, OpCode};
use memory::{format_number, Function, Heap, Value};

/// Write the listing of `func` to `out`.
pub fn disassemble(heap: &Heap, func: &Function, out: &mut dyn Write) -> io::Result<()> {
    writeln!(
        out,
        "; function {} (arity {}, {} slots, {} constants, {} instructions)",
        display_name(&func.name),
        func.arity,
        func.max_slots,
        func.constants.len(),
        func.chunk.len()
    )?;
    for (ip, inst) in func.chunk.iter().enumerate() {
        writeln!(out, "{}", format_instruction(heap, func, ip, *inst))?;
    }
    Ok(())
}

/// Render one instruction. Also used by the execution trace.
pub fn format_instruction(heap: &Heap, func: &Function, ip: usize, inst: u32) -> String {
    let op_byte = decode_opcode(inst);
    let Some(op) = OpCode::from_u8(op_byte) else {
        return format!("{:04} {:<14} {:#010x}", ip, "UNKNOWN", inst);
    };

    let a = decode_a(inst);
    let b = decode_b(inst);
    let c = decode_c(inst);
    let bx = decode_bx(inst);

    let operands = match op.format() {
        Format::None => String::new(),
        Format::A => format!("R{a}"),
        Format::AB => format!("R{a}, R{b}"),
        Format::ABC => format!("R{a}, R{b}, R{c}"),
        Format::AK => format!("R{a}, K{bx} ({})", constant_text(heap, func, bx)),
        Format::K => format!("K{bx} ({})", constant_text(heap, func, bx)),
        Format::AJ => format!("R{a}, -> {bx:04}"),
        Format::J => format!("-> {bx:04}"),
        Format::AP => {
            let name = func
                .protos
                .get(bx as usize)
                .and_then(|h| heap.get_function(*h))
                .map_or("<missing>", |f| display_name(&f.name));
            format!("R{a}, P{bx} ({name})")
        }
        Format::Call => format!("R{a}, R{b}, {c} arg(s)"),
        Format::Ret => {
            if b == 1 {
                format!("R{a}")
            } else {
                "undefined".to_string()
            }
        }
    };

    if operands.is_empty() {
        format!("{:04} {}", ip, op.name())
    } else {
        format!("{:04} {:<14} {}", ip, op.name(), operands)
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "<anonymous>"
    } else {
        name
    }
}

fn constant_text(heap: &Heap, func: &Function, idx: u16) -> String {
    match func.constants.get(idx as usize) {
        None => "<missing>".to_string(),
        Some(Value::String(h)) => match heap.get_string(*h) {
            Some(s) => format!("{s:?}"),
            None => "<bad string>".to_string(),
        },
        Some(Value::Number(n)) => format_number(*n),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Undefined) => "undefined".to_string(),
        Some(other) => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory::{Constant, Prototype};

    fn sample(heap: &mut Heap) -> u32 {
        let mut proto = Prototype::new("addOne", 1);
        proto.max_slots = 3;
        proto.constants.push(Constant::Number(1.0));
        proto.code = vec![
            encode_abx(OpCode::LoadConst.as_u8(), 1, 0),
            encode_abc(OpCode::Add.as_u8(), 2, 0, 1),
            encode_abc(OpCode::Return.as_u8(), 2, 1, 0),
        ];
        heap.import_prototype(&proto)
    }

    #[test]
    fn test_listing_has_one_line_per_instruction() {
        let mut heap = Heap::new();
        let handle = sample(&mut heap);
        let func = heap.get_function(handle).unwrap();

        let mut out = Vec::new();
        disassemble(&heap, func, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("; function addOne"));
        assert_eq!(lines[1], "0000 LOAD_CONST     R1, K0 (1)");
        assert_eq!(lines[2], "0001 ADD            R2, R0, R1");
        assert_eq!(lines[3], "0002 RETURN         R2");
    }

    #[test]
    fn test_unknown_opcode_is_rendered() {
        let mut heap = Heap::new();
        let mut proto = Prototype::new("", 0);
        proto.code = vec![0xEE00_0000];
        let handle = heap.import_prototype(&proto);
        let func = heap.get_function(handle).unwrap();
        let line = format_instruction(&heap, func, 0, func.chunk[0]);
        assert!(line.contains("UNKNOWN"));
    }
}
