use crate::engine::Engine;
use crate::error::{ImageError, UnitKind};
use crate::source::ByteBuffer;
use crate::HEADER_LEN;

/// A fully decoded, not yet linked image.
#[derive(Debug)]
pub struct DecodedImage<F, S> {
    pub script: S,
    /// `(name, function)` in stream order.
    pub functions: Vec<(String, F)>,
}

/// Decode a container image.
///
/// Either every unit decodes and the input is consumed exactly, or nothing
/// is returned. The buffer is released when decoding ends either way.
pub fn decode<E: Engine>(
    buffer: ByteBuffer,
    engine: &mut E,
) -> Result<DecodedImage<E::Function, E::Script>, ImageError> {
    if buffer.len() < HEADER_LEN {
        return Err(ImageError::Truncated {
            needed: HEADER_LEN,
            available: buffer.len(),
        });
    }

    let mut cursor = buffer.cursor();
    let found = cursor.read_u32()?;
    let expected = engine.container_magic();
    if found != expected {
        return Err(ImageError::BadMagic { expected, found });
    }

    let unit_count = cursor.read_u32()?;
    if unit_count == 0 {
        return Err(ImageError::Corrupt {
            index: 0,
            kind: UnitKind::Script,
            message: "image declares no units".into(),
        });
    }
    let function_count = unit_count - 1;
    log::debug!("image header: {unit_count} unit(s), {} byte(s) of records", cursor.remaining());

    // Every record takes at least one byte, so the remaining input bounds
    // the number of functions that can actually be present.
    let mut functions = Vec::with_capacity((function_count as usize).min(cursor.remaining()));

    for index in 0..function_count {
        let start = cursor.position();
        let (name, function) =
            engine
                .decode_function(&mut cursor)
                .map_err(|e| ImageError::Corrupt {
                    index,
                    kind: UnitKind::Function,
                    message: e.message,
                })?;
        log::debug!(
            "unit {index}: function {name:?} at bytes {start}..{}",
            cursor.position()
        );
        functions.push((name, function));
    }

    let start = cursor.position();
    let script = engine
        .decode_script(&mut cursor)
        .map_err(|e| ImageError::Corrupt {
            index: function_count,
            kind: UnitKind::Script,
            message: e.message,
        })?;
    log::debug!(
        "unit {function_count}: script at bytes {start}..{}",
        cursor.position()
    );

    if !cursor.is_empty() {
        return Err(ImageError::TrailingData {
            remaining: cursor.remaining(),
        });
    }

    Ok(DecodedImage { script, functions })
}
