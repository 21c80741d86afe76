use std::io;

use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("unexpected end of input: needed {needed} byte(s), {available} available")]
    UnexpectedEnd { needed: usize, available: usize },
}

/// Forward-only read position over a byte slice.
///
/// Every read either consumes exactly the bytes it returns or fails without
/// moving. There is no way to seek backward.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CursorError> {
        let available = self.remaining();
        if n > available {
            return Err(CursorError::UnexpectedEnd {
                needed: n,
                available,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        self.read_bytes(2).map(LittleEndian::read_u16)
    }

    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        self.read_bytes(4).map(LittleEndian::read_u32)
    }

    pub fn read_f64(&mut self) -> Result<f64, CursorError> {
        self.read_bytes(8).map(LittleEndian::read_f64)
    }
}

/// Lets engines decode with `byteorder::ReadBytesExt`. Short reads follow
/// the `io::Read` contract, so `read_exact` reports `UnexpectedEof`.
impl io::Read for Cursor<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
