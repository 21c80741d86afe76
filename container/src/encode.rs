use byteorder::{ByteOrder, LittleEndian};

use crate::HEADER_LEN;

/// Assembles a container image from already-encoded unit records.
///
/// ```
/// use container::ImageBuilder;
///
/// let mut builder = ImageBuilder::new(0x0153_434A);
/// builder.function(vec![1, 2]).script(vec![3]);
/// let image = builder.finish();
/// assert_eq!(&image[4..8], &2u32.to_le_bytes());
/// assert_eq!(&image[8..], &[1, 2, 3]);
/// ```
#[derive(Debug, Clone)]
pub struct ImageBuilder {
    magic: u32,
    functions: Vec<Vec<u8>>,
    script: Option<Vec<u8>>,
}

impl ImageBuilder {
    pub fn new(magic: u32) -> Self {
        Self {
            magic,
            functions: Vec::new(),
            script: None,
        }
    }

    /// Append a function record. Order is preserved.
    pub fn function(&mut self, record: impl Into<Vec<u8>>) -> &mut Self {
        self.functions.push(record.into());
        self
    }

    /// Set the script record, replacing any earlier one.
    pub fn script(&mut self, record: impl Into<Vec<u8>>) -> &mut Self {
        self.script = Some(record.into());
        self
    }

    /// Header followed by the function records and then the script record.
    /// Without a script the unit count covers only the functions.
    pub fn finish(self) -> Vec<u8> {
        let units: Vec<Vec<u8>> = self.functions.into_iter().chain(self.script).collect();
        let body_len: usize = units.iter().map(Vec::len).sum();

        let mut header = [0u8; HEADER_LEN];
        LittleEndian::write_u32(&mut header[..4], self.magic);
        LittleEndian::write_u32(&mut header[4..], units.len() as u32);

        let mut out = Vec::with_capacity(HEADER_LEN + body_len);
        out.extend_from_slice(&header);
        for unit in &units {
            out.extend_from_slice(unit);
        }
        log::debug!("built image: {} unit(s), {} byte(s)", units.len(), out.len());
        out
    }
}
