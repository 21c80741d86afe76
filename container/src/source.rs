//! Byte source: the whole input file, read up front.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::cursor::Cursor;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{}: no such file", path.display())]
    NotFound { path: PathBuf },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            SourceError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            SourceError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Owned, immutable input bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
}

impl ByteBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&self.bytes)
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Read the file at `path` in full.
///
/// The size is taken from the file's metadata and exactly that many bytes
/// are requested. Hitting end-of-file first (the file shrank after the
/// size was taken) yields the shorter buffer; any other read failure is an
/// error.
pub fn read_all(path: &Path) -> Result<ByteBuffer, SourceError> {
    let metadata = fs::metadata(path).map_err(|e| SourceError::from_io(path, e))?;
    let expected = usize::try_from(metadata.len()).map_err(|_| SourceError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::OutOfMemory, "file too large"),
    })?;

    let mut file = File::open(path).map_err(|e| SourceError::from_io(path, e))?;
    let mut bytes = vec![0u8; expected];
    let mut filled = 0;

    while filled < expected {
        match file.read(&mut bytes[filled..]) {
            Ok(0) => {
                log::warn!(
                    "{}: expected {} byte(s) but reached end of file after {}",
                    path.display(),
                    expected,
                    filled
                );
                bytes.truncate(filled);
                break;
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(SourceError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
    }

    log::debug!("{}: read {} byte(s)", path.display(), bytes.len());
    Ok(ByteBuffer::new(bytes))
}
