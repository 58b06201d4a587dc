//! Raw access to a disk image.
//!
//! [`ImageReader`] is the only component that touches the underlying file. Everything above it
//! asks for `(offset, length)` byte ranges and gets back exactly that many bytes or an error.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use log::trace;

/// Seekable, bounds-checked view over the bytes of a disk image.
#[derive(Debug)]
pub struct ImageReader<R> {
    inner: R,
    len: u64,
}

impl ImageReader<File> {
    /// Opens the image file at `path` in read-only mode.
    ///
    /// # Errors
    /// Returns the `io::Error` of the failed `open` or `metadata` call.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Failed to open {}: {err}", path.display()),
            )
        })?;
        let len = file.metadata()?.len();

        Ok(Self { inner: file, len })
    }
}

impl<R: Read + Seek> ImageReader<R> {
    /// Wraps any seekable source (an in-memory image for instance).
    ///
    /// The image length is taken from the end position of the source.
    pub fn new(mut inner: R) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        Ok(Self { inner, len })
    }

    /// Returns the image length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns true if the image holds no byte.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads exactly `length` bytes starting at byte `offset`.
    ///
    /// # Errors
    /// Fails with `UnexpectedEof` if the range goes past the end of the image, or with the
    /// error of the underlying seek/read.
    pub fn read_exact_at(&mut self, offset: u64, length: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; length];
        self.read_into(offset, &mut buf)?;
        Ok(buf)
    }

    /// Fills `buf` with the bytes starting at `offset`.
    pub fn read_into(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let end = offset.checked_add(buf.len() as u64);
        if end.is_none_or(|end| end > self.len) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Read of {} bytes at offset {offset} goes past the end of the {}-byte image",
                    buf.len(),
                    self.len
                ),
            ));
        }

        trace!("read {} bytes at 0x{offset:X}", buf.len());
        self.inner.seek(SeekFrom::Start(offset))?;
        self.inner.read_exact(buf).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Failed to read {} bytes at offset {offset}: {err}", buf.len()),
            )
        })
    }

    /// Releases the image and hands back the underlying source.
    pub fn close(self) -> R {
        self.inner
    }
}
