//! The layered byte-stream stack: a small capability-based trait pair that
//! every adapter (file, crypto, lz4, buffer) implements, instead of a class
//! hierarchy. Streams are one-shot and one-directional.

pub mod buffer;
pub mod crypto;
pub mod file;
pub mod lz4;
#[cfg(test)]
pub(crate) mod memtest;

use crate::error::{Error, Result};

/// A readable stream. Implementors provide `read`; the rest is derived.
pub trait ReadStream {
    /// Reads into `buf`, returning the number of bytes filled. `Ok(0)` means EOF.
    /// May return short reads for reasons other than EOF.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Fills `buf` completely or fails with `Error::UnexpectedEof`.
    fn read_exact(&mut self, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.read(buf)? {
                0 => return Err(Error::UnexpectedEof),
                n => buf = &mut buf[n..],
            }
        }
        Ok(())
    }

    /// Fills `buf` until EOF or the buffer is full, returning the number of
    /// bytes actually read (which may be less than `buf.len()`).
    fn read_at_most(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        Ok(filled)
    }

    /// Checks any integrity tag carried by this stream. A pass-through no-op
    /// for streams that don't carry one (e.g. a plain file or LZ4 layer).
    fn verify(&mut self) -> Result<()> {
        Ok(())
    }

    /// Releases resources. Must be safe to call after a prior error, and
    /// must not itself panic; callers treat failures here as best-effort.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A writable stream. Implementors provide `write_all`; the rest is derived.
pub trait WriteStream {
    /// Writes all of `buf` to this stream.
    fn write_all(&mut self, buf: &[u8]) -> Result<()>;

    /// Finalizes every layer below this one: encryption tail, LZ4
    /// end-of-frame, file sync. Flush is the only operation that pushes
    /// buffered bytes through to the next layer.
    fn flush(&mut self) -> Result<()>;

    /// Releases resources. Must be safe to call after a prior error.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

// Boxed trait objects are themselves streams, so adapters can be composed
// without knowing the concrete type of the layer beneath them.
impl ReadStream for Box<dyn ReadStream> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn verify(&mut self) -> Result<()> {
        (**self).verify()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl WriteStream for Box<dyn WriteStream> {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        (**self).write_all(buf)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
