//! Fixed-size read-ahead / write-behind adapter. This is the
//! outermost layer of both stacks, smoothing the small, frequent calls the
//! FileNet walk makes into fewer, larger calls to the layer beneath.

use crate::error::Result;
use crate::stream::{ReadStream, WriteStream};

const CAPACITY: usize = 64 * 1024;

pub struct BufferReadStream<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    len: usize,
}

impl<R: ReadStream> BufferReadStream<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: vec![0u8; CAPACITY],
            pos: 0,
            len: 0,
        }
    }

    fn refill(&mut self) -> Result<()> {
        self.pos = 0;
        self.len = self.inner.read_at_most(&mut self.buf)?;
        Ok(())
    }
}

impl<R: ReadStream> ReadStream for BufferReadStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.pos == self.len {
            self.refill()?;
            if self.len == 0 {
                return Ok(0);
            }
        }
        let avail = &self.buf[self.pos..self.len];
        let n = avail.len().min(buf.len());
        buf[..n].copy_from_slice(&avail[..n]);
        self.pos += n;
        Ok(n)
    }

    fn verify(&mut self) -> Result<()> {
        self.inner.verify()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

#[cfg(test)]
mod read_tests {
    use super::*;
    use crate::stream::memtest::MemReader;

    #[test]
    fn coalesces_small_reads_into_one_refill() {
        let data: Vec<u8> = (0u8..=255).collect();
        let mut stream = BufferReadStream::new(MemReader::new(data.clone()));
        let mut out = Vec::new();
        let mut chunk = [0u8; 3];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(out, data);
    }

    #[test]
    fn empty_source_yields_immediate_eof() {
        let mut stream = BufferReadStream::new(MemReader::new(Vec::new()));
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }
}

pub struct BufferWriteStream<W> {
    inner: W,
    buf: Vec<u8>,
}

impl<W: WriteStream> BufferWriteStream<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(CAPACITY),
        }
    }

    fn drain(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            self.inner.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl<W: WriteStream> WriteStream for BufferWriteStream<W> {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        if buf.len() >= CAPACITY {
            self.drain()?;
            return self.inner.write_all(buf);
        }
        if self.buf.len() + buf.len() > CAPACITY {
            self.drain()?;
        }
        self.buf.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.drain()?;
        self.inner.flush()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}
