//! In-memory `ReadStream`/`WriteStream` stand-ins used only by unit tests
//! for layers that don't need real seekability (LZ4, Buffer, FileNet codec).

#![cfg(test)]

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::stream::{ReadStream, WriteStream};

pub struct MemReader {
    data: Vec<u8>,
    pos: usize,
}

impl MemReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }
}

impl ReadStream for MemReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let avail = &self.data[self.pos..];
        let n = avail.len().min(buf.len());
        buf[..n].copy_from_slice(&avail[..n]);
        self.pos += n;
        Ok(n)
    }
}

#[derive(Default)]
pub struct MemWriter {
    pub data: Vec<u8>,
}

impl WriteStream for MemWriter {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.data.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Like [`MemWriter`], but the backing buffer is reachable from outside the
/// stream even after it's wrapped by an adapter that consumes it on flush
/// (e.g. `Lz4WriteStream`).
#[derive(Clone, Default)]
pub struct SharedMemWriter(pub Rc<RefCell<Vec<u8>>>);

impl WriteStream for SharedMemWriter {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
