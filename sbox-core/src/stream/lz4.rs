//! LZ4-frame compression layer. Compression is lazy: the frame
//! header is emitted on the first write, not at construction, so an empty
//! archive still produces a well-formed (empty) frame at flush.

use std::io;

use lz4_flex::frame::{FrameDecoder, FrameEncoder};

use crate::error::{Error, Result};
use crate::stream::{ReadStream, WriteStream};

const CHUNK: usize = 64 * 1024;

/// Bridges a layer-stack `WriteStream` to `std::io::Write`, which is what
/// `lz4_flex`'s frame encoder expects underneath it.
struct IoSink<W>(W);

impl<W: WriteStream> io::Write for IoSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .write_all(buf)
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Bridges a layer-stack `ReadStream` to `std::io::Read`.
struct IoSource<R>(R);

impl<R: ReadStream> io::Read for IoSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf).map_err(|e| io::Error::other(e.to_string()))
    }
}

enum WriterState<W: WriteStream> {
    Empty(Option<IoSink<W>>),
    Writing(FrameEncoder<IoSink<W>>),
    Flushed,
}

pub struct Lz4WriteStream<W: WriteStream> {
    state: WriterState<W>,
}

impl<W: WriteStream> Lz4WriteStream<W> {
    pub fn new(inner: W) -> Self {
        Self {
            state: WriterState::Empty(Some(IoSink(inner))),
        }
    }

    fn encoder(&mut self) -> &mut FrameEncoder<IoSink<W>> {
        if let WriterState::Empty(inner) = &mut self.state {
            let inner = inner.take().expect("encoder state already taken");
            self.state = WriterState::Writing(FrameEncoder::new(inner));
        }
        match &mut self.state {
            WriterState::Writing(enc) => enc,
            _ => unreachable!(),
        }
    }
}

impl<W: WriteStream> WriteStream for Lz4WriteStream<W> {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        use std::io::Write as _;
        for chunk in buf.chunks(CHUNK) {
            self.encoder()
                .write_all(chunk)
                .map_err(|e| Error::Compression(e.to_string()))?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write as _;
        match std::mem::replace(&mut self.state, WriterState::Flushed) {
            WriterState::Empty(inner) => {
                // Nothing was ever written; still emit a valid empty frame.
                let mut enc = FrameEncoder::new(inner.expect("inner taken twice"));
                enc.flush().map_err(|e| Error::Compression(e.to_string()))?;
                let sink = enc.finish().map_err(|e| Error::Compression(e.to_string()))?;
                sink.0.flush()
            }
            WriterState::Writing(enc) => {
                let sink = enc.finish().map_err(|e| Error::Compression(e.to_string()))?;
                sink.0.flush()
            }
            WriterState::Flushed => Ok(()),
        }
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

pub struct Lz4ReadStream<R: ReadStream> {
    decoder: FrameDecoder<IoSource<R>>,
}

impl<R: ReadStream> Lz4ReadStream<R> {
    pub fn new(inner: R) -> Self {
        Self {
            decoder: FrameDecoder::new(IoSource(inner)),
        }
    }
}

impl<R: ReadStream> ReadStream for Lz4ReadStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        use std::io::Read as _;
        match self.decoder.read(buf) {
            Ok(n) => Ok(n),
            Err(e) => Err(Error::Compression(e.to_string())),
        }
    }
}
