//! Thin adapter over an OS file descriptor.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::stream::{ReadStream, WriteStream};

pub struct FileReadStream {
    path: PathBuf,
    file: File,
    closed: bool,
}

impl FileReadStream {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io_at(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            closed: false,
        })
    }

    /// Exposes the underlying descriptor for layers that need to seek
    /// (the tail reader and the encrypted-archive salt rewrite need this).
    pub fn raw(&mut self) -> &mut File {
        &mut self.file
    }
}

impl ReadStream for FileReadStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.file.read(buf).map_err(|e| Error::io_at(&self.path, e))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

pub struct FileWriteStream {
    path: PathBuf,
    file: File,
    closed: bool,
}

impl FileWriteStream {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| Error::io_at(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            closed: false,
        })
    }

    pub fn raw(&mut self) -> &mut File {
        &mut self.file
    }

    /// Rewrites the first `data.len()` bytes of the file and restores the
    /// previous write position. Used by `CryptoWriteStream::flush` to patch
    /// the salt byte after the unaligned count is known.
    pub fn rewrite_head(&mut self, data: &[u8]) -> Result<()> {
        let cur = self.file.stream_position().map_err(|e| Error::io_at(&self.path, e))?;
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| Error::io_at(&self.path, e))?;
        self.file.write_all(data).map_err(|e| Error::io_at(&self.path, e))?;
        self.file
            .seek(SeekFrom::Start(cur))
            .map_err(|e| Error::io_at(&self.path, e))?;
        Ok(())
    }
}

impl WriteStream for FileWriteStream {
    fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        self.file.write_all(buf).map_err(|e| Error::io_at(&self.path, e))
    }

    fn flush(&mut self) -> Result<()> {
        self.file.flush().map_err(|e| Error::io_at(&self.path, e))?;
        self.file.sync_all().map_err(|e| Error::io_at(&self.path, e))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
