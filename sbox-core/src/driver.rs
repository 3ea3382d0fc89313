//! The two top-level operations: `pack` threads a FileNet through the
//! output stream stack; `unpack` does the reverse, dispatching to
//! list/test/extract.

use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};
use crate::filenet::{self, Node, NodeKind, Visit};
use crate::stream::buffer::{BufferReadStream, BufferWriteStream};
use crate::stream::crypto::{CryptoReadStream, CryptoWriteStream};
use crate::stream::file::{FileReadStream, FileWriteStream};
use crate::stream::lz4::{Lz4ReadStream, Lz4WriteStream};
use crate::stream::{ReadStream, WriteStream};

const MAGIC: &[u8; 4] = b"sbox";
const COPY_CHUNK: usize = 64 * 1024;

/// Compression preset, 0..=9 (`b` on the original CLI meant 9). `lz4_flex`'s
/// frame encoder does not expose a tunable compressor, so every level
/// currently maps to the same LZ4 strategy; the value is kept so the CLI
/// surface stays stable and a future codec swap has somewhere to read it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressionLevel(pub u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    List,
    Test,
    Extract,
}

#[derive(Default)]
pub struct PackOptions {
    pub compression: Option<CompressionLevel>,
    pub password: Option<SecretString>,
}

pub struct UnpackOptions {
    pub mode: RunMode,
    pub password: Option<SecretString>,
}

/// One progress line per archive entry, e.g. `" a path/to/file"`.
pub trait Progress {
    fn line(&mut self, action: char, path: &str);
}

/// A `Progress` that prints nothing, for callers that don't want the
/// `" a path"` lines the CLI prints for each entry.
pub struct NoProgress;
impl Progress for NoProgress {
    fn line(&mut self, _action: char, _path: &str) {}
}

pub fn pack(
    inputs: &[impl AsRef<Path>],
    archive_path: &Path,
    opts: &PackOptions,
    progress: &mut impl Progress,
) -> Result<()> {
    let file = FileWriteStream::create(archive_path)?;

    let mut pre_compression: Box<dyn WriteStream> = match &opts.password {
        Some(pw) => Box::new(CryptoWriteStream::new(file, pw.expose_secret().as_bytes())?),
        None => Box::new(file),
    };

    pre_compression.write_all(MAGIC)?;
    pre_compression.write_all(&[if opts.compression.is_some() { 1 } else { 0 }])?;

    let compressed: Box<dyn WriteStream> = if opts.compression.is_some() {
        Box::new(Lz4WriteStream::new(pre_compression))
    } else {
        pre_compression
    };
    let mut stack: Box<dyn WriteStream> = Box::new(BufferWriteStream::new(compressed));

    let root = filenet::scan(inputs)?;
    tracing::debug!(count = count_nodes(&root), "scanned input tree");

    stack.write_all(&filenet::encode(&root))?;

    let real_roots: Vec<PathBuf> = inputs.iter().map(|p| p.as_ref().to_path_buf()).collect();
    let NodeKind::Dir { children } = &root.kind else {
        unreachable!("scan always returns a directory root")
    };
    for (node, real_root) in children.iter().zip(&real_roots) {
        stream_file_bodies(stack.as_mut(), node, real_root, progress)?;
    }

    stack.flush()?;
    stack.close()
}

fn stream_file_bodies(
    stack: &mut dyn WriteStream,
    node: &Node,
    real_path: &Path,
    progress: &mut impl Progress,
) -> Result<()> {
    match &node.kind {
        NodeKind::File { size } => {
            let meta = std::fs::metadata(real_path).map_err(|e| Error::io_at(real_path, e))?;
            if let (Some(recorded), Ok(now)) = (node.mtime, meta.modified()) {
                if recorded != now {
                    return Err(Error::Changed(real_path.to_path_buf()));
                }
            }
            let mut src = FileReadStream::open(real_path)?;
            copy_exact(&mut src, stack, *size as u64)?;
            src.close()?;
            progress.line('a', &real_path.display().to_string());
            tracing::debug!(path = %real_path.display(), size, "packed file");
        }
        NodeKind::Dir { children } => {
            let meta = std::fs::metadata(real_path).map_err(|e| Error::io_at(real_path, e))?;
            if let (Some(recorded), Ok(now)) = (node.mtime, meta.modified()) {
                if recorded != now {
                    return Err(Error::Changed(real_path.to_path_buf()));
                }
            }
            for child in children {
                let child_path = real_path.join(name_to_os(&child.name));
                stream_file_bodies(stack, child, &child_path, progress)?;
            }
        }
    }
    Ok(())
}

pub fn unpack(
    archive_path: &Path,
    output_dir: &Path,
    opts: &UnpackOptions,
    progress: &mut impl Progress,
) -> Result<()> {
    let file = FileReadStream::open(archive_path)?;

    let mut pre_compression: Box<dyn ReadStream> = match &opts.password {
        Some(pw) => Box::new(CryptoReadStream::new(file, pw.expose_secret().as_bytes())?),
        None => Box::new(file),
    };

    let mut magic = [0u8; 4];
    pre_compression.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(Error::Format("not an sbox archive".into()));
    }
    let mut comp = [0u8; 1];
    pre_compression.read_exact(&mut comp)?;

    let decompressed: Box<dyn ReadStream> = match comp[0] {
        0 => pre_compression,
        1 => Box::new(Lz4ReadStream::new(pre_compression)),
        other => return Err(Error::Format(format!("unknown compression id {other}"))),
    };
    let mut stack: Box<dyn ReadStream> = Box::new(BufferReadStream::new(decompressed));

    let root = filenet::decode(&mut stack)?;

    match opts.mode {
        RunMode::List => {
            root.walk(&mut |_node, path| {
                progress.line('l', &String::from_utf8_lossy(path));
                Ok(Visit::Continue)
            })?;
        }
        RunMode::Test => {
            root.walk(&mut |node, path| {
                if let NodeKind::File { size } = node.kind {
                    discard_exact(stack.as_mut(), size as u64)?;
                }
                progress.line('t', &String::from_utf8_lossy(path));
                Ok(Visit::Continue)
            })?;
        }
        RunMode::Extract => {
            root.walk(&mut |node, path| {
                let target = output_dir.join(Node::path_buf(path));
                match &node.kind {
                    NodeKind::Dir { .. } => {
                        if !target.is_dir() {
                            std::fs::create_dir_all(&target).map_err(|e| Error::io_at(&target, e))?;
                        }
                    }
                    NodeKind::File { size } => {
                        if let Some(parent) = target.parent() {
                            std::fs::create_dir_all(parent).map_err(|e| Error::io_at(parent, e))?;
                        }
                        let mut out = FileWriteStream::create(&target)?;
                        copy_exact(stack.as_mut(), &mut out, *size as u64)?;
                        out.flush()?;
                        out.close()?;
                        set_mode(&target, node.mode)?;
                    }
                }
                progress.line('x', &String::from_utf8_lossy(path));
                Ok(Visit::Continue)
            })?;
        }
    }

    if !matches!(opts.mode, RunMode::List) {
        match stack.verify() {
            Ok(()) => tracing::info!("archive checksum: ok"),
            Err(e) => {
                tracing::warn!("archive checksum: bad");
                return Err(e);
            }
        }
    }
    stack.close()
}

fn copy_exact(src: &mut dyn ReadStream, dst: &mut dyn WriteStream, mut remaining: u64) -> Result<()> {
    let mut buf = [0u8; COPY_CHUNK];
    while remaining > 0 {
        let want = buf.len().min(remaining as usize);
        let n = src.read_at_most(&mut buf[..want])?;
        if n == 0 {
            return Err(Error::UnexpectedEof);
        }
        dst.write_all(&buf[..n])?;
        remaining -= n as u64;
    }
    Ok(())
}

fn discard_exact(src: &mut dyn ReadStream, mut remaining: u64) -> Result<()> {
    let mut buf = [0u8; COPY_CHUNK];
    while remaining > 0 {
        let want = buf.len().min(remaining as usize);
        let n = src.read_at_most(&mut buf[..want])?;
        if n == 0 {
            return Err(Error::UnexpectedEof);
        }
        remaining -= n as u64;
    }
    Ok(())
}

fn name_to_os(name: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(name).into_owned())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, Permissions::from_mode(mode)).map_err(|e| Error::io_at(path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

fn count_nodes(root: &Node) -> usize {
    fn count(node: &Node) -> usize {
        match &node.kind {
            NodeKind::File { .. } => 1,
            NodeKind::Dir { children } => 1 + children.iter().map(count).sum::<usize>(),
        }
    }
    match &root.kind {
        NodeKind::Dir { children } => children.iter().map(count).sum(),
        NodeKind::File { .. } => 0,
    }
}
