use std::path::PathBuf;

use thiserror::Error;

/// Every failure mode `sbox-core` can report. `InvalidName` is deliberately
/// absent because the format rewrites bad names on the spot instead of
/// raising an error.
#[derive(Debug, Error)]
pub enum Error {
    /// Filesystem or descriptor failure, with a path when the call site knew one.
    #[error("I/O error{}: {source}", path.as_ref().map(|p| format!(" ({})", p.display())).unwrap_or_default())]
    Io {
        #[source]
        source: std::io::Error,
        path: Option<PathBuf>,
    },

    /// A stream returned fewer bytes than required to complete a read-exact.
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// Magic mismatch, unknown compression byte, or a malformed FileNet opcode.
    #[error("format error: {0}")]
    Format(String),

    /// HMAC verification failed at the end of an encrypted stream.
    #[error("integrity check failed: HMAC mismatch")]
    Integrity,

    /// Key derivation, cipher setup, or a block transform failed.
    #[error("cryptographic operation failed: {0}")]
    Crypto(String),

    /// The LZ4 codec reported an error from compress/decompress.
    #[error("compression error: {0}")]
    Compression(String),

    /// A file's or directory's mtime at pack time differs from the value
    /// captured during the scan.
    #[error("file changed during pack: {0}")]
    Changed(PathBuf),

    /// Encryption or compression was requested but this build has no support for it.
    #[error("{0} support is not enabled in this build")]
    ConfigDisabled(&'static str),
}

impl Error {
    /// Wraps an I/O error with the path the failing operation was acting on.
    pub fn io_at(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            source,
            path: Some(path.into()),
        }
    }

    /// True if this is exactly the "stream ended early" condition, as
    /// opposed to a harder I/O failure.
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::UnexpectedEof)
            || matches!(&self, Error::Io { source, .. } if source.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source, path: None }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
