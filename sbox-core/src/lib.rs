//! `sbox-core`: the layered byte-stream pipeline, the FileNet tree, and the
//! pack/unpack driver. No process exit, no argument parsing, no stdout —
//! every diagnostic is a typed [`error::Error`].

pub mod driver;
pub mod error;
pub mod filenet;
pub mod stream;

pub use driver::{pack, unpack, CompressionLevel, NoProgress, PackOptions, Progress, RunMode, UnpackOptions};
pub use error::{Error, Result};
