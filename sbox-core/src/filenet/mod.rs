//! The in-memory file tree: scan, prefix-order iteration, and the wire
//! encoding. A `Node` is either a directory or a regular file; the root is
//! synthetic and never serialized.

mod codec;
mod node;
mod scan;

pub use codec::{decode, encode};
pub use node::{Node, NodeKind};
pub use scan::scan;

/// What a visitor returns from [`Node::walk`]: keep going, or stop the
/// whole traversal and propagate the signal to the caller.
pub enum Visit {
    Continue,
    Abort,
}
