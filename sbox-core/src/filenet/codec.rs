//! The wire encoding for a `Node` tree. Each node is a 1-byte opcode whose
//! case carries "has a following sibling", then big-endian `mode`/`size`
//! fields, then a NUL-terminated basename.

use crate::error::{Error, Result};
use crate::filenet::node::{Node, NodeKind};
use crate::stream::ReadStream;

const RESTRICTED_NAME: &[u8] = b"_name_restricted_";

/// Encodes every child of `root` (the root itself is never serialized) in
/// prefix order.
pub fn encode(root: &Node) -> Vec<u8> {
    let mut out = Vec::new();
    if let NodeKind::Dir { children } = &root.kind {
        encode_siblings(children, &mut out);
    }
    out
}

fn encode_siblings(children: &[Node], out: &mut Vec<u8>) {
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        encode_node(child, is_last, out);
    }
}

fn encode_node(node: &Node, is_last: bool, out: &mut Vec<u8>) {
    match &node.kind {
        NodeKind::File { size } => {
            out.push(if is_last { b'f' } else { b'F' });
            out.extend_from_slice(&node.mode.to_be_bytes());
            out.extend_from_slice(&size.to_be_bytes());
            write_name(out, &node.name);
        }
        NodeKind::Dir { children } => {
            let letter = match (children.is_empty(), is_last) {
                (true, true) => b'e',
                (true, false) => b'E',
                (false, true) => b'd',
                (false, false) => b'D',
            };
            out.push(letter);
            out.extend_from_slice(&node.mode.to_be_bytes());
            write_name(out, &node.name);
            encode_siblings(children, out);
        }
    }
}

fn write_name(out: &mut Vec<u8>, name: &[u8]) {
    if name == b".." || name.contains(&b'/') {
        out.push(b'.');
    } else {
        out.extend_from_slice(name);
    }
    out.push(0);
}

/// Decodes the tree written by [`encode`], reading directly off the archive
/// stream. Names equal to `..` or containing `/` are replaced with a fixed
/// sentinel; the decoder never trusts name bytes for recursion, only the
/// opcode's sibling/kind bits.
pub fn decode<R: ReadStream>(r: &mut R) -> Result<Node> {
    let children = decode_siblings(r)?;
    Ok(Node::root(children))
}

fn decode_siblings<R: ReadStream>(r: &mut R) -> Result<Vec<Node>> {
    let mut children = Vec::new();
    loop {
        let (node, has_sibling) = decode_node(r)?;
        children.push(node);
        if !has_sibling {
            return Ok(children);
        }
    }
}

fn decode_node<R: ReadStream>(r: &mut R) -> Result<(Node, bool)> {
    let mut opcode = [0u8; 1];
    r.read_exact(&mut opcode)?;

    let (has_sibling, kind_letter) = match opcode[0] {
        b'f' => (false, b'f'),
        b'F' => (true, b'f'),
        b'd' => (false, b'd'),
        b'D' => (true, b'd'),
        b'e' => (false, b'e'),
        b'E' => (true, b'e'),
        other => {
            return Err(Error::Format(format!(
                "unknown FileNet opcode byte {other:#04x}"
            )));
        }
    };

    let mode = read_u32(r)?;
    let name = sanitize_decoded_name(read_name(r)?);

    let node = match kind_letter {
        b'f' => {
            let size = read_u32(r)?;
            Node {
                name,
                mode,
                mtime: None,
                kind: NodeKind::File { size },
            }
        }
        b'e' => Node {
            name,
            mode,
            mtime: None,
            kind: NodeKind::Dir { children: Vec::new() },
        },
        b'd' => {
            let children = decode_siblings(r)?;
            Node {
                name,
                mode,
                mtime: None,
                kind: NodeKind::Dir { children },
            }
        }
        _ => unreachable!(),
    };

    Ok((node, has_sibling))
}

fn read_u32<R: ReadStream>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

fn read_name<R: ReadStream>(r: &mut R) -> Result<Vec<u8>> {
    let mut name = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        r.read_exact(&mut byte)?;
        if byte[0] == 0 {
            return Ok(name);
        }
        name.push(byte[0]);
    }
}

fn sanitize_decoded_name(name: Vec<u8>) -> Vec<u8> {
    if name == b".." || name.contains(&b'/') {
        RESTRICTED_NAME.to_vec()
    } else {
        name
    }
}
