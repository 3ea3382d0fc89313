use std::path::PathBuf;
use std::time::SystemTime;

use crate::error::Result;
use crate::filenet::Visit;

/// One element of the tree. The root carries an empty name and is never
/// itself passed to a visitor or serialized.
pub struct Node {
    pub name: Vec<u8>,
    pub mode: u32,
    /// Only meaningful during pack, as a change-detection check; never
    /// written to the archive.
    pub mtime: Option<SystemTime>,
    pub kind: NodeKind,
}

pub enum NodeKind {
    File { size: u32 },
    Dir { children: Vec<Node> },
}

impl Node {
    pub fn root(children: Vec<Node>) -> Self {
        Node {
            name: Vec::new(),
            mode: 0,
            mtime: None,
            kind: NodeKind::Dir { children },
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Dir { .. })
    }

    /// Depth-first prefix traversal: a directory is visited before its
    /// children. `visitor` receives every non-root node along with its
    /// assembled path; returning [`Visit::Abort`] stops the whole walk.
    pub fn walk<F>(&self, visitor: &mut F) -> Result<Visit>
    where
        F: FnMut(&Node, &[u8]) -> Result<Visit>,
    {
        let mut stack: Vec<u8> = Vec::new();
        self.walk_children(&mut stack, visitor)
    }

    fn walk_children<F>(&self, stack: &mut Vec<u8>, visitor: &mut F) -> Result<Visit>
    where
        F: FnMut(&Node, &[u8]) -> Result<Visit>,
    {
        let NodeKind::Dir { children } = &self.kind else {
            return Ok(Visit::Continue);
        };
        for child in children {
            let mark = stack.len();
            if mark > 0 {
                stack.push(b'/');
            }
            stack.extend_from_slice(&child.name);

            match visitor(child, stack)? {
                Visit::Abort => return Ok(Visit::Abort),
                Visit::Continue => {}
            }
            if child.is_dir() {
                match child.walk_children(stack, visitor)? {
                    Visit::Abort => return Ok(Visit::Abort),
                    Visit::Continue => {}
                }
            }
            stack.truncate(mark);
        }
        Ok(Visit::Continue)
    }

    pub fn path_buf(path: &[u8]) -> PathBuf {
        PathBuf::from(String::from_utf8_lossy(path).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> Node {
        Node {
            name: name.as_bytes().to_vec(),
            mode: 0o644,
            mtime: None,
            kind: NodeKind::File { size: 0 },
        }
    }

    fn dir(name: &str, children: Vec<Node>) -> Node {
        Node {
            name: name.as_bytes().to_vec(),
            mode: 0o755,
            mtime: None,
            kind: NodeKind::Dir { children },
        }
    }

    #[test]
    fn walk_visits_in_prefix_order_with_assembled_paths() {
        let root = Node::root(vec![
            file("a"),
            dir("sub", vec![file("x"), file("y")]),
        ]);

        let mut seen = Vec::new();
        root.walk(&mut |node, path| {
            seen.push((String::from_utf8_lossy(&node.name).into_owned(), String::from_utf8_lossy(path).into_owned()));
            Ok(Visit::Continue)
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                ("a".to_string(), "a".to_string()),
                ("sub".to_string(), "sub".to_string()),
                ("x".to_string(), "sub/x".to_string()),
                ("y".to_string(), "sub/y".to_string()),
            ]
        );
    }

    #[test]
    fn walk_abort_stops_the_rest_of_the_tree() {
        let root = Node::root(vec![file("a"), file("b"), file("c")]);
        let mut seen = Vec::new();
        root.walk(&mut |node, _path| {
            seen.push(node.name.clone());
            if node.name == b"b" {
                Ok(Visit::Abort)
            } else {
                Ok(Visit::Continue)
            }
        })
        .unwrap();
        assert_eq!(seen, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn walk_over_an_empty_root_visits_nothing() {
        let root = Node::root(Vec::new());
        let mut count = 0;
        root.walk(&mut |_node, _path| {
            count += 1;
            Ok(Visit::Continue)
        })
        .unwrap();
        assert_eq!(count, 0);
    }
}
