use std::fs::Metadata;
use std::path::Path;

use crate::error::{Error, Result};
use crate::filenet::node::{Node, NodeKind};

/// Builds the synthetic root node by recursively stat-ing every input path.
/// Directory entries are kept in the order the OS directory iterator
/// returns them — this function does not sort.
pub fn scan(paths: &[impl AsRef<Path>]) -> Result<Node> {
    let mut children = Vec::with_capacity(paths.len());
    for path in paths {
        children.push(scan_one(path.as_ref())?);
    }
    Ok(Node::root(children))
}

fn scan_one(path: &Path) -> Result<Node> {
    // Follows symlinks, matching the original's plain stat(): a symlink is
    // recorded and later streamed as whatever it points to, never as a
    // pseudo-file holding the link target's text.
    let meta = std::fs::metadata(path).map_err(|e| Error::io_at(path, e))?;
    let name = basename(path);
    let mode = mode_of(&meta);
    let mtime = meta.modified().ok();

    if meta.is_dir() {
        let mut children = Vec::new();
        let entries = std::fs::read_dir(path).map_err(|e| Error::io_at(path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io_at(path, e))?;
            children.push(scan_one(&entry.path())?);
        }
        Ok(Node {
            name,
            mode,
            mtime,
            kind: NodeKind::Dir { children },
        })
    } else {
        let size = size_of(path, &meta)?;
        Ok(Node {
            name,
            mode,
            mtime,
            kind: NodeKind::File { size },
        })
    }
}

fn basename(path: &Path) -> Vec<u8> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned().into_bytes())
        .unwrap_or_default()
}

fn size_of(path: &Path, meta: &Metadata) -> Result<u32> {
    u32::try_from(meta.len()).map_err(|_| {
        Error::Format(format!(
            "{}: file exceeds the 2^32-1 byte size limit",
            path.display()
        ))
    })
}

#[cfg(unix)]
fn mode_of(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn mode_of(meta: &Metadata) -> u32 {
    if meta.is_dir() {
        0o040755
    } else {
        0o100644
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filenet::node::NodeKind;

    #[test]
    fn scans_a_file_and_a_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.txt"), b"world!").unwrap();

        let root = scan(&[dir.path()]).unwrap();
        let NodeKind::Dir { children } = &root.kind else {
            panic!("root must be a directory");
        };
        assert_eq!(children.len(), 1);

        let NodeKind::Dir { children: top } = &children[0].kind else {
            panic!("input path must scan as a directory");
        };
        assert_eq!(top.len(), 2);

        let a = top.iter().find(|n| n.name == b"a.txt").unwrap();
        let NodeKind::File { size } = a.kind else {
            panic!("a.txt must be a file");
        };
        assert_eq!(size, 5);

        let sub = top.iter().find(|n| n.name == b"sub").unwrap();
        let NodeKind::Dir { children: sub_children } = &sub.kind else {
            panic!("sub must be a directory");
        };
        assert_eq!(sub_children.len(), 1);
        let NodeKind::File { size } = sub_children[0].kind else {
            panic!("b.txt must be a file");
        };
        assert_eq!(size, 6);
    }

    #[test]
    fn scanning_a_missing_path_fails() {
        let err = scan(&[Path::new("/nonexistent/definitely-not-here")]).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
