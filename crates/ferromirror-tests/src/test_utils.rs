//! Tree fixtures and snapshots for mirroring tests

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

/// One entry of a directory snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A directory
    Dir,
    /// A regular file and its content
    File(Vec<u8>),
    /// A symbolic link and its target
    Link(PathBuf),
}

/// Relative path to entry map of everything below a root
pub type Snapshot = BTreeMap<PathBuf, Node>;

/// Capture a tree without following links
pub fn snapshot(root: &Path) -> Snapshot {
    let mut entries = Snapshot::new();
    if !root.exists() {
        return entries;
    }

    for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
        let entry = entry.expect("Failed to walk tree");
        let relative = entry
            .path()
            .strip_prefix(root)
            .expect("Walked outside the root")
            .to_path_buf();
        let file_type = entry.file_type();
        let node = if file_type.is_dir() {
            Node::Dir
        } else if file_type.is_symlink() {
            Node::Link(fs::read_link(entry.path()).expect("Failed to read link"))
        } else {
            Node::File(fs::read(entry.path()).expect("Failed to read file"))
        };
        entries.insert(relative, node);
    }
    entries
}

/// Deterministic content of the given size
pub fn generate_test_data(size: usize, seed: u8) -> Vec<u8> {
    (0..size)
        .map(|i| ((i * 7 + 13) % 251) as u8 ^ seed)
        .collect()
}

/// A temporary source directory and a (possibly missing) replica directory
pub struct MirrorFixture {
    temp_dir: TempDir,
    source: PathBuf,
    replica: PathBuf,
}

impl MirrorFixture {
    /// Create an empty source and no replica
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = temp_dir.path().join("source");
        let replica = temp_dir.path().join("replica");
        fs::create_dir(&source).expect("Failed to create source");
        Self {
            temp_dir,
            source,
            replica,
        }
    }

    /// Source root
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Replica root
    pub fn replica(&self) -> &Path {
        &self.replica
    }

    /// Directory holding both roots
    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file below the source, creating parents
    pub fn write_source(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        write_file(&self.source, relative, content.as_ref())
    }

    /// Write a file below the replica, creating parents
    pub fn write_replica(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        write_file(&self.replica, relative, content.as_ref())
    }

    /// Create a directory below the source
    pub fn mkdir_source(&self, relative: &str) -> PathBuf {
        make_dir(&self.source, relative)
    }

    /// Create a directory below the replica
    pub fn mkdir_replica(&self, relative: &str) -> PathBuf {
        make_dir(&self.replica, relative)
    }

    /// Remove a file or a whole directory below the source
    pub fn remove_source(&self, relative: &str) {
        let path = self.source.join(relative);
        if path.is_dir() {
            fs::remove_dir_all(&path).expect("Failed to remove source dir");
        } else {
            fs::remove_file(&path).expect("Failed to remove source file");
        }
    }

    /// Content of a replica file
    pub fn read_replica(&self, relative: &str) -> Vec<u8> {
        fs::read(self.replica.join(relative)).expect("Failed to read replica file")
    }

    /// Whether the replica currently mirrors the source exactly
    pub fn is_mirrored(&self) -> bool {
        snapshot(&self.source) == snapshot(&self.replica)
    }
}

impl Default for MirrorFixture {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    fs::write(&path, content).expect("Failed to write file");
    path
}

fn make_dir(root: &Path, relative: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(&path).expect("Failed to create dir");
    path
}

/// Materialize a generated tree below `root`
///
/// Entries are `(path, Some(content))` for files and `(path, None)` for
/// directories. Entries that clash with an earlier one are skipped.
pub fn build_tree(root: &Path, entries: &[(PathBuf, Option<Vec<u8>>)]) {
    fs::create_dir_all(root).expect("Failed to create root");
    for (relative, content) in entries {
        let path = root.join(relative);
        match content {
            Some(bytes) => {
                let parent_ok = path
                    .parent()
                    .map_or(true, |parent| fs::create_dir_all(parent).is_ok());
                if parent_ok && !path.is_dir() {
                    let _ = fs::write(&path, bytes);
                }
            }
            None => {
                let _ = fs::create_dir_all(&path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_captures_dirs_and_files() {
        let fixture = MirrorFixture::new();
        fixture.write_source("a.txt", "hello");
        fixture.mkdir_source("empty");
        fixture.write_source("dir/b.txt", "b");

        let snap = snapshot(fixture.source());
        assert_eq!(snap.len(), 4);
        assert_eq!(snap[Path::new("a.txt")], Node::File(b"hello".to_vec()));
        assert_eq!(snap[Path::new("empty")], Node::Dir);
        assert_eq!(snap[Path::new("dir/b.txt")], Node::File(b"b".to_vec()));
    }

    #[test]
    fn test_snapshot_of_missing_root_is_empty() {
        let fixture = MirrorFixture::new();
        assert!(snapshot(fixture.replica()).is_empty());
    }

    #[test]
    fn test_build_tree_skips_clashes() {
        let fixture = MirrorFixture::new();
        let root = fixture.base().join("generated");
        build_tree(
            &root,
            &[
                (PathBuf::from("a"), Some(b"file".to_vec())),
                (PathBuf::from("a/b"), Some(b"under a file".to_vec())),
                (PathBuf::from("c/d"), None),
            ],
        );

        let snap = snapshot(&root);
        assert_eq!(snap[Path::new("a")], Node::File(b"file".to_vec()));
        assert_eq!(snap[Path::new("c/d")], Node::Dir);
        assert_eq!(snap.len(), 3);
    }

    #[test]
    fn test_generate_test_data_is_deterministic() {
        assert_eq!(generate_test_data(1024, 1), generate_test_data(1024, 1));
        assert_ne!(generate_test_data(1024, 1), generate_test_data(1024, 2));
    }
}
