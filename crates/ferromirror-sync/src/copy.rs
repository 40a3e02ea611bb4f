//! Copy-then-replace file transfer
//!
//! The destination is never truncated in place. Content goes to a hidden
//! sibling first and only a complete copy is renamed over the destination, so
//! an interrupted pass can leave a stray temp file but never a partial file
//! under the real name. Stray temp files have no source counterpart and are
//! pruned by the next pass.

use filetime::FileTime;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Copy `source` over `destination`, returning the number of bytes copied
///
/// Permissions come along with the content; access and modification times
/// are applied when `preserve_timestamps` is set.
pub async fn replace_file(
    source: &Path,
    destination: &Path,
    preserve_timestamps: bool,
) -> io::Result<u64> {
    let temp_path = temp_sibling(destination)?;

    let result = copy_into_place(source, &temp_path, destination, preserve_timestamps).await;
    if result.is_err() {
        if let Err(e) = fs::remove_file(&temp_path).await {
            if e.kind() != io::ErrorKind::NotFound {
                debug!("Failed to clean up '{}': {}", temp_path.display(), e);
            }
        }
    }
    result
}

async fn copy_into_place(
    source: &Path,
    temp_path: &Path,
    destination: &Path,
    preserve_timestamps: bool,
) -> io::Result<u64> {
    let bytes = fs::copy(source, temp_path).await?;

    if preserve_timestamps {
        let metadata = fs::metadata(source).await?;
        filetime::set_file_times(
            temp_path,
            FileTime::from_last_access_time(&metadata),
            FileTime::from_last_modification_time(&metadata),
        )?;
    }

    fs::rename(temp_path, destination).await?;
    Ok(bytes)
}

/// Hidden sibling with a fixed-length name, so a destination name near the
/// filesystem limit still leaves room for it
fn temp_sibling(destination: &Path) -> io::Result<PathBuf> {
    let parent = destination.parent().filter(|_| destination.file_name().is_some());
    let parent = parent.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' has no file name", destination.display()),
        )
    })?;

    Ok(parent.join(format!(
        ".ferromirror-{}.tmp",
        uuid::Uuid::new_v4().simple()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_replace_new_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source.txt");
        let destination = temp_dir.path().join("destination.txt");
        std::fs::write(&source, "hello").unwrap();

        let bytes = replace_file(&source, &destination, true).await.unwrap();

        assert_eq!(bytes, 5);
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_replace_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source.txt");
        let destination = temp_dir.path().join("destination.txt");
        std::fs::write(&source, "new").unwrap();
        std::fs::write(&destination, "old and longer").unwrap();

        replace_file(&source, &destination, false).await.unwrap();

        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "new");
        let leftovers = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[tokio::test]
    async fn test_preserves_modification_time() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source.txt");
        let destination = temp_dir.path().join("destination.txt");
        std::fs::write(&source, "hello").unwrap();

        let past = SystemTime::now() - Duration::from_secs(3600 * 24);
        filetime::set_file_mtime(&source, FileTime::from_system_time(past)).unwrap();

        replace_file(&source, &destination, true).await.unwrap();

        let source_mtime =
            FileTime::from_last_modification_time(&std::fs::metadata(&source).unwrap());
        let dest_mtime =
            FileTime::from_last_modification_time(&std::fs::metadata(&destination).unwrap());
        assert_eq!(source_mtime, dest_mtime);
    }

    #[tokio::test]
    async fn test_failed_copy_leaves_destination_intact() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("missing.txt");
        let destination = temp_dir.path().join("destination.txt");
        std::fs::write(&destination, "keep me").unwrap();

        let result = replace_file(&source, &destination, true).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "keep me");
        let leftovers = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_temp_sibling_is_hidden_and_unique() {
        let destination = Path::new("/replica/dir/report.pdf");
        let first = temp_sibling(destination).unwrap();
        let second = temp_sibling(destination).unwrap();

        assert_eq!(first.parent(), destination.parent());
        assert!(first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(".ferromirror-"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_temp_sibling_length_does_not_depend_on_name() {
        let short = temp_sibling(Path::new("/replica/a")).unwrap();
        let long = temp_sibling(&Path::new("/replica").join("b".repeat(250))).unwrap();

        assert_eq!(short.file_name().unwrap().len(), long.file_name().unwrap().len());
        assert!(long.file_name().unwrap().len() < 64);
    }

    #[tokio::test]
    async fn test_replace_file_with_long_name() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("source.txt");
        let destination = temp_dir.path().join("d".repeat(245));
        std::fs::write(&source, "hello").unwrap();

        replace_file(&source, &destination, true).await.unwrap();

        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "hello");
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 2);
    }
}
