//! Content fingerprints for change detection

use ferromirror_types::ChunkSize;
use std::fmt;
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

/// BLAKE3 digest of a file's full byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileFingerprint(blake3::Hash);

impl FileFingerprint {
    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl fmt::Display for FileFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Hash a file in `chunk_size` pieces, so memory use is bounded regardless of file size
pub async fn fingerprint<P: AsRef<Path>>(path: P, chunk_size: ChunkSize) -> io::Result<FileFingerprint> {
    let mut file = File::open(path.as_ref()).await?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; chunk_size.get()];

    loop {
        let bytes_read = file.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(FileFingerprint(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_equal_content_equal_fingerprint() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        std::fs::write(&a, "hello").unwrap();
        std::fs::write(&b, "hello").unwrap();

        let fa = fingerprint(&a, ChunkSize::default()).await.unwrap();
        let fb = fingerprint(&b, ChunkSize::default()).await.unwrap();
        assert_eq!(fa, fb);
        assert_eq!(fa.to_string(), blake3::hash(b"hello").to_hex().to_string());
    }

    #[rstest]
    #[case(4096)]
    #[case(64 * 1024)]
    #[case(1 << 20)]
    #[tokio::test]
    async fn test_chunking_does_not_change_the_digest(#[case] chunk_size: usize) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("large.bin");
        let data: Vec<u8> = (0..100_000u32).map(|i| (i * 7 % 251) as u8).collect();
        std::fs::write(&path, &data).unwrap();

        let print = fingerprint(&path, ChunkSize::new(chunk_size).unwrap())
            .await
            .unwrap();
        assert_eq!(print.as_bytes(), blake3::hash(&data).as_bytes());
    }

    #[tokio::test]
    async fn test_different_content() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        std::fs::write(&a, "hello").unwrap();
        std::fs::write(&b, "hellp").unwrap();

        let fa = fingerprint(&a, ChunkSize::default()).await.unwrap();
        let fb = fingerprint(&b, ChunkSize::default()).await.unwrap();
        assert_ne!(fa, fb);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = fingerprint(temp_dir.path().join("nope"), ChunkSize::default()).await;
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
