//! Streaming content hashing.
//!
//! The digest identifies a file by its bytes alone; filename and path never
//! enter the hash. It is the dedup key for the bronze file registry.

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Chunk size for streaming reads. Bounds memory for arbitrarily large files.
const HASH_CHUNK_SIZE: usize = 8192;

/// Compute the lowercase-hex SHA-256 digest of a file's content.
pub fn sha256_file(path: impl AsRef<Path>) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    sha256_reader(&mut file)
}

/// Compute the lowercase-hex SHA-256 digest of any readable source.
pub fn sha256_reader<R: Read>(reader: &mut R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    #[test]
    fn test_sha256_known_vector() {
        let mut cursor = Cursor::new(b"hello world");
        let digest = sha256_reader(&mut cursor).unwrap();
        assert_eq!(digest, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }

    #[test]
    fn test_sha256_file_matches_reader() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();

        let digest = sha256_file(file.path()).unwrap();
        assert_eq!(digest, "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9");
    }

    #[test]
    fn test_digest_ignores_name() {
        let mut a = tempfile::NamedTempFile::new().unwrap();
        let mut b = tempfile::NamedTempFile::new().unwrap();
        a.write_all(b"same bytes").unwrap();
        b.write_all(b"same bytes").unwrap();
        a.flush().unwrap();
        b.flush().unwrap();

        assert_eq!(sha256_file(a.path()).unwrap(), sha256_file(b.path()).unwrap());
    }

    #[test]
    fn test_input_larger_than_chunk() {
        let data = vec![0xabu8; HASH_CHUNK_SIZE * 3 + 17];
        let mut cursor = Cursor::new(data.clone());
        let streamed = sha256_reader(&mut cursor).unwrap();

        let mut hasher = Sha256::new();
        hasher.update(&data);
        assert_eq!(streamed, hex::encode(hasher.finalize()));
    }
}
