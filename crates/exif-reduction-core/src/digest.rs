use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// SHA-256 of the whole file, streamed in 64 KiB blocks.
pub fn file_digest(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_vec())
}

/// Uppercase hex without separators, as used in collision suffixes.
pub fn digest_suffix(digest: &[u8]) -> String {
    hex::encode_upper(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_file_digest_matches_in_memory_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &content).unwrap();

        assert_eq!(file_digest(&path).unwrap(), Sha256::digest(&content).to_vec());
    }

    #[test]
    fn test_suffix_is_uppercase_hex() {
        let suffix = digest_suffix(&[0xab, 0x01, 0xff]);
        assert_eq!(suffix, "AB01FF");
        let empty = Sha256::digest(b"");
        assert_eq!(digest_suffix(&empty).len(), 64);
    }
}
