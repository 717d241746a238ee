use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// The three digests build-info records for every artifact and dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileChecksums {
    pub sha1: String,
    pub md5: String,
    pub sha256: String,
}

/// Compute SHA-1, MD5 and SHA-256 of a file in a single pass.
pub fn checksums_file(path: &Path) -> std::io::Result<FileChecksums> {
    let mut file = std::fs::File::open(path)?;
    let mut sha1 = Sha1::new();
    let mut md5 = Md5::new();
    let mut sha256 = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        sha1.update(&buffer[..n]);
        md5.update(&buffer[..n]);
        sha256.update(&buffer[..n]);
    }
    Ok(FileChecksums {
        sha1: format!("{:x}", sha1.finalize()),
        md5: format!("{:x}", md5.finalize()),
        sha256: format!("{:x}", sha256.finalize()),
    })
}

/// Compute SHA-1, MD5 and SHA-256 of a byte slice.
pub fn checksums_bytes(data: &[u8]) -> FileChecksums {
    FileChecksums {
        sha1: format!("{:x}", Sha1::digest(data)),
        md5: format!("{:x}", Md5::digest(data)),
        sha256: sha256_bytes(data),
    }
}

/// Compute the SHA-256 hash of a byte slice, returning a lowercase hex string.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
