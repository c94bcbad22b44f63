//! Streaming content fingerprints.
//!
//! Files are grouped on their BLAKE3 digest alone; matching digests are not
//! followed by a byte-by-byte comparison. A collision would therefore report
//! two different files as duplicates. For BLAKE3 that is astronomically
//! unlikely, but it is a limitation, not a guarantee.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::debug;
use serde::{Serialize, Serializer};

use crate::error::{Result, ScanError};

const BUFFER_SIZE: usize = 8192;

/// 32-byte BLAKE3 fingerprint of a file's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; 32]);

impl From<blake3::Hash> for Digest {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Hashes a file in fixed-size chunks so memory use does not depend on file size.
pub fn digest_file(file_path: &Path) -> Result<Digest> {
    let wrap = |source| ScanError::Digest {
        path: file_path.to_path_buf(),
        source,
    };

    let file = File::open(file_path).map_err(wrap)?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0; BUFFER_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(wrap)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        total_bytes += bytes_read as u64;
    }

    let digest = Digest::from(hasher.finalize());
    debug!("Hashed '{}': {} ({} bytes)", file_path.display(), digest, total_bytes);
    Ok(digest)
}
