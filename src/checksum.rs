//! SHA-1 digests published next to each archive.

use anyhow::{Context, Result};
use sha1::{Digest, Sha1};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

/// Streaming SHA-1 of a file as lowercase hex.
pub fn sha1_file(path: &Path) -> Result<String> {
    let f = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut r = BufReader::new(f);
    let mut hasher = Sha1::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = r
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write the digest of `src` to `dst` with no trailing newline.
pub fn write_sha1(src: &Path, dst: &Path) -> Result<String> {
    let digest = sha1_file(src)?;
    fs::write(dst, &digest).with_context(|| format!("Failed to write {}", dst.display()))?;
    Ok(digest)
}
