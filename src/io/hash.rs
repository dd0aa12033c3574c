//! Content hashing for change detection.

use super::FileSystem;
use crate::path::FilePath;
use sha2::{Digest, Sha256};
use std::io::{self, Read};

/// Computes a content checksum for a file.
pub trait HashComputer: Send + Sync {
    fn compute(&self, fs: &dyn FileSystem, path: &FilePath) -> io::Result<String>;
}

/// SHA-256 checksum rendered as lowercase hex.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl HashComputer for Sha256Hasher {
    fn compute(&self, fs: &dyn FileSystem, path: &FilePath) -> io::Result<String> {
        let mut reader = fs.open_read(path)?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}
