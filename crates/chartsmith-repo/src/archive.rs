//! Chart archive extraction
//!
//! Archives are tarballs, optionally compressed. The compression is
//! detected from the leading bytes of the stream rather than the URL's
//! file extension, since repositories are not consistent about naming.

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::io::{self, Cursor, Read};
use std::path::Path;
use tar::Archive;

use crate::error::{RepoError, Result};

/// Enough to reach the `ustar` magic at offset 257
const SNIFF_LEN: u64 = 512;

/// Compression wrapped around the tar stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zstd,
    None,
}

impl Compression {
    /// Detect compression from the first bytes of an archive
    pub fn detect(header: &[u8]) -> Result<Self> {
        if header.starts_with(&[0x1f, 0x8b]) {
            return Ok(Compression::Gzip);
        }
        if header.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            return Ok(Compression::Zstd);
        }
        if header.len() >= 262 && &header[257..262] == b"ustar" {
            return Ok(Compression::None);
        }

        let detected = if header.starts_with(b"BZh") {
            "bzip2"
        } else if header.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            "xz"
        } else if header.starts_with(b"PK\x03\x04") {
            "zip"
        } else {
            "unknown"
        };

        Err(RepoError::Archive {
            message: format!("unsupported archive format ({})", detected),
        })
    }
}

/// Unpack a (possibly compressed) tar stream into `dest`
pub fn unpack<R: Read>(mut reader: R, dest: &Path) -> Result<Compression> {
    let mut header = Vec::with_capacity(SNIFF_LEN as usize);
    (&mut reader)
        .take(SNIFF_LEN)
        .read_to_end(&mut header)
        .map_err(archive_error)?;

    let compression = Compression::detect(&header)?;
    let stream = Cursor::new(header).chain(reader);

    std::fs::create_dir_all(dest)?;
    match compression {
        Compression::Gzip => unpack_tar(GzDecoder::new(stream), dest)?,
        Compression::Zstd => {
            let decoder = zstd::stream::read::Decoder::new(stream).map_err(archive_error)?;
            unpack_tar(decoder, dest)?
        }
        Compression::None => unpack_tar(stream, dest)?,
    }

    Ok(compression)
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> Result<()> {
    Archive::new(reader).unpack(dest).map_err(archive_error)
}

fn archive_error(e: io::Error) -> RepoError {
    RepoError::Archive {
        message: e.to_string(),
    }
}

/// Reader adapter hashing every byte that passes through it
pub struct DigestReader<R> {
    inner: R,
    hasher: Sha256,
}

impl<R: Read> DigestReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    /// Consume what is left of the stream and return the digest
    ///
    /// Decoders may stop before the end of the stream (tar padding, gzip
    /// trailer), so the remainder is drained before hashing completes.
    pub fn finish(mut self) -> Result<String> {
        io::copy(&mut self, &mut io::sink()).map_err(archive_error)?;
        Ok(format!("sha256:{}", hex::encode(self.hasher.finalize())))
    }
}

impl<R: Read> Read for DigestReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }
}

/// Compute SHA256 digest of data
pub fn compute_digest(data: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(data)))
}

/// Check if two digests match (supports various formats)
pub fn digest_matches(expected: &str, actual: &str) -> bool {
    fn normalize(digest: &str) -> String {
        digest
            .trim()
            .to_lowercase()
            .replace("sha256:", "")
            .replace("sha256-", "")
    }

    normalize(expected) == normalize(actual)
}
