use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::{Accumulator, HashError};

/// Read size used when streaming file content into the accumulator
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// What to do when a stream ends before its recorded length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortReadPolicy {
    /// Report [`HashError::Truncated`]
    #[default]
    Fail,
    /// Hash what was read, followed by the recorded length
    Truncate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashOptions {
    pub chunk_size: usize,
    pub short_read: ShortReadPolicy,
}

impl Default for HashOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            short_read: ShortReadPolicy::default(),
        }
    }
}

/// Fingerprint a file's content and length with a fresh accumulator
pub fn hash_file(path: &Path) -> Result<u64, HashError> {
    let mut acc = Accumulator::new();
    hash_file_with(path, &mut acc, &HashOptions::default())
}

/// Fingerprint a file into a caller-supplied accumulator.
///
/// The accumulator is fed as-is, so anything already in it becomes part of the
/// result. Call [`Accumulator::reset`] first when reusing one across files.
pub fn hash_file_with(
    path: &Path,
    acc: &mut Accumulator,
    options: &HashOptions,
) -> Result<u64, HashError> {
    let file = File::open(path).map_err(|source| HashError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let length = file
        .metadata()
        .map_err(|source| HashError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    tracing::trace!("Hashing {} ({} bytes)", path.display(), length);

    hash_reader(file, length, acc, options, path)
}

/// Fingerprint `length` bytes of `reader`.
///
/// Bytes past `length` are never read. `origin` only labels errors.
pub fn hash_reader<R: Read>(
    mut reader: R,
    length: u64,
    acc: &mut Accumulator,
    options: &HashOptions,
    origin: &Path,
) -> Result<u64, HashError> {
    let consumed =
        feed(&mut reader, length, acc, options.chunk_size).map_err(|source| HashError::Read {
            path: origin.to_path_buf(),
            source,
        })?;

    if consumed < length {
        match options.short_read {
            ShortReadPolicy::Fail => {
                return Err(HashError::Truncated {
                    path: origin.to_path_buf(),
                    expected: length,
                    actual: consumed,
                });
            }
            ShortReadPolicy::Truncate => {
                tracing::warn!(
                    "{} ended after {} of {} bytes, hashing what was read",
                    origin.display(),
                    consumed,
                    length
                );
            }
        }
    }

    acc.put_u64(length);
    Ok(acc.finish())
}

/// Fingerprint an in-memory buffer exactly as [`hash_file`] would a file
/// holding the same bytes
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut acc = Accumulator::new();
    acc.update(bytes);
    acc.put_u64(bytes.len() as u64);
    acc.finish()
}

fn feed<R: Read>(
    reader: &mut R,
    length: u64,
    acc: &mut Accumulator,
    chunk_size: usize,
) -> std::io::Result<u64> {
    let capacity = chunk_size
        .max(1)
        .min(usize::try_from(length).unwrap_or(usize::MAX));
    let mut buffer = vec![0u8; capacity];
    let mut consumed = 0u64;

    while consumed < length {
        let want = (length - consumed).min(buffer.len() as u64) as usize;
        match reader.read(&mut buffer[..want]) {
            Ok(0) => break,
            Ok(n) => {
                acc.update(&buffer[..n]);
                consumed += n as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(consumed)
}
