//! Class sources: where class-file bytes come from.
//!
//! Every lookup opens, reads, and closes its archive or directory within the
//! call. No file handle is retained between lookups.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use super::location::ResourceLocation;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Corrupt archive: {0}")]
    Archive(String),

    #[error("Entry {entry} is {size} bytes, limit is {limit}")]
    TooLarge { entry: String, size: u64, limit: u64 },
}

impl From<io::Error> for SourceError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// A searchable origin of class-file entries.
///
/// Entry names use archive form: `com/example/Driver.class`.
pub trait ClassSource: Send + Sync + fmt::Debug {
    /// Human-readable origin, used in handles and error messages.
    fn describe(&self) -> String;

    /// Read the named entry, or `Ok(None)` if the source does not contain it.
    fn find_entry(&self, entry: &str, max_bytes: u64) -> Result<Option<Vec<u8>>, SourceError>;
}

impl ClassSource for ResourceLocation {
    fn describe(&self) -> String {
        self.as_str().to_string()
    }

    fn find_entry(&self, entry: &str, max_bytes: u64) -> Result<Option<Vec<u8>>, SourceError> {
        let path = self.path();
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            // Missing class-path entries are skipped, not fatal.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            read_from_directory(path, entry, max_bytes)
        } else {
            read_from_archive(path, entry, max_bytes)
        }
    }
}

fn read_from_directory(root: &Path, entry: &str, max_bytes: u64) -> Result<Option<Vec<u8>>, SourceError> {
    let mut file_path = PathBuf::from(root);
    for part in entry.split('/') {
        file_path.push(part);
    }

    let metadata = match fs::metadata(&file_path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    check_size(entry, metadata.len(), max_bytes)?;

    let file = File::open(&file_path)?;
    read_capped(file, entry, metadata.len(), max_bytes).map(Some)
}

fn read_from_archive(path: &Path, entry: &str, max_bytes: u64) -> Result<Option<Vec<u8>>, SourceError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(archive_error)?;

    let mut zipped = match archive.by_name(entry) {
        Ok(z) => z,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(archive_error(e)),
    };
    if zipped.is_dir() {
        return Ok(None);
    }
    let declared = zipped.size();
    check_size(entry, declared, max_bytes)?;

    read_capped(&mut zipped, entry, declared, max_bytes)
        .map(Some)
        .map_err(|e| match e {
            SourceError::Io(reason) => SourceError::Archive(reason),
            other => other,
        })
}

/// Read at most `limit` bytes. Declared sizes only size the buffer; an entry
/// that yields more than `limit` is `TooLarge` whatever its header says.
fn read_capped<R: Read>(reader: R, entry: &str, declared: u64, limit: u64) -> Result<Vec<u8>, SourceError> {
    let mut bytes = Vec::with_capacity(declared.min(limit) as usize);
    reader.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;

    check_size(entry, bytes.len() as u64, limit)?;
    Ok(bytes)
}

fn check_size(entry: &str, size: u64, limit: u64) -> Result<(), SourceError> {
    if size > limit {
        return Err(SourceError::TooLarge {
            entry: entry.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

fn archive_error(err: ZipError) -> SourceError {
    match err {
        ZipError::Io(e) => SourceError::Io(e.to_string()),
        other => SourceError::Archive(other.to_string()),
    }
}
