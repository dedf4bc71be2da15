//! Metadata queries by directory scan.
//!
//! There is no index: every query lists every upload directory under the
//! root and parses every metadata record it finds, so the cost of a query is
//! linear in the number of stored uploads. That is fine for a few thousand
//! uploads and is the main scalability limit of this storage layout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::{FileUploadError, Result};

use super::properties::Properties;
use super::record::{MetadataMap, RecordFilter};
use super::METADATA_SUFFIX;

/// What to do with an upload directory that holds no metadata record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanMode {
    /// Stop the scan and return no results at all, even for directories
    /// that were already matched. Deployments with existing data rely on
    /// this behavior, so it stays the default.
    #[default]
    AbortOnEmpty,
    /// Ignore the directory and keep scanning.
    SkipEmpty,
}

/// Scans a storage root for metadata records.
#[derive(Debug, Clone)]
pub struct MetadataScanner {
    root: PathBuf,
    mode: ScanMode,
}

impl MetadataScanner {
    /// Create a scanner for `root`.
    pub fn new(root: impl Into<PathBuf>, mode: ScanMode) -> Self {
        Self {
            root: root.into(),
            mode,
        }
    }

    /// Get the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the scan mode.
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Find the records owned by `owner`, optionally limited to one creation date.
    ///
    /// Records come back in directory listing order, then file listing order;
    /// neither is stable across platforms.
    pub fn search(&self, owner: &str, creation_date: Option<NaiveDate>) -> Result<Vec<MetadataMap>> {
        let filter = RecordFilter::new(owner, creation_date);

        let directories = match upload_directories(&self.root) {
            Ok(dirs) => dirs,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Cannot list storage root {}",
                    self.root.display()
                );
                return Ok(Vec::new());
            }
        };

        tracing::debug!("Total directories to scan [{}]", directories.len());

        let mut matches = Vec::new();
        for dir in directories {
            tracing::debug!("Checking metadata records under {}", dir.display());

            let records = metadata_files(&dir).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Cannot list {}", dir.display());
                Vec::new()
            });

            if records.is_empty() {
                match self.mode {
                    ScanMode::AbortOnEmpty => {
                        tracing::debug!(
                            "No metadata record in {}, abandoning scan",
                            dir.display()
                        );
                        return Ok(Vec::new());
                    }
                    ScanMode::SkipEmpty => continue,
                }
            }

            for path in records {
                let props = read_record(&path)?;
                if filter.matches(&props) {
                    matches.push(props.into_map());
                }
            }
        }

        Ok(matches)
    }
}

/// Immediate, non-hidden subdirectories of `root`.
fn upload_directories(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if is_hidden(&entry.file_name()) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    Ok(dirs)
}

/// Entries of `dir` whose names end in `.properties`.
fn metadata_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        tracing::trace!("File name [{}]", name.to_string_lossy());
        if name.to_string_lossy().ends_with(METADATA_SUFFIX) {
            files.push(entry.path());
        }
    }
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn read_record(path: &Path) -> Result<Properties> {
    let bytes = fs::read(path).map_err(|e| FileUploadError::metadata_read(path, e))?;
    let props = Properties::from_latin1(&bytes).map_err(|e| FileUploadError::metadata_read(path, e))?;
    tracing::trace!(?props, "Loaded metadata record {}", path.display());
    Ok(props)
}
