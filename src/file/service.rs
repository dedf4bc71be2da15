//! Upload and query facade.
//!
//! This is the only surface the web layer calls. Both operations are
//! synchronous and block on filesystem I/O.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use rand::{CryptoRng, RngCore};

use crate::config::StorageConfig;
use crate::datetime::{clock_for, format_date, Clock};
use crate::Result;

use super::container::FileContainer;
use super::record::MetadataMap;
use super::scanner::{MetadataScanner, ScanMode};
use super::storage::{FileStorage, StorageEntry};
use super::token::TokenGenerator;

/// Operations offered to the boundary layer.
pub trait FileService: Send + Sync {
    /// Save the file and its metadata record.
    fn upload(&self, container: FileContainer) -> Result<StorageEntry>;

    /// Find metadata records for `owner`, optionally created on `creation_date`.
    fn query(&self, owner: &str, creation_date: Option<NaiveDate>) -> Result<Vec<MetadataMap>>;
}

/// Filesystem-backed file service.
pub struct LocalFileService<R = rand::rngs::StdRng> {
    storage: FileStorage<R>,
    scanner: MetadataScanner,
}

impl LocalFileService {
    /// Build the service described by the storage configuration, seeding
    /// tokens from the operating system.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let tokens = TokenGenerator::from_os_rng()?;
        let clock: Arc<dyn Clock> = Arc::from(clock_for(config.timezone.as_deref())?);
        let mode = if config.skip_empty_directories {
            ScanMode::SkipEmpty
        } else {
            ScanMode::AbortOnEmpty
        };
        Ok(Self::new(&config.root, tokens, clock, mode))
    }
}

impl<R: RngCore + CryptoRng> LocalFileService<R> {
    /// Create a service over `root` with explicit dependencies.
    pub fn new(
        root: impl Into<PathBuf>,
        tokens: TokenGenerator<R>,
        clock: Arc<dyn Clock>,
        mode: ScanMode,
    ) -> Self {
        let root = root.into();
        Self {
            scanner: MetadataScanner::new(&root, mode),
            storage: FileStorage::new(root, tokens, clock),
        }
    }

    /// Get the storage root.
    pub fn root(&self) -> &Path {
        self.storage.root()
    }
}

impl<R: RngCore + CryptoRng + Send> FileService for LocalFileService<R> {
    fn upload(&self, container: FileContainer) -> Result<StorageEntry> {
        tracing::info!(
            owner = %container.owner,
            file_name = %container.logical_name,
            size = container.size(),
            "File persisting started"
        );
        let entry = self.storage.store(&container).inspect_err(|e| {
            tracing::error!(error = %e, "Failed while saving file on disk");
        })?;
        tracing::info!(token = %entry.token, "File persisting completed");
        Ok(entry)
    }

    fn query(&self, owner: &str, creation_date: Option<NaiveDate>) -> Result<Vec<MetadataMap>> {
        let date = creation_date.map(format_date);
        tracing::info!(
            owner,
            creation_date = ?date,
            "Started searching metadata"
        );
        let records = self.scanner.search(owner, creation_date).inspect_err(|e| {
            tracing::error!(error = %e, "Failed while searching metadata");
        })?;
        tracing::info!(
            owner,
            creation_date = ?date,
            matches = records.len(),
            "Completed searching metadata"
        );
        Ok(records)
    }
}
