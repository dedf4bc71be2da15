//! Physical storage of uploads.
//!
//! Every upload gets its own directory directly under the storage root:
//! ```text
//! {root}/
//! ├── 1b3kq9v0c8k2l5s7m4e6r1t0fa/
//! │   ├── report.pdf
//! │   └── report.pdf.properties
//! └── 3o0u7d2h9n1j5g4s8b6c0p2m1k/
//!     ├── notes.txt
//!     └── notes.txt.properties
//! ```
//! An upload is assembled in a hidden staging directory and renamed into
//! place once both files are written, so a failed upload never leaves a
//! content file without its metadata record.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::{CryptoRng, RngCore};

use crate::datetime::Clock;
use crate::{FileUploadError, Result};

use super::container::FileContainer;
use super::record::{MetadataRecord, RECORD_HEADER};
use super::token::TokenGenerator;
use super::{METADATA_SUFFIX, STAGING_PREFIX};

/// A stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    /// Token naming the upload directory.
    pub token: String,
    /// Upload directory (`{root}/{token}`).
    pub location: PathBuf,
    /// Content file (`{location}/{logical_name}`).
    pub content_path: PathBuf,
    /// Metadata record (`{location}/{logical_name}.properties`).
    pub metadata_path: PathBuf,
}

/// Writes uploads below a storage root.
pub struct FileStorage<R = rand::rngs::StdRng> {
    root: PathBuf,
    tokens: TokenGenerator<R>,
    clock: Arc<dyn Clock>,
}

impl<R: RngCore + CryptoRng> FileStorage<R> {
    /// Create a storage writer for `root`.
    ///
    /// The root directory is created lazily by the first upload.
    pub fn new(root: impl Into<PathBuf>, tokens: TokenGenerator<R>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            tokens,
            clock,
        }
    }

    /// Get the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist the container's content and its metadata record.
    pub fn store(&self, container: &FileContainer) -> Result<StorageEntry> {
        validate_logical_name(&container.logical_name)?;

        let token = self.tokens.next_token();
        let location = self.root.join(&token);
        let staging = self.root.join(format!("{STAGING_PREFIX}{token}"));

        fs::create_dir_all(&self.root).map_err(|e| FileUploadError::storage(&self.root, e))?;
        fs::create_dir(&staging).map_err(|e| FileUploadError::storage(&staging, e))?;

        let record = MetadataRecord::for_upload(container, self.clock.today());
        if let Err(e) = write_entry(&staging, container, &record) {
            discard_staging(&staging);
            return Err(e);
        }

        if let Err(e) = fs::rename(&staging, &location) {
            discard_staging(&staging);
            return Err(FileUploadError::storage(&location, e));
        }

        tracing::debug!(
            token = %token,
            size = container.size(),
            "Stored upload at {}",
            location.display()
        );

        Ok(StorageEntry {
            content_path: location.join(&container.logical_name),
            metadata_path: location.join(metadata_file_name(&container.logical_name)),
            token,
            location,
        })
    }
}

/// Name of the metadata record for a logical file name.
pub fn metadata_file_name(logical_name: &str) -> String {
    format!("{logical_name}{METADATA_SUFFIX}")
}

/// Reject logical names that cannot be used as a single path segment.
pub fn validate_logical_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.ends_with(METADATA_SUFFIX);
    if invalid {
        return Err(FileUploadError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

fn write_entry(dir: &Path, container: &FileContainer, record: &MetadataRecord) -> Result<()> {
    let content_path = dir.join(&container.logical_name);
    write_synced(&content_path, |file| file.write_all(&container.content))?;

    let metadata_path = dir.join(metadata_file_name(&container.logical_name));
    let props = record.to_properties();
    write_synced(&metadata_path, |file| {
        props.store(BufWriter::new(file), Some(RECORD_HEADER))
    })?;

    Ok(())
}

/// Create `path`, fill it, and flush it to disk. The handle is closed on
/// every path out of this function.
fn write_synced<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let mut file = File::create(path).map_err(|e| FileUploadError::storage(path, e))?;
    fill(&mut file).map_err(|e| FileUploadError::storage(path, e))?;
    file.sync_all().map_err(|e| FileUploadError::storage(path, e))
}

fn discard_staging(staging: &Path) {
    if let Err(e) = fs::remove_dir_all(staging) {
        tracing::warn!(
            error = %e,
            "Failed to remove staging directory {}",
            staging.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::FixedClock;
    use crate::file::properties::Properties;
    use crate::file::record::{CREATION_DATE, FILE_NAME, UPLOADED_DATE, USER_NAME};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn storage_at(root: &Path) -> FileStorage {
        let tokens = TokenGenerator::new(StdRng::seed_from_u64(99));
        FileStorage::new(root, tokens, Arc::new(FixedClock(date(2017, 1, 5))))
    }

    fn setup_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage_at(temp_dir.path());
        (temp_dir, storage)
    }

    fn container(name: &str, content: &[u8]) -> FileContainer {
        FileContainer::new("Test-User-1", content, name, date(2017, 1, 1))
    }

    fn entries_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_store_writes_content_and_record() {
        let (_temp_dir, storage) = setup_storage();

        let entry = storage.store(&container("a.txt", b"hello")).unwrap();

        assert_eq!(entry.location, storage.root().join(&entry.token));
        assert_eq!(fs::read(&entry.content_path).unwrap(), b"hello");
        assert_eq!(
            entries_in(&entry.location),
            vec!["a.txt".to_string(), "a.txt.properties".to_string()]
        );

        let props = Properties::from_latin1(&fs::read(&entry.metadata_path).unwrap()).unwrap();
        assert_eq!(props.len(), 4);
        assert_eq!(props.get(FILE_NAME), Some("a.txt"));
        assert_eq!(props.get(USER_NAME), Some("Test-User-1"));
        assert_eq!(props.get(CREATION_DATE), Some("2017-01-01"));
        assert_eq!(props.get(UPLOADED_DATE), Some("2017-01-05"));
    }

    #[test]
    fn test_record_starts_with_header() {
        let (_temp_dir, storage) = setup_storage();

        let entry = storage.store(&container("a.txt", b"x")).unwrap();
        let text = fs::read_to_string(&entry.metadata_path).unwrap();

        assert!(text.starts_with(&format!("#{RECORD_HEADER}\n")));
    }

    #[test]
    fn test_store_creates_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("storage");
        let storage = storage_at(&root);

        assert!(!root.exists());
        let entry = storage.store(&container("a.txt", b"data")).unwrap();

        assert!(root.is_dir());
        assert_eq!(entry.location.parent(), Some(root.as_path()));
    }

    #[test]
    fn test_store_uses_distinct_locations() {
        let (temp_dir, storage) = setup_storage();

        let first = storage.store(&container("a.txt", b"1")).unwrap();
        let second = storage.store(&container("a.txt", b"2")).unwrap();

        assert_ne!(first.location, second.location);
        assert_eq!(entries_in(temp_dir.path()).len(), 2);
        assert_eq!(fs::read(&first.content_path).unwrap(), b"1");
        assert_eq!(fs::read(&second.content_path).unwrap(), b"2");
    }

    #[test]
    fn test_store_leaves_no_staging_directory() {
        let (temp_dir, storage) = setup_storage();

        storage.store(&container("a.txt", b"data")).unwrap();

        assert!(entries_in(temp_dir.path())
            .iter()
            .all(|name| !name.starts_with(STAGING_PREFIX)));
    }

    #[test]
    fn test_store_binary_content() {
        let (_temp_dir, storage) = setup_storage();
        let content: Vec<u8> = (0..=255).collect();

        let entry = storage.store(&container("binary.bin", &content)).unwrap();

        assert_eq!(fs::read(&entry.content_path).unwrap(), content);
    }

    #[test]
    fn test_store_empty_content() {
        let (_temp_dir, storage) = setup_storage();

        let entry = storage.store(&container("empty", b"")).unwrap();

        assert_eq!(fs::metadata(&entry.content_path).unwrap().len(), 0);
        assert!(entry.metadata_path.exists());
    }

    #[test]
    fn test_store_unicode_name() {
        let (_temp_dir, storage) = setup_storage();

        let entry = storage.store(&container("日本語ファイル.txt", b"data")).unwrap();

        let props = Properties::from_latin1(&fs::read(&entry.metadata_path).unwrap()).unwrap();
        assert_eq!(props.get(FILE_NAME), Some("日本語ファイル.txt"));
        assert!(entry.content_path.ends_with("日本語ファイル.txt"));
    }

    #[test]
    fn test_store_rejects_unsafe_names() {
        let (temp_dir, storage) = setup_storage();

        for name in ["", ".", "..", "../escape", "a/b", "a\\b", "nul\0", "x.properties"] {
            let result = storage.store(&container(name, b"data"));
            assert!(
                matches!(result, Err(FileUploadError::InvalidFileName(_))),
                "{name:?} should be rejected"
            );
        }
        assert!(entries_in(temp_dir.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_store_fails_when_root_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("not-a-dir");
        fs::write(&root, b"occupied").unwrap();
        let storage = storage_at(&root);

        let result = storage.store(&container("a.txt", b"data"));

        assert!(matches!(result, Err(FileUploadError::Storage { .. })));
    }

    #[test]
    fn test_token_collision_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = storage_at(temp_dir.path());
        let first = storage.store(&container("a.txt", b"1")).unwrap();

        // A second writer with the same seed draws the same token.
        let replay = storage_at(temp_dir.path());
        let result = replay.store(&container("b.txt", b"2"));

        assert!(matches!(result, Err(FileUploadError::Storage { .. })));
        assert_eq!(
            entries_in(&first.location),
            vec!["a.txt".to_string(), "a.txt.properties".to_string()]
        );
        assert_eq!(entries_in(temp_dir.path()).len(), 1);
    }

    #[test]
    fn test_validate_logical_name() {
        assert!(validate_logical_name("a.txt").is_ok());
        assert!(validate_logical_name(".hidden").is_ok());
        assert!(validate_logical_name("file").is_ok());
        assert!(validate_logical_name("properties").is_ok());
        assert!(validate_logical_name("..").is_err());
        assert!(validate_logical_name("dir/file").is_err());
    }

    #[test]
    fn test_metadata_file_name() {
        assert_eq!(metadata_file_name("a.txt"), "a.txt.properties");
    }
}
