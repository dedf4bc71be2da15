//! File storage and metadata queries.
//!
//! This module provides:
//! - Random storage tokens naming each upload directory
//! - Storage of file bytes plus a `.properties` metadata record
//! - Scan-based metadata queries by owner and creation date
//! - The service facade used by the web layer

mod container;
pub mod properties;
pub mod record;
mod scanner;
mod service;
mod storage;
mod token;

pub use container::FileContainer;
pub use properties::{Properties, PropertiesError};
pub use record::{MetadataMap, MetadataRecord, RecordFilter};
pub use scanner::{MetadataScanner, ScanMode};
pub use service::{FileService, LocalFileService};
pub use storage::{metadata_file_name, validate_logical_name, FileStorage, StorageEntry};
pub use token::{TokenGenerator, MAX_TOKEN_LENGTH, TOKEN_BITS};

/// Suffix of the metadata record stored next to each file.
pub const METADATA_SUFFIX: &str = ".properties";

/// Prefix of the hidden directory an upload is assembled in.
pub const STAGING_PREFIX: &str = ".staging-";
