//! File upload service.
//!
//! Stores each uploaded file in its own randomly named directory together
//! with a `.properties` metadata record, and answers metadata queries by
//! owner and creation date by scanning the storage root.

pub mod config;
pub mod datetime;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use config::Config;
pub use error::{FileUploadError, Result};
pub use file::{FileContainer, FileService, LocalFileService, MetadataMap, StorageEntry};
pub use web::WebServer;
