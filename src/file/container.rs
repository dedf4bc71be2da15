//! In-memory upload payload.

use chrono::NaiveDate;

/// File bytes plus the metadata supplied with an upload.
///
/// Built by the boundary for a single request and consumed by the storage
/// writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContainer {
    /// User on whose behalf the file is uploaded.
    pub owner: String,
    /// Raw file content.
    pub content: Vec<u8>,
    /// Filename used when persisting the content.
    pub logical_name: String,
    /// Caller-supplied creation date.
    pub creation_date: NaiveDate,
}

impl FileContainer {
    /// Create a new container.
    pub fn new(
        owner: impl Into<String>,
        content: impl Into<Vec<u8>>,
        logical_name: impl Into<String>,
        creation_date: NaiveDate,
    ) -> Self {
        Self {
            owner: owner.into(),
            content: content.into(),
            logical_name: logical_name.into(),
            creation_date,
        }
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }
}
