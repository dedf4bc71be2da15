//! Request DTOs for Web API.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::datetime::parse_date;
use crate::file::FileContainer;
use crate::web::error::ApiError;

/// Query parameters for `GET /metadata`.
#[derive(Debug, Deserialize)]
pub struct MetadataQuery {
    /// Owner whose records are requested.
    #[serde(default)]
    pub user: Option<String>,
    /// Optional creation date filter (`yyyy-MM-dd`).
    #[serde(default, rename = "fileCreationDate")]
    pub file_creation_date: Option<String>,
}

impl MetadataQuery {
    /// The requested owner. Missing or blank is a bad request.
    pub fn user(&self) -> Result<&str, ApiError> {
        self.user
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Required parameter 'user' is not present"))
    }

    /// Parse the optional creation date. An empty value means "no filter".
    pub fn creation_date(&self) -> Result<Option<NaiveDate>, ApiError> {
        match self.file_creation_date.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => parse_date(raw)
                .map(Some)
                .ok_or_else(|| invalid_date(raw)),
        }
    }
}

/// Query parameters accepted by `POST /upload`.
///
/// Older clients send `user` and `fileCreationDate` in the query string and
/// only the file in the multipart body.
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    /// Uploading user.
    #[serde(default)]
    pub user: Option<String>,
    /// Creation date (`yyyy-MM-dd`).
    #[serde(default, rename = "fileCreationDate")]
    pub file_creation_date: Option<String>,
}

/// Fields collected from an upload's multipart body.
#[derive(Debug, Default)]
pub struct UploadForm {
    /// File name taken from the `file` part.
    pub file_name: Option<String>,
    /// File content.
    pub content: Option<Vec<u8>>,
    /// Uploading user.
    pub user: Option<String>,
    /// Creation date as sent (`yyyy-MM-dd`).
    pub file_creation_date: Option<String>,
}

impl UploadForm {
    /// Fill fields the multipart body did not carry from the query string.
    pub fn fill_from(&mut self, params: UploadParams) {
        if self.user.is_none() {
            self.user = params.user;
        }
        if self.file_creation_date.is_none() {
            self.file_creation_date = params.file_creation_date;
        }
    }

    /// Check that every required field is present and build the container.
    pub fn into_container(self) -> Result<FileContainer, ApiError> {
        let content = self
            .content
            .ok_or_else(|| ApiError::bad_request("Required part 'file' is not present"))?;
        let file_name = self
            .file_name
            .ok_or_else(|| ApiError::bad_request("Required part 'file' is not present"))?;
        let user = self
            .user
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("Required parameter 'user' is not present"))?;
        let raw_date = self.file_creation_date.ok_or_else(|| {
            ApiError::bad_request("Required parameter 'fileCreationDate' is not present")
        })?;
        let creation_date = parse_date(&raw_date).ok_or_else(|| invalid_date(&raw_date))?;

        Ok(FileContainer::new(user, content, file_name, creation_date))
    }
}

fn invalid_date(raw: &str) -> ApiError {
    ApiError::bad_request(format!(
        "Invalid fileCreationDate {raw:?}, expected yyyy-MM-dd"
    ))
}
