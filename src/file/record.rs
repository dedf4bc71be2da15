//! Metadata records stored beside each upload.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::datetime::format_date;

use super::container::FileContainer;
use super::properties::Properties;

/// Key holding the logical file name.
pub const FILE_NAME: &str = "File_Name";
/// Key holding the owner.
pub const USER_NAME: &str = "User_Name";
/// Key holding the caller-supplied creation date.
pub const CREATION_DATE: &str = "Creation_Date";
/// Key holding the server date of the upload.
pub const UPLOADED_DATE: &str = "Uploaded_Date";

/// Comment line written at the top of every record.
pub const RECORD_HEADER: &str =
    "=============================File Metadata=============================";

/// A metadata record as returned by queries: field name to value.
pub type MetadataMap = BTreeMap<String, String>;

/// The four fields written for every upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub file_name: String,
    pub user_name: String,
    pub creation_date: NaiveDate,
    pub uploaded_date: NaiveDate,
}

impl MetadataRecord {
    /// Build the record for a container uploaded on `uploaded_date`.
    pub fn for_upload(container: &FileContainer, uploaded_date: NaiveDate) -> Self {
        Self {
            file_name: container.logical_name.clone(),
            user_name: container.owner.clone(),
            creation_date: container.creation_date,
            uploaded_date,
        }
    }

    /// Render as a properties document.
    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        props.set(FILE_NAME, self.file_name.as_str());
        props.set(USER_NAME, self.user_name.as_str());
        props.set(CREATION_DATE, format_date(self.creation_date));
        props.set(UPLOADED_DATE, format_date(self.uploaded_date));
        props
    }
}

/// Query filter applied to each parsed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    owner: String,
    creation_date: Option<String>,
}

impl RecordFilter {
    /// Match records owned by `owner`, optionally created on `creation_date`.
    pub fn new(owner: impl Into<String>, creation_date: Option<NaiveDate>) -> Self {
        Self {
            owner: owner.into(),
            creation_date: creation_date.map(format_date),
        }
    }

    /// Whether the record passes the filter.
    ///
    /// Both comparisons ignore case. A record without an owner, or without a
    /// creation date when one is required, never matches.
    pub fn matches(&self, props: &Properties) -> bool {
        let Some(owner) = props.get(USER_NAME) else {
            return false;
        };
        if !eq_ignore_case(owner, &self.owner) {
            return false;
        }
        match &self.creation_date {
            Some(date) => props
                .get(CREATION_DATE)
                .is_some_and(|stored| eq_ignore_case(stored, date)),
            None => true,
        }
    }
}

/// Character-wise case-insensitive equality.
fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let mut left = a.chars();
    let mut right = b.chars();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) => {
                if x != y
                    && !x.to_uppercase().eq(y.to_uppercase())
                    && !x.to_lowercase().eq(y.to_lowercase())
                {
                    return false;
                }
            }
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_props(owner: &str, creation: &str) -> Properties {
        [
            (FILE_NAME, "a.txt"),
            (USER_NAME, owner),
            (CREATION_DATE, creation),
            (UPLOADED_DATE, "2017-01-05"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_for_upload_to_properties() {
        let container = FileContainer::new("Test-User-1", b"hello".to_vec(), "a.txt", date(2017, 1, 1));
        let record = MetadataRecord::for_upload(&container, date(2017, 1, 5));
        let props = record.to_properties();

        assert_eq!(props.len(), 4);
        assert_eq!(props.get(FILE_NAME), Some("a.txt"));
        assert_eq!(props.get(USER_NAME), Some("Test-User-1"));
        assert_eq!(props.get(CREATION_DATE), Some("2017-01-01"));
        assert_eq!(props.get(UPLOADED_DATE), Some("2017-01-05"));
    }

    #[test]
    fn test_filter_owner_only() {
        let filter = RecordFilter::new("Test-User-1", None);
        assert!(filter.matches(&sample_props("Test-User-1", "2017-01-01")));
        assert!(filter.matches(&sample_props("test-user-1", "2017-01-02")));
        assert!(!filter.matches(&sample_props("Test-User-2", "2017-01-01")));
    }

    #[test]
    fn test_filter_with_date() {
        let filter = RecordFilter::new("alice", Some(date(2017, 1, 2)));
        assert!(filter.matches(&sample_props("ALICE", "2017-01-02")));
        assert!(!filter.matches(&sample_props("alice", "2017-01-01")));
        assert!(!filter.matches(&sample_props("bob", "2017-01-02")));
    }

    #[test]
    fn test_filter_missing_fields() {
        let no_owner: Properties = [(FILE_NAME, "a.txt"), (CREATION_DATE, "2017-01-01")]
            .into_iter()
            .collect();
        assert!(!RecordFilter::new("alice", None).matches(&no_owner));

        let no_date: Properties = [(USER_NAME, "alice")].into_iter().collect();
        assert!(RecordFilter::new("alice", None).matches(&no_date));
        assert!(!RecordFilter::new("alice", Some(date(2017, 1, 1))).matches(&no_date));
    }

    #[test]
    fn test_eq_ignore_case() {
        assert!(eq_ignore_case("", ""));
        assert!(eq_ignore_case("Straße", "STRAßE"));
        assert!(eq_ignore_case("Ärger", "äRGER"));
        assert!(!eq_ignore_case("abc", "abcd"));
        assert!(!eq_ignore_case("abc", "abd"));
    }
}
