//! Student Record Store
//!
//! The document-store contract the rest of the service is written against.
//! Every implementation must make `update_one` a single atomic replace of the
//! whole document, optionally conditional on the stored version.

use async_trait::async_trait;
use std::fmt::{self, Debug};

use super::{StoreError, StudentRecord};

/// Lookup keys supported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentFilter {
    All,
    Id(String),
    MobileNumber(String),
    ApplicationNumber(String),
    NationalId(String),
    Plan(String),
}

impl StudentFilter {
    /// Check a record against this filter
    pub fn matches(&self, record: &StudentRecord) -> bool {
        match self {
            StudentFilter::All => true,
            StudentFilter::Id(id) => &record.id == id,
            StudentFilter::MobileNumber(m) => &record.mobile_number == m,
            StudentFilter::ApplicationNumber(a) => &record.application_number == a,
            StudentFilter::NationalId(n) => &record.national_id_number == n,
            StudentFilter::Plan(p) => &record.plan == p,
        }
    }

    /// Column and bound value, `None` for an unfiltered scan
    pub fn column(&self) -> Option<(&'static str, &str)> {
        match self {
            StudentFilter::All => None,
            StudentFilter::Id(v) => Some(("id", v)),
            StudentFilter::MobileNumber(v) => Some(("mobile_number", v)),
            StudentFilter::ApplicationNumber(v) => Some(("application_number", v)),
            StudentFilter::NationalId(v) => Some(("national_id_number", v)),
            StudentFilter::Plan(v) => Some(("plan", v)),
        }
    }
}

impl fmt::Display for StudentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column() {
            Some((column, value)) => write!(f, "{}={}", column, value),
            None => f.write_str("all"),
        }
    }
}

/// Full-document replacement, optionally guarded by the expected version
#[derive(Debug, Clone)]
pub struct StudentUpdate {
    pub record: StudentRecord,
    pub expected_version: Option<i64>,
}

impl StudentUpdate {
    /// Unconditional replace
    pub fn replace(record: StudentRecord) -> Self {
        Self {
            record,
            expected_version: None,
        }
    }

    /// Replace only if nobody else has written since `version` was read
    pub fn compare_and_swap(record: StudentRecord, version: i64) -> Self {
        Self {
            record,
            expected_version: Some(version),
        }
    }
}

#[async_trait]
pub trait StudentStore: Send + Sync + Debug {
    async fn find_one(&self, filter: &StudentFilter) -> Result<Option<StudentRecord>, StoreError>;

    /// Insert a new document; unique-key collisions fail with `DuplicateKey`
    async fn insert_one(&self, record: &StudentRecord) -> Result<(), StoreError>;

    /// Atomically replace the first matching document. Returns the matched
    /// count, which is 0 when nothing matched or the version guard failed.
    async fn update_one(
        &self,
        filter: &StudentFilter,
        update: &StudentUpdate,
    ) -> Result<u64, StoreError>;

    /// Returns the deleted count
    async fn delete_one(&self, filter: &StudentFilter) -> Result<u64, StoreError>;

    /// Matching documents in registration order, at most `limit`
    async fn find_many(
        &self,
        filter: &StudentFilter,
        limit: usize,
    ) -> Result<Vec<StudentRecord>, StoreError>;
}
