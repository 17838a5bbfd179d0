//! In-memory Student Store
//!
//! Process-local store with the same uniqueness, ordering and
//! compare-and-swap semantics as the Postgres store. Used by tests and by
//! `DATABASE_URL=memory` local runs.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoreError, StudentFilter, StudentRecord, StudentStore, StudentUpdate};

#[derive(Debug, Default)]
pub struct InMemoryStudentStore {
    // Insertion order is registration order
    records: RwLock<Vec<StudentRecord>>,
}

impl InMemoryStudentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// First unique field of `candidate` that collides with any record other than
/// the one at `skip`
fn unique_violation(
    records: &[StudentRecord],
    candidate: &StudentRecord,
    skip: Option<usize>,
) -> Option<&'static str> {
    records
        .iter()
        .enumerate()
        .filter(|(idx, _)| Some(*idx) != skip)
        .find_map(|(_, existing)| {
            if existing.id == candidate.id {
                Some("id")
            } else if existing.application_number == candidate.application_number {
                Some("application_number")
            } else if existing.mobile_number == candidate.mobile_number {
                Some("mobile_number")
            } else if existing.national_id_number == candidate.national_id_number {
                Some("national_id_number")
            } else if existing.email.eq_ignore_ascii_case(&candidate.email) {
                Some("email")
            } else {
                None
            }
        })
}

#[async_trait]
impl StudentStore for InMemoryStudentStore {
    async fn find_one(&self, filter: &StudentFilter) -> Result<Option<StudentRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| filter.matches(r)).cloned())
    }

    async fn insert_one(&self, record: &StudentRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;

        if let Some(field) = unique_violation(&records, record, None) {
            return Err(StoreError::DuplicateKey(field.to_string()));
        }

        let mut stored = record.clone();
        stored.version = 1;
        records.push(stored);
        Ok(())
    }

    async fn update_one(
        &self,
        filter: &StudentFilter,
        update: &StudentUpdate,
    ) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;

        let Some(idx) = records.iter().position(|r| filter.matches(r)) else {
            return Ok(0);
        };

        if let Some(expected) = update.expected_version {
            if records[idx].version != expected {
                return Ok(0);
            }
        }

        if let Some(field) = unique_violation(&records, &update.record, Some(idx)) {
            return Err(StoreError::DuplicateKey(field.to_string()));
        }

        let mut stored = update.record.clone();
        stored.version = records[idx].version + 1;
        records[idx] = stored;
        Ok(1)
    }

    async fn delete_one(&self, filter: &StudentFilter) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;

        match records.iter().position(|r| filter.matches(r)) {
            Some(idx) => {
                records.remove(idx);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn find_many(
        &self,
        filter: &StudentFilter,
        limit: usize,
    ) -> Result<Vec<StudentRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|r| filter.matches(r))
            .take(limit)
            .cloned()
            .collect())
    }
}
