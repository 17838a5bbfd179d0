//! Identifier generation
//!
//! Identifiers for students, payments and lessons are random unique tokens,
//! generated once when a record first enters persistence.

use std::fmt::Debug;
use uuid::Uuid;

/// Source of fresh unique identifiers
pub trait IdGenerator: Send + Sync + Debug {
    fn generate(&self) -> String;

    /// Keep an existing identifier, generate one only when missing or blank
    fn ensure(&self, existing: Option<String>) -> String {
        match existing {
            Some(id) if !id.trim().is_empty() => id,
            _ => self.generate(),
        }
    }
}

/// Random v4 UUIDs in simple (hyphenless) form
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
