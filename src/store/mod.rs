//! Student Record Store module
//!
//! Persistence collaborator for student documents: the store contract,
//! its Postgres and in-memory implementations, and bounded retry.

mod error;
pub mod memory;
mod postgres;
mod record;
mod repository;
mod retry;

pub use error::StoreError;
pub use memory::InMemoryStudentStore;
pub(crate) use postgres::bounded;
pub use postgres::PgStudentStore;
pub use record::{LessonRecord, PaymentRecord, StudentRecord};
pub use repository::{StudentFilter, StudentStore, StudentUpdate};
pub use retry::{with_store_retry, RetryPolicy};
