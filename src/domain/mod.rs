//! Domain module
//!
//! Core domain types and business logic.

pub mod amount;
pub mod context;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod plan;
pub mod student;

pub use amount::{Amount, AmountError, Balance};
pub use context::{CallerIdentity, OperationContext, Role};
pub use error::DomainError;
pub use ids::{IdGenerator, UuidIdGenerator};
pub use ledger::{LedgerEngine, NewPayment, PaymentApplied};
pub use plan::{CatalogError, PlanCatalog, PlanId};
pub use student::{
    EnrollmentStatus, LedgerFields, Lesson, LessonInput, Payment, PaymentInput, PaymentStatus,
    Student, StudentInput,
};
