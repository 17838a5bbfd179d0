//! Command Handlers module
//!
//! Handlers that orchestrate business operations. Each one checks the
//! caller, runs the ledger and assembly logic, and persists through the
//! Student Record Store.

mod auth_handler;
mod commands;
mod payment_handler;
mod student_handler;


pub use auth_handler::{LoginHandler, LogoutHandler, RegisterStaffHandler};
pub use commands::*;
pub use payment_handler::AddPaymentHandler;
pub use student_handler::{
    CreateStudentHandler, DeleteStudentHandler, StudentQueries, UpdateStudentHandler,
};

use std::sync::Arc;

use crate::auth::UnauthorizedReason;
use crate::domain::{CallerIdentity, OperationContext, Role};
use crate::error::AppError;
use crate::store::{
    with_store_retry, RetryPolicy, StudentFilter, StudentRecord, StudentStore, StudentUpdate,
};

/// Roles allowed to create, update and take payments (Admin is implied)
pub const WRITE_ROLES: &[Role] = &[Role::Instructor];

/// Roles allowed to delete students (Admin only)
pub const DELETE_ROLES: &[Role] = &[];

/// Roles allowed to create Instructor and Admin accounts (Admin only)
pub const STAFF_ADMIN_ROLES: &[Role] = &[];

/// Require an authenticated caller holding one of `roles`
pub(crate) fn authorize<'a>(
    context: &'a OperationContext,
    roles: &[Role],
) -> Result<&'a CallerIdentity, AppError> {
    let caller = context
        .caller
        .as_ref()
        .ok_or(AppError::Unauthorized(UnauthorizedReason::Missing))?;

    if !caller.has_any_role(roles) {
        return Err(AppError::Forbidden(format!(
            "role {} may not perform this operation",
            caller.role
        )));
    }

    Ok(caller)
}

/// Require any authenticated caller
pub(crate) fn authenticated(context: &OperationContext) -> Result<&CallerIdentity, AppError> {
    context
        .caller
        .as_ref()
        .ok_or(AppError::Unauthorized(UnauthorizedReason::Missing))
}

/// Outcome of one read-modify-write attempt
pub(crate) enum Modification<T> {
    /// Store the replacement record, then return the output
    Write(StudentRecord, T),
    /// The freshly read record already carries the change
    Unchanged(T),
}

/// Read-modify-write of one student under compare-and-swap.
///
/// `modify` gets a freshly read record each attempt and returns either the
/// replacement plus a result, or `Unchanged` when an earlier attempt whose
/// reply was lost already committed. A lost race re-reads and recomputes;
/// after `policy.max_retries` lost races the write fails with
/// `ConcurrentModification`.
pub(crate) async fn modify_student<T, F>(
    store: &Arc<dyn StudentStore>,
    policy: &RetryPolicy,
    filter: &StudentFilter,
    mut modify: F,
) -> Result<T, AppError>
where
    F: FnMut(StudentRecord) -> Result<Modification<T>, AppError>,
{
    for attempt in 0..=policy.max_retries {
        let current = with_store_retry(policy, "find_one", || store.find_one(filter))
            .await?
            .ok_or_else(|| AppError::StudentNotFound(filter.to_string()))?;

        let id = StudentFilter::Id(current.id.clone());
        let version = current.version;
        let (replacement, output) = match modify(current)? {
            Modification::Write(replacement, output) => (replacement, output),
            Modification::Unchanged(output) => return Ok(output),
        };
        let update = StudentUpdate::compare_and_swap(replacement, version);

        let matched = with_store_retry(policy, "update_one", || store.update_one(&id, &update))
            .await?;

        if matched == 1 {
            return Ok(output);
        }

        tracing::warn!(
            student = %filter,
            expected_version = version,
            attempt = attempt + 1,
            max_retries = policy.max_retries,
            "Student changed concurrently, retrying"
        );
        tokio::time::sleep(policy.delay_for(attempt)).await;
    }

    Err(AppError::ConcurrentModification)
}
