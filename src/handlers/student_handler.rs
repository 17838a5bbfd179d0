//! Student Handlers
//!
//! Registration, full replacement, deletion and the read side.

use std::sync::Arc;

use crate::assembly::RecordAssembler;
use crate::domain::{OperationContext, PlanId, Student};
use crate::error::AppError;
use crate::store::{with_store_retry, RetryPolicy, StudentFilter, StudentStore};

use super::{
    authenticated, authorize, modify_student, CreateStudentCommand, DeleteStudentCommand,
    LedgerSummary, Modification, StudentLookup, UpdateStudentCommand, DELETE_ROLES, WRITE_ROLES,
};

// =========================================================================
// CreateStudentHandler
// =========================================================================

/// Handler for student registration
pub struct CreateStudentHandler {
    store: Arc<dyn StudentStore>,
    assembler: RecordAssembler,
    retry: RetryPolicy,
}

impl CreateStudentHandler {
    pub fn new(store: Arc<dyn StudentStore>, assembler: RecordAssembler, retry: RetryPolicy) -> Self {
        Self {
            store,
            assembler,
            retry,
        }
    }

    /// Execute the registration.
    ///
    /// Nothing is persisted unless the plan is known, the input is valid and
    /// the initial payments fit within the plan price.
    pub async fn execute(
        &self,
        command: CreateStudentCommand,
        context: &OperationContext,
    ) -> Result<Student, AppError> {
        let caller = authorize(context, WRITE_ROLES)?;

        let (record, student) = self.assembler.assemble_for_create(command.input)?;

        with_store_retry(&self.retry, "insert_one", || self.store.insert_one(&record)).await?;

        tracing::info!(
            student_id = %student.id,
            application_number = %student.application_number,
            plan = %student.plan,
            balance = %student.balance(),
            created_by = %caller.subject_email,
            "Student registered"
        );

        Ok(student)
    }
}

// =========================================================================
// UpdateStudentHandler
// =========================================================================

/// Handler for full replacement of a student
pub struct UpdateStudentHandler {
    store: Arc<dyn StudentStore>,
    assembler: RecordAssembler,
    retry: RetryPolicy,
}

impl UpdateStudentHandler {
    pub fn new(store: Arc<dyn StudentStore>, assembler: RecordAssembler, retry: RetryPolicy) -> Self {
        Self {
            store,
            assembler,
            retry,
        }
    }

    /// Replace every caller-editable field; id and registration date stay,
    /// the ledger is recomputed
    pub async fn execute(
        &self,
        command: UpdateStudentCommand,
        context: &OperationContext,
    ) -> Result<Student, AppError> {
        let caller = authorize(context, WRITE_ROLES)?;
        let filter = StudentLookup::ApplicationNumber(command.application_number).filter();
        let input = command.input;

        let student = modify_student(&self.store, &self.retry, &filter, |existing| {
            let (record, student) = self
                .assembler
                .assemble_for_update(&existing, input.clone())?;
            Ok(Modification::Write(record, student))
        })
        .await?;

        tracing::info!(
            student_id = %student.id,
            application_number = %student.application_number,
            updated_by = %caller.subject_email,
            "Student replaced"
        );

        Ok(student)
    }
}

// =========================================================================
// DeleteStudentHandler
// =========================================================================

/// Handler for student deletion
pub struct DeleteStudentHandler {
    store: Arc<dyn StudentStore>,
    retry: RetryPolicy,
}

impl DeleteStudentHandler {
    pub fn new(store: Arc<dyn StudentStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub async fn execute(
        &self,
        command: DeleteStudentCommand,
        context: &OperationContext,
    ) -> Result<(), AppError> {
        let caller = authorize(context, DELETE_ROLES)?;
        let filter = command.lookup.filter();

        let deleted =
            with_store_retry(&self.retry, "delete_one", || self.store.delete_one(&filter)).await?;

        if deleted == 0 {
            return Err(AppError::StudentNotFound(filter.to_string()));
        }

        tracing::info!(student = %filter, deleted_by = %caller.subject_email, "Student deleted");
        Ok(())
    }
}

// =========================================================================
// StudentQueries
// =========================================================================

/// Read side. Every student goes through `assemble_for_read`, so responses
/// never carry stored ledger values unchecked.
pub struct StudentQueries {
    store: Arc<dyn StudentStore>,
    assembler: RecordAssembler,
    retry: RetryPolicy,
    list_limit: usize,
}

impl StudentQueries {
    pub fn new(
        store: Arc<dyn StudentStore>,
        assembler: RecordAssembler,
        retry: RetryPolicy,
        list_limit: usize,
    ) -> Self {
        Self {
            store,
            assembler,
            retry,
            list_limit,
        }
    }

    /// Students in registration order, capped at the configured limit
    pub async fn list(
        &self,
        limit: Option<usize>,
        context: &OperationContext,
    ) -> Result<Vec<Student>, AppError> {
        authenticated(context)?;
        self.find_many(&StudentFilter::All, limit).await
    }

    pub async fn list_by_plan(
        &self,
        plan: &PlanId,
        limit: Option<usize>,
        context: &OperationContext,
    ) -> Result<Vec<Student>, AppError> {
        authenticated(context)?;
        self.find_many(&StudentFilter::Plan(plan.to_string()), limit)
            .await
    }

    pub async fn get(
        &self,
        lookup: &StudentLookup,
        context: &OperationContext,
    ) -> Result<Student, AppError> {
        authenticated(context)?;
        let filter = lookup.filter();

        let record = with_store_retry(&self.retry, "find_one", || self.store.find_one(&filter))
            .await?
            .ok_or_else(|| AppError::StudentNotFound(filter.to_string()))?;

        Ok(self.assembler.assemble_for_read(record)?)
    }

    pub async fn ledger(
        &self,
        application_number: &str,
        context: &OperationContext,
    ) -> Result<LedgerSummary, AppError> {
        let student = self
            .get(
                &StudentLookup::ApplicationNumber(application_number.to_string()),
                context,
            )
            .await?;
        Ok(LedgerSummary::from(&student))
    }

    async fn find_many(
        &self,
        filter: &StudentFilter,
        limit: Option<usize>,
    ) -> Result<Vec<Student>, AppError> {
        let limit = limit
            .unwrap_or(self.list_limit)
            .clamp(1, self.list_limit);

        let records =
            with_store_retry(&self.retry, "find_many", || self.store.find_many(filter, limit))
                .await?;

        records
            .into_iter()
            .map(|record| self.assembler.assemble_for_read(record).map_err(AppError::from))
            .collect()
    }
}
