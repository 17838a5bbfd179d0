//! Payment Handler
//!
//! Appends a payment to a student. The new payment sequence and all derived
//! ledger fields are written in one conditional update; a concurrent writer
//! forces a re-read and recompute. The payment id is reserved before the
//! first attempt, so a write that committed but timed out is recognised on
//! the re-read instead of being applied twice.

use std::sync::Arc;

use crate::assembly::{to_record, RecordAssembler};
use crate::domain::OperationContext;
use crate::error::AppError;
use crate::store::{RetryPolicy, StudentStore};

use super::{
    authorize, modify_student, AddPaymentCommand, AddPaymentResult, Modification, StudentLookup,
    WRITE_ROLES,
};

/// Handler for adding payments
pub struct AddPaymentHandler {
    store: Arc<dyn StudentStore>,
    assembler: RecordAssembler,
    retry: RetryPolicy,
}

impl AddPaymentHandler {
    pub fn new(store: Arc<dyn StudentStore>, assembler: RecordAssembler, retry: RetryPolicy) -> Self {
        Self {
            store,
            assembler,
            retry,
        }
    }

    /// Execute the payment command
    ///
    /// # Errors
    /// - `StudentNotFound` if no student has the application number
    /// - `OverpaymentRejected` if the student is paid up or the amount
    ///   exceeds the outstanding balance
    /// - `ConcurrentModification` if the retry budget is spent on lost races
    pub async fn execute(
        &self,
        command: AddPaymentCommand,
        context: &OperationContext,
    ) -> Result<AddPaymentResult, AppError> {
        let caller = authorize(context, WRITE_ROLES)?;
        let filter = StudentLookup::ApplicationNumber(command.application_number).filter();
        let payment_id = self.assembler.ids().generate();
        let new_payment = command.payment.with_payment_id(payment_id.clone());

        let result = modify_student(&self.store, &self.retry, &filter, |record| {
            let version = record.version;
            let student = self.assembler.assemble_for_read(record)?;

            if let Some(payment) = student
                .payments
                .iter()
                .find(|p| p.payment_id == payment_id)
                .cloned()
            {
                tracing::warn!(
                    student_id = %student.id,
                    payment_id = %payment_id,
                    "Payment already committed by an earlier attempt"
                );
                return Ok(Modification::Unchanged(AddPaymentResult { student, payment }));
            }

            let applied = self.assembler.ledger().apply_payment(
                &student,
                new_payment.clone(),
                self.assembler.ids(),
            )?;

            let payment = applied.payment.clone();
            let student = applied.into_student(student);
            let replacement = to_record(&student, version);

            Ok(Modification::Write(
                replacement,
                AddPaymentResult { student, payment },
            ))
        })
        .await?;

        tracing::info!(
            student_id = %result.student.id,
            payment_id = %result.payment.payment_id,
            amount = %result.payment.amount,
            balance = %result.student.balance(),
            status = %result.student.full_payment_status(),
            recorded_by = %caller.subject_email,
            "Payment applied"
        );

        Ok(result)
    }
}
