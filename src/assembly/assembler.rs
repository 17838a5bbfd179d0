//! Record Assembler
//!
//! Converts between the stored document and the validated `Student`.
//! Identifiers are generated only for sub-records that do not have one yet;
//! ledger fields are always recomputed, never copied from storage.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{
    Amount, DomainError, IdGenerator, LedgerEngine, LedgerFields, Lesson, Payment, PlanId,
    Student, StudentInput,
};
use crate::store::{LessonRecord, PaymentRecord, StudentRecord};

#[derive(Debug, Clone)]
pub struct RecordAssembler {
    ledger: LedgerEngine,
    ids: Arc<dyn IdGenerator>,
}

impl RecordAssembler {
    pub fn new(ledger: LedgerEngine, ids: Arc<dyn IdGenerator>) -> Self {
        Self { ledger, ids }
    }

    pub fn ledger(&self) -> &LedgerEngine {
        &self.ledger
    }

    pub fn ids(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    // =========================================================================
    // assembleForCreate
    // =========================================================================

    /// Validate a new student, assign its id and any missing sub-ids, and
    /// compute its ledger.
    ///
    /// Returns the storage-shaped record and the response-shaped student.
    pub fn assemble_for_create(
        &self,
        input: StudentInput,
    ) -> Result<(StudentRecord, Student), DomainError> {
        let id = self.ids.generate();
        let registered_date = input.registered_date;
        let student = self.build(id, registered_date, input)?;
        let record = to_record(&student, 0);
        Ok((record, student))
    }

    /// Full replacement of an existing student. The aggregate id and
    /// registration date are kept; sub-ids supplied by the caller are kept.
    pub fn assemble_for_update(
        &self,
        existing: &StudentRecord,
        input: StudentInput,
    ) -> Result<(StudentRecord, Student), DomainError> {
        let student = self.build(existing.id.clone(), existing.registered_date, input)?;
        let record = to_record(&student, existing.version);
        Ok((record, student))
    }

    fn build(
        &self,
        id: String,
        registered_date: DateTime<Utc>,
        input: StudentInput,
    ) -> Result<Student, DomainError> {
        input.validate()?;

        let payments: Vec<Payment> = input
            .payments
            .into_iter()
            .map(|p| Payment {
                payment_id: self.ids.ensure(p.payment_id),
                transaction_id: p.transaction_id,
                amount: p.amount,
                date: p.date,
                status: p.status,
            })
            .collect();

        let lessons: Vec<Lesson> = input
            .lessons
            .into_iter()
            .map(|l| Lesson {
                lesson_id: self.ids.ensure(l.lesson_id),
                instructor_id: l.instructor_id,
                date: l.date,
                status: l.status,
            })
            .collect();

        ensure_unique("payments.payment_id", payments.iter().map(|p| &p.payment_id))?;
        ensure_unique("lessons.lesson_id", lessons.iter().map(|l| &l.lesson_id))?;

        let ledger = self.ledger.initialize_ledger(&input.plan, &payments)?;

        Ok(Student {
            id,
            name: input.name.trim().to_string(),
            mobile_number: input.mobile_number.trim().to_string(),
            application_number: input.application_number.trim().to_string(),
            email: input.email.trim().to_string(),
            national_id_number: input.national_id_number.trim().to_string(),
            plan: input.plan,
            registered_date,
            status: input.status,
            ledger,
            payments,
            lessons,
        })
    }

    // =========================================================================
    // assembleForRead
    // =========================================================================

    /// Rebuild a student from its stored document.
    ///
    /// Payments and lessons are re-validated and the ledger is recomputed from
    /// plan and payments. Stored ledger values that disagree are logged and
    /// discarded. Never generates identifiers, so reading the same record twice
    /// yields the same student.
    pub fn assemble_for_read(&self, record: StudentRecord) -> Result<Student, DomainError> {
        let corrupt = |reason: String| DomainError::CorruptRecord {
            id: record.id.clone(),
            reason,
        };

        let payments = record
            .payments
            .iter()
            .map(|p| {
                if p.payment_id.trim().is_empty() {
                    return Err(corrupt("payment without payment_id".to_string()));
                }
                let amount = Amount::new(p.amount)
                    .map_err(|e| corrupt(format!("payment {}: {}", p.payment_id, e)))?;
                Ok(Payment {
                    payment_id: p.payment_id.clone(),
                    transaction_id: p.transaction_id.clone(),
                    amount,
                    date: p.date,
                    status: p.status,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let lessons = record
            .lessons
            .iter()
            .map(|l| {
                if l.lesson_id.trim().is_empty() {
                    return Err(corrupt("lesson without lesson_id".to_string()));
                }
                Ok(Lesson {
                    lesson_id: l.lesson_id.clone(),
                    instructor_id: l.instructor_id.clone(),
                    date: l.date,
                    status: l.status.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let plan = PlanId::new(record.plan.clone());
        let ledger = self
            .ledger
            .initialize_ledger(&plan, &payments)
            .map_err(|e| match e {
                DomainError::OverpaymentRejected { .. } => {
                    corrupt("payments exceed plan total".to_string())
                }
                other => other,
            })?;

        if stored_ledger_drifted(&record, &ledger) {
            tracing::warn!(
                student_id = %record.id,
                stored_total = %record.total_amount,
                stored_paid = %record.paid_amount,
                stored_balance = %record.balance,
                total = %ledger.total_amount,
                paid = %ledger.paid_amount,
                balance = %ledger.balance,
                "Stored ledger fields disagree with recomputed values"
            );
        }

        Ok(Student {
            id: record.id,
            name: record.name,
            mobile_number: record.mobile_number,
            application_number: record.application_number,
            email: record.email,
            national_id_number: record.national_id_number,
            plan,
            registered_date: record.registered_date,
            status: record.status,
            ledger,
            payments,
            lessons,
        })
    }
}

/// Storage shape of a student; derived fields are written so other readers
/// of the store see current values
pub fn to_record(student: &Student, version: i64) -> StudentRecord {
    StudentRecord {
        id: student.id.clone(),
        name: student.name.clone(),
        mobile_number: student.mobile_number.clone(),
        application_number: student.application_number.clone(),
        email: student.email.clone(),
        national_id_number: student.national_id_number.clone(),
        plan: student.plan.to_string(),
        registered_date: student.registered_date,
        status: student.status,
        total_amount: student.ledger.total_amount,
        paid_amount: student.ledger.paid_amount,
        balance: student.ledger.balance.value(),
        full_payment_status: student.ledger.full_payment_status,
        payments: student
            .payments
            .iter()
            .map(|p| PaymentRecord {
                payment_id: p.payment_id.clone(),
                transaction_id: p.transaction_id.clone(),
                amount: p.amount.value(),
                date: p.date,
                status: p.status,
            })
            .collect(),
        lessons: student
            .lessons
            .iter()
            .map(|l| LessonRecord {
                lesson_id: l.lesson_id.clone(),
                instructor_id: l.instructor_id.clone(),
                date: l.date,
                status: l.status.clone(),
            })
            .collect(),
        version,
    }
}

fn stored_ledger_drifted(record: &StudentRecord, ledger: &LedgerFields) -> bool {
    record.total_amount != ledger.total_amount
        || record.paid_amount != ledger.paid_amount
        || record.balance != ledger.balance.value()
        || record.full_payment_status != ledger.full_payment_status
}

fn ensure_unique<'a>(
    field: &'static str,
    ids: impl Iterator<Item = &'a String>,
) -> Result<(), DomainError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(DomainError::invalid_input(field, format!("duplicate id {}", id)));
        }
    }
    Ok(())
}
