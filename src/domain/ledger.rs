//! Ledger Engine
//!
//! Computes the derived financial fields of a student from its source of
//! truth: the plan and the payment sequence. Totals are always recomputed
//! over the whole sequence, never adjusted incrementally.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::student::received;
use super::{
    Amount, Balance, DomainError, IdGenerator, LedgerFields, Payment, PaymentStatus, PlanCatalog,
    PlanId, Student,
};

/// A payment about to be applied.
///
/// `payment_id` is never read from callers. A handler may reserve one before
/// its first write attempt so that every retry carries the same identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    #[serde(skip)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub amount: Amount,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    #[serde(default = "received")]
    pub status: PaymentStatus,
}

impl NewPayment {
    pub fn new(amount: Amount) -> Self {
        Self {
            payment_id: None,
            transaction_id: None,
            amount,
            date: Utc::now(),
            status: received(),
        }
    }

    pub fn with_payment_id(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = Some(payment_id.into());
        self
    }

    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }
}

/// Result of applying a payment: the new payment, the full updated sequence
/// and the ledger recomputed over it. All of it is committed together or not
/// at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentApplied {
    pub payment: Payment,
    pub payments: Vec<Payment>,
    pub ledger: LedgerFields,
}

impl PaymentApplied {
    /// Fold the outcome into the student it was computed from
    pub fn into_student(self, mut student: Student) -> Student {
        student.payments = self.payments;
        student.ledger = self.ledger;
        student
    }
}

/// Shared ledger arithmetic, invoked by every read and write path
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    catalog: Arc<PlanCatalog>,
}

impl LedgerEngine {
    pub fn new(catalog: Arc<PlanCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Compute total, paid, balance and status from a plan and its payments.
    ///
    /// # Errors
    /// - `UnknownPlan` if the plan is not in the catalog
    /// - `OverpaymentRejected` if the payments exceed the plan price
    pub fn initialize_ledger(
        &self,
        plan: &PlanId,
        payments: &[Payment],
    ) -> Result<LedgerFields, DomainError> {
        let total = self.catalog.price_of(plan)?.value();
        let paid = sum_payments(payments)?;

        let balance = Balance::new(total - paid)
            .map_err(|_| DomainError::overpayment(paid, total))?;

        Ok(LedgerFields {
            total_amount: total,
            paid_amount: paid,
            balance,
            full_payment_status: status_for(&balance),
        })
    }

    /// Append a payment to a student and recompute the ledger.
    ///
    /// The payment gets its reserved identifier, or a fresh one when none was
    /// reserved. The student is left untouched; the caller persists the returned
    /// outcome as one unit.
    ///
    /// # Errors
    /// - `OverpaymentRejected` if the student is already fully paid, or the
    ///   payment would push the paid amount past the total
    /// - `UnknownPlan` if the student's plan is no longer in the catalog
    pub fn apply_payment(
        &self,
        student: &Student,
        new_payment: NewPayment,
        ids: &dyn IdGenerator,
    ) -> Result<PaymentApplied, DomainError> {
        // Stored derived fields are not trusted
        let current = self.initialize_ledger(&student.plan, &student.payments)?;
        let attempted = new_payment.amount.value();

        if current.paid_amount >= current.total_amount {
            return Err(DomainError::overpayment(attempted, current.balance.value()));
        }

        let payment = Payment {
            payment_id: ids.ensure(new_payment.payment_id),
            transaction_id: new_payment.transaction_id,
            amount: new_payment.amount,
            date: new_payment.date,
            status: new_payment.status,
        };

        let mut payments = Vec::with_capacity(student.payments.len() + 1);
        payments.extend(student.payments.iter().cloned());
        payments.push(payment.clone());

        let ledger = self
            .initialize_ledger(&student.plan, &payments)
            .map_err(|e| match e {
                DomainError::OverpaymentRejected { .. } => {
                    DomainError::overpayment(attempted, current.balance.value())
                }
                other => other,
            })?;

        Ok(PaymentApplied {
            payment,
            payments,
            ledger,
        })
    }
}

/// Pure function of the balance
pub fn status_for(balance: &Balance) -> PaymentStatus {
    if balance.is_zero() {
        PaymentStatus::Completed
    } else {
        PaymentStatus::Pending
    }
}

fn sum_payments(payments: &[Payment]) -> Result<Decimal, DomainError> {
    payments.iter().try_fold(Decimal::ZERO, |acc, payment| {
        acc.checked_add(payment.amount.value())
            .ok_or_else(|| DomainError::InvalidAmount("payment total overflows".to_string()))
    })
}
