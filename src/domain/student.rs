//! Student aggregate
//!
//! A student exclusively owns its payments and lessons. The four ledger
//! fields are never set directly; they are always produced by the
//! [`LedgerEngine`](super::LedgerEngine).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Amount, Balance, DomainError, PlanId};

/// Status of a single payment, and of the student's overall payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Status of a payment whose caller left it out: the money was received
pub(crate) fn received() -> PaymentStatus {
    PaymentStatus::Completed
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// Where a student is in the enrollment process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    Registered,
    InTraining,
    TestScheduled,
    Licensed,
    Withdrawn,
}

impl Default for EnrollmentStatus {
    fn default() -> Self {
        Self::Registered
    }
}

/// A recorded payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: String,
    /// External reference, e.g. a UPI transaction id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub amount: Amount,
    pub date: DateTime<Utc>,
    pub status: PaymentStatus,
}

/// A recorded lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_id: String,
    pub instructor_id: String,
    pub date: DateTime<Utc>,
    /// Free-form progress marker
    pub status: String,
}

/// The derived financial fields of a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFields {
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance: Balance,
    pub full_payment_status: PaymentStatus,
}

/// Student aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: String,
    pub name: String,
    pub mobile_number: String,
    pub application_number: String,
    pub email: String,
    pub national_id_number: String,
    pub plan: PlanId,
    pub registered_date: DateTime<Utc>,
    pub status: EnrollmentStatus,
    #[serde(flatten)]
    pub ledger: LedgerFields,
    pub payments: Vec<Payment>,
    pub lessons: Vec<Lesson>,
}

impl Student {
    pub fn total_amount(&self) -> Decimal {
        self.ledger.total_amount
    }

    pub fn paid_amount(&self) -> Decimal {
        self.ledger.paid_amount
    }

    pub fn balance(&self) -> Balance {
        self.ledger.balance
    }

    pub fn full_payment_status(&self) -> PaymentStatus {
        self.ledger.full_payment_status
    }

    pub fn is_fully_paid(&self) -> bool {
        self.ledger.full_payment_status == PaymentStatus::Completed
    }
}

// =========================================================================
// Inputs
// =========================================================================

/// Payment as supplied by a caller; `payment_id` is assigned on persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInput {
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub amount: Amount,
    #[serde(default = "Utc::now")]
    pub date: DateTime<Utc>,
    #[serde(default = "received")]
    pub status: PaymentStatus,
}

impl PaymentInput {
    pub fn new(amount: Amount) -> Self {
        Self {
            payment_id: None,
            transaction_id: None,
            amount,
            date: Utc::now(),
            status: PaymentStatus::Completed,
        }
    }

    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }
}

/// Lesson as supplied by a caller; `lesson_id` is assigned on persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonInput {
    #[serde(default)]
    pub lesson_id: Option<String>,
    pub instructor_id: String,
    pub date: DateTime<Utc>,
    pub status: String,
}

/// Everything needed to create or fully replace a student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentInput {
    pub name: String,
    pub mobile_number: String,
    pub application_number: String,
    pub email: String,
    pub national_id_number: String,
    pub plan: PlanId,
    #[serde(default = "Utc::now")]
    pub registered_date: DateTime<Utc>,
    #[serde(default)]
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub payments: Vec<PaymentInput>,
    #[serde(default)]
    pub lessons: Vec<LessonInput>,
}

impl StudentInput {
    /// Validate profile fields
    pub fn validate(&self) -> Result<(), DomainError> {
        require_non_blank("name", &self.name)?;
        require_non_blank("mobile_number", &self.mobile_number)?;
        require_non_blank("application_number", &self.application_number)?;
        require_non_blank("national_id_number", &self.national_id_number)?;

        if !self
            .mobile_number
            .chars()
            .all(|c| c.is_ascii_digit() || c == '+')
        {
            return Err(DomainError::invalid_input(
                "mobile_number",
                "must contain only digits",
            ));
        }

        if !is_plausible_email(&self.email) {
            return Err(DomainError::invalid_input("email", "not a valid email address"));
        }

        for lesson in &self.lessons {
            require_non_blank("lessons.instructor_id", &lesson.instructor_id)?;
        }

        Ok(())
    }
}

fn require_non_blank(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid_input(field, "must not be empty"));
    }
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> StudentInput {
        StudentInput {
            name: "Anjali Nair".to_string(),
            mobile_number: "9847012345".to_string(),
            application_number: "APP-1001".to_string(),
            email: "anjali@example.com".to_string(),
            national_id_number: "1234-5678-9012".to_string(),
            plan: PlanId::from("Basic"),
            registered_date: Utc::now(),
            status: EnrollmentStatus::Registered,
            payments: vec![],
            lessons: vec![],
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut student = input();
        student.name = "  ".to_string();

        assert!(matches!(
            student.validate(),
            Err(DomainError::InvalidInput { field: "name", .. })
        ));
    }

    #[test]
    fn test_bad_email_rejected() {
        for email in ["anjali", "anjali@", "@example.com", "a@b", "a b@example.com"] {
            let mut student = input();
            student.email = email.to_string();
            assert!(student.validate().is_err(), "accepted {email}");
        }
    }

    #[test]
    fn test_mobile_number_digits_only() {
        let mut student = input();
        student.mobile_number = "98470-12345".to_string();
        assert!(student.validate().is_err());
    }

    #[test]
    fn test_input_defaults() {
        let json = r#"{
            "name": "Ravi",
            "mobile_number": "9000000001",
            "application_number": "APP-7",
            "email": "ravi@example.com",
            "national_id_number": "5555",
            "plan": "Fast Track"
        }"#;

        let student: StudentInput = serde_json::from_str(json).unwrap();
        assert_eq!(student.plan.as_str(), "Fast Track");
        assert_eq!(student.status, EnrollmentStatus::Registered);
        assert!(student.payments.is_empty());
        assert!(student.lessons.is_empty());
    }

    #[test]
    fn test_payment_input_amount_validated() {
        let json = r#"{"amount": "-5", "date": "2026-01-10T10:00:00Z", "status": "Completed"}"#;
        let payment: Result<PaymentInput, _> = serde_json::from_str(json);
        assert!(payment.is_err());
    }
}
