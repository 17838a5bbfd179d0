//! Command definitions
//!
//! Commands represent intentions to change the system state.

use serde::{Deserialize, Serialize};

use crate::domain::{
    LedgerFields, NewPayment, Payment, PaymentStatus, Role, Student, StudentInput,
};
use crate::store::StudentFilter;

// =========================================================================
// Student lookups
// =========================================================================

/// Unique keys a single student can be addressed by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentLookup {
    MobileNumber(String),
    ApplicationNumber(String),
    NationalId(String),
}

impl StudentLookup {
    pub fn filter(&self) -> StudentFilter {
        match self {
            StudentLookup::MobileNumber(v) => StudentFilter::MobileNumber(v.trim().to_string()),
            StudentLookup::ApplicationNumber(v) => {
                StudentFilter::ApplicationNumber(v.trim().to_string())
            }
            StudentLookup::NationalId(v) => StudentFilter::NationalId(v.trim().to_string()),
        }
    }
}

impl std::fmt::Display for StudentLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.filter().fmt(f)
    }
}

// =========================================================================
// CreateStudentCommand
// =========================================================================

/// Command to register a new student with any initial payments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStudentCommand {
    #[serde(flatten)]
    pub input: StudentInput,
}

impl CreateStudentCommand {
    pub fn new(input: StudentInput) -> Self {
        Self { input }
    }
}

// =========================================================================
// UpdateStudentCommand
// =========================================================================

/// Command to fully replace a student, addressed by application number
#[derive(Debug, Clone)]
pub struct UpdateStudentCommand {
    pub application_number: String,
    pub input: StudentInput,
}

impl UpdateStudentCommand {
    pub fn new(application_number: impl Into<String>, input: StudentInput) -> Self {
        Self {
            application_number: application_number.into(),
            input,
        }
    }
}

// =========================================================================
// DeleteStudentCommand
// =========================================================================

#[derive(Debug, Clone)]
pub struct DeleteStudentCommand {
    pub lookup: StudentLookup,
}

impl DeleteStudentCommand {
    pub fn new(lookup: StudentLookup) -> Self {
        Self { lookup }
    }
}

// =========================================================================
// AddPaymentCommand
// =========================================================================

/// Command to append a payment to a student's ledger
#[derive(Debug, Clone)]
pub struct AddPaymentCommand {
    pub application_number: String,
    pub payment: NewPayment,
}

impl AddPaymentCommand {
    pub fn new(application_number: impl Into<String>, payment: NewPayment) -> Self {
        Self {
            application_number: application_number.into(),
            payment,
        }
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.payment.status = status;
        self
    }
}

/// Result of a successful payment: the reconciled student and the new entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddPaymentResult {
    pub student: Student,
    pub payment: Payment,
}

/// The four ledger fields of a student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub application_number: String,
    #[serde(flatten)]
    pub ledger: LedgerFields,
}

impl From<&Student> for LedgerSummary {
    fn from(student: &Student) -> Self {
        Self {
            application_number: student.application_number.clone(),
            ledger: student.ledger,
        }
    }
}

// =========================================================================
// Staff authentication
// =========================================================================

/// Command to create an account; `role` defaults to `Student`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterStaffCommand {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "self_service_role")]
    pub role: Role,
}

fn self_service_role() -> Role {
    Role::Student
}

impl RegisterStaffCommand {
    pub fn new(name: &str, email: &str, password: &str, role: Role) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl LoginCommand {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    pub access_token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}
