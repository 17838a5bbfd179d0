//! Stored document shapes
//!
//! What a student looks like inside the store. Money fields are raw decimals
//! and the derived ledger fields are whatever the writer put there; neither is
//! trusted until the record is reassembled.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{EnrollmentStatus, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: String,
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonRecord {
    pub lesson_id: String,
    pub instructor_id: String,
    pub date: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub mobile_number: String,
    pub application_number: String,
    pub email: String,
    pub national_id_number: String,
    pub plan: String,
    pub registered_date: DateTime<Utc>,
    #[serde(default)]
    pub status: EnrollmentStatus,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub paid_amount: Decimal,
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub full_payment_status: PaymentStatus,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
    #[serde(default)]
    pub lessons: Vec<LessonRecord>,
    /// Store-maintained revision, bumped on every update
    #[serde(skip)]
    pub version: i64,
}
