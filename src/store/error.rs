//! Store Errors
//!
//! Error types for student record store operations.

/// Errors that can occur in a record store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique mobile/application/national-id/email collision
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Transient infrastructure fault (timeout, connection loss)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                let field = db_err
                    .constraint()
                    .map(field_for_constraint)
                    .unwrap_or("unique key");
                StoreError::DuplicateKey(field.to_string())
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Database(err),
        }
    }
}

/// Map a Postgres unique constraint name back to the colliding field
fn field_for_constraint(constraint: &str) -> &'static str {
    match constraint {
        "students_pkey" => "id",
        "students_application_number_key" => "application_number",
        "students_mobile_number_key" => "mobile_number",
        "students_national_id_number_key" => "national_id_number",
        "students_email_key" => "email",
        "staff_users_pkey" | "staff_users_email_key" => "email",
        _ => "unique key",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_is_retryable() {
        assert!(StoreError::Unavailable("timed out".to_string()).is_retryable());
        assert!(!StoreError::DuplicateKey("mobile_number".to_string()).is_retryable());
    }

    #[test]
    fn test_pool_timeout_is_unavailable() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_field_for_constraint() {
        assert_eq!(field_for_constraint("students_mobile_number_key"), "mobile_number");
        assert_eq!(field_for_constraint("students_email_key"), "email");
        assert_eq!(field_for_constraint("something_else"), "unique key");
    }
}
