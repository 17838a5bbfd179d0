//! Operation Context
//!
//! Who is calling and which request this is, carried through handlers for
//! authorization and log correlation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Staff and student roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Instructor => "Instructor",
            Role::Student => "Student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Instructor" => Ok(Role::Instructor),
            "Student" => Ok(Role::Student),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Resolved identity of an authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub subject_email: String,
    pub role: Role,
}

impl CallerIdentity {
    pub fn new(subject_email: impl Into<String>, role: Role) -> Self {
        Self {
            subject_email: subject_email.into(),
            role,
        }
    }

    /// Admin is allowed everything
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.role == Role::Admin || roles.contains(&self.role)
    }
}

/// Context for an operation, used for authorization and tracing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<CallerIdentity>,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl OperationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caller(mut self, caller: CallerIdentity) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }

    pub fn caller_email(&self) -> Option<&str> {
        self.caller.as_ref().map(|c| c.subject_email.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let correlation_id = Uuid::new_v4();
        let caller = CallerIdentity::new("desk@school.in", Role::Instructor);

        let context = OperationContext::new()
            .with_caller(caller.clone())
            .with_correlation_id(correlation_id);

        assert_eq!(context.caller, Some(caller));
        assert_eq!(context.correlation_id, Some(correlation_id));
        assert_eq!(context.caller_email(), Some("desk@school.in"));
    }

    #[test]
    fn test_ensure_correlation_id() {
        let mut context = OperationContext::new();
        assert!(context.correlation_id.is_none());

        let id = context.ensure_correlation_id();
        assert_eq!(context.correlation_id, Some(id));

        // Calling again should return the same ID
        assert_eq!(id, context.ensure_correlation_id());
    }

    #[test]
    fn test_role_round_trip_and_admin_override() {
        assert_eq!("Instructor".parse::<Role>().unwrap(), Role::Instructor);
        assert!("Owner".parse::<Role>().is_err());

        let admin = CallerIdentity::new("boss@school.in", Role::Admin);
        let student = CallerIdentity::new("kid@school.in", Role::Student);
        assert!(admin.has_any_role(&[Role::Instructor]));
        assert!(!student.has_any_role(&[Role::Instructor]));
    }
}
