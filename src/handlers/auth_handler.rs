//! Staff Authentication Handlers
//!
//! Registration, login and logout for staff accounts. Self-registration
//! only yields `Student` accounts; privileged roles are granted by an Admin.

use std::sync::Arc;

use crate::auth::{
    hash_password, verify_password, AuthError, IdentityGate, StaffUser, UserStore,
};
use crate::domain::{OperationContext, Role};
use crate::error::AppError;
use crate::store::StoreError;

use super::{authorize, LoginCommand, LoginResult, RegisterStaffCommand, STAFF_ADMIN_ROLES};

const MIN_PASSWORD_LENGTH: usize = 8;

// =========================================================================
// RegisterStaffHandler
// =========================================================================

pub struct RegisterStaffHandler {
    users: Arc<dyn UserStore>,
}

impl RegisterStaffHandler {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Create an account.
    ///
    /// Anyone may register a `Student` account. `Instructor` and `Admin`
    /// accounts can only be created by an authenticated Admin.
    pub async fn execute(
        &self,
        command: RegisterStaffCommand,
        context: &OperationContext,
    ) -> Result<StaffUser, AppError> {
        if command.role != Role::Student {
            if context.caller.is_none() {
                return Err(AppError::Forbidden(format!(
                    "only an admin may create {} accounts",
                    command.role
                )));
            }
            authorize(context, STAFF_ADMIN_ROLES)?;
        }

        let user = self.create(command).await?;

        let created_by = context
            .caller
            .as_ref()
            .map(|caller| caller.subject_email.as_str())
            .unwrap_or("self");
        tracing::info!(
            user_id = %user.id,
            role = %user.role,
            created_by = %created_by,
            "Staff user registered"
        );
        Ok(user)
    }

    /// Create the first Admin at start-up unless the email is already taken.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<bool, AppError> {
        if self.users.find_by_email(email).await?.is_some() {
            return Ok(false);
        }

        let user = self
            .create(RegisterStaffCommand::new("Administrator", email, password, Role::Admin))
            .await?;

        tracing::info!(user_id = %user.id, "Bootstrap admin created");
        Ok(true)
    }

    async fn create(&self, command: RegisterStaffCommand) -> Result<StaffUser, AppError> {
        if command.name.trim().is_empty() {
            return Err(AuthError::InvalidRegistration("name must not be empty".into()).into());
        }
        if !command.email.contains('@') || command.email.trim().len() < 3 {
            return Err(AuthError::InvalidRegistration("email is not valid".into()).into());
        }
        if command.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::InvalidRegistration(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            ))
            .into());
        }

        if self.users.find_by_email(&command.email).await?.is_some() {
            return Err(AuthError::EmailTaken.into());
        }

        let password_hash = hash_password(&command.password)?;
        let user = StaffUser::new(&command.name, &command.email, password_hash, command.role);

        self.users.insert(&user).await.map_err(|e| match e {
            StoreError::DuplicateKey(_) => AppError::EmailTaken,
            other => other.into(),
        })?;

        Ok(user)
    }
}

// =========================================================================
// LoginHandler
// =========================================================================

pub struct LoginHandler {
    users: Arc<dyn UserStore>,
    gate: IdentityGate,
}

impl LoginHandler {
    pub fn new(users: Arc<dyn UserStore>, gate: IdentityGate) -> Self {
        Self { users, gate }
    }

    pub async fn execute(&self, command: LoginCommand) -> Result<LoginResult, AppError> {
        // Same error for unknown email and wrong password
        let user = self
            .users
            .find_by_email(&command.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&command.password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Login rejected");
            return Err(AuthError::InvalidCredentials.into());
        }

        let issued = self.gate.tokens().issue(&user.email, user.role)?;

        tracing::info!(user_id = %user.id, "Staff user logged in");
        Ok(LoginResult {
            access_token: issued.token,
            token_type: "bearer".to_string(),
            expires_in: self.gate.tokens().ttl().num_seconds(),
        })
    }
}

// =========================================================================
// LogoutHandler
// =========================================================================

pub struct LogoutHandler {
    gate: IdentityGate,
}

impl LogoutHandler {
    pub fn new(gate: IdentityGate) -> Self {
        Self { gate }
    }

    /// Revoke the presented token until its own expiry
    pub async fn execute(&self, token: &str, context: &OperationContext) -> Result<(), AppError> {
        super::authenticated(context)?;
        self.gate.revoke(token).await?;
        Ok(())
    }
}
