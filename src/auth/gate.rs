//! Identity / Access Gate
//!
//! Resolves a bearer credential into a `CallerIdentity`. Ledger and
//! assembly code only ever see the resolved identity.

use std::sync::Arc;

use crate::domain::CallerIdentity;

use super::{
    token_fingerprint, AuthError, Claims, RevocationStore, TokenService, UnauthorizedReason,
};

/// Extract the token from an `Authorization` header value
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[derive(Debug, Clone)]
pub struct IdentityGate {
    tokens: Arc<TokenService>,
    revocations: Arc<dyn RevocationStore>,
}

impl IdentityGate {
    pub fn new(tokens: Arc<TokenService>, revocations: Arc<dyn RevocationStore>) -> Self {
        Self {
            tokens,
            revocations,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Validate a raw `Authorization` header
    pub async fn authenticate(&self, header: Option<&str>) -> Result<CallerIdentity, AuthError> {
        let token = bearer_token(header).ok_or(UnauthorizedReason::Missing)?;
        let claims = self.verify(token).await?;
        Ok(claims.identity())
    }

    /// Signature, expiry and revocation check for a bare token
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.tokens.validate(token)?;

        if self
            .revocations
            .is_revoked(&token_fingerprint(token))
            .await?
        {
            tracing::debug!(subject = %claims.sub, "Rejected revoked token");
            return Err(UnauthorizedReason::Invalid.into());
        }

        Ok(claims)
    }

    /// Revoke a token until it would have expired anyway
    pub async fn revoke(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.verify(token).await?;
        self.revocations
            .revoke(&token_fingerprint(token), claims.expires_at())
            .await?;

        tracing::info!(subject = %claims.sub, "Token revoked");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InMemoryRevocationStore;
    use crate::domain::Role;
    use chrono::Duration;

    fn gate() -> IdentityGate {
        IdentityGate::new(
            Arc::new(TokenService::new("gate-test-secret", Duration::hours(1))),
            Arc::new(InMemoryRevocationStore::new()),
        )
    }

    fn unauthorized(result: Result<CallerIdentity, AuthError>) -> UnauthorizedReason {
        match result {
            Err(AuthError::Unauthorized(reason)) => reason,
            other => panic!("expected Unauthorized, got {:?}", other),
        }
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[tokio::test]
    async fn test_authenticate_valid_token() {
        let gate = gate();
        let issued = gate.tokens().issue("desk@school.in", Role::Instructor).unwrap();

        let caller = gate
            .authenticate(Some(&format!("Bearer {}", issued.token)))
            .await
            .unwrap();

        assert_eq!(caller, CallerIdentity::new("desk@school.in", Role::Instructor));
    }

    #[tokio::test]
    async fn test_missing_expired_invalid() {
        let gate = gate();
        let expired = gate
            .tokens()
            .issue_with_ttl("a@b.in", Role::Admin, Duration::hours(-1))
            .unwrap();

        assert_eq!(
            unauthorized(gate.authenticate(None).await),
            UnauthorizedReason::Missing
        );
        assert_eq!(
            unauthorized(gate.authenticate(Some(&format!("Bearer {}", expired.token))).await),
            UnauthorizedReason::Expired
        );
        assert_eq!(
            unauthorized(gate.authenticate(Some("Bearer garbage")).await),
            UnauthorizedReason::Invalid
        );
    }

    #[tokio::test]
    async fn test_revoked_token_is_invalid() {
        let gate = gate();
        let issued = gate.tokens().issue("a@b.in", Role::Admin).unwrap();
        let header = format!("Bearer {}", issued.token);

        gate.revoke(&issued.token).await.unwrap();

        assert_eq!(
            unauthorized(gate.authenticate(Some(&header)).await),
            UnauthorizedReason::Invalid
        );
    }
}
