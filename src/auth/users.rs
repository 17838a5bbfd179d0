//! Staff accounts

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::Role;
use crate::store::{bounded, StoreError};

#[derive(Debug, Clone, Serialize)]
pub struct StaffUser {
    pub id: Uuid,
    pub name: String,
    /// Stored lowercased
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl StaffUser {
    pub fn new(name: &str, email: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync + Debug {
    async fn find_by_email(&self, email: &str) -> Result<Option<StaffUser>, StoreError>;

    /// Fails with `DuplicateKey("email")` when the address is taken
    async fn insert(&self, user: &StaffUser) -> Result<(), StoreError>;
}

// =========================================================================
// In-memory
// =========================================================================

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<Vec<StaffUser>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StaffUser>, StoreError> {
        let email = email.trim().to_lowercase();
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn insert(&self, user: &StaffUser) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateKey("email".to_string()));
        }
        users.push(user.clone());
        Ok(())
    }
}

// =========================================================================
// Postgres
// =========================================================================

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[derive(sqlx::FromRow)]
struct StaffUserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<StaffUserRow> for StaffUser {
    type Error = StoreError;

    fn try_from(row: StaffUserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(|_| {
            StoreError::Database(sqlx::Error::Decode(
                format!("staff user {} has unknown role {}", row.id, row.role).into(),
            ))
        })?;
        Ok(StaffUser {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<StaffUser>, StoreError> {
        let row: Option<StaffUserRow> = bounded(
            self.timeout,
            "find_staff_user",
            sqlx::query_as(
                r#"
                SELECT id, name, email, password_hash, role, created_at
                FROM staff_users
                WHERE email = LOWER($1)
                "#,
            )
            .bind(email.trim())
            .fetch_optional(&self.pool),
        )
        .await?;

        row.map(StaffUser::try_from).transpose()
    }

    async fn insert(&self, user: &StaffUser) -> Result<(), StoreError> {
        bounded(
            self.timeout,
            "insert_staff_user",
            sqlx::query(
                r#"
                INSERT INTO staff_users (id, name, email, password_hash, role, created_at)
                VALUES ($1, $2, LOWER($3), $4, $5, $6)
                "#,
            )
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .execute(&self.pool),
        )
        .await?;

        tracing::debug!(user_id = %user.id, "Staff user inserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_lowercases_email() {
        let user = StaffUser::new("Front Desk", "  Desk@School.IN ", "hash".to_string(), Role::Admin);
        assert_eq!(user.email, "desk@school.in");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = StaffUser::new("Ravi", "a@b.in", "secret-hash".to_string(), Role::Instructor);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }

    #[tokio::test]
    async fn test_in_memory_email_unique_case_insensitive() {
        let store = InMemoryUserStore::new();
        store
            .insert(&StaffUser::new("Ravi", "a@b.in", "h".to_string(), Role::Admin))
            .await
            .unwrap();

        let found = store.find_by_email("A@B.IN").await.unwrap();
        assert!(found.is_some());

        let dup = store
            .insert(&StaffUser::new("Anil", "A@b.in", "h".to_string(), Role::Student))
            .await;
        assert!(matches!(dup, Err(StoreError::DuplicateKey(f)) if f == "email"));
    }
}
