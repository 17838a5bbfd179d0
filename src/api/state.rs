//! Shared application state
//!
//! Everything a request needs, injected once at start-up. Stores sit behind
//! trait objects so the same router runs on Postgres or in memory.

use std::sync::Arc;

use crate::assembly::RecordAssembler;
use crate::auth::{IdentityGate, RevocationStore, TokenService, UserStore};
use crate::domain::{IdGenerator, LedgerEngine, PlanCatalog};
use crate::store::{RetryPolicy, StudentStore};

#[derive(Debug, Clone)]
pub struct AppState {
    pub students: Arc<dyn StudentStore>,
    pub users: Arc<dyn UserStore>,
    pub gate: IdentityGate,
    pub assembler: RecordAssembler,
    pub retry: RetryPolicy,
    /// Upper bound for list endpoints
    pub list_limit: usize,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        students: Arc<dyn StudentStore>,
        users: Arc<dyn UserStore>,
        revocations: Arc<dyn RevocationStore>,
        tokens: Arc<TokenService>,
        catalog: Arc<PlanCatalog>,
        ids: Arc<dyn IdGenerator>,
        retry: RetryPolicy,
        list_limit: usize,
    ) -> Self {
        Self {
            students,
            users,
            gate: IdentityGate::new(tokens, revocations),
            assembler: RecordAssembler::new(LedgerEngine::new(catalog), ids),
            retry,
            list_limit,
        }
    }
}
