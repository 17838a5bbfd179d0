//! driving_school - Driving School Student Ledger Backend
//!
//! Registers students against priced plans, records their payments and
//! keeps every balance reconciled. Staff authenticate with bearer tokens.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driving_school::api::{self, AppState};
use driving_school::auth::{
    InMemoryRevocationStore, InMemoryUserStore, PgRevocationStore, PgUserStore, RevocationStore,
    TokenService, UserStore,
};
use driving_school::db;
use driving_school::domain::{PlanCatalog, UuidIdGenerator};
use driving_school::handlers::RegisterStaffHandler;
use driving_school::jobs::{JobScheduler, JobSchedulerConfig};
use driving_school::store::{InMemoryStudentStore, PgStudentStore, RetryPolicy, StudentStore};
use driving_school::Config;

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driving_school=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_catalog(config: &Config) -> anyhow::Result<PlanCatalog> {
    match &config.plan_catalog_path {
        Some(path) => {
            let catalog = PlanCatalog::from_json_file(path)?;
            tracing::info!(path = %path, plans = catalog.len(), "Loaded plan catalog");
            Ok(catalog)
        }
        None => Ok(PlanCatalog::standard()),
    }
}

struct Stores {
    students: Arc<dyn StudentStore>,
    users: Arc<dyn UserStore>,
    revocations: Arc<dyn RevocationStore>,
    pool: Option<PgPool>,
}

async fn connect_stores(config: &Config) -> anyhow::Result<Stores> {
    if config.uses_in_memory_store() {
        tracing::warn!("Using in-memory stores; data is lost on shutdown");
        return Ok(Stores {
            students: Arc::new(InMemoryStudentStore::new()),
            users: Arc::new(InMemoryUserStore::new()),
            revocations: Arc::new(InMemoryRevocationStore::new()),
            pool: None,
        });
    }

    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.store_timeout())
        .connect(&config.database_url)
        .await?;

    db::verify_connection(&pool).await?;

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");

    let timeout = config.store_timeout();
    Ok(Stores {
        students: Arc::new(PgStudentStore::new(pool.clone(), timeout)),
        users: Arc::new(PgUserStore::new(pool.clone(), timeout)),
        revocations: Arc::new(PgRevocationStore::new(pool.clone(), timeout)),
        pool: Some(pool),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(environment = %config.environment, "Starting driving_school server");

    let catalog = Arc::new(load_catalog(&config)?);
    let stores = connect_stores(&config).await?;

    if let Some((email, password)) = config.bootstrap_admin() {
        RegisterStaffHandler::new(stores.users.clone())
            .ensure_admin(email, password)
            .await?;
    }

    let state = AppState::new(
        stores.students.clone(),
        stores.users.clone(),
        stores.revocations.clone(),
        Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl())),
        catalog,
        Arc::new(UuidIdGenerator),
        RetryPolicy::new(config.store_max_retries, RetryPolicy::default().base_delay),
        config.student_list_limit,
    );

    let scheduler = JobScheduler::with_config(
        stores.revocations.clone(),
        JobSchedulerConfig {
            revocation_purge_interval: config.revocation_purge_interval(),
        },
    )
    .start();

    let app = api::build_router(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down...");
    scheduler.abort();
    if let Some(pool) = stores.pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }
    tracing::info!("Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
