//! Infrastructure wiring: store selection and service construction.

use std::sync::Arc;

use filehaven_auth::{AuthorizationEngine, Hs256Tokens, TokenIdentityService};
use filehaven_infra::{
    AccountService, ContentStore, FileStore, FsContentStore, InMemoryContentStore,
    InMemoryFileStore, InMemoryIdentityDirectory, InMemoryPermissionLedger, InMemoryUserStore,
    PostgresFileStore, PostgresIdentityDirectory, PostgresPermissionLedger, PostgresUserStore,
};

use crate::config::AppConfig;

/// Everything the routes and adapters need, behind `Arc`.
pub struct AppServices {
    pub identity: TokenIdentityService,
    pub engine: AuthorizationEngine,
    pub accounts: AccountService,
    pub files: Arc<dyn FileStore>,
    pub content: Arc<dyn ContentStore>,
}

/// Build services against Postgres when `DATABASE_URL` is configured, or
/// fully in-memory otherwise (tests, demos, single-process deployments).
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let tokens = Arc::new(Hs256Tokens::from_secret(&config.jwt_secret)?);

    let services = match &config.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url).await?;
            tracing::info!("using postgres stores");

            let users = Arc::new(PostgresUserStore::new(pool.clone()));
            let files = Arc::new(PostgresFileStore::new(pool.clone()));
            let ledger = Arc::new(PostgresPermissionLedger::new(pool.clone()));
            let directory = Arc::new(PostgresIdentityDirectory::new(pool));

            let content: Arc<dyn ContentStore> = match &config.storage_dir {
                Some(dir) => Arc::new(FsContentStore::new(dir.clone()).await?),
                None => Arc::new(InMemoryContentStore::new()),
            };

            AppServices {
                identity: TokenIdentityService::new(tokens.clone(), directory),
                engine: AuthorizationEngine::new(ledger, files.clone()),
                accounts: AccountService::new(users, tokens),
                files,
                content,
            }
        }
        None => {
            tracing::info!("using in-memory stores");

            let users = InMemoryUserStore::new();
            let files = InMemoryFileStore::new();
            let ledger = Arc::new(InMemoryPermissionLedger::new(Arc::new(files.clone())));
            let directory = Arc::new(InMemoryIdentityDirectory::new(
                users.clone(),
                files.clone(),
                ledger.clone(),
            ));

            let content: Arc<dyn ContentStore> = match &config.storage_dir {
                Some(dir) => Arc::new(FsContentStore::new(dir.clone()).await?),
                None => Arc::new(InMemoryContentStore::new()),
            };

            AppServices {
                identity: TokenIdentityService::new(tokens.clone(), directory),
                engine: AuthorizationEngine::new(ledger, Arc::new(files.clone())),
                accounts: AccountService::new(Arc::new(users), tokens),
                files: Arc::new(files),
                content,
            }
        }
    };

    if let Some(admin) = &config.admin {
        services
            .accounts
            .seed_administrator(&admin.email, &admin.password)
            .await?;
    }

    Ok(services)
}
