//! Production wiring for [`PardotClient`]

use std::sync::Arc;

use pardot_common::time::{Clock, SystemClock};
use pardot_core::{PardotClient, QuotaStore};
use pardot_domain::{PardotConfig, PardotError, QuotaBackend, QuotaStoreConfig, Result};
use tokio::task;
use tracing::debug;

use crate::database::{QuotaDbManager, SqliteQuotaStore};
use crate::http::ReqwestTransport;
use crate::redis_store::RedisQuotaStore;

/// Build a client with the reqwest transport, the configured shared quota
/// store and the system clock.
pub async fn connect(config: &PardotConfig) -> Result<PardotClient> {
    connect_with_clock(config, Arc::new(SystemClock)).await
}

/// Same as [`connect`] with an injected clock.
pub async fn connect_with_clock(
    config: &PardotConfig,
    clock: Arc<dyn Clock>,
) -> Result<PardotClient> {
    config.validate()?;

    let transport = Arc::new(ReqwestTransport::from_settings(&config.http)?);

    let store: Arc<dyn QuotaStore> = match config.quota_store.backend {
        QuotaBackend::Sqlite => {
            let store_config = config.quota_store.clone();
            let store_clock = Arc::clone(&clock);
            let store =
                task::spawn_blocking(move || open_quota_store(&store_config, store_clock))
                    .await
                    .map_err(|err| {
                        PardotError::Internal(format!("blocking task failed: {err}"))
                    })??;
            Arc::new(store)
        }
        QuotaBackend::Redis => Arc::new(RedisQuotaStore::connect(&config.quota_store).await?),
    };
    debug!(backend = ?config.quota_store.backend, "quota store ready");

    PardotClient::connect(config, transport, store, clock).await
}

/// Open the shared counter database and make sure its schema exists.
pub fn open_quota_store(
    config: &QuotaStoreConfig,
    clock: Arc<dyn Clock>,
) -> Result<SqliteQuotaStore> {
    let db = QuotaDbManager::from_config(config)?;
    db.run_migrations()?;
    Ok(SqliteQuotaStore::new(Arc::new(db), clock, config.ttl()))
}
