use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::actor_framework::ResourceActor;
use crate::analytics::AnalyticsEngine;
use crate::clients::{AnalyticsClient, StockClient, UserClient};
use crate::domain::{Identity, Role, User, UserCreate, DEFAULT_ADMIN_ID_NUMBER};
use crate::ledger::LedgerStore;
use crate::policy::AccessGate;
use crate::stock_actor::StockService;

use super::{AppConfig, SystemError};

/// The running ledger: one stock service, one user directory and the
/// clients that front them.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct LedgerSystem {
    pub stock_client: StockClient,
    pub user_client: UserClient,
    pub analytics_client: AnalyticsClient,
    admin: Identity,
    store: LedgerStore,
    handles: Vec<JoinHandle<()>>,
}

impl LedgerSystem {
    /// Opens the configured store and starts every actor.
    pub async fn start(config: &AppConfig) -> Result<Self, SystemError> {
        let store = LedgerStore::open(&config.store).await?;
        Self::with_store(store, config).await
    }

    pub async fn with_store(store: LedgerStore, config: &AppConfig) -> Result<Self, SystemError> {
        let gate = AccessGate::new(config.policy.clone());
        let request_timeout = Duration::from_millis(config.service.request_timeout_ms);

        // 1. Stock service, the single writer over the ledger
        let (stock_service, stock_client) = StockService::new(
            config.service.buffer_size,
            request_timeout,
            store.clone(),
            gate.clone(),
        );
        let stock_handle = tokio::spawn(stock_service.run());

        // 2. User directory, seeded with the default administrator
        let (user_actor, user_resource_client) =
            ResourceActor::<User>::new(config.service.buffer_size, request_timeout);
        let user_handle = tokio::spawn(user_actor.run());
        let user_client = UserClient::new(user_resource_client, gate.clone());
        let admin_id = user_client
            .bootstrap(UserCreate::new(
                DEFAULT_ADMIN_ID_NUMBER,
                "System Administrator",
                Role::Admin,
            ))
            .await?;
        info!(user_id = %admin_id, "Default administrator registered");

        // 3. Analytics, reading snapshots directly
        let engine = AnalyticsEngine::new(store.clone(), config.analytics.clone());
        let analytics_client = AnalyticsClient::new(engine, gate);

        info!(
            products = store.snapshot().await.product_count(),
            "Ledger system started"
        );
        Ok(Self {
            stock_client,
            user_client,
            analytics_client,
            admin: Identity::new(admin_id, Role::Admin),
            store,
            handles: vec![stock_handle, user_handle],
        })
    }

    /// The built-in administrator registered at startup.
    pub fn admin(&self) -> Identity {
        self.admin
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Stops the stock service after its queued requests and closes the
    /// user directory. Clones of the user client handed out earlier must be
    /// dropped first, or the directory keeps running.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");
        self.stock_client.shutdown().await?;

        drop(self.stock_client);
        drop(self.user_client);
        drop(self.analytics_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(SystemError::ActorFailed(e.to_string()));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
