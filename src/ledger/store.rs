use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use super::{StoreError, Tables, Transaction};

pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_COMMIT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON document backing the ledger. In-memory only when absent.
    pub path: Option<PathBuf>,
    /// Upper bound on waiting for the writer lock.
    pub lock_timeout_ms: u64,
    /// Upper bound on persisting a commit.
    pub commit_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            commit_timeout_ms: DEFAULT_COMMIT_TIMEOUT_MS,
        }
    }
}

/// Shared handle to the ledger. Cloning is cheap; every clone sees the same
/// committed state and contends for the same writer lock.
#[derive(Clone)]
pub struct LedgerStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    committed: RwLock<Arc<Tables>>,
    writer: Arc<Mutex<()>>,
    path: Option<PathBuf>,
    lock_timeout: Duration,
    commit_timeout: Duration,
    next_tx: AtomicU64,
}

impl LedgerStore {
    pub fn in_memory() -> Self {
        Self::with_tables(Tables::default(), &StoreConfig::default())
    }

    /// Opens the store, loading the persisted document when one exists.
    #[instrument(fields(path = ?config.path), skip(config))]
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let tables = match &config.path {
            Some(path) => load(path).await?,
            None => Tables::default(),
        };
        info!(
            products = tables.product_count(),
            sales = tables.sale_count(),
            "Ledger store opened"
        );
        Ok(Self::with_tables(tables, config))
    }

    fn with_tables(tables: Tables, config: &StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                committed: RwLock::new(Arc::new(tables)),
                writer: Arc::new(Mutex::new(())),
                path: config.path.clone(),
                lock_timeout: Duration::from_millis(config.lock_timeout_ms),
                commit_timeout: Duration::from_millis(config.commit_timeout_ms),
                next_tx: AtomicU64::new(1),
            }),
        }
    }

    /// Last committed state. Never reflects a transaction in progress.
    pub async fn snapshot(&self) -> Arc<Tables> {
        self.inner.committed.read().await.clone()
    }

    /// Opens a transaction: takes the writer lock and stages a private copy
    /// of the committed tables.
    pub async fn begin(&self) -> Result<Transaction, StoreError> {
        let waited = self.inner.lock_timeout;
        let guard = tokio::time::timeout(waited, self.inner.writer.clone().lock_owned())
            .await
            .map_err(|_| StoreError::Timeout {
                waited,
                what: "writer lock",
            })?;
        let staged = Tables::clone(&*self.snapshot().await);
        let id = self.inner.next_tx.fetch_add(1, Ordering::Relaxed);
        debug!(tx = id, "Transaction opened");
        Ok(Transaction::new(id, self.clone(), guard, staged))
    }

    /// Persists (when file backed) and then publishes `tables` as the new
    /// committed state. Called with the writer lock held.
    pub(super) async fn publish(&self, tables: Tables) -> Result<(), StoreError> {
        if let Some(path) = &self.inner.path {
            let waited = self.inner.commit_timeout;
            tokio::time::timeout(waited, persist(path, &tables))
                .await
                .map_err(|_| StoreError::Timeout {
                    waited,
                    what: "commit persistence",
                })??;
        }
        *self.inner.committed.write().await = Arc::new(tables);
        Ok(())
    }
}

async fn load(path: &Path) -> Result<Tables, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Tables::from_document(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No ledger document yet, starting empty");
            Ok(Tables::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Write-then-rename so a crash never leaves a torn document behind.
async fn persist(path: &Path, tables: &Tables) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(&tables.to_document())?;
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);
    tokio::fs::write(&staging, bytes).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}
