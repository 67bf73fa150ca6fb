use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

// =============================================================================
// 1. THE ABSTRACTION (Entity trait with lifecycle hooks)
// =============================================================================

/// Trait that any row type must implement to live in a [`Table`].
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Copy + Ord + Hash + Send + Sync + Display + Debug + From<u64> + Into<u64>;
    type CreatePayload: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;

    /// Human readable table name used in errors and spans.
    const KIND: &'static str;

    fn id(&self) -> Self::Id;

    /// Business key that must be unique within the table, if any.
    fn unique_key(&self) -> Option<&str> {
        None
    }

    /// Construct the full row from its assigned id and the payload.
    fn from_create(id: Self::Id, payload: Self::CreatePayload) -> Result<Self, String>;

    // --- Lifecycle Hooks ---

    fn on_update(&mut self, patch: Self::Patch) -> Result<(), String>;
    fn on_delete(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TableError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },
    #[error("{kind} with key {key} already exists")]
    Duplicate { kind: &'static str, key: String },
    #[error("{kind} rejected: {reason}")]
    Rejected { kind: &'static str, reason: String },
}

// =============================================================================
// 2. THE TABLE (ordered rows + monotonic id allocation)
// =============================================================================

/// Rows ordered by id. Ids are allocated only when a row is actually
/// inserted, so a rejected create never leaves a gap.
#[derive(Debug, Clone)]
pub struct Table<T: Entity> {
    rows: BTreeMap<T::Id, T>,
    next_id: u64,
}

impl<T: Entity> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Table<T> {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuilds a table from persisted rows. `next_id` is raised past the
    /// highest stored id if needed.
    pub fn from_rows(rows: impl IntoIterator<Item = T>, next_id: u64) -> Self {
        let rows: BTreeMap<T::Id, T> = rows.into_iter().map(|row| (row.id(), row)).collect();
        let floor = rows
            .keys()
            .next_back()
            .map(|id| Into::<u64>::into(*id) + 1)
            .unwrap_or(1);
        Self {
            rows,
            next_id: next_id.max(floor),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: T::Id) -> Option<&T> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.rows.contains_key(&id)
    }

    /// Rows in id order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.rows.values()
    }

    pub fn create(&mut self, payload: T::CreatePayload) -> Result<T::Id, TableError> {
        let id = T::Id::from(self.next_id);
        let row = T::from_create(id, payload).map_err(|reason| TableError::Rejected {
            kind: T::KIND,
            reason,
        })?;
        if let Some(key) = row.unique_key() {
            if self.rows.values().any(|other| other.unique_key() == Some(key)) {
                return Err(TableError::Duplicate {
                    kind: T::KIND,
                    key: key.to_string(),
                });
            }
        }
        self.rows.insert(id, row);
        self.next_id += 1;
        Ok(id)
    }

    pub fn update(&mut self, id: T::Id, patch: T::Patch) -> Result<&T, TableError> {
        let row = self.get_mut(id)?;
        row.on_update(patch).map_err(|reason| TableError::Rejected {
            kind: T::KIND,
            reason,
        })?;
        Ok(&*row)
    }

    /// Mutable access for callers that enforce their own invariants.
    pub fn get_mut(&mut self, id: T::Id) -> Result<&mut T, TableError> {
        self.rows.get_mut(&id).ok_or(TableError::NotFound {
            kind: T::KIND,
            id: id.into(),
        })
    }

    pub fn remove(&mut self, id: T::Id) -> Result<T, TableError> {
        let row = self.rows.get(&id).ok_or(TableError::NotFound {
            kind: T::KIND,
            id: id.into(),
        })?;
        row.on_delete().map_err(|reason| TableError::Rejected {
            kind: T::KIND,
            reason,
        })?;
        self.rows.remove(&id).ok_or(TableError::NotFound {
            kind: T::KIND,
            id: id.into(),
        })
    }
}

// =============================================================================
// 3. THE GENERIC MESSAGES
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("actor closed")]
    ActorClosed,
    #[error("actor dropped the request")]
    ActorDropped,
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        payload: T::CreatePayload,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
}

// =============================================================================
// 4. THE GENERIC ACTOR SERVER
// =============================================================================

/// Owns one [`Table`] and serves CRUD requests one at a time.
pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    table: Table<T>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(buffer_size: usize, request_timeout: Duration) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            table: Table::new(),
        };
        let client = ResourceClient::new(sender, request_timeout);
        (actor, client)
    }

    #[instrument(name = "resource_actor", fields(kind = T::KIND), skip(self))]
    pub async fn run(mut self) {
        info!("Resource actor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { payload, respond_to } => {
                    let result = self.table.create(payload).map_err(FrameworkError::from);
                    match &result {
                        Ok(id) => info!(id = %id, "Row created"),
                        Err(e) => warn!(error = %e, "Create rejected"),
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Get { id, respond_to } => {
                    debug!(id = %id, "Processing get request");
                    let _ = respond_to.send(Ok(self.table.get(id).cloned()));
                }
                ResourceRequest::List { respond_to } => {
                    let rows: Vec<T> = self.table.iter().cloned().collect();
                    debug!(rows = rows.len(), "Listed rows");
                    let _ = respond_to.send(Ok(rows));
                }
                ResourceRequest::Update {
                    id,
                    patch,
                    respond_to,
                } => {
                    let result = self
                        .table
                        .update(id, patch)
                        .map(T::clone)
                        .map_err(FrameworkError::from);
                    if let Err(e) = &result {
                        warn!(id = %id, error = %e, "Update rejected");
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let result = self
                        .table
                        .remove(id)
                        .map(|_| ())
                        .map_err(FrameworkError::from);
                    match &result {
                        Ok(()) => info!(id = %id, "Row deleted"),
                        Err(e) => warn!(id = %id, error = %e, "Delete rejected"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }
        info!("Resource actor stopped");
    }
}

// =============================================================================
// 5. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
    request_timeout: Duration,
}

impl<T: Entity> ResourceClient<T> {
    pub(crate) fn new(sender: mpsc::Sender<ResourceRequest<T>>, request_timeout: Duration) -> Self {
        Self {
            sender,
            request_timeout,
        }
    }

    async fn call<R>(
        &self,
        request: ResourceRequest<T>,
        response: oneshot::Receiver<Result<R, FrameworkError>>,
    ) -> Result<R, FrameworkError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        tokio::time::timeout(self.request_timeout, response)
            .await
            .map_err(|_| FrameworkError::Timeout(self.request_timeout))?
            .map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, payload: T::CreatePayload) -> Result<T::Id, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(ResourceRequest::Create { payload, respond_to }, response)
            .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(ResourceRequest::Get { id, respond_to }, response)
            .await
    }

    pub async fn list(&self) -> Result<Vec<T>, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(ResourceRequest::List { respond_to }, response).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(
            ResourceRequest::Update {
                id,
                patch,
                respond_to,
            },
            response,
        )
        .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.call(ResourceRequest::Delete { id, respond_to }, response)
            .await
    }
}

// =============================================================================
// 6. EXAMPLE USAGE (Test)
// =============================================================================
