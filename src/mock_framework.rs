//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] or [`create_mock_stock_client`] to get a client
//! and the receiving end of its channel, then the `expect_*` helpers to
//! assert what arrives and answer it.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::actor_framework::{Entity, FrameworkError, ResourceClient, ResourceRequest};
use crate::clients::StockClient;
use crate::domain::{SaleId, SaleRequest};
use crate::ledger::LedgerStore;
use crate::policy::AccessGate;
use crate::stock_actor::{ServiceResponse, StockRequest};

const MOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates a resource client whose requests land on the returned receiver
/// instead of a running [`ResourceActor`](crate::actor_framework::ResourceActor).
pub fn create_mock_client<T: Entity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender, MOCK_TIMEOUT), receiver)
}

/// A stock client with no service behind it. Snapshot reads see an empty
/// in-memory store.
pub fn create_mock_stock_client(
    buffer_size: usize,
    gate: AccessGate,
) -> (StockClient, mpsc::Receiver<StockRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let client = StockClient::new(sender, LedgerStore::in_memory(), gate, MOCK_TIMEOUT);
    (client, receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreatePayload, oneshot::Sender<Result<T::Id, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { payload, respond_to }) => Some((payload, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a RecordSale request
pub async fn expect_record_sale(
    receiver: &mut mpsc::Receiver<StockRequest>,
) -> Option<(SaleRequest, ServiceResponse<Vec<SaleId>>)> {
    match receiver.recv().await {
        Some(StockRequest::RecordSale { sale, respond_to }) => Some((sale, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, User, UserCreate, UserId};

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<User>(10);

        let create_task = tokio::spawn(async move {
            client
                .create(UserCreate::new("EMP001", "Test User", Role::Staff))
                .await
        });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.full_name, "Test User");
        responder.send(Ok(UserId(1))).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Ok(UserId(1)));
    }
}
