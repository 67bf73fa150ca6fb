use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{Identity, User, UserCreate, UserId, UserPatch};
use crate::policy::{AccessGate, Operation};
use crate::user_actor::UserError;

/// Client for the staff directory. Every call requires `manage-users`.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
    gate: AccessGate,
}

impl UserClient {
    pub fn new(inner: ResourceClient<User>, gate: AccessGate) -> Self {
        Self { inner, gate }
    }

    fn authorize(&self, identity: &Identity) -> Result<(), UserError> {
        self.gate
            .authorize(identity, Operation::ManageUsers)
            .map_err(|_| UserError::Forbidden {
                role: identity.role,
                operation: Operation::ManageUsers,
            })
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn list_users(&self, identity: &Identity) -> Result<Vec<User>, UserError> {
        self.authorize(identity)?;
        debug!("Sending request");
        Ok(self.inner.list().await?)
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn get_user(&self, identity: &Identity, id: UserId) -> Result<User, UserError> {
        self.authorize(identity)?;
        debug!("Sending request");
        self.inner
            .get(id)
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))
    }

    #[instrument(fields(user_id = %identity.user_id, id_number = %user.id_number), skip(self, identity, user))]
    pub async fn create_user(&self, identity: &Identity, user: UserCreate) -> Result<UserId, UserError> {
        self.authorize(identity)?;
        debug!("Sending request");
        Ok(self.inner.create(user).await?)
    }

    #[instrument(fields(user_id = %identity.user_id), skip(self, identity, patch))]
    pub async fn update_user(
        &self,
        identity: &Identity,
        id: UserId,
        patch: UserPatch,
    ) -> Result<User, UserError> {
        self.authorize(identity)?;
        debug!("Sending request");
        Ok(self.inner.update(id, patch).await?)
    }

    /// The default administrator is refused.
    #[instrument(fields(user_id = %identity.user_id), skip(self, identity))]
    pub async fn delete_user(&self, identity: &Identity, id: UserId) -> Result<(), UserError> {
        self.authorize(identity)?;
        debug!("Sending request");
        Ok(self.inner.delete(id).await?)
    }

    /// Seeds a row without a caller. Used once at startup for the default
    /// administrator.
    pub(crate) async fn bootstrap(&self, user: UserCreate) -> Result<UserId, UserError> {
        Ok(self.inner.create(user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::FrameworkError;
    use crate::domain::Role;
    use crate::mock_framework::{create_mock_client, expect_create, expect_get};

    fn admin() -> Identity {
        Identity::new(UserId(1), Role::Admin)
    }

    #[tokio::test]
    async fn only_admins_manage_users() {
        let (inner, mut receiver) = create_mock_client::<User>(4);
        let client = UserClient::new(inner, AccessGate::default());
        let manager = Identity::new(UserId(2), Role::Manager);

        let err = client.list_users(&manager).await.unwrap_err();
        assert_eq!(
            err,
            UserError::Forbidden {
                role: Role::Manager,
                operation: Operation::ManageUsers,
            }
        );
        drop(client);
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn create_forwards_the_payload() {
        let (inner, mut receiver) = create_mock_client::<User>(4);
        let client = UserClient::new(inner, AccessGate::default());

        let task = tokio::spawn(async move {
            client
                .create_user(&admin(), UserCreate::new("EMP100", "Liza Santos", Role::Staff))
                .await
        });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.id_number, "EMP100");
        responder.send(Ok(UserId(5))).unwrap();

        assert_eq!(task.await.unwrap(), Ok(UserId(5)));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let (inner, mut receiver) = create_mock_client::<User>(4);
        let client = UserClient::new(inner, AccessGate::default());

        let task = tokio::spawn(async move { client.get_user(&admin(), UserId(9)).await });

        let (id, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        assert_eq!(id, UserId(9));
        responder.send(Ok(None)).unwrap();

        assert_eq!(task.await.unwrap(), Err(UserError::NotFound("9".into())));
    }

    #[tokio::test]
    async fn closed_directory_is_a_communication_error() {
        let (inner, receiver) = create_mock_client::<User>(4);
        drop(receiver);
        let client = UserClient::new(inner, AccessGate::default());

        let err = client.list_users(&admin()).await.unwrap_err();
        assert_eq!(
            err,
            UserError::ActorCommunicationError(FrameworkError::ActorClosed.to_string())
        );
    }
}
