use chrono::Utc;

use crate::actor_framework::Entity;
use crate::domain::{User, UserCreate, UserId, UserPatch, DEFAULT_ADMIN_ID_NUMBER};

impl Entity for User {
    type Id = UserId;
    type CreatePayload = UserCreate;
    type Patch = UserPatch;
    const KIND: &'static str = "user";

    fn id(&self) -> UserId {
        self.id
    }

    fn unique_key(&self) -> Option<&str> {
        Some(&self.id_number)
    }

    fn from_create(id: UserId, payload: UserCreate) -> Result<Self, String> {
        let id_number = payload.id_number.trim().to_string();
        let full_name = payload.full_name.trim().to_string();
        if id_number.is_empty() {
            return Err("id number is required".to_string());
        }
        if full_name.is_empty() {
            return Err("full name is required".to_string());
        }
        Ok(Self {
            id,
            id_number,
            full_name,
            role: payload.role,
            created_at: Utc::now(),
        })
    }

    /// Badge numbers are immutable; only the name and role can change.
    fn on_update(&mut self, patch: UserPatch) -> Result<(), String> {
        if let Some(full_name) = patch.full_name {
            let full_name = full_name.trim();
            if full_name.is_empty() {
                return Err("full name is required".to_string());
            }
            self.full_name = full_name.to_string();
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        Ok(())
    }

    fn on_delete(&self) -> Result<(), String> {
        if self.id_number == DEFAULT_ADMIN_ID_NUMBER {
            return Err("the default administrator cannot be deleted".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::{Table, TableError};
    use crate::domain::Role;

    #[test]
    fn default_admin_cannot_be_removed() {
        let mut users: Table<User> = Table::new();
        let admin = users
            .create(UserCreate::new(DEFAULT_ADMIN_ID_NUMBER, "System Administrator", Role::Admin))
            .unwrap();
        let clerk = users
            .create(UserCreate::new("EMP042", "Rosa Dizon", Role::Staff))
            .unwrap();

        assert!(matches!(users.remove(admin), Err(TableError::Rejected { .. })));
        assert!(users.remove(clerk).is_ok());
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn badge_numbers_are_unique_and_trimmed() {
        let mut users: Table<User> = Table::new();
        users.create(UserCreate::new(" EMP001 ", "Ana Cruz", Role::Manager)).unwrap();
        let err = users
            .create(UserCreate::new("EMP001", "Someone Else", Role::Staff))
            .unwrap_err();
        assert_eq!(
            err,
            TableError::Duplicate {
                kind: "user",
                key: "EMP001".into()
            }
        );
    }

    #[test]
    fn blank_name_patch_is_rejected() {
        let mut users: Table<User> = Table::new();
        let id = users.create(UserCreate::new("EMP007", "Ben Reyes", Role::Staff)).unwrap();
        let patch = UserPatch {
            full_name: Some("  ".into()),
            role: Some(Role::Manager),
        };
        assert!(users.update(id, patch).is_err());
        assert_eq!(users.get(id).unwrap().role, Role::Staff);
    }
}
