//! User profiles
//!
//! Registration and lookup. The caller is already authenticated; this
//! service only keeps profile data that reservations refer to.

use std::sync::Arc;

use tracing::info;

use crate::domain::{DomainError, DomainResult, NewUser, RepositoryProvider, User, UserRole};

pub struct UserService {
    repos: Arc<dyn RepositoryProvider>,
}

impl UserService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn register(&self, user: NewUser) -> DomainResult<User> {
        user.validate()?;

        if self
            .repos
            .users()
            .find_by_username_or_email(&user.username, &user.email)
            .await?
            .is_some()
        {
            return Err(DomainError::Conflict(format!(
                "Username or email already exists: {} / {}",
                user.username, user.email
            )));
        }

        let user = self.repos.users().create(user).await?;
        info!(user_id = user.id, username = %user.username, role = user.role.as_str(), "User registered");
        Ok(user)
    }

    pub async fn get(&self, user_id: i32) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }

    /// Make sure an admin profile with this username/email exists
    pub async fn ensure_admin(&self, username: &str, email: &str) -> DomainResult<User> {
        if let Some(existing) = self
            .repos
            .users()
            .find_by_username_or_email(username, email)
            .await?
        {
            info!(user_id = existing.id, "Admin profile already exists");
            return Ok(existing);
        }

        self.register(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            role: UserRole::Admin,
            vehicle_number: None,
            pin_code: None,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn service() -> UserService {
        UserService::new(Arc::new(InMemoryRepositoryProvider::new()))
    }

    fn driver(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            role: UserRole::Regular,
            vehicle_number: Some("MH12AB0001".into()),
            pin_code: Some("411001".into()),
        }
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let service = service();
        service.register(driver("asha", "asha@example.com")).await.unwrap();

        assert!(matches!(
            service.register(driver("asha", "other@example.com")).await,
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            service.register(driver("other", "asha@example.com")).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let service = service();
        let first = service.ensure_admin("admin", "admin@example.com").await.unwrap();
        let second = service.ensure_admin("admin", "admin@example.com").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn get_unknown_user_is_not_found() {
        assert!(matches!(
            service().get(3).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
