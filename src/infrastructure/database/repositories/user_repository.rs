//! SeaORM implementation of UserRepository

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use super::db_err;
use crate::domain::{DomainResult, NewUser, User, UserRepository, UserRole};
use crate::infrastructure::database::entities::user;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: user::Model) -> User {
    User {
        id: m.id,
        username: m.username,
        email: m.email,
        role: UserRole::from_str(&m.role),
        vehicle_number: m.vehicle_number,
        pin_code: m.pin_code,
        created_at: m.created_at,
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn create(&self, u: NewUser) -> DomainResult<User> {
        debug!("Creating user: {}", u.username);

        let model = user::ActiveModel {
            username: Set(u.username),
            email: Set(u.email),
            role: Set(u.role.as_str().to_string()),
            vehicle_number: Set(u.vehicle_number),
            pin_code: Set(u.pin_code),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let model = model.insert(&self.db).await.map_err(db_err)?;
        Ok(model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(username))
                    .add(user::Column::Email.eq(email)),
            )
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::repositories::test_support::memory_db;

    #[tokio::test]
    async fn lookup_by_username_or_email() {
        let repo = SeaOrmUserRepository::new(memory_db().await);
        let created = repo
            .create(NewUser {
                username: "admin".into(),
                email: "admin@example.com".into(),
                role: UserRole::Admin,
                vehicle_number: None,
                pin_code: None,
            })
            .await
            .unwrap();

        let by_name = repo
            .find_by_username_or_email("admin", "nobody@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_name.id, created.id);
        assert_eq!(by_name.role, UserRole::Admin);

        assert!(repo
            .find_by_username_or_email("ghost", "ghost@example.com")
            .await
            .unwrap()
            .is_none());
    }
}
