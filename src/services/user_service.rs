use aws_sdk_dynamodb::types::ReturnValue;
use tracing::{info, instrument};

use crate::dynamodb::{Document, ReadOptions, RepositoryFactory, SimpleRepository};
use crate::models::User;
use crate::services::{ServiceError, ServiceResult};

pub struct UserService {
    repository: SimpleRepository<String, User>,
}

impl UserService {
    pub fn new(repository: SimpleRepository<String, User>) -> Self {
        Self { repository }
    }

    pub fn from_factory(factory: &RepositoryFactory, table_name: &str, key_name: &str) -> Self {
        Self::new(factory.get::<String, User>(table_name, key_name))
    }

    /// Reads a user without the password attribute.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: &str) -> ServiceResult<User> {
        let options = ReadOptions::default().attributes(User::PUBLIC_ATTRIBUTES);
        self.repository
            .get_with(&id.to_string(), None, &options)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound { id: id.to_string() })
    }

    /// The stored attributes of a user, untyped, without the password.
    #[instrument(skip(self))]
    pub async fn get_user_document(&self, id: &str) -> ServiceResult<Document> {
        let options = ReadOptions::default().attributes(User::PUBLIC_ATTRIBUTES);
        self.repository
            .get_document(&id.to_string(), None, &options)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound { id: id.to_string() })
    }

    #[instrument(skip(self))]
    pub async fn get_all_users(&self) -> ServiceResult<Vec<User>> {
        let users = self.repository.scan(&[], &ReadOptions::default()).await?;
        info!("Found {} users", users.len());
        Ok(users)
    }

    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn create_user(&self, user: &User) -> ServiceResult<()> {
        if user.user_id.is_empty() {
            return Err(ServiceError::ValidationError {
                message: "User ID cannot be empty".to_string(),
            });
        }
        self.repository.insert(user).await?;
        Ok(())
    }

    /// Writes the non-default fields of `user` and returns the stored result.
    #[instrument(skip(self, user), fields(user_id = %user.user_id))]
    pub async fn update_user(&self, user: &User) -> ServiceResult<User> {
        self.repository
            .partial_update(user, ReturnValue::AllNew)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound {
                id: user.user_id.clone(),
            })
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: &str) -> ServiceResult<()> {
        self.repository.delete(&id.to_string(), None).await?;
        Ok(())
    }
}
