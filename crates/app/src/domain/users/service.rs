//! Users service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;

use crate::domain::users::{
    data::NewUser,
    errors::UsersServiceError,
    records::{UserRecord, UserUuid},
    repository::PgUsersRepository,
};

#[derive(Debug, Clone)]
pub struct PgUsersService {
    repository: PgUsersRepository,
}

impl PgUsersService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PgUsersRepository::new(pool),
        }
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError> {
        let email = normalise_email(&user.email)?;

        self.repository
            .create_user(NewUser { email, ..user })
            .await
            .map_err(Into::into)
    }

    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, UsersServiceError> {
        self.repository.get_user(user).await.map_err(Into::into)
    }
}

#[automock]
#[async_trait]
/// Customer account operations.
pub trait UsersService: Send + Sync {
    /// Registers a customer account.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError>;

    /// Retrieves an active customer account.
    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, UsersServiceError>;
}

fn normalise_email(raw: &str) -> Result<String, UsersServiceError> {
    let email = raw.trim();

    let Some((local, domain)) = email.split_once('@') else {
        return Err(UsersServiceError::InvalidEmail);
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') || email.contains(' ') {
        return Err(UsersServiceError::InvalidEmail);
    }

    Ok(email.to_owned())
}
