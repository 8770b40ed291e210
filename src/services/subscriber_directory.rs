use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait};

use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::UserRole;

/// The account fields billing needs; everything else about a user belongs to
/// the account service.
#[derive(Debug, Clone)]
pub struct SubscriberProfile {
    pub user_id: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    async fn profile(&self, user_id: &str) -> AppResult<SubscriberProfile>;
}

#[derive(Clone)]
pub struct DbSubscriberDirectory {
    pool: DatabaseConnection,
}

impl DbSubscriberDirectory {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberDirectory for DbSubscriberDirectory {
    async fn profile(&self, user_id: &str) -> AppResult<SubscriberProfile> {
        let user = users::Entity::find_by_id(user_id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))?;

        let role: UserRole = user.role.parse()?;

        Ok(SubscriberProfile {
            user_id: user.id,
            email: user.email,
            role,
            created_at: user.created_at.unwrap_or_else(Utc::now),
        })
    }
}
