use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::payment_entity as payments;
use crate::error::{AppError, AppResult};

/// Persistence contract for per-subscriber billing state.
///
/// `put` is a full upsert with last-writer-wins semantics; no optimistic
/// concurrency is assumed. `find_by_subscription_id` is the webhook
/// correlation path and fails with `SubscriptionNotFoundError` when no record
/// carries the id.
#[async_trait]
pub trait SubscriptionRecordStore: Send + Sync {
    async fn get(&self, user_id: &str) -> AppResult<Option<payments::Model>>;

    async fn put(&self, record: payments::Model) -> AppResult<()>;

    async fn find_by_subscription_id(&self, subscription_id: &str)
    -> AppResult<payments::Model>;
}

#[derive(Clone)]
pub struct DbSubscriptionRecordStore {
    pool: DatabaseConnection,
}

impl DbSubscriptionRecordStore {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }
}

fn to_active(record: payments::Model) -> payments::ActiveModel {
    payments::ActiveModel {
        user_id: Set(record.user_id),
        trial_ends_at: Set(record.trial_ends_at),
        subscription_ends_at: Set(record.subscription_ends_at),
        is_active: Set(record.is_active),
        last_payment_at: Set(record.last_payment_at),
        next_payment_at: Set(record.next_payment_at),
        amount_cents: Set(record.amount_cents),
        subscription_id: Set(record.subscription_id),
        payment_method_id: Set(record.payment_method_id),
        status: Set(record.status),
        // created_at keeps its insert-time default
        created_at: sea_orm::ActiveValue::NotSet,
        updated_at: Set(Some(Utc::now())),
    }
}

#[async_trait]
impl SubscriptionRecordStore for DbSubscriptionRecordStore {
    async fn get(&self, user_id: &str) -> AppResult<Option<payments::Model>> {
        let record = payments::Entity::find_by_id(user_id.to_string())
            .one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn put(&self, record: payments::Model) -> AppResult<()> {
        payments::Entity::insert(to_active(record))
            .on_conflict(
                OnConflict::column(payments::Column::UserId)
                    .update_columns([
                        payments::Column::TrialEndsAt,
                        payments::Column::SubscriptionEndsAt,
                        payments::Column::IsActive,
                        payments::Column::LastPaymentAt,
                        payments::Column::NextPaymentAt,
                        payments::Column::AmountCents,
                        payments::Column::SubscriptionId,
                        payments::Column::PaymentMethodId,
                        payments::Column::Status,
                        payments::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_subscription_id(
        &self,
        subscription_id: &str,
    ) -> AppResult<payments::Model> {
        payments::Entity::find()
            .filter(payments::Column::SubscriptionId.eq(subscription_id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::SubscriptionNotFoundError(subscription_id.to_string()))
    }
}
