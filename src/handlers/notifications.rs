use axum::{
    extract::State,
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::entities::notification;
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::extract::AppPath;
use crate::AppState;

/// Who a notification is addressed to
#[derive(Debug, Clone, Copy)]
pub enum Recipient {
    User(i32),
    Driver(i32),
}

/// Persist a notification row on the caller's connection or transaction
pub async fn notify<C: ConnectionTrait>(
    db: &C,
    recipient: Recipient,
    message: impl Into<String>,
) -> AppResult<()> {
    let (user_id, driver_id) = match recipient {
        Recipient::User(id) => (Some(id), None),
        Recipient::Driver(id) => (None, Some(id)),
    };

    notification::ActiveModel {
        user_id: Set(user_id),
        driver_id: Set(driver_id),
        message: Set(message.into()),
        is_read: Set(false),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(())
}

/// Notify the first administrator account. Without an admin this is a no-op.
pub async fn notify_admin<C: ConnectionTrait>(db: &C, message: impl Into<String>) -> AppResult<()> {
    let admin = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Admin))
        .order_by_asc(user::Column::Id)
        .one(db)
        .await?;

    match admin {
        Some(admin) => notify(db, Recipient::User(admin.id), message).await,
        None => {
            tracing::debug!("No admin account to notify");
            Ok(())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationInfo {
    pub id: i32,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<NotificationInfo>,
}

async fn list_for(
    state: &AppState,
    column: notification::Column,
    owner_id: i32,
) -> AppResult<NotificationsResponse> {
    let notifications = notification::Entity::find()
        .filter(column.eq(owner_id))
        .order_by_asc(notification::Column::Id)
        .all(&state.db)
        .await?;

    Ok(NotificationsResponse {
        notifications: notifications
            .into_iter()
            .map(|n| NotificationInfo {
                id: n.id,
                message: n.message,
                is_read: n.is_read,
                created_at: n.created_at.with_timezone(&Utc),
            })
            .collect(),
    })
}

/// List notifications addressed to a user
pub async fn user_notifications(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i32>,
) -> AppResult<Json<NotificationsResponse>> {
    Ok(Json(
        list_for(&state, notification::Column::UserId, user_id).await?,
    ))
}

/// List notifications addressed to a driver
pub async fn driver_notifications(
    State(state): State<AppState>,
    AppPath(driver_id): AppPath<i32>,
) -> AppResult<Json<NotificationsResponse>> {
    Ok(Json(
        list_for(&state, notification::Column::DriverId, driver_id).await?,
    ))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AppPath(notification_id): AppPath<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let notification = notification::Entity::find_by_id(notification_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    let mut active: notification::ActiveModel = notification.into();
    active.is_read = Set(true);
    active.update(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "Notification marked as read!" })))
}
