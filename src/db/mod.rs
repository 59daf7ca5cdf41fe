use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};

use crate::config::Config;
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::utils::password::hash_password;

pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging(false);

    // Every connection to an in-memory SQLite URL opens a separate database.
    if config.database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }

    Database::connect(options)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))
}

/// Create the administrator account unless a user with the configured email
/// already exists. Returns the admin's id.
pub async fn seed_admin(db: &DatabaseConnection, config: &Config) -> AppResult<i32> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&config.admin_email))
        .one(db)
        .await?;

    if let Some(admin) = existing {
        return Ok(admin.id);
    }

    let password_hash = hash_password(&config.admin_password)?;

    let admin = user::ActiveModel {
        name: Set("Admin".to_string()),
        phone: Set("1234567890".to_string()),
        email: Set(config.admin_email.clone()),
        password_hash: Set(password_hash),
        role: Set(UserRole::Admin),
        is_banned: Set(false),
        balance: Set(0.0),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    let admin = admin.insert(db).await?;
    tracing::info!("Admin account created: {}", admin.email);

    Ok(admin.id)
}
