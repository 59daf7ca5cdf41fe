use axum::{extract::State, Json};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::driver;
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::required_text;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i32,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user_id: i32,
    pub role: UserRole,
}

const MISSING_REGISTRATION_FIELDS: &str = "Name, phone, email, and password are required";

fn parse_role(role: Option<&str>) -> AppResult<UserRole> {
    match role.map(str::trim) {
        None | Some("") | Some("user") => Ok(UserRole::User),
        Some("driver") => Ok(UserRole::Driver),
        // Administrators only come from the start-up seed
        Some(other) => Err(AppError::BadRequest(format!("Invalid role: {}", other))),
    }
}

fn email_taken(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Email already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

/// Register a user account, plus the driver profile when `role` is "driver"
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    let name = required_text(payload.name, MISSING_REGISTRATION_FIELDS)?;
    let phone = required_text(payload.phone, MISSING_REGISTRATION_FIELDS)?;
    let email = required_text(payload.email, MISSING_REGISTRATION_FIELDS)?;
    let password = required_text(payload.password, MISSING_REGISTRATION_FIELDS)?;
    let role = parse_role(payload.role.as_deref())?;

    let password_hash = hash_password(&password)?;

    let txn = state.db.begin().await?;

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&txn)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let new_user = user::ActiveModel {
        name: Set(name),
        phone: Set(phone),
        email: Set(email),
        password_hash: Set(password_hash),
        role: Set(role),
        is_banned: Set(false),
        balance: Set(0.0),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    };

    let user = new_user.insert(&txn).await.map_err(email_taken)?;

    if role == UserRole::Driver {
        let new_driver = driver::ActiveModel {
            user_id: Set(user.id),
            vehicle_type: Set(payload.vehicle_type.unwrap_or_default()),
            license_plate: Set(payload.license_plate.unwrap_or_default()),
            is_available: Set(true),
            earnings: Set(0.0),
            ratings: Set(0.0),
            completed_orders: Set(0),
            live_location: Set(None),
            ..Default::default()
        };
        new_driver.insert(&txn).await?;
    }

    txn.commit().await?;

    tracing::info!(user_id = user.id, role = ?role, "User registered");

    Ok(Json(RegisterResponse {
        message: "Registration successful!".to_string(),
        user_id: user.id,
    }))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let email = payload.email.ok_or_else(invalid)?;
    let password = payload.password.ok_or_else(invalid)?;

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&password, &user.password_hash)? {
        tracing::warn!(user_id = user.id, "Rejected login");
        return Err(invalid());
    }

    if user.is_banned {
        return Err(AppError::Forbidden("Account has been banned".to_string()));
    }

    Ok(Json(LoginResponse {
        message: "Login successful!".to_string(),
        user_id: user.id,
        role: user.role,
    }))
}
