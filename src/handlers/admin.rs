use axum::{
    extract::State,
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::booking::{self, BookingStatus};
use crate::entities::support_ticket::{self, TicketStatus};
use crate::entities::user::{self, UserRole};
use crate::entities::promo_code;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::handlers::notifications::{notify, Recipient};
use crate::handlers::user::{TicketInfo, TicketsResponse};
use crate::utils::validate::{required_positive, required_text};
use crate::AppState;

// ============ User Management ============

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub is_banned: bool,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

/// List all users (admin)
pub async fn manage_users(State(state): State<AppState>) -> AppResult<Json<UsersResponse>> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;

    let users = users
        .into_iter()
        .map(|u| UserSummary {
            user_id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            role: u.role,
            is_banned: u.is_banned,
            balance: u.balance,
            created_at: u.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(UsersResponse { users }))
}

/// Ban a user (admin). Banned accounts can no longer log in, book, deposit,
/// review or open tickets.
pub async fn ban_user(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let user = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.role == UserRole::Admin {
        return Err(AppError::Conflict("Administrators cannot be banned".to_string()));
    }

    let mut active: user::ActiveModel = user.into();
    active.is_banned = Set(true);
    let updated = active.update(&state.db).await?;

    tracing::info!(user_id, "User banned");

    Ok(Json(serde_json::json!({
        "message": format!("User {} has been banned.", updated.name)
    })))
}

// ============ Support Tickets ============

#[derive(Debug, Serialize)]
pub struct AdminTicketInfo {
    #[serde(flatten)]
    pub ticket: TicketInfo,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Debug, Serialize)]
pub struct AdminTicketsResponse {
    pub tickets: Vec<AdminTicketInfo>,
}

/// List every support ticket with its author, newest first (admin)
pub async fn support_tickets(
    State(state): State<AppState>,
) -> AppResult<Json<AdminTicketsResponse>> {
    let tickets = support_ticket::Entity::find()
        .order_by_desc(support_ticket::Column::CreatedAt)
        .order_by_desc(support_ticket::Column::Id)
        .find_also_related(user::Entity)
        .all(&state.db)
        .await?;

    let tickets = tickets
        .into_iter()
        .map(|(t, u)| {
            let user_id = t.user_id;
            AdminTicketInfo {
                ticket: TicketInfo::from(t),
                user_name: u
                    .as_ref()
                    .map(|u| u.name.clone())
                    .unwrap_or_else(|| format!("User {}", user_id)),
                user_email: u
                    .map(|u| u.email)
                    .unwrap_or_else(|| "Unknown".to_string()),
            }
        })
        .collect();

    Ok(Json(AdminTicketsResponse { tickets }))
}

/// Every support ticket as stored, newest first, without the author lookup (admin)
pub async fn all_support_tickets(
    State(state): State<AppState>,
) -> AppResult<Json<TicketsResponse>> {
    let tickets = support_ticket::Entity::find()
        .order_by_desc(support_ticket::Column::CreatedAt)
        .order_by_desc(support_ticket::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(TicketsResponse {
        tickets: tickets.into_iter().map(TicketInfo::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReplyTicketRequest {
    pub admin_reply: Option<String>,
}

/// Resolve a ticket with a reply and notify its author (admin)
pub async fn reply_support_ticket(
    State(state): State<AppState>,
    AppPath(ticket_id): AppPath<i32>,
    AppJson(payload): AppJson<ReplyTicketRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let reply = required_text(payload.admin_reply, "Admin reply is required")?;

    let txn = state.db.begin().await?;

    // Only an open ticket can be resolved, so a second reply matches no row
    let result = support_ticket::Entity::update_many()
        .set(support_ticket::ActiveModel {
            admin_reply: Set(Some(reply.clone())),
            status: Set(TicketStatus::Resolved),
            ..Default::default()
        })
        .filter(support_ticket::Column::Id.eq(ticket_id))
        .filter(support_ticket::Column::Status.eq(TicketStatus::Open))
        .exec(&txn)
        .await?;

    let ticket = support_ticket::Entity::find_by_id(ticket_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Support ticket not found".to_string()))?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "Support ticket is already resolved".to_string(),
        ));
    }

    let user_id = ticket.user_id;

    notify(
        &txn,
        Recipient::User(user_id),
        format!("Admin has replied to your support ticket: {}.", reply),
    )
    .await?;

    txn.commit().await?;

    tracing::info!(ticket_id, "Support ticket resolved");

    Ok(Json(serde_json::json!({ "message": "Support ticket resolved successfully!" })))
}

// ============ Escrow ============

#[derive(Debug, Serialize)]
pub struct EscrowEntry {
    pub booking_id: i32,
    pub user_id: i32,
    pub driver_id: i32,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct EscrowResponse {
    pub escrow: Vec<EscrowEntry>,
}

/// Completed bookings and the amount each one carried (admin)
pub async fn escrow(State(state): State<AppState>) -> AppResult<Json<EscrowResponse>> {
    let bookings = booking::Entity::find()
        .filter(booking::Column::Status.eq(BookingStatus::Completed))
        .order_by_asc(booking::Column::Id)
        .all(&state.db)
        .await?;

    let escrow = bookings
        .into_iter()
        .map(|b| EscrowEntry {
            booking_id: b.id,
            user_id: b.user_id,
            driver_id: b.driver_id,
            price: b.price,
            created_at: b.created_at.with_timezone(&Utc),
        })
        .collect();

    Ok(Json(EscrowResponse { escrow }))
}

// ============ Promo Codes ============

#[derive(Debug, Deserialize)]
pub struct CreatePromoRequest {
    pub code: Option<String>,
    pub discount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CreatePromoResponse {
    pub message: String,
    pub promo_id: i32,
}

fn code_taken(e: DbErr) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Promo code already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

/// Create an active promo code (admin)
pub async fn create_promo_code(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePromoRequest>,
) -> AppResult<Json<CreatePromoResponse>> {
    const MISSING: &str = "Code and discount are required";
    let code = required_text(payload.code, MISSING)?;
    let discount = required_positive(payload.discount, MISSING)?;

    if discount > 100.0 {
        return Err(AppError::BadRequest(
            "Discount must be a percentage between 0 and 100".to_string(),
        ));
    }

    let existing = promo_code::Entity::find()
        .filter(promo_code::Column::Code.eq(&code))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Promo code already exists".to_string()));
    }

    let promo = promo_code::ActiveModel {
        code: Set(code),
        discount: Set(discount),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(code_taken)?;

    tracing::info!(code = %promo.code, discount, "Promo code created");

    Ok(Json(CreatePromoResponse {
        message: "Promo code created successfully!".to_string(),
        promo_id: promo.id,
    }))
}

/// Deactivate a promo code (admin). There is no way back.
pub async fn disable_promo_code(
    State(state): State<AppState>,
    AppPath(promo_id): AppPath<i32>,
) -> AppResult<Json<serde_json::Value>> {
    let promo = promo_code::Entity::find_by_id(promo_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Promo code not found".to_string()))?;

    let mut active: promo_code::ActiveModel = promo.into();
    active.is_active = Set(false);
    active.update(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "Promo code disabled successfully!" })))
}

#[derive(Debug, Serialize)]
pub struct PromoCodesResponse {
    pub promo_codes: Vec<promo_code::Model>,
}

/// List all promo codes, active or not (admin)
pub async fn list_promo_codes(
    State(state): State<AppState>,
) -> AppResult<Json<PromoCodesResponse>> {
    let promo_codes = promo_code::Entity::find()
        .order_by_asc(promo_code::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(PromoCodesResponse { promo_codes }))
}
