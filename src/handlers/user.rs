use axum::{
    extract::State,
    Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::payment::{self, PaymentStatus};
use crate::entities::support_ticket::{self, TicketStatus};
use crate::entities::{driver, promo_code, review, user};
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::handlers::bookings::{self, CancelledBy, OrderInfo, OrdersResponse};
use crate::handlers::notifications::{notify, notify_admin, Recipient};
use crate::utils::pricing::{apply_discount, quote_distance, quote_price};
use crate::utils::validate::{required_id, required_positive, required_text};
use crate::AppState;

/// Load a user that may act on the platform: unknown ids are `NotFound`,
/// banned accounts are `Forbidden`.
pub async fn active_user<C: ConnectionTrait>(db: &C, user_id: i32) -> AppResult<user::Model> {
    let user = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.is_banned {
        return Err(AppError::Forbidden("Account has been banned".to_string()));
    }

    Ok(user)
}

/// Look up a promo code that can currently be redeemed
async fn active_promo<C: ConnectionTrait>(
    db: &C,
    code: &str,
) -> AppResult<Option<promo_code::Model>> {
    Ok(promo_code::Entity::find()
        .filter(promo_code::Column::Code.eq(code))
        .filter(promo_code::Column::IsActive.eq(true))
        .one(db)
        .await?)
}

// ============ Discovery ============

#[derive(Debug, Deserialize)]
pub struct SearchDriversRequest {
    pub pickup_location: Option<String>,
    pub dropoff_location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DriverQuote {
    pub driver_id: i32,
    pub name: String,
    pub vehicle_type: String,
    pub ratings: f64,
    pub completed_orders: i32,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct SearchDriversResponse {
    pub distance: f64,
    pub price: f64,
    pub drivers: Vec<DriverQuote>,
}

/// Quote a trip and list every available driver
pub async fn search_drivers(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SearchDriversRequest>,
) -> AppResult<Json<SearchDriversResponse>> {
    const MISSING: &str = "Pickup and dropoff locations are required";
    let pickup = required_text(payload.pickup_location, MISSING)?;
    let dropoff = required_text(payload.dropoff_location, MISSING)?;

    let distance = quote_distance(&pickup, &dropoff);
    let price = quote_price(distance, state.config.fare_per_km);

    let drivers = driver::Entity::find()
        .filter(driver::Column::IsAvailable.eq(true))
        .order_by_asc(driver::Column::Id)
        .find_also_related(user::Entity)
        .all(&state.db)
        .await?;

    let drivers = drivers
        .into_iter()
        .map(|(d, u)| DriverQuote {
            driver_id: d.id,
            name: u.map(|u| u.name).unwrap_or_default(),
            vehicle_type: d.vehicle_type,
            ratings: d.ratings,
            completed_orders: d.completed_orders,
            price,
        })
        .collect();

    Ok(Json(SearchDriversResponse {
        distance,
        price,
        drivers,
    }))
}

// ============ Booking ============

#[derive(Debug, Default, Deserialize)]
pub struct BookDriverRequest {
    pub user_id: Option<i32>,
    pub driver_id: Option<i32>,
    #[serde(alias = "pickup")]
    pub pickup_location: Option<String>,
    #[serde(alias = "dropoff")]
    pub dropoff_location: Option<String>,
    pub distance: Option<f64>,
    pub price: Option<f64>,
    pub promo_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BookDriverResponse {
    pub message: String,
    pub booking_id: i32,
    pub price: f64,
}

/// Book a driver, applying an active promo code to the quoted price
pub async fn book_driver(
    State(state): State<AppState>,
    AppJson(payload): AppJson<BookDriverRequest>,
) -> AppResult<Json<BookDriverResponse>> {
    const MISSING: &str = "Missing required fields";
    let user_id = required_id(payload.user_id, MISSING)?;
    let driver_id = required_id(payload.driver_id, MISSING)?;
    let pickup = required_text(payload.pickup_location, MISSING)?;
    let dropoff = required_text(payload.dropoff_location, MISSING)?;
    let distance = required_positive(payload.distance, MISSING)?;
    let mut price = required_positive(payload.price, MISSING)?;

    let txn = state.db.begin().await?;

    active_user(&txn, user_id).await?;

    driver::Entity::find_by_id(driver_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    // A code that does not resolve leaves the price untouched and is not
    // stamped, so it can still be applied later.
    let mut applied_code = None;
    if let Some(code) = payload.promo_code.filter(|c| !c.trim().is_empty()) {
        if let Some(promo) = active_promo(&txn, &code).await? {
            price = apply_discount(price, promo.discount);
            applied_code = Some(promo.code);
        }
    }

    let booking = booking::ActiveModel {
        user_id: Set(user_id),
        driver_id: Set(driver_id),
        pickup_location: Set(pickup),
        dropoff_location: Set(dropoff),
        distance: Set(distance),
        price: Set(price),
        status: Set(BookingStatus::Pending),
        promo_code: Set(applied_code),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    notify(
        &txn,
        Recipient::Driver(driver_id),
        format!("New booking request from User {}.", user_id),
    )
    .await?;

    txn.commit().await?;

    tracing::info!(booking_id = booking.id, user_id, driver_id, price, "Booking created");

    Ok(Json(BookDriverResponse {
        message: "Driver booked successfully!".to_string(),
        booking_id: booking.id,
        price: booking.price,
    }))
}

/// Cancel a booking that no driver has accepted yet
pub async fn cancel_order(
    State(state): State<AppState>,
    AppPath(booking_id): AppPath<i32>,
) -> AppResult<Json<serde_json::Value>> {
    bookings::cancel(&state, booking_id, CancelledBy::User).await?;
    Ok(Json(serde_json::json!({ "message": "Order cancelled successfully!" })))
}

/// List a user's bookings
pub async fn order_history(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i32>,
) -> AppResult<Json<OrdersResponse>> {
    let orders = booking::Entity::find()
        .filter(booking::Column::UserId.eq(user_id))
        .order_by_asc(booking::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderInfo::from).collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct TrackDriverResponse {
    pub booking_id: i32,
    pub driver_id: i32,
    pub live_location: String,
}

/// Last reported location of the driver serving a booking
pub async fn track_driver(
    State(state): State<AppState>,
    AppPath(booking_id): AppPath<i32>,
) -> AppResult<Json<TrackDriverResponse>> {
    let booking = bookings::find(&state.db, booking_id).await?;

    let driver = driver::Entity::find_by_id(booking.driver_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    let live_location = driver
        .live_location
        .ok_or_else(|| AppError::NotFound("Driver location not available".to_string()))?;

    Ok(Json(TrackDriverResponse {
        booking_id: booking.id,
        driver_id: driver.id,
        live_location,
    }))
}

// ============ Wallet ============

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub user_id: Option<i32>,
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DepositResponse {
    pub message: String,
    pub new_balance: f64,
    pub transaction_id: String,
}

/// Credit a user's wallet and record the payment
pub async fn deposit(
    State(state): State<AppState>,
    AppJson(payload): AppJson<DepositRequest>,
) -> AppResult<Json<DepositResponse>> {
    const MISSING: &str = "User ID and amount are required";
    let user_id = required_id(payload.user_id, MISSING)?;
    let amount = required_positive(payload.amount, MISSING)?;

    let txn = state.db.begin().await?;

    active_user(&txn, user_id).await?;

    user::Entity::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).add(amount),
        )
        .filter(user::Column::Id.eq(user_id))
        .exec(&txn)
        .await?;

    let payment = payment::ActiveModel {
        user_id: Set(user_id),
        amount: Set(amount),
        transaction_id: Set(Uuid::new_v4().to_string()),
        status: Set(PaymentStatus::Completed),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let user = active_user(&txn, user_id).await?;

    txn.commit().await?;

    tracing::info!(user_id, amount, "Deposit recorded");

    Ok(Json(DepositResponse {
        message: "Deposit successful!".to_string(),
        new_balance: user.balance,
        transaction_id: payment.transaction_id,
    }))
}

#[derive(Debug, Serialize)]
pub struct PaymentInfo {
    pub id: i32,
    pub amount: f64,
    pub transaction_id: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PaymentsResponse {
    pub payments: Vec<PaymentInfo>,
}

pub async fn payment_history(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<i32>,
) -> AppResult<Json<PaymentsResponse>> {
    let payments = payment::Entity::find()
        .filter(payment::Column::UserId.eq(user_id))
        .order_by_asc(payment::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(PaymentsResponse {
        payments: payments
            .into_iter()
            .map(|p| PaymentInfo {
                id: p.id,
                amount: p.amount,
                transaction_id: p.transaction_id,
                status: p.status,
                created_at: p.created_at.with_timezone(&Utc),
            })
            .collect(),
    }))
}

// ============ Promo codes ============

#[derive(Debug, Deserialize)]
pub struct ApplyPromoRequest {
    pub promo_code: Option<String>,
    pub booking_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ApplyPromoResponse {
    pub message: String,
    pub new_price: f64,
}

/// Discount an existing booking. A booking carries at most one promo code,
/// whether it was applied at creation or here.
pub async fn apply_promo_code(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ApplyPromoRequest>,
) -> AppResult<Json<ApplyPromoResponse>> {
    const MISSING: &str = "Promo code and booking ID are required";
    let code = required_text(payload.promo_code, MISSING)?;
    let booking_id = required_id(payload.booking_id, MISSING)?;

    let txn = state.db.begin().await?;

    let promo = active_promo(&txn, &code)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid or inactive promo code".to_string()))?;

    let booking = bookings::find(&txn, booking_id).await?;

    if matches!(
        booking.status,
        BookingStatus::Completed | BookingStatus::Cancelled
    ) {
        return Err(AppError::Conflict(
            "Promo codes can only be applied to open bookings".to_string(),
        ));
    }

    let new_price = apply_discount(booking.price, promo.discount);

    let result = booking::Entity::update_many()
        .set(booking::ActiveModel {
            price: Set(new_price),
            promo_code: Set(Some(promo.code.clone())),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::PromoCode.is_null())
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(
            "A promo code has already been applied to this booking".to_string(),
        ));
    }

    txn.commit().await?;

    tracing::info!(booking_id, code = %promo.code, new_price, "Promo code applied");

    Ok(Json(ApplyPromoResponse {
        message: "Promo code applied successfully!".to_string(),
        new_price,
    }))
}

// ============ Reviews ============

#[derive(Debug, Deserialize)]
pub struct SubmitReviewRequest {
    pub user_id: Option<i32>,
    pub driver_id: Option<i32>,
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

/// Record a review and fold it into the driver's running average
pub async fn submit_review(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmitReviewRequest>,
) -> AppResult<Json<serde_json::Value>> {
    const MISSING: &str = "User ID, driver ID, and rating are required";
    let user_id = required_id(payload.user_id, MISSING)?;
    let driver_id = required_id(payload.driver_id, MISSING)?;
    let rating = required_id(payload.rating, MISSING)?;

    if !(1..=5).contains(&rating) {
        return Err(AppError::BadRequest(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    let txn = state.db.begin().await?;

    active_user(&txn, user_id).await?;

    driver::Entity::find_by_id(driver_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    review::ActiveModel {
        user_id: Set(user_id),
        driver_id: Set(driver_id),
        rating: Set(rating),
        comment: Set(payload.comment.filter(|c| !c.is_empty())),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    // Both columns are computed from the pre-update row in one statement
    let new_average = Expr::cust_with_exprs(
        "($1 * $2 + $3) / ($4 + 1)",
        [
            Expr::col(driver::Column::Ratings).into(),
            Expr::col(driver::Column::CompletedOrders).into(),
            Expr::val(rating as f64).into(),
            Expr::col(driver::Column::CompletedOrders).into(),
        ],
    );

    driver::Entity::update_many()
        .col_expr(driver::Column::Ratings, new_average)
        .col_expr(
            driver::Column::CompletedOrders,
            Expr::col(driver::Column::CompletedOrders).add(1),
        )
        .filter(driver::Column::Id.eq(driver_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(user_id, driver_id, rating, "Review submitted");

    Ok(Json(serde_json::json!({ "message": "Review submitted successfully!" })))
}

// ============ Support ============

#[derive(Debug, Deserialize)]
pub struct SubmitTicketRequest {
    pub user_id: Option<i32>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitTicketResponse {
    pub message: String,
    pub ticket_id: i32,
}

/// Open a support ticket and let the administrator know
pub async fn submit_support_ticket(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SubmitTicketRequest>,
) -> AppResult<Json<SubmitTicketResponse>> {
    const MISSING: &str = "User ID, subject, and message are required";
    let user_id = required_id(payload.user_id, MISSING)?;
    let subject = required_text(payload.subject, MISSING)?;
    let message = required_text(payload.message, MISSING)?;

    let txn = state.db.begin().await?;

    active_user(&txn, user_id).await?;

    let ticket = support_ticket::ActiveModel {
        user_id: Set(user_id),
        subject: Set(subject),
        message: Set(message),
        status: Set(TicketStatus::Open),
        admin_reply: Set(None),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    notify_admin(&txn, format!("New support ticket from User {}.", user_id)).await?;

    txn.commit().await?;

    Ok(Json(SubmitTicketResponse {
        message: "Support ticket submitted successfully!".to_string(),
        ticket_id: ticket.id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    pub user_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct TicketInfo {
    pub id: i32,
    pub user_id: i32,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub admin_reply: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<support_ticket::Model> for TicketInfo {
    fn from(t: support_ticket::Model) -> Self {
        Self {
            id: t.id,
            user_id: t.user_id,
            subject: t.subject,
            message: t.message,
            status: t.status,
            admin_reply: t.admin_reply,
            created_at: t.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketsResponse {
    pub tickets: Vec<TicketInfo>,
}

/// A user's support tickets, newest first
pub async fn support_tickets(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TicketQuery>,
) -> AppResult<Json<TicketsResponse>> {
    let user_id = required_id(query.user_id, "User ID is required")?;

    let tickets = support_ticket::Entity::find()
        .filter(support_ticket::Column::UserId.eq(user_id))
        .order_by_desc(support_ticket::Column::CreatedAt)
        .order_by_desc(support_ticket::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(TicketsResponse {
        tickets: tickets.into_iter().map(TicketInfo::from).collect(),
    }))
}
