use axum::{
    extract::State,
    Json,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::booking::{self, BookingStatus};
use crate::entities::driver;
use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::handlers::bookings::{self, CancelledBy, OrderInfo, OrdersResponse};
use crate::handlers::notifications::{notify, Recipient};
use crate::utils::validate::{required_id, required_positive, required_text};
use crate::AppState;

async fn find_driver(state: &AppState, driver_id: i32) -> AppResult<driver::Model> {
    driver::Entity::find_by_id(driver_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))
}

// ============ Orders ============

/// List every booking still waiting for a driver
pub async fn available_orders(
    State(state): State<AppState>,
) -> AppResult<Json<OrdersResponse>> {
    let orders = booking::Entity::find()
        .filter(booking::Column::Status.eq(BookingStatus::Pending))
        .order_by_asc(booking::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderInfo::from).collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct OrderActionResponse {
    pub message: String,
    pub booking_id: i32,
}

/// Accept a pending booking. Accepting an already accepted booking is a
/// no-op; completed or cancelled bookings cannot be accepted.
pub async fn accept_order(
    State(state): State<AppState>,
    AppPath(booking_id): AppPath<i32>,
) -> AppResult<Json<OrderActionResponse>> {
    let txn = state.db.begin().await?;

    let moved = bookings::transition(
        &txn,
        booking_id,
        BookingStatus::Pending,
        BookingStatus::Accepted,
        "Only pending orders can be accepted",
    )
    .await;

    match moved {
        Ok(booking) => {
            notify(
                &txn,
                Recipient::User(booking.user_id),
                format!("Driver {} has accepted your booking.", booking.driver_id),
            )
            .await?;

            tracing::info!(booking_id, driver_id = booking.driver_id, "Booking accepted");
        }
        // Lost the race to another accept, or accepted earlier
        Err(AppError::Conflict(msg)) => {
            let current = bookings::find(&txn, booking_id).await?;
            if current.status != BookingStatus::Accepted {
                return Err(AppError::Conflict(msg));
            }
        }
        Err(e) => return Err(e),
    }

    txn.commit().await?;

    Ok(Json(OrderActionResponse {
        message: "Order accepted!".to_string(),
        booking_id,
    }))
}

/// Finish an accepted booking and credit its price to the driver
pub async fn complete_order(
    State(state): State<AppState>,
    AppPath(booking_id): AppPath<i32>,
) -> AppResult<Json<OrderActionResponse>> {
    let txn = state.db.begin().await?;

    let booking = bookings::transition(
        &txn,
        booking_id,
        BookingStatus::Accepted,
        BookingStatus::Completed,
        "Only accepted orders can be completed",
    )
    .await?;

    driver::Entity::update_many()
        .col_expr(
            driver::Column::Earnings,
            Expr::col(driver::Column::Earnings).add(booking.price),
        )
        .filter(driver::Column::Id.eq(booking.driver_id))
        .exec(&txn)
        .await?;

    notify(
        &txn,
        Recipient::User(booking.user_id),
        format!("Booking {} has been completed.", booking.id),
    )
    .await?;

    txn.commit().await?;

    tracing::info!(
        booking_id,
        driver_id = booking.driver_id,
        price = booking.price,
        "Booking completed"
    );

    Ok(Json(OrderActionResponse {
        message: "Order completed!".to_string(),
        booking_id,
    }))
}

/// Drop an accepted booking
pub async fn cancel_order(
    State(state): State<AppState>,
    AppPath(booking_id): AppPath<i32>,
) -> AppResult<Json<serde_json::Value>> {
    bookings::cancel(&state, booking_id, CancelledBy::Driver).await?;
    Ok(Json(serde_json::json!({ "message": "Order cancelled successfully!" })))
}

/// List a driver's bookings
pub async fn order_history(
    State(state): State<AppState>,
    AppPath(driver_id): AppPath<i32>,
) -> AppResult<Json<OrdersResponse>> {
    let orders = booking::Entity::find()
        .filter(booking::Column::DriverId.eq(driver_id))
        .order_by_asc(booking::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(OrdersResponse {
        orders: orders.into_iter().map(OrderInfo::from).collect(),
    }))
}

// ============ Earnings ============

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub driver_id: Option<i32>,
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct WithdrawResponse {
    pub message: String,
    pub new_earnings: f64,
}

/// Pay out part of a driver's earnings
pub async fn withdraw(
    State(state): State<AppState>,
    AppJson(payload): AppJson<WithdrawRequest>,
) -> AppResult<Json<WithdrawResponse>> {
    const MISSING: &str = "Driver ID and amount are required";
    let driver_id = required_id(payload.driver_id, MISSING)?;
    let amount = required_positive(payload.amount, MISSING)?;

    let txn = state.db.begin().await?;

    // The sufficiency check lives in the WHERE clause, so concurrent
    // withdrawals are serialised by the row update itself.
    let result = driver::Entity::update_many()
        .col_expr(
            driver::Column::Earnings,
            Expr::col(driver::Column::Earnings).sub(amount),
        )
        .filter(driver::Column::Id.eq(driver_id))
        .filter(driver::Column::Earnings.gte(amount))
        .exec(&txn)
        .await?;

    let driver = driver::Entity::find_by_id(driver_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict("Insufficient earnings".to_string()));
    }

    txn.commit().await?;

    tracing::info!(driver_id, amount, "Withdrawal processed");

    Ok(Json(WithdrawResponse {
        message: "Withdrawal successful!".to_string(),
        new_earnings: driver.earnings,
    }))
}

// ============ Availability & location ============

#[derive(Debug, Deserialize)]
pub struct ToggleAvailabilityRequest {
    pub driver_id: Option<i32>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub message: String,
    pub is_available: bool,
}

pub async fn toggle_availability(
    State(state): State<AppState>,
    AppJson(payload): AppJson<ToggleAvailabilityRequest>,
) -> AppResult<Json<AvailabilityResponse>> {
    const MISSING: &str = "Driver ID and availability status are required";
    let driver_id = required_id(payload.driver_id, MISSING)?;
    let is_available = payload
        .is_available
        .ok_or_else(|| AppError::BadRequest(MISSING.to_string()))?;

    let driver = find_driver(&state, driver_id).await?;

    let mut active: driver::ActiveModel = driver.into();
    active.is_available = Set(is_available);
    let updated = active.update(&state.db).await?;

    Ok(Json(AvailabilityResponse {
        message: "Availability updated successfully!".to_string(),
        is_available: updated.is_available,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub driver_id: Option<i32>,
    pub live_location: Option<String>,
}

/// Store the driver's last reported position
pub async fn update_location(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateLocationRequest>,
) -> AppResult<Json<serde_json::Value>> {
    const MISSING: &str = "Driver ID and live location are required";
    let driver_id = required_id(payload.driver_id, MISSING)?;
    let live_location = required_text(payload.live_location, MISSING)?;

    let driver = find_driver(&state, driver_id).await?;

    let mut active: driver::ActiveModel = driver.into();
    active.live_location = Set(Some(live_location));
    active.update(&state.db).await?;

    Ok(Json(serde_json::json!({ "message": "Driver location updated successfully!" })))
}
