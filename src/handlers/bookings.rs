//! Booking status transitions shared by the user and driver handlers.
//!
//! Every transition is a single conditional `UPDATE ... WHERE status IN (..)`
//! so two callers racing on the same booking cannot both move it.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::Serialize;

use crate::entities::booking::{self, BookingStatus};
use crate::error::{AppError, AppResult};
use crate::handlers::notifications::{notify, Recipient};
use crate::AppState;

/// Which side of a booking asked for the cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelledBy {
    User,
    Driver,
}

impl CancelledBy {
    /// Status a booking must be in for this side to cancel it
    pub fn required_status(self) -> BookingStatus {
        match self {
            CancelledBy::User => BookingStatus::Pending,
            CancelledBy::Driver => BookingStatus::Accepted,
        }
    }

    pub fn rejection(self) -> &'static str {
        match self {
            CancelledBy::User => "Only pending orders can be cancelled",
            CancelledBy::Driver => "Only accepted orders can be cancelled by drivers",
        }
    }
}

/// Move a booking from `from` to `to`.
///
/// Returns the updated booking, `NotFound` for an unknown id, or
/// `Conflict(rejection)` when the booking is in any other status.
pub async fn transition<C: ConnectionTrait>(
    db: &C,
    booking_id: i32,
    from: BookingStatus,
    to: BookingStatus,
    rejection: &str,
) -> AppResult<booking::Model> {
    let result = booking::Entity::update_many()
        .set(booking::ActiveModel {
            status: Set(to),
            ..Default::default()
        })
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::Status.eq(from))
        .exec(db)
        .await?;

    let booking = find(db, booking_id).await?;

    if result.rows_affected == 0 {
        return Err(AppError::Conflict(rejection.to_string()));
    }

    Ok(booking)
}

pub async fn find<C: ConnectionTrait>(db: &C, booking_id: i32) -> AppResult<booking::Model> {
    booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))
}

/// Cancel a booking on behalf of one side and notify the other
pub async fn cancel(
    state: &AppState,
    booking_id: i32,
    by: CancelledBy,
) -> AppResult<booking::Model> {
    let txn = state.db.begin().await?;

    let booking = transition(
        &txn,
        booking_id,
        by.required_status(),
        BookingStatus::Cancelled,
        by.rejection(),
    )
    .await?;

    match by {
        CancelledBy::User => {
            notify(
                &txn,
                Recipient::Driver(booking.driver_id),
                format!("User {} has cancelled booking {}.", booking.user_id, booking.id),
            )
            .await?
        }
        CancelledBy::Driver => {
            notify(
                &txn,
                Recipient::User(booking.user_id),
                format!("Driver {} has cancelled booking {}.", booking.driver_id, booking.id),
            )
            .await?
        }
    }

    txn.commit().await?;

    tracing::info!(booking_id, by = ?by, "Booking cancelled");

    Ok(booking)
}

/// Row of an order history listing
#[derive(Debug, Serialize)]
pub struct OrderInfo {
    pub booking_id: i32,
    pub user_id: i32,
    pub driver_id: i32,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub distance: f64,
    pub price: f64,
    pub status: BookingStatus,
    pub promo_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<booking::Model> for OrderInfo {
    fn from(b: booking::Model) -> Self {
        Self {
            booking_id: b.id,
            user_id: b.user_id,
            driver_id: b.driver_id,
            pickup_location: b.pickup_location,
            dropoff_location: b.dropoff_location,
            distance: b.distance,
            price: b.price,
            status: b.status,
            promo_code: b.promo_code,
            created_at: b.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderInfo>,
}
