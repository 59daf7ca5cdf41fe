use axum::{
    routing::{get, post},
    Json, Router,
};

use crate::handlers::{admin, auth, driver, notifications, user};
use crate::AppState;

async fn landing() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Welcome to the Moving App API!" }))
}

pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let user_routes = Router::new()
        .route("/search-drivers", post(user::search_drivers))
        .route("/book-driver", post(user::book_driver))
        .route("/cancel-order/{id}", post(user::cancel_order))
        .route("/order-history/{user_id}", get(user::order_history))
        .route("/track-driver/{booking_id}", get(user::track_driver))
        // Wallet
        .route("/deposit", post(user::deposit))
        .route("/payments/{user_id}", get(user::payment_history))
        .route("/apply-promo-code", post(user::apply_promo_code))
        // Reviews & support
        .route("/submit-review", post(user::submit_review))
        .route("/submit-support-ticket", post(user::submit_support_ticket))
        .route("/support-tickets", get(user::support_tickets))
        .route("/notifications/{user_id}", get(notifications::user_notifications));

    let driver_routes = Router::new()
        .route("/available-orders", get(driver::available_orders))
        .route("/accept-order/{id}", post(driver::accept_order))
        .route("/complete-order/{id}", post(driver::complete_order))
        .route("/cancel-order/{id}", post(driver::cancel_order))
        .route("/order-history/{driver_id}", get(driver::order_history))
        .route("/withdraw", post(driver::withdraw))
        .route("/toggle-availability", post(driver::toggle_availability))
        .route("/update-location", post(driver::update_location))
        .route("/notifications/{driver_id}", get(notifications::driver_notifications));

    let admin_routes = Router::new()
        .route("/manage-users", get(admin::manage_users))
        .route("/ban-user/{id}", post(admin::ban_user))
        .route("/support-tickets", get(admin::support_tickets))
        .route("/all-support-tickets", get(admin::all_support_tickets))
        .route("/reply-support-ticket/{id}", post(admin::reply_support_ticket))
        .route("/escrow", get(admin::escrow))
        .route("/promo-codes", get(admin::list_promo_codes))
        .route("/create-promo-code", post(admin::create_promo_code))
        .route("/disable-promo-code/{id}", post(admin::disable_promo_code));

    let notification_routes =
        Router::new().route("/mark-read/{id}", post(notifications::mark_read));

    Router::new()
        .route("/", get(landing))
        .nest("/api", auth_routes)
        .nest("/api/user", user_routes)
        .nest("/api/driver", driver_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/notifications", notification_routes)
        .with_state(state)
}
