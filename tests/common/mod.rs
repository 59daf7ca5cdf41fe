// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use axum::extract::State;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm_migration::MigratorTrait;
use serde::de::DeserializeOwned;
use serde_json::json;

use movers_backend::entities::user::UserRole;
use movers_backend::entities::{booking, driver, notification, user};
use movers_backend::extract::AppJson;
use movers_backend::handlers::user as user_handlers;
use movers_backend::{db, AppState, Config};

pub const ADMIN_EMAIL: &str = "admin@movingapp.test";
pub const ADMIN_PASSWORD: &str = "admin-pass";

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        admin_email: ADMIN_EMAIL.to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        fare_per_km: 5.0,
    }
}

/// Fresh state over a migrated in-memory database with the admin seeded
pub async fn test_state() -> AppState {
    let config = test_config();
    let db = db::connect(&config).await.expect("connect");
    migration::Migrator::up(&db, None).await.expect("migrate");
    db::seed_admin(&db, &config).await.expect("seed admin");
    AppState { db, config }
}

/// Wrap a JSON literal as a request body
pub fn body<T: DeserializeOwned>(value: serde_json::Value) -> AppJson<T> {
    AppJson(serde_json::from_value(value).expect("request body"))
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Insert a plain user without going through password hashing
pub async fn create_user(state: &AppState, name: &str, email: &str) -> i32 {
    user::ActiveModel {
        name: Set(name.to_string()),
        phone: Set("0200000000".to_string()),
        email: Set(email.to_string()),
        password_hash: Set("not-a-real-hash".to_string()),
        role: Set(UserRole::User),
        is_banned: Set(false),
        balance: Set(0.0),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .expect("insert user")
    .id
}

/// Insert a driver account and its profile. Returns the driver id.
pub async fn create_driver(state: &AppState, name: &str, email: &str) -> i32 {
    let user_id = create_user(state, name, email).await;

    let mut account: user::ActiveModel = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await
        .unwrap()
        .unwrap()
        .into();
    account.role = Set(UserRole::Driver);
    account.update(&state.db).await.unwrap();

    driver::ActiveModel {
        user_id: Set(user_id),
        vehicle_type: Set("Van".to_string()),
        license_plate: Set("GR-1234-24".to_string()),
        is_available: Set(true),
        earnings: Set(0.0),
        ratings: Set(0.0),
        completed_orders: Set(0),
        live_location: Set(None),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .expect("insert driver")
    .id
}

/// Book `driver_id` for `user_id` at `price` through the handler
pub async fn book(state: &AppState, user_id: i32, driver_id: i32, price: f64) -> i32 {
    user_handlers::book_driver(
        State(state.clone()),
        body(json!({
            "user_id": user_id,
            "driver_id": driver_id,
            "pickup_location": "Osu",
            "dropoff_location": "East Legon",
            "distance": 10.5,
            "price": price,
        })),
    )
    .await
    .expect("book driver")
    .0
    .booking_id
}

pub async fn get_booking(state: &AppState, id: i32) -> booking::Model {
    booking::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .unwrap()
        .expect("booking exists")
}

pub async fn get_driver(state: &AppState, id: i32) -> driver::Model {
    driver::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .unwrap()
        .expect("driver exists")
}

pub async fn get_user(state: &AppState, id: i32) -> user::Model {
    user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .unwrap()
        .expect("user exists")
}

/// Force a driver's rating state
pub async fn set_rating(state: &AppState, driver_id: i32, ratings: f64, completed: i32) {
    let mut active: driver::ActiveModel = get_driver(state, driver_id).await.into();
    active.ratings = Set(ratings);
    active.completed_orders = Set(completed);
    active.update(&state.db).await.unwrap();
}

pub async fn set_earnings(state: &AppState, driver_id: i32, earnings: f64) {
    let mut active: driver::ActiveModel = get_driver(state, driver_id).await.into();
    active.earnings = Set(earnings);
    active.update(&state.db).await.unwrap();
}

pub async fn notifications_for_driver(state: &AppState, driver_id: i32) -> Vec<notification::Model> {
    notification::Entity::find()
        .filter(notification::Column::DriverId.eq(driver_id))
        .all(&state.db)
        .await
        .unwrap()
}

pub async fn notifications_for_user(state: &AppState, user_id: i32) -> Vec<notification::Model> {
    notification::Entity::find()
        .filter(notification::Column::UserId.eq(user_id))
        .all(&state.db)
        .await
        .unwrap()
}
