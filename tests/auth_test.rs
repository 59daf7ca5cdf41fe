mod common;

use axum::extract::State;
use common::{body, get_user, test_state, ADMIN_EMAIL, ADMIN_PASSWORD};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use movers_backend::db;
use movers_backend::entities::driver;
use movers_backend::entities::user::{self, UserRole};
use movers_backend::extract::AppPath;
use movers_backend::handlers::{admin, auth};
use movers_backend::AppError;

#[tokio::test]
async fn test_register_then_login_returns_role() {
    let state = test_state().await;

    let registered = auth::register(
        State(state.clone()),
        body(json!({
            "name": "Kofi",
            "phone": "0244000000",
            "email": "kofi@example.com",
            "password": "hunter22",
        })),
    )
    .await
    .unwrap()
    .0;

    let login = auth::login(
        State(state.clone()),
        body(json!({ "email": "kofi@example.com", "password": "hunter22" })),
    )
    .await
    .unwrap()
    .0;

    assert_eq!(login.user_id, registered.user_id);
    assert_eq!(login.role, UserRole::User);
}

#[tokio::test]
async fn test_register_driver_creates_profile() {
    let state = test_state().await;

    let registered = auth::register(
        State(state.clone()),
        body(json!({
            "name": "Esi",
            "phone": "0244000001",
            "email": "esi@example.com",
            "password": "truckdriver",
            "role": "driver",
            "vehicle_type": "Truck",
        })),
    )
    .await
    .unwrap()
    .0;

    let profile = driver::Entity::find()
        .filter(driver::Column::UserId.eq(registered.user_id))
        .one(&state.db)
        .await
        .unwrap()
        .expect("driver profile");

    assert_eq!(profile.vehicle_type, "Truck");
    assert_eq!(profile.license_plate, "");
    assert!(profile.is_available);
    assert_eq!(profile.completed_orders, 0);

    let login = auth::login(
        State(state.clone()),
        body(json!({ "email": "esi@example.com", "password": "truckdriver" })),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(login.role, UserRole::Driver);
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let state = test_state().await;

    auth::register(
        State(state.clone()),
        body(json!({
            "name": "Ama",
            "phone": "0244000002",
            "email": "ama@example.com",
            "password": "first",
        })),
    )
    .await
    .unwrap();

    // Every other field differs, including the role
    let err = auth::register(
        State(state.clone()),
        body(json!({
            "name": "Someone Else",
            "phone": "0555000000",
            "email": "ama@example.com",
            "password": "second",
            "role": "driver",
        })),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));

    let count = user::Entity::find()
        .filter(user::Column::Email.eq("ama@example.com"))
        .count(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 1);

    // The failed driver registration left no orphan profile
    assert_eq!(driver::Entity::find().count(&state.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_register_requires_fields() {
    let state = test_state().await;

    for payload in [
        json!({ "phone": "1", "email": "a@b.c", "password": "p" }),
        json!({ "name": "A", "email": "a@b.c", "password": "p" }),
        json!({ "name": "A", "phone": "1", "password": "p" }),
        json!({ "name": "A", "phone": "1", "email": "a@b.c", "password": "" }),
    ] {
        let err = auth::register(State(state.clone()), body(payload))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}

#[tokio::test]
async fn test_register_rejects_admin_role() {
    let state = test_state().await;

    let err = auth::register(
        State(state.clone()),
        body(json!({
            "name": "Mallory",
            "phone": "1",
            "email": "mallory@example.com",
            "password": "p",
            "role": "admin",
        })),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let state = test_state().await;

    let wrong_password = auth::login(
        State(state.clone()),
        body(json!({ "email": ADMIN_EMAIL, "password": "nope" })),
    )
    .await
    .unwrap_err();
    assert!(matches!(wrong_password, AppError::Unauthorized(_)));

    let unknown = auth::login(
        State(state.clone()),
        body(json!({ "email": "ghost@example.com", "password": "nope" })),
    )
    .await
    .unwrap_err();
    assert!(matches!(unknown, AppError::Unauthorized(_)));
}

#[tokio::test]
async fn test_admin_seed_is_idempotent() {
    let state = test_state().await;

    let first = db::seed_admin(&state.db, &state.config).await.unwrap();
    let second = db::seed_admin(&state.db, &state.config).await.unwrap();
    assert_eq!(first, second);

    let admins = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Admin))
        .count(&state.db)
        .await
        .unwrap();
    assert_eq!(admins, 1);

    let login = auth::login(
        State(state.clone()),
        body(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(login.role, UserRole::Admin);
}

#[tokio::test]
async fn test_banned_user_cannot_login() {
    let state = test_state().await;

    let user_id = auth::register(
        State(state.clone()),
        body(json!({
            "name": "Yaw",
            "phone": "0244000003",
            "email": "yaw@example.com",
            "password": "secret",
        })),
    )
    .await
    .unwrap()
    .0
    .user_id;

    admin::ban_user(State(state.clone()), AppPath(user_id))
        .await
        .unwrap();
    assert!(get_user(&state, user_id).await.is_banned);

    let err = auth::login(
        State(state.clone()),
        body(json!({ "email": "yaw@example.com", "password": "secret" })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}
