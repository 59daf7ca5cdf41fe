pub mod admin;
pub mod auth;
pub mod bookings;
pub mod driver;
pub mod notifications;
pub mod user;
