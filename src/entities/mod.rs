pub mod booking;
pub mod driver;
pub mod notification;
pub mod payment;
pub mod promo_code;
pub mod review;
pub mod support_ticket;
pub mod user;
