pub mod password;
pub mod pricing;
pub mod validate;
