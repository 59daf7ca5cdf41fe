use crate::error::{AppError, AppResult};

/// Take a required text field, treating absent and blank values alike
pub fn required_text(value: Option<String>, message: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::BadRequest(message.to_string())),
    }
}

/// Take a required strictly positive amount
pub fn required_positive(value: Option<f64>, message: &str) -> AppResult<f64> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(AppError::BadRequest(message.to_string())),
    }
}

/// Take a required id
pub fn required_id(value: Option<i32>, message: &str) -> AppResult<i32> {
    value.ok_or_else(|| AppError::BadRequest(message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert_eq!(required_text(Some("Ama".into()), "name").unwrap(), "Ama");
        assert!(matches!(required_text(Some("  ".into()), "name"), Err(AppError::BadRequest(_))));
        assert!(matches!(required_text(None, "name"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_required_positive() {
        assert_eq!(required_positive(Some(2.5), "amount").unwrap(), 2.5);
        assert!(required_positive(Some(0.0), "amount").is_err());
        assert!(required_positive(Some(-1.0), "amount").is_err());
        assert!(required_positive(Some(f64::NAN), "amount").is_err());
        assert!(required_positive(None, "amount").is_err());
    }
}
