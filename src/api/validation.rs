//! Input validation for API requests.
//!
//! This module provides validation functions for API request data,
//! ensuring all inputs meet the required format and constraints.
//!
//! For collecting multiple validation errors and returning them as an ApiError,
//! use the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating email addresses (pragmatic, not RFC-complete)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9][-a-zA-Z0-9]*(\.[a-zA-Z0-9][-a-zA-Z0-9]*)+$"
    ).unwrap();
}

/// Minimum accepted password length
const MIN_PASSWORD_LENGTH: usize = 6;

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a password for account creation
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }

    if password.len() > 512 {
        return Err("Password is too long (max 512 characters)".to_string());
    }

    Ok(())
}

/// Validate a category or product name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name is required".to_string());
    }

    if name.len() > 255 {
        return Err("Name is too long (max 255 characters)".to_string());
    }

    Ok(())
}

/// Validate a price value
pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() {
        return Err("Price must be a finite number".to_string());
    }

    if price < 0.0 {
        return Err("Price cannot be negative".to_string());
    }

    Ok(())
}

/// Validate a stock count
pub fn validate_stock(stock: i64) -> Result<(), String> {
    if stock < 0 {
        return Err("Stock cannot be negative".to_string());
    }

    Ok(())
}

/// Validate a UUID string
pub fn validate_uuid(id: &str, field_name: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err(format!("{} is required", field_name));
    }

    if uuid::Uuid::parse_str(id).is_err() {
        return Err(format!("Invalid {} format", field_name));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("john@email.com").is_ok());
        assert!(validate_email("j.doe+tag@sub.example.org").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("correct horse battery staple").is_ok());

        assert!(validate_password("").is_err());
        assert!(validate_password("12345").is_err()); // too short
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Shoes").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(10.99).is_ok());

        assert!(validate_price(-0.01).is_err());
        assert!(validate_price(f64::NAN).is_err());
        assert!(validate_price(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_stock() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(24).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000", "category_id").is_ok());
        assert!(validate_uuid("", "category_id").is_err());
        assert!(validate_uuid("not-a-uuid", "category_id").is_err());
    }
}
