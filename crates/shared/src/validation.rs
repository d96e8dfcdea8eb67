//! Common validation utilities.
//!
//! These are plugged into `#[validate(custom(function = ...))]` attributes
//! on request payloads.

use validator::ValidationError;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if lat.is_finite() && (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(error("latitude_range", "Latitude must be between -90 and 90"))
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if lon.is_finite() && (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(error(
            "longitude_range",
            "Longitude must be between -180 and 180",
        ))
    }
}

/// Rejects strings made only of whitespace.
///
/// Length limits are checked separately with `#[validate(length(...))]`.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(error("blank", "Value must not be blank"))
    } else {
        Ok(())
    }
}

/// Validates a join code typed by a user (`GRT-1234`).
pub fn validate_join_code(code: &str) -> Result<(), ValidationError> {
    if crate::codes::is_join_code(code) {
        Ok(())
    } else {
        Err(error(
            "join_code_format",
            "Join code must look like ABC-1234",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(12.2426).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(-90.1).is_err());
    }

    #[test]
    fn test_validate_latitude_not_finite() {
        assert!(validate_latitude(f64::NAN).is_err());
        assert!(validate_latitude(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_latitude_error_message() {
        let err = validate_latitude(100.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Latitude must be between -90 and 90"
        );
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(79.3197).is_ok());
        assert!(validate_longitude(180.1).is_err());
        assert!(validate_longitude(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_validate_longitude_error_message() {
        let err = validate_longitude(200.0).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Longitude must be between -180 and 180"
        );
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Alice").is_ok());
        assert!(validate_not_blank(" a ").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   \t").is_err());
    }

    #[test]
    fn test_validate_not_blank_with_generated_names() {
        use fake::faker::name::en::Name;
        use fake::Fake;

        for _ in 0..20 {
            let name: String = Name().fake();
            assert!(validate_not_blank(&name).is_ok());
        }
    }

    #[test]
    fn test_validate_join_code() {
        assert!(validate_join_code("GRT-4821").is_ok());
        let err = validate_join_code("4821").unwrap_err();
        assert_eq!(err.code, "join_code_format");
    }
}
