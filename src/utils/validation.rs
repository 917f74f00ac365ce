use crate::utils::error::{EtlError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// 閉區間檢查；無法比較的值 (NaN) 一律視為超出範圍
pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if !(value >= min && value <= max) {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_non_negative(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Weight must be a finite, non-negative number".to_string(),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(EtlError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Unsupported value. Valid values: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("inputs.orders", "raw/orders.csv").is_ok());
        assert!(validate_path("inputs.orders", "  ").is_err());
        assert!(validate_path("inputs.orders", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("tiers.driver_cutoff", 60.0, 0.0, 100.0).is_ok());
        assert!(validate_range("tiers.driver_cutoff", 120.0, 0.0, 100.0).is_err());
        assert!(validate_range("tiers.driver_cutoff", 0.0, 0.0, 100.0).is_ok());
        assert!(validate_range("tiers.driver_cutoff", 100.0, 0.0, 100.0).is_ok());
    }

    #[test]
    fn test_validate_range_rejects_nan() {
        let err = validate_range("tiers.driver_cutoff", f64::NAN, 0.0, 100.0).unwrap_err();
        assert!(err.to_string().contains("tiers.driver_cutoff"));
        assert!(validate_range("tiers.driver_cutoff", f64::INFINITY, 0.0, 100.0).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("scoring.demand.order_volume", 0.0).is_ok());
        assert!(validate_non_negative("scoring.demand.order_volume", -0.1).is_err());
        assert!(validate_non_negative("scoring.demand.order_volume", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_one_of() {
        assert!(validate_one_of("outputs.formats", "csv", &["csv", "json"]).is_ok());
        assert!(validate_one_of("outputs.formats", "xlsx", &["csv", "json"]).is_err());
    }
}
