//! Common utilities and types for Prometheus trajectory optimization

use std::f64::consts::PI;
use thiserror::Error;

/// Standard gravity used for traction limits (m/s²)
pub const GRAVITY: f64 = 9.8;

/// Error raised when applying a parameter map to a configuration struct
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),
    #[error("invalid value {value} for parameter '{name}': {reason}")]
    InvalidValue {
        name: String,
        value: f64,
        reason: &'static str,
    },
}

impl ConfigError {
    pub(crate) fn invalid(name: &str, value: f64, reason: &'static str) -> Self {
        ConfigError::InvalidValue {
            name: name.to_string(),
            value,
            reason,
        }
    }
}

/// Accepts finite values greater than zero
pub(crate) fn require_positive(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid(name, value, "must be finite and positive"))
    }
}

/// Accepts finite values greater than or equal to zero
pub(crate) fn require_non_negative(name: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid(name, value, "must be finite and non-negative"))
    }
}

/// Wrap an angle into (-π, π]
pub fn angle_modulus(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

pub fn lerp(start: f64, end: f64, t: f64) -> f64 {
    start + (end - start) * t
}

/// `count` evenly spaced values after `start`, ending exactly at `end`
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    (1..=count)
        .map(|i| lerp(start, end, i as f64 / count as f64))
        .collect()
}

/// Like [`linspace`] for headings, following the shortest wrapped difference.
///
/// Values are not wrapped, so consecutive entries never jump by 2π.
pub fn angle_linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    linspace(start, start + angle_modulus(end - start), count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_angle_modulus_range() {
        assert_relative_eq!(angle_modulus(0.0), 0.0);
        assert_relative_eq!(angle_modulus(PI), PI);
        assert_relative_eq!(angle_modulus(-PI), PI);
        assert_relative_eq!(angle_modulus(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(angle_modulus(-5.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_linspace_excludes_start() {
        let values = linspace(0.0, 1.0, 4);
        assert_eq!(values.len(), 4);
        assert_relative_eq!(values[0], 0.25);
        assert_relative_eq!(values[3], 1.0);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_angle_linspace_takes_short_way() {
        let values = angle_linspace(3.0, -3.0, 2);
        // 3.0 to -3.0 is shorter through π than through zero
        assert!(values[0] > 3.0);
        assert_relative_eq!(angle_modulus(values[1]), -3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_require_positive() {
        assert!(require_positive("mass", 1.0).is_ok());
        assert!(require_positive("mass", 0.0).is_err());
        assert!(require_positive("mass", f64::NAN).is_err());
        assert!(require_non_negative("tolerance", 0.0).is_ok());
    }
}
