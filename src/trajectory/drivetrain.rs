//! Differential drivetrain parameters

use std::collections::HashMap;

use crate::common::{require_positive, ConfigError, GRAVITY};

/// Physical parameters of a differential-drive robot
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentialDrivetrain {
    pub mass: f64,                       // kg
    pub moi: f64,                        // kg·m²
    pub trackwidth: f64,                 // m, distance between wheel contact points
    pub wheel_radius: f64,               // m
    pub wheel_max_angular_velocity: f64, // rad/s
    pub wheel_max_torque: f64,           // N·m, per wheel
    pub wheel_cof: f64,                  // wheel/floor friction coefficient
}

impl Default for DifferentialDrivetrain {
    fn default() -> Self {
        Self {
            mass: 45.0,
            moi: 6.0,
            trackwidth: 0.6,
            wheel_radius: 0.08,
            wheel_max_angular_velocity: 37.5,
            wheel_max_torque: 2.0,
            wheel_cof: 1.5,
        }
    }
}

impl DifferentialDrivetrain {
    /// Apply parameters from a name/value map. Every value must be positive.
    pub fn configure(&mut self, params: &HashMap<String, f64>) -> Result<(), ConfigError> {
        for (name, &value) in params {
            let field = match name.as_str() {
                "mass" => &mut self.mass,
                "moi" => &mut self.moi,
                "trackwidth" => &mut self.trackwidth,
                "wheel_radius" => &mut self.wheel_radius,
                "wheel_max_angular_velocity" => &mut self.wheel_max_angular_velocity,
                "wheel_max_torque" => &mut self.wheel_max_torque,
                "wheel_cof" => &mut self.wheel_cof,
                _ => return Err(ConfigError::UnknownParameter(name.clone())),
            };
            *field = require_positive(name, value)?;
        }
        Ok(())
    }

    /// Top wheel surface speed (m/s)
    pub fn max_wheel_velocity(&self) -> f64 {
        self.wheel_radius * self.wheel_max_angular_velocity
    }

    /// Per-wheel force limit: the lower of motor torque and traction (N)
    pub fn max_wheel_force(&self) -> f64 {
        let torque_limited = self.wheel_max_torque / self.wheel_radius;
        let traction_limited = self.wheel_cof * self.mass * GRAVITY;
        torque_limited.min(traction_limited)
    }

    pub fn max_linear_acceleration(&self) -> f64 {
        2.0 * self.max_wheel_force() / self.mass
    }

    pub fn max_angular_velocity(&self) -> f64 {
        2.0 * self.max_wheel_velocity() / self.trackwidth
    }

    pub fn max_angular_acceleration(&self) -> f64 {
        2.0 * self.max_linear_acceleration() / self.trackwidth
    }

    /// Chassis (linear, angular) velocity from wheel surface speeds
    pub fn wheel_to_chassis(&self, left: f64, right: f64) -> (f64, f64) {
        ((left + right) / 2.0, (right - left) / self.trackwidth)
    }

    /// Wheel surface speeds (left, right) from chassis velocity
    pub fn chassis_to_wheel(&self, linear: f64, angular: f64) -> (f64, f64) {
        let half = self.trackwidth / 2.0 * angular;
        (linear - half, linear + half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_limits() {
        let drivetrain = DifferentialDrivetrain::default();
        // Torque limit (25 N) is below traction (661.5 N)
        assert_relative_eq!(drivetrain.max_wheel_force(), 25.0);
        assert_relative_eq!(drivetrain.max_linear_acceleration(), 50.0 / 45.0);
        assert_relative_eq!(drivetrain.max_wheel_velocity(), 3.0);
        assert_relative_eq!(drivetrain.max_angular_velocity(), 10.0);
    }

    #[test]
    fn test_traction_limited_force() {
        let drivetrain = DifferentialDrivetrain {
            wheel_cof: 0.01,
            ..Default::default()
        };
        assert_relative_eq!(drivetrain.max_wheel_force(), 0.01 * 45.0 * GRAVITY);
    }

    #[test]
    fn test_wheel_chassis_round_trip() {
        let drivetrain = DifferentialDrivetrain::default();
        let (left, right) = drivetrain.chassis_to_wheel(1.0, 2.0);
        let (linear, angular) = drivetrain.wheel_to_chassis(left, right);
        assert_relative_eq!(linear, 1.0);
        assert_relative_eq!(angular, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_configure() {
        let mut drivetrain = DifferentialDrivetrain::default();
        let mut params = HashMap::new();
        params.insert("mass".to_string(), 60.0);
        params.insert("trackwidth".to_string(), 0.5);
        drivetrain.configure(&params).unwrap();
        assert_eq!(drivetrain.mass, 60.0);
        assert_eq!(drivetrain.trackwidth, 0.5);

        params.insert("wheel_radius".to_string(), -1.0);
        assert!(matches!(
            drivetrain.configure(&params),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut unknown = HashMap::new();
        unknown.insert("wheelbase".to_string(), 1.0);
        assert!(matches!(
            drivetrain.configure(&unknown),
            Err(ConfigError::UnknownParameter(_))
        ));
    }
}
