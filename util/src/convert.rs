//! Unit conversions used at the boundary between the wire formats and the planner.
//!
//! Inside the planner all speeds are in meters/second and all angles in radians. The simulator
//! reports the ego speed in miles/hour and the yaw in degrees, so these are converted exactly once
//! when telemetry is ingested.

/// Meters per second in one mile per hour.
pub const MPH_TO_MS: f64 = 0.44704;

/// Convert a speed in miles/hour into meters/second.
pub fn mph_to_ms(speed_mph: f64) -> f64 {
    speed_mph * MPH_TO_MS
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_speed_conversion() {
        assert!((mph_to_ms(50.0) - 22.352).abs() < 1e-9);

        // The original 0.224 mph speed step is just over 0.1 m/s
        assert!((mph_to_ms(0.224) - 0.1001370).abs() < 1e-6);
    }
}
