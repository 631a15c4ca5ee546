//! # Telemetry messages
//!
//! One [`TelemetryMsg`] is received per planning cycle. The field names and units match those
//! used by the highway simulator:
//!
//! - Ego position `x`, `y` and road frame `s`, `d` are in meters.
//! - Ego `yaw` is in degrees, ego `speed` is in miles/hour.
//! - Tracked object velocities `vx`, `vy` are in meters/second.
//!
//! Conversion into the planner's unit system happens once, when the message is ingested by the
//! planner. Nothing in this module converts units.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Telemetry packet sent by the vehicle at the start of each cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryMsg {
    /// Ego X position in the world frame.
    pub x: f64,

    /// Ego Y position in the world frame.
    pub y: f64,

    /// Ego progress along the road, as estimated by the vehicle. Advisory only.
    pub s: f64,

    /// Ego lateral offset from the road centreline, as estimated by the vehicle. Advisory only.
    pub d: f64,

    /// Ego heading in degrees from the world X axis.
    pub yaw: f64,

    /// Ego speed in miles/hour.
    pub speed: f64,

    /// X coordinates of the previously issued trajectory that the vehicle hasn't consumed yet.
    pub previous_path_x: Vec<f64>,

    /// Y coordinates of the previously issued trajectory that the vehicle hasn't consumed yet.
    pub previous_path_y: Vec<f64>,

    /// Road progress at the end of the previous path.
    pub end_path_s: f64,

    /// Lateral offset at the end of the previous path.
    pub end_path_d: f64,

    /// Tracked objects on the ego's side of the road.
    pub sensor_fusion: Vec<ObjectMsg>,
}

/// A single tracked object.
///
/// On the wire objects are usually encoded as arrays in the order `[id, x, y, vx, vy, s, d]`,
/// which deserialises into this struct. The named-field form is also accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ObjectMsg {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub s: f64,
    pub d: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TlmError {
    #[error("Telemetry contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Telemetry field {0} is not a finite number")]
    NonFinite(String),

    #[error(
        "Previous path has mismatched coordinate counts ({num_x} x values, {num_y} y values)"
    )]
    PathLengthMismatch { num_x: usize, num_y: usize },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TelemetryMsg {
    /// Parse and validate a telemetry packet from a JSON string.
    ///
    /// Missing fields are rejected by the parser, so a successfully returned packet is complete.
    pub fn from_json(json_str: &str) -> Result<Self, TlmError> {
        let msg: Self = serde_json::from_str(json_str).map_err(TlmError::InvalidJson)?;
        msg.validate()?;
        Ok(msg)
    }

    /// Check that the packet is internally consistent.
    ///
    /// All numbers must be finite and the previous path must have as many X as Y coordinates.
    pub fn validate(&self) -> Result<(), TlmError> {
        let scalars = [
            ("x", self.x),
            ("y", self.y),
            ("s", self.s),
            ("d", self.d),
            ("yaw", self.yaw),
            ("speed", self.speed),
            ("end_path_s", self.end_path_s),
            ("end_path_d", self.end_path_d),
        ];
        for (name, val) in scalars.iter() {
            check_finite(val, || name.to_string())?;
        }

        if self.previous_path_x.len() != self.previous_path_y.len() {
            return Err(TlmError::PathLengthMismatch {
                num_x: self.previous_path_x.len(),
                num_y: self.previous_path_y.len(),
            });
        }

        for (i, (x, y)) in self
            .previous_path_x
            .iter()
            .zip(self.previous_path_y.iter())
            .enumerate()
        {
            check_finite(x, || format!("previous_path_x[{}]", i))?;
            check_finite(y, || format!("previous_path_y[{}]", i))?;
        }

        for (i, obj) in self.sensor_fusion.iter().enumerate() {
            let fields = [
                ("x", obj.x),
                ("y", obj.y),
                ("vx", obj.vx),
                ("vy", obj.vy),
                ("s", obj.s),
                ("d", obj.d),
            ];
            for (name, val) in fields.iter() {
                check_finite(val, || format!("sensor_fusion[{}].{}", i, name))?;
            }
        }

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn check_finite<F>(val: &f64, name: F) -> Result<(), TlmError>
where
    F: FnOnce() -> String,
{
    if val.is_finite() {
        Ok(())
    } else {
        Err(TlmError::NonFinite(name()))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const TLM_JSON: &str = r#"{
        "x": 909.48, "y": 1128.67, "s": 124.83, "d": 6.16,
        "yaw": 0.0, "speed": 0.0,
        "previous_path_x": [909.5, 909.6],
        "previous_path_y": [1128.67, 1128.67],
        "end_path_s": 125.0, "end_path_d": 6.0,
        "sensor_fusion": [
            [0, 775.99, 1421.6, 0.0, 0.0, 6721.839, -277.6729],
            [1, 775.8, 1425.2, 0.0, 0.0, 6719.219, -280.1494]
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let tlm = TelemetryMsg::from_json(TLM_JSON).unwrap();

        assert_eq!(tlm.previous_path_x.len(), 2);
        assert_eq!(tlm.sensor_fusion.len(), 2);
        assert_eq!(tlm.sensor_fusion[1].id, 1);
        assert_eq!(tlm.sensor_fusion[1].s, 6719.219);
        assert_eq!(tlm.sensor_fusion[1].d, -280.1494);
    }

    #[test]
    fn test_missing_field_rejected() {
        let json = TLM_JSON.replace("\"end_path_s\": 125.0,", "");
        match TelemetryMsg::from_json(&json) {
            Err(TlmError::InvalidJson(_)) => (),
            r => panic!("Expected invalid JSON, got {:?}", r),
        }
    }

    #[test]
    fn test_short_object_rejected() {
        let json = TLM_JSON.replace("[1, 775.8, 1425.2, 0.0, 0.0, 6719.219, -280.1494]", "[1, 775.8]");
        assert!(TelemetryMsg::from_json(&json).is_err());
    }

    #[test]
    fn test_validate() {
        let mut tlm = TelemetryMsg::from_json(TLM_JSON).unwrap();

        tlm.previous_path_y.pop();
        match tlm.validate() {
            Err(TlmError::PathLengthMismatch { num_x: 2, num_y: 1 }) => (),
            r => panic!("Expected a length mismatch, got {:?}", r),
        }

        tlm.previous_path_y.push(1128.67);
        tlm.sensor_fusion[0].vx = std::f64::NAN;
        match tlm.validate() {
            Err(TlmError::NonFinite(f)) => assert_eq!(f, "sensor_fusion[0].vx"),
            r => panic!("Expected a non-finite error, got {:?}", r),
        }
    }
}
