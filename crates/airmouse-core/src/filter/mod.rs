//! Sensor-specific heading filters.
//!
//! A filter is a pure per-sample transform: it takes the 2–3 raw values the
//! device reported and produces the 2D [`Heading`] the motion loop should
//! follow, or nothing while it is still calibrating. Each supported sensor
//! type has its own variant because the raw value ranges differ (angular
//! rates are proportionally much smaller than accelerations), but both share
//! the same delta-from-origin scheme:
//!
//! 1. The first sample after construction or [`HeadingFilter::recalibrate`]
//!    becomes the calibration origin and emits no heading.
//! 2. Subsequent samples are expressed as deltas from that origin.
//! 3. Each delta component strictly inside the dead-zone `(−1, 1)` is
//!    clamped to exactly 0 to suppress sensor noise and drift.
//! 4. The x component is negated so tilting the device right moves the
//!    pointer right.

use std::fmt;

use thiserror::Error;

use crate::domain::Heading;

pub mod accelerometer;
pub mod gyroscope;

pub use accelerometer::AccelerometerFilter;
pub use gyroscope::GyroscopeFilter;

/// Minimum number of values a raw sample must carry (x and y).
pub const MIN_SAMPLE_AXES: usize = 2;

/// Half-width of the dead-zone around the calibration origin.
pub const DEAD_ZONE: f64 = 1.0;

/// Error type for filter construction and sample processing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The sample carried fewer values than the protocol contract allows.
    #[error("sample must contain at least 2 values, got {0}")]
    InvalidSample(usize),
    /// The sensor type id is not one of the well-known ids.
    #[error("unknown sensor type id: {0}")]
    UnknownSensorType(i32),
}

/// Well-known sensor type ids as declared by devices on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorType {
    Accelerometer,
    Gyroscope,
}

impl SensorType {
    /// The wire id of this sensor type.
    pub fn id(self) -> i32 {
        match self {
            SensorType::Accelerometer => 1,
            SensorType::Gyroscope => 2,
        }
    }
}

impl TryFrom<i32> for SensorType {
    type Error = FilterError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SensorType::Accelerometer),
            2 => Ok(SensorType::Gyroscope),
            other => Err(FilterError::UnknownSensorType(other)),
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorType::Accelerometer => f.write_str("Accelerometer"),
            SensorType::Gyroscope => f.write_str("Gyroscope"),
        }
    }
}

/// A per-sample transform from raw sensor values to a pointer heading.
///
/// Implementations hold the calibration origin and nothing else; they are
/// cheap to construct and are simply replaced when the device switches
/// sensor types.
pub trait HeadingFilter: Send {
    /// Processes one raw sample.
    ///
    /// Returns `Ok(None)` while calibrating (the sample became the new
    /// origin), `Ok(Some(heading))` once calibrated.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidSample`] when the sample carries fewer
    /// than [`MIN_SAMPLE_AXES`] values. The caller drops the sample; the
    /// session is unaffected.
    fn process_sample(&mut self, values: &[f64]) -> Result<Option<Heading>, FilterError>;

    /// Clears the calibration origin; the next sample becomes the new zero.
    fn recalibrate(&mut self);

    /// Human-readable sensor name for the status display.
    fn display_name(&self) -> &'static str;
}

/// Constructs the filter for a wire sensor type id.
///
/// # Errors
///
/// Returns [`FilterError::UnknownSensorType`] for unrecognised ids.
pub fn create_filter(type_id: i32) -> Result<Box<dyn HeadingFilter>, FilterError> {
    match SensorType::try_from(type_id)? {
        SensorType::Accelerometer => Ok(Box::new(AccelerometerFilter::new())),
        SensorType::Gyroscope => Ok(Box::new(GyroscopeFilter::new())),
    }
}

/// Extracts the x/y axes from a raw sample, enforcing the minimum arity.
///
/// A third value (z axis) is accepted and ignored; it is reserved for
/// future sensor fusion.
fn axes(values: &[f64]) -> Result<(f64, f64), FilterError> {
    if values.len() < MIN_SAMPLE_AXES {
        return Err(FilterError::InvalidSample(values.len()));
    }
    Ok((values[0], values[1]))
}

/// Clamps a delta component strictly inside the dead-zone to exactly zero.
fn dead_zone(v: f64) -> f64 {
    if v > -DEAD_ZONE && v < DEAD_ZONE {
        0.0
    } else {
        v
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_type_round_trips_through_wire_id() {
        assert_eq!(SensorType::try_from(1), Ok(SensorType::Accelerometer));
        assert_eq!(SensorType::try_from(2), Ok(SensorType::Gyroscope));
        assert_eq!(SensorType::Accelerometer.id(), 1);
        assert_eq!(SensorType::Gyroscope.id(), 2);
    }

    #[test]
    fn test_sensor_type_rejects_unknown_id() {
        assert_eq!(
            SensorType::try_from(7),
            Err(FilterError::UnknownSensorType(7))
        );
    }

    #[test]
    fn test_create_filter_returns_variant_for_each_known_id() {
        assert_eq!(create_filter(1).unwrap().display_name(), "Accelerometer");
        assert_eq!(create_filter(2).unwrap().display_name(), "Gyroscope");
    }

    #[test]
    fn test_create_filter_fails_for_unknown_id() {
        let err = create_filter(99)
            .err()
            .expect("expected UnknownSensorType error");
        assert_eq!(err, FilterError::UnknownSensorType(99));
    }

    #[test]
    fn test_axes_rejects_short_samples_naming_the_arity() {
        let err = axes(&[4.2]).unwrap_err();
        assert_eq!(err, FilterError::InvalidSample(1));
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_dead_zone_clamps_strictly_inside_the_band() {
        assert_eq!(dead_zone(0.0), 0.0);
        assert_eq!(dead_zone(0.999), 0.0);
        assert_eq!(dead_zone(-0.999), 0.0);
        // The boundary itself is outside the dead-zone.
        assert_eq!(dead_zone(1.0), 1.0);
        assert_eq!(dead_zone(-1.0), -1.0);
        assert_eq!(dead_zone(3.5), 3.5);
    }
}
