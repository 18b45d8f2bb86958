//! Accelerometer heading filter.

use crate::domain::Heading;

use super::{axes, dead_zone, FilterError, HeadingFilter};

/// Delta-from-origin filter for accelerometer samples.
///
/// Accelerations are already in a comfortable range for pointer velocities,
/// so the delta is used unscaled.
#[derive(Debug, Default)]
pub struct AccelerometerFilter {
    origin: Option<(f64, f64)>,
}

impl AccelerometerFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeadingFilter for AccelerometerFilter {
    fn process_sample(&mut self, values: &[f64]) -> Result<Option<Heading>, FilterError> {
        let (x, y) = axes(values)?;

        let Some((x0, y0)) = self.origin else {
            self.origin = Some((x, y));
            return Ok(None);
        };

        let dx = dead_zone(x - x0);
        let dy = dead_zone(y - y0);

        Ok(Some(Heading::new(-dx, dy)))
    }

    fn recalibrate(&mut self) {
        self.origin = None;
    }

    fn display_name(&self) -> &'static str {
        "Accelerometer"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_becomes_origin_and_emits_nothing() {
        let mut filter = AccelerometerFilter::new();

        let heading = filter.process_sample(&[3.0, -2.0]).unwrap();

        assert_eq!(heading, None);
    }

    #[test]
    fn test_samples_inside_dead_zone_emit_exact_zero() {
        let mut filter = AccelerometerFilter::new();
        filter.process_sample(&[5.0, 5.0]).unwrap(); // origin

        // Both deltas are within (-1, 1) of the origin.
        let heading = filter.process_sample(&[5.9, 4.1]).unwrap().unwrap();

        assert_eq!(heading, Heading::new(0.0, 0.0));
    }

    #[test]
    fn test_delta_from_origin_with_x_inverted() {
        let mut filter = AccelerometerFilter::new();
        filter.process_sample(&[1.0, 1.0]).unwrap(); // origin

        let heading = filter.process_sample(&[4.0, -1.5]).unwrap().unwrap();

        // dx = 3.0 (inverted), dy = -2.5
        assert_eq!(heading, Heading::new(-3.0, -2.5));
    }

    #[test]
    fn test_dead_zone_applies_per_axis() {
        let mut filter = AccelerometerFilter::new();
        filter.process_sample(&[0.0, 0.0]).unwrap(); // origin

        // x delta is inside the dead-zone, y delta is not.
        let heading = filter.process_sample(&[0.5, 4.0]).unwrap().unwrap();

        assert_eq!(heading, Heading::new(0.0, 4.0));
    }

    #[test]
    fn test_recalibrate_makes_next_sample_the_new_origin() {
        let mut filter = AccelerometerFilter::new();
        filter.process_sample(&[0.0, 0.0]).unwrap();
        filter.process_sample(&[3.0, 3.0]).unwrap();

        filter.recalibrate();

        // The next sample calibrates again and must not emit a heading.
        assert_eq!(filter.process_sample(&[10.0, 10.0]).unwrap(), None);
        // Deltas are now relative to the new origin.
        let heading = filter.process_sample(&[12.0, 10.5]).unwrap().unwrap();
        assert_eq!(heading, Heading::new(-2.0, 0.0));
    }

    #[test]
    fn test_third_axis_is_accepted_and_ignored() {
        // The z value is reserved for future sensor fusion: it must be
        // accepted on the wire but has no effect on the heading yet.
        let mut filter = AccelerometerFilter::new();
        filter.process_sample(&[0.0, 0.0, 9.8]).unwrap();

        let with_z = filter.process_sample(&[2.0, 2.0, -40.0]).unwrap().unwrap();

        assert_eq!(with_z, Heading::new(-2.0, 2.0));
    }

    #[test]
    fn test_single_value_sample_is_rejected() {
        let mut filter = AccelerometerFilter::new();
        assert_eq!(
            filter.process_sample(&[1.0]),
            Err(FilterError::InvalidSample(1))
        );
    }

    #[test]
    fn test_rejected_sample_does_not_consume_calibration() {
        let mut filter = AccelerometerFilter::new();
        filter.process_sample(&[]).unwrap_err();

        // The failed sample must not have become the origin.
        assert_eq!(filter.process_sample(&[1.0, 1.0]).unwrap(), None);
    }
}
