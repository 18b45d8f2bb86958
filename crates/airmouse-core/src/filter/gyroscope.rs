//! Gyroscope heading filter.

use crate::domain::Heading;

use super::{axes, dead_zone, FilterError, HeadingFilter};

/// Gain applied to angular-rate deltas before dead-zone clamping.
///
/// Gyroscope deltas are an order of magnitude smaller than accelerometer
/// deltas, so without this gain almost every reading would land inside the
/// dead-zone and the pointer would barely move.
const GAIN: f64 = 10.0;

/// Delta-from-origin filter for gyroscope samples.
#[derive(Debug, Default)]
pub struct GyroscopeFilter {
    origin: Option<(f64, f64)>,
}

impl GyroscopeFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HeadingFilter for GyroscopeFilter {
    fn process_sample(&mut self, values: &[f64]) -> Result<Option<Heading>, FilterError> {
        let (x, y) = axes(values)?;

        let Some((x0, y0)) = self.origin else {
            self.origin = Some((x, y));
            return Ok(None);
        };

        // Scale before clamping so small-but-deliberate rotations survive
        // the dead-zone.
        let dx = dead_zone((x - x0) * GAIN);
        let dy = dead_zone((y - y0) * GAIN);

        Ok(Some(Heading::new(-dx, dy)))
    }

    fn recalibrate(&mut self) {
        self.origin = None;
    }

    fn display_name(&self) -> &'static str {
        "Gyroscope"
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_becomes_origin_and_emits_nothing() {
        let mut filter = GyroscopeFilter::new();
        assert_eq!(filter.process_sample(&[0.2, -0.1]).unwrap(), None);
    }

    #[test]
    fn test_delta_is_scaled_tenfold_before_clamping() {
        let mut filter = GyroscopeFilter::new();
        filter.process_sample(&[1.0, 1.0]).unwrap(); // origin

        // Raw per-axis delta is 0.5; the emitted magnitude must be 5.0.
        let heading = filter.process_sample(&[1.5, 1.5]).unwrap().unwrap();

        assert_eq!(heading, Heading::new(-5.0, 5.0));
    }

    #[test]
    fn test_small_rotations_survive_the_dead_zone_thanks_to_gain() {
        let mut filter = GyroscopeFilter::new();
        filter.process_sample(&[0.0, 0.0]).unwrap();

        // A raw delta of 0.15 would be clamped unscaled; at 10x it is 1.5.
        let heading = filter.process_sample(&[0.15, 0.0]).unwrap().unwrap();

        assert_eq!(heading, Heading::new(-1.5, 0.0));
    }

    #[test]
    fn test_scaled_delta_inside_dead_zone_is_clamped() {
        let mut filter = GyroscopeFilter::new();
        filter.process_sample(&[0.0, 0.0]).unwrap();

        // 0.05 * 10 = 0.5, still inside (-1, 1).
        let heading = filter.process_sample(&[0.05, -0.05]).unwrap().unwrap();

        assert_eq!(heading, Heading::new(0.0, 0.0));
    }

    #[test]
    fn test_recalibrate_clears_the_origin() {
        let mut filter = GyroscopeFilter::new();
        filter.process_sample(&[2.0, 2.0]).unwrap();
        filter.recalibrate();

        assert_eq!(filter.process_sample(&[5.0, 5.0]).unwrap(), None);
        let heading = filter.process_sample(&[5.25, 5.0]).unwrap().unwrap();
        assert_eq!(heading, Heading::new(-2.5, 0.0));
    }

    #[test]
    fn test_third_axis_is_accepted_and_ignored() {
        // Reserved for future sensor fusion.
        let mut filter = GyroscopeFilter::new();
        filter.process_sample(&[0.0, 0.0, 1.0]).unwrap();

        let heading = filter.process_sample(&[0.3, 0.0, 99.0]).unwrap().unwrap();

        assert_eq!(heading, Heading::new(-3.0, 0.0));
    }

    #[test]
    fn test_short_sample_is_rejected_with_arity() {
        let mut filter = GyroscopeFilter::new();
        assert_eq!(
            filter.process_sample(&[]),
            Err(FilterError::InvalidSample(0))
        );
    }
}
