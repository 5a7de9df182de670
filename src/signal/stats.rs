//! Descriptive statistics over one window of (corrected) samples.
//!
//! Frequency is estimated from zero crossings after mean removal and assumes a
//! fixed sampling rate. The estimate does not look at wall-clock timing, so a
//! device that streams faster or slower than the configured rate biases it.
use crate::signal::ScopeError;

/// Matches the UI refresh rate the device is read at.
pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 29.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatsSnapshot {
    pub amplitude: f64,
    pub frequency: f64,
    pub peak_to_peak: f64,
    pub rms: f64,
    pub mean: f64,
    pub high: f64,
    pub low: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct StatsEngine {
    sampling_rate_hz: f64,
}

impl Default for StatsEngine {
    fn default() -> Self {
        Self {
            sampling_rate_hz: DEFAULT_SAMPLING_RATE_HZ,
        }
    }
}

impl StatsEngine {
    pub fn new(sampling_rate_hz: f64) -> Result<Self, ScopeError> {
        if !(sampling_rate_hz > 0.0) || !sampling_rate_hz.is_finite() {
            return Err(ScopeError::InvalidSampleRate);
        }
        Ok(Self { sampling_rate_hz })
    }

    pub fn sampling_rate_hz(&self) -> f64 {
        self.sampling_rate_hz
    }

    pub fn try_compute(&self, values: &[f64]) -> Result<StatsSnapshot, ScopeError> {
        let (low, high) = high_low(values).ok_or(ScopeError::EmptyWindow)?;
        Ok(StatsSnapshot {
            amplitude: amplitude(low, high),
            frequency: zero_crossing_frequency(values, self.sampling_rate_hz),
            peak_to_peak: peak_to_peak(low, high),
            rms: rms(values),
            mean: mean(values),
            high,
            low,
        })
    }

    /// Zeroed stats for an empty window.
    pub fn compute(&self, values: &[f64]) -> StatsSnapshot {
        self.try_compute(values).unwrap_or_default()
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// `(low, high)` of the window.
pub fn high_low(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

pub fn peak_to_peak(low: f64, high: f64) -> f64 {
    high - low
}

pub fn amplitude(low: f64, high: f64) -> f64 {
    peak_to_peak(low, high) / 2.0
}

/// `Some(true)` above zero, `Some(false)` below, `None` exactly on it.
fn side(value: f64) -> Option<bool> {
    if value > 0.0 {
        Some(true)
    } else if value < 0.0 {
        Some(false)
    } else {
        None
    }
}

/// Indices of the first sample on the opposite side of the mean.
///
/// Samples sitting exactly on the mean keep the previous side, so passing
/// through it on a sample point is one crossing, not two.
pub fn zero_crossings(values: &[f64]) -> Vec<usize> {
    let centre = mean(values);
    let mut last_side = None;
    let mut crossings = Vec::new();
    for (i, &value) in values.iter().enumerate() {
        let Some(current) = side(value - centre) else {
            continue;
        };
        if last_side.is_some_and(|prev| prev != current) {
            crossings.push(i);
        }
        last_side = Some(current);
    }
    crossings
}

/// Frequency in Hz from the mean spacing of zero crossings.
///
/// Consecutive crossings are half a period apart, so the full period is twice
/// the mean crossing interval. Fewer than two crossings gives `0.0`.
pub fn zero_crossing_frequency(values: &[f64], sampling_rate_hz: f64) -> f64 {
    if !(sampling_rate_hz > 0.0) {
        return 0.0;
    }
    let crossings = zero_crossings(values);
    if crossings.len() < 2 {
        return 0.0;
    }
    let half_periods: Vec<f64> = crossings
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) as f64 / sampling_rate_hz)
        .collect();
    let avg_half_period = mean(&half_periods);
    if avg_half_period == 0.0 {
        return 0.0;
    }
    1.0 / (2.0 * avg_half_period)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn square_wave(period: usize, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| if (i % period) < period / 2 { 1.0 } else { -1.0 })
            .collect()
    }

    #[test]
    fn descriptive_stats_of_small_ramp() {
        let stats = StatsEngine::default().compute(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((stats.mean - 3.0).abs() < EPS);
        assert_eq!(stats.high, 5.0);
        assert_eq!(stats.low, 1.0);
        assert_eq!(stats.peak_to_peak, 4.0);
        assert_eq!(stats.amplitude, 2.0);
        assert!((stats.rms - 11.0_f64.sqrt()).abs() < EPS);
        assert!((stats.rms - 3.3166).abs() < 1e-4);
    }

    #[test]
    fn monotonic_ramp_has_no_frequency() {
        let ramp: Vec<f64> = (0..200).map(|i| i as f64).collect();
        assert_eq!(zero_crossings(&ramp).len(), 1);
        assert_eq!(zero_crossing_frequency(&ramp, 29.0), 0.0);
    }

    #[test]
    fn constant_window_has_no_frequency() {
        assert_eq!(zero_crossing_frequency(&[4.0; 50], 29.0), 0.0);
    }

    #[test]
    fn square_wave_frequency_is_rate_over_period() {
        let wave = square_wave(20, 200);
        let freq = zero_crossing_frequency(&wave, 29.0);
        assert!((freq - 29.0 / 20.0).abs() < EPS, "got {freq}");
    }

    #[test]
    fn sine_frequency_is_rate_over_period() {
        let wave: Vec<f64> = (0..200)
            .map(|i| (2.0 * std::f64::consts::PI * (i as f64 + 0.25) / 20.0).sin())
            .collect();
        let freq = zero_crossing_frequency(&wave, 29.0);
        assert!((freq - 1.45).abs() < 1e-6, "got {freq}");
    }

    #[test]
    fn passing_through_the_mean_is_one_crossing() {
        assert_eq!(zero_crossings(&[1.0, 0.0, -1.0]), vec![2]);
        assert_eq!(zero_crossings(&[1.0, 0.0, 1.0]), Vec::<usize>::new());
    }

    #[test]
    fn odd_length_ramp_has_no_frequency() {
        // 50..=250 has its mean (150) on a sample point.
        let ramp: Vec<f64> = (50..=250).map(|i| i as f64).collect();
        assert_eq!(zero_crossings(&ramp).len(), 1);
        assert_eq!(zero_crossing_frequency(&ramp, 29.0), 0.0);
    }

    #[test]
    fn integer_triangle_frequency_is_rate_over_period() {
        let cycle = [0.0, 1.0, 2.0, 1.0, 0.0, -1.0, -2.0, -1.0];
        let wave: Vec<f64> = cycle.iter().copied().cycle().take(200).collect();
        let freq = zero_crossing_frequency(&wave, 29.0);
        assert!((freq - 29.0 / 8.0).abs() < EPS, "got {freq}");
    }

    #[test]
    fn peak_helpers_follow_bounds() {
        assert_eq!(peak_to_peak(-3.0, 5.0), 8.0);
        assert_eq!(amplitude(-3.0, 5.0), 4.0);
    }

    #[test]
    fn empty_window_is_guarded() {
        let engine = StatsEngine::default();
        assert!(matches!(
            engine.try_compute(&[]),
            Err(ScopeError::EmptyWindow)
        ));
        assert_eq!(engine.compute(&[]), StatsSnapshot::default());
    }

    #[test]
    fn non_positive_rate_is_rejected() {
        assert!(StatsEngine::new(0.0).is_err());
        assert!(StatsEngine::new(-3.0).is_err());
        assert!(StatsEngine::new(f64::NAN).is_err());
        assert_eq!(zero_crossing_frequency(&square_wave(4, 40), 0.0), 0.0);
    }
}
