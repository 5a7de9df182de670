use crate::signal::ScopeError;

/// Causal moving average over the newest `window_size` values of `history`.
///
/// Shorter histories are averaged in full. An empty history yields `0.0`.
pub fn moving_average<I>(history: I, window_size: usize) -> f64
where
    I: DoubleEndedIterator<Item = f64> + ExactSizeIterator,
{
    let take = history.len().min(window_size.max(1));
    if take == 0 {
        return 0.0;
    }
    let sum: f64 = history.rev().take(take).sum();
    sum / take as f64
}

/// Moving-average smoother applied to each raw sample as it arrives.
#[derive(Clone, Copy, Debug)]
pub struct Smoother {
    window_size: usize,
}

impl Default for Smoother {
    fn default() -> Self {
        // Pass-through.
        Self { window_size: 1 }
    }
}

impl Smoother {
    pub fn new(window_size: usize) -> Result<Self, ScopeError> {
        if window_size == 0 {
            return Err(ScopeError::InvalidSmootherWindow);
        }
        Ok(Self { window_size })
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn apply<I>(&self, history: I) -> f64
    where
        I: DoubleEndedIterator<Item = f64> + ExactSizeIterator,
    {
        moving_average(history, self.window_size)
    }
}

/// Shifts `values` so that their mean equals `reference`.
pub fn correct_offset(values: &[f64], reference: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let offset = mean - reference;
    values.iter().map(|v| v - offset).collect()
}

/// DC-offset removal, recomputed from the whole window every time it runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct OffsetCorrector {
    reference: f64,
}

impl OffsetCorrector {
    pub fn with_reference(reference: f64) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    /// Identity when `enabled` is false.
    pub fn correct(&self, values: Vec<f64>, enabled: bool) -> Vec<f64> {
        if enabled {
            correct_offset(&values, self.reference)
        } else {
            values
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn unit_window_passes_latest_value_through() {
        let mut history = vec![0.0; 10];
        for value in [3.5, -1.0, 42.0] {
            history.push(value);
            assert_eq!(Smoother::default().apply(history.iter().copied()), value);
        }
    }

    #[test]
    fn short_history_averages_everything() {
        let history = [2.0, 4.0];
        assert_eq!(moving_average(history.iter().copied(), 5), 3.0);
    }

    #[test]
    fn long_history_averages_newest_values() {
        let history = [100.0, 1.0, 2.0, 3.0];
        assert_eq!(moving_average(history.iter().copied(), 3), 2.0);
    }

    #[test]
    fn empty_history_is_zero() {
        assert_eq!(moving_average(Vec::<f64>::new().into_iter(), 4), 0.0);
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(matches!(
            Smoother::new(0),
            Err(ScopeError::InvalidSmootherWindow)
        ));
    }

    #[test]
    fn corrected_mean_matches_reference() {
        let values = [5.0, 7.0, 9.0, 11.0, 3.25];
        for reference in [0.0, 2.5, -10.0] {
            let corrected = correct_offset(&values, reference);
            assert_eq!(corrected.len(), values.len());
            assert!((mean(&corrected) - reference).abs() < 1e-9);
        }
    }

    #[test]
    fn correction_preserves_shape() {
        let corrected = correct_offset(&[1.0, 2.0, 3.0], 0.0);
        assert_eq!(corrected, vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn correction_is_fixed_point_when_mean_equals_reference() {
        let values = vec![-1.0, 0.0, 1.0];
        let corrector = OffsetCorrector::default();
        assert_eq!(corrector.correct(values.clone(), true), values);
    }

    #[test]
    fn disabled_corrector_is_identity() {
        let values = vec![10.0, 20.0, 30.0];
        let corrector = OffsetCorrector::with_reference(1.0);
        assert_eq!(corrector.correct(values.clone(), false), values);
    }
}
