//! Per-period weight generation for spreading an amount over its duration
//!
//! Even, milestone and manual items spread uniformly. Curve items follow a
//! logistic S-curve whose steepness and midpoint are set by the item's curve
//! parameters.

use crate::budget::{CurveProfile, TimingMethod};

/// Steepness used when a curve item does not specify one
pub const DEFAULT_STEEPNESS: f64 = 50.0;

/// Logistic slope at steepness 0
const MIN_LOGISTIC_K: f64 = 0.2;

/// Logistic slope at steepness 100
const MAX_LOGISTIC_K: f64 = 1.0;

/// Midpoint shift for front/back loading, as a fraction of the period count
const LOADING_SHIFT: f64 = 0.15;

/// Parameters controlling how an amount is distributed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistributionParams {
    pub method: TimingMethod,
    pub profile: CurveProfile,
    /// 0-100; out-of-range values are clamped
    pub steepness: f64,
}

impl Default for DistributionParams {
    fn default() -> Self {
        Self {
            method: TimingMethod::Distributed,
            profile: CurveProfile::Standard,
            steepness: DEFAULT_STEEPNESS,
        }
    }
}

impl DistributionParams {
    pub fn even() -> Self {
        Self::default()
    }

    pub fn curve(profile: CurveProfile, steepness: f64) -> Self {
        Self {
            method: TimingMethod::Curve,
            profile,
            steepness,
        }
    }

    /// Logistic slope k in [0.2, 1.0]
    fn logistic_k(&self) -> f64 {
        let steepness = if self.steepness.is_nan() {
            DEFAULT_STEEPNESS
        } else {
            self.steepness.clamp(0.0, 100.0)
        };
        MIN_LOGISTIC_K + (MAX_LOGISTIC_K - MIN_LOGISTIC_K) * steepness / 100.0
    }

    /// Sigmoid midpoint for an n-period curve
    fn midpoint(&self, periods: usize) -> f64 {
        let n = periods as f64;
        let centre = (n - 1.0) / 2.0;
        match self.profile {
            CurveProfile::Standard => centre,
            CurveProfile::FrontLoaded => centre - LOADING_SHIFT * n,
            CurveProfile::BackLoaded => centre + LOADING_SHIFT * n,
        }
    }
}

/// Un-normalized weights for `periods` periods. Callers normally want [`weights`].
///
/// For curves, period 0 keeps the raw cumulative sigmoid value rather than a
/// difference, since there is no period -1 to difference against.
pub fn raw_weights(periods: i32, params: &DistributionParams) -> Vec<f64> {
    if periods <= 0 {
        return Vec::new();
    }
    let n = periods as usize;

    match params.method {
        TimingMethod::Distributed | TimingMethod::Milestone | TimingMethod::Manual => {
            vec![1.0 / n as f64; n]
        }
        TimingMethod::Curve => {
            let k = params.logistic_k();
            let mid = params.midpoint(n);
            let cumulative = |x: f64| 1.0 / (1.0 + (-k * (x - mid)).exp());

            (0..n)
                .map(|i| {
                    let x = i as f64;
                    if i == 0 {
                        cumulative(x)
                    } else {
                        cumulative(x) - cumulative(x - 1.0)
                    }
                })
                .collect()
        }
    }
}

/// Weights for `periods` periods, renormalized to sum to 1.0
pub fn weights(periods: i32, params: &DistributionParams) -> Vec<f64> {
    let raw = raw_weights(periods, params);
    let total: f64 = raw.iter().sum();

    if total <= 0.0 || !total.is_finite() {
        let n = raw.len();
        return vec![1.0 / n as f64; n];
    }

    raw.into_iter().map(|w| w / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_even_weights_uniform() {
        let w = weights(4, &DistributionParams::even());
        assert_eq!(w, vec![0.25; 4]);
    }

    #[test]
    fn test_non_positive_periods_empty() {
        assert!(weights(0, &DistributionParams::even()).is_empty());
        assert!(weights(-3, &DistributionParams::curve(CurveProfile::Standard, 50.0)).is_empty());
    }

    #[test]
    fn test_weights_sum_to_one_everywhere() {
        let methods = [
            TimingMethod::Distributed,
            TimingMethod::Milestone,
            TimingMethod::Manual,
            TimingMethod::Curve,
        ];
        let profiles = [CurveProfile::Standard, CurveProfile::FrontLoaded, CurveProfile::BackLoaded];

        for n in 1..=60 {
            for method in methods {
                for profile in profiles {
                    for steepness in [-20.0, 0.0, 35.0, 50.0, 100.0, 250.0] {
                        let params = DistributionParams { method, profile, steepness };
                        let w = weights(n, &params);
                        assert_eq!(w.len(), n as usize);
                        let sum: f64 = w.iter().sum();
                        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
                        assert!(w.iter().all(|x| *x >= 0.0));
                    }
                }
            }
        }
    }

    #[test]
    fn test_long_steep_curve_tail_rounds_to_zero() {
        // The sigmoid saturates to 1.0 in f64 before the final month
        let w = weights(60, &DistributionParams::curve(CurveProfile::FrontLoaded, 100.0));
        assert_eq!(w.len(), 60);
        assert_eq!(w[59], 0.0);
        assert!(w.iter().all(|x| *x >= 0.0));
        let sum: f64 = w.iter().sum();
        assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_first_period_keeps_raw_cumulative() {
        let params = DistributionParams::curve(CurveProfile::Standard, 50.0);
        let raw = raw_weights(12, &params);
        let k: f64 = 0.6;
        let mid: f64 = 5.5;
        let expected = 1.0 / (1.0 + (k * mid).exp());
        assert_abs_diff_eq!(raw[0], expected, epsilon = 1e-12);
    }

    #[test]
    fn test_steepness_clamped() {
        let low = DistributionParams::curve(CurveProfile::Standard, -10.0);
        let zero = DistributionParams::curve(CurveProfile::Standard, 0.0);
        assert_eq!(raw_weights(10, &low), raw_weights(10, &zero));

        let high = DistributionParams::curve(CurveProfile::Standard, 400.0);
        let hundred = DistributionParams::curve(CurveProfile::Standard, 100.0);
        assert_eq!(raw_weights(10, &high), raw_weights(10, &hundred));
    }

    #[test]
    fn test_front_loaded_spends_earlier_than_back_loaded() {
        let n = 20;
        let front = weights(n, &DistributionParams::curve(CurveProfile::FrontLoaded, 60.0));
        let back = weights(n, &DistributionParams::curve(CurveProfile::BackLoaded, 60.0));

        let first_half = |w: &[f64]| w[..10].iter().sum::<f64>();
        assert!(first_half(&front) > 0.5);
        assert!(first_half(&back) < 0.5);
    }

    #[test]
    fn test_standard_curve_peaks_mid_duration() {
        let w = weights(11, &DistributionParams::curve(CurveProfile::Standard, 80.0));
        let peak = w
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert!((4..=6).contains(&peak));
    }
}
