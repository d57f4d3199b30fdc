//! Investment metrics derived from a periodic net cash flow series
//!
//! All metrics degrade to `None` rather than NaN when the series does not
//! support them (no sign change, no contributions, never recovers).

use serde::{Deserialize, Serialize};

/// Schedule columns per year for the monthly source schedule
pub const PERIODS_PER_YEAR: u32 = 12;

/// Search bounds for the periodic rate
const MIN_PERIODIC_RATE: f64 = -0.99;
const MAX_PERIODIC_RATE: f64 = 10.0;

/// Calculate the Internal Rate of Return (IRR) for a series of cash flows
/// using the Newton-Raphson method, falling back to bisection.
///
/// # Arguments
/// * `cashflows` - Vector of cash flows (positive = inflow, negative = outflow)
/// * `periods_per_year` - Number of periods per year (12 for monthly)
///
/// # Returns
/// * `Option<f64>` - Annual IRR as a decimal (e.g., 0.05 for 5%), or None if
///   the series has no sign change or no solution was found
pub fn calculate_irr(cashflows: &[f64], periods_per_year: u32) -> Option<f64> {
    // A root only exists if the series changes sign
    let has_positive = cashflows.iter().any(|&cf| cf > 1e-10);
    let has_negative = cashflows.iter().any(|&cf| cf < -1e-10);
    if !has_positive || !has_negative {
        return None;
    }

    // Newton-Raphson iteration for the periodic rate
    let mut rate = 0.10 / periods_per_year as f64;
    let tolerance = 1e-10;
    let max_iterations = 1000;

    for _ in 0..max_iterations {
        let (npv, dnpv) = npv_and_derivative(cashflows, rate);

        if !npv.is_finite() || !dnpv.is_finite() || dnpv.abs() < 1e-20 {
            return calculate_irr_bisection(cashflows, periods_per_year);
        }

        let new_rate = (rate - npv / dnpv).clamp(MIN_PERIODIC_RATE, MAX_PERIODIC_RATE);

        // Pinned at a bound is not a root
        if new_rate == MIN_PERIODIC_RATE || new_rate == MAX_PERIODIC_RATE {
            return calculate_irr_bisection(cashflows, periods_per_year);
        }

        if (new_rate - rate).abs() < tolerance {
            if is_root(cashflows, new_rate) {
                return annualize(new_rate, periods_per_year);
            }
            return calculate_irr_bisection(cashflows, periods_per_year);
        }

        rate = new_rate;
    }

    calculate_irr_bisection(cashflows, periods_per_year)
}

/// Convert a periodic rate to an annual rate, rejecting non-finite results
fn annualize(periodic_rate: f64, periods_per_year: u32) -> Option<f64> {
    let annual = (1.0 + periodic_rate).powi(periods_per_year as i32) - 1.0;
    annual.is_finite().then_some(annual)
}

/// Whether `rate` zeroes the NPV, relative to the size of the flows
fn is_root(cashflows: &[f64], rate: f64) -> bool {
    let scale = cashflows.iter().map(|cf| cf.abs()).sum::<f64>().max(1.0);
    npv_at_rate(cashflows, rate).abs() <= 1e-6 * scale
}

/// Calculate NPV and its derivative with respect to rate
fn npv_and_derivative(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (t, &cf) in cashflows.iter().enumerate() {
        let discount = (1.0 + rate).powi(t as i32);
        npv += cf / discount;
        if t > 0 {
            dnpv -= (t as f64) * cf / ((1.0 + rate).powi(t as i32 + 1));
        }
    }

    (npv, dnpv)
}

/// Fallback IRR calculation using bisection method
fn calculate_irr_bisection(cashflows: &[f64], periods_per_year: u32) -> Option<f64> {
    let mut low = MIN_PERIODIC_RATE;
    let mut high = MAX_PERIODIC_RATE;
    let tolerance = 1e-10;
    let max_iterations = 1000;

    let mut npv_low = npv_at_rate(cashflows, low);
    let npv_high = npv_at_rate(cashflows, high);

    if !npv_low.is_finite() || !npv_high.is_finite() || npv_low * npv_high > 0.0 {
        return None;
    }

    for _ in 0..max_iterations {
        let mid = (low + high) / 2.0;
        let npv_mid = npv_at_rate(cashflows, mid);

        if npv_mid.abs() < tolerance || (high - low) / 2.0 < tolerance {
            return annualize(mid, periods_per_year);
        }

        if npv_mid * npv_low < 0.0 {
            high = mid;
        } else {
            low = mid;
            npv_low = npv_mid;
        }
    }

    None
}

/// Calculate NPV at a given periodic rate; the first flow is undiscounted
pub fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Periodic rate equivalent to an annual effective rate
pub fn periodic_rate(annual_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + annual_rate).powf(1.0 / periods_per_year as f64) - 1.0
}

/// NPV at an annual discount rate
pub fn npv(cashflows: &[f64], annual_rate: f64, periods_per_year: u32) -> f64 {
    npv_at_rate(cashflows, periodic_rate(annual_rate, periods_per_year))
}

/// Equity paid in and returned, per period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityFlows {
    /// Amounts contributed (positive numbers)
    pub contributions: Vec<f64>,
    /// Amounts distributed (positive numbers)
    pub distributions: Vec<f64>,
}

impl EquityFlows {
    /// Treat every net outflow as a contribution and every net inflow as a distribution
    pub fn from_net(cashflows: &[f64]) -> Self {
        Self {
            contributions: cashflows.iter().map(|cf| (-cf).max(0.0)).collect(),
            distributions: cashflows.iter().map(|cf| cf.max(0.0)).collect(),
        }
    }

    pub fn total_contributed(&self) -> f64 {
        self.contributions.iter().sum()
    }

    pub fn total_distributed(&self) -> f64 {
        self.distributions.iter().sum()
    }

    /// Distributions over contributions; None when nothing was contributed
    pub fn multiple(&self) -> Option<f64> {
        let contributed = self.total_contributed();
        if contributed <= 0.0 {
            None
        } else {
            Some(self.total_distributed() / contributed)
        }
    }
}

/// Largest cumulative deficit over the series (0 if it never goes negative)
pub fn peak_equity(cashflows: &[f64]) -> f64 {
    let mut cumulative: f64 = 0.0;
    let mut peak: f64 = 0.0;
    for cf in cashflows {
        cumulative += cf;
        peak = peak.max(-cumulative);
    }
    peak
}

/// Index of the first period in which the cumulative flow is back at or
/// above zero after having been negative. A series that never goes negative
/// pays back at period 0; one that never recovers returns None.
pub fn payback_period(cashflows: &[f64]) -> Option<usize> {
    let mut cumulative: f64 = 0.0;
    let mut been_negative = false;

    for (index, cf) in cashflows.iter().enumerate() {
        cumulative += cf;
        if cumulative < 0.0 {
            been_negative = true;
        } else if been_negative {
            return Some(index);
        }
    }

    if been_negative || cashflows.is_empty() {
        None
    } else {
        Some(0)
    }
}

/// Gross profit over gross revenue; None without revenue
pub fn gross_margin(gross_profit: f64, gross_revenue: f64) -> Option<f64> {
    if gross_revenue == 0.0 {
        None
    } else {
        Some(gross_profit / gross_revenue)
    }
}

/// Metrics derived from a net cash flow series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestmentMetrics {
    pub irr: Option<f64>,
    pub npv: f64,
    pub equity_multiple: Option<f64>,
    pub peak_equity: f64,
    pub payback_period: Option<usize>,
}

/// Computes investment metrics at a fixed discount rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsCalculator {
    /// Annual discount rate as a decimal
    pub discount_rate: f64,
    pub periods_per_year: u32,
}

impl MetricsCalculator {
    pub fn new(discount_rate: f64) -> Self {
        Self {
            discount_rate,
            periods_per_year: PERIODS_PER_YEAR,
        }
    }

    /// Compute metrics for `net`. Explicit equity flows override the split
    /// derived from the net series.
    pub fn calculate(&self, net: &[f64], equity: Option<&EquityFlows>) -> InvestmentMetrics {
        let equity_multiple = match equity {
            Some(flows) => flows.multiple(),
            None => EquityFlows::from_net(net).multiple(),
        };

        InvestmentMetrics {
            irr: calculate_irr(net, self.periods_per_year),
            npv: npv(net, self.discount_rate, self.periods_per_year),
            equity_multiple,
            peak_equity: peak_equity(net),
            payback_period: payback_period(net),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_irr_land_flip() {
        // Land bought for 2M, sold a year later for 2.2M
        let mut cashflows = vec![-2_000_000.0];
        cashflows.extend(vec![0.0; 11]);
        cashflows.push(2_200_000.0);

        let irr = calculate_irr(&cashflows, 12).unwrap();
        assert_relative_eq!(irr, 0.10, max_relative = 1e-6);
    }

    #[test]
    fn test_irr_presale_deposits() {
        // Buyer deposits up front, then monthly construction draws
        let mut cashflows = vec![500_000.0];
        cashflows.extend(vec![-45_000.0; 12]);

        let irr = calculate_irr(&cashflows, 12).unwrap();
        assert!(irr.is_finite());
        assert_abs_diff_eq!(npv_at_rate(&cashflows, periodic_rate(irr, 12)), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_irr_beyond_search_range_is_none() {
        // Periodic root of 49 lies outside the solver's bracket
        assert_eq!(calculate_irr(&[-100.0, 5000.0], 12), None);

        // A large root inside the bracket is still found
        let irr = calculate_irr(&[-100.0, 150.0], 12).unwrap();
        assert_relative_eq!(irr, 1.5_f64.powi(12) - 1.0, max_relative = 1e-6);
    }

    #[test]
    fn test_irr_without_sign_change_is_none() {
        assert_eq!(calculate_irr(&[100.0, 200.0, 50.0], 12), None);
        assert_eq!(calculate_irr(&[-100.0, -200.0], 12), None);
        assert_eq!(calculate_irr(&[0.0, 0.0, 0.0], 12), None);
        assert_eq!(calculate_irr(&[], 12), None);
    }

    #[test]
    fn test_irr_development_profile() {
        // 18 months of spend, then 12 months of sales
        let mut cashflows = vec![-100_000.0; 18];
        cashflows.extend(vec![200_000.0; 12]);

        let irr = calculate_irr(&cashflows, 12).expect("IRR should exist");
        assert!(irr.is_finite());
        let monthly = periodic_rate(irr, 12);
        assert_abs_diff_eq!(npv_at_rate(&cashflows, monthly), 0.0, epsilon = 1.0);
    }

    #[test]
    fn test_npv_zero_rate_is_sum() {
        let cashflows = [-500.0, 200.0, 400.0];
        assert_relative_eq!(npv(&cashflows, 0.0, 12), 100.0);
    }

    #[test]
    fn test_npv_discounts_from_second_period() {
        let cashflows = [-1000.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1100.0];
        assert_abs_diff_eq!(npv(&cashflows, 0.10, 12), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_equity_multiple() {
        let flows = EquityFlows::from_net(&[-100.0, -100.0, 50.0, 350.0]);
        assert_relative_eq!(flows.multiple().unwrap(), 2.0);
        assert_eq!(EquityFlows::from_net(&[10.0, 20.0]).multiple(), None);
    }

    #[test]
    fn test_peak_equity() {
        assert_relative_eq!(peak_equity(&[-100.0, -50.0, 80.0, -60.0, 500.0]), 150.0);
        assert_eq!(peak_equity(&[10.0, 20.0]), 0.0);
    }

    #[test]
    fn test_payback_period() {
        assert_eq!(payback_period(&[-100.0, 40.0, 40.0, 40.0]), Some(3));
        assert_eq!(payback_period(&[-100.0, 100.0]), Some(1));
        assert_eq!(payback_period(&[0.0, -10.0, 5.0, 5.0]), Some(3));
        assert_eq!(payback_period(&[50.0, 10.0]), Some(0));
    }

    #[test]
    fn test_payback_never_recovers_is_none() {
        assert_eq!(payback_period(&[-100.0, 20.0, 20.0]), None);
        assert_eq!(payback_period(&[]), None);
    }

    #[test]
    fn test_gross_margin() {
        assert_relative_eq!(gross_margin(25.0, 100.0).unwrap(), 0.25);
        assert_eq!(gross_margin(-10.0, 0.0), None);
    }

    #[test]
    fn test_calculator_with_explicit_equity() {
        let calc = MetricsCalculator::new(0.08);
        let net = [-1000.0, 300.0, 300.0, 600.0];
        let equity = EquityFlows {
            contributions: vec![400.0, 0.0, 0.0, 0.0],
            distributions: vec![0.0, 0.0, 0.0, 1000.0],
        };

        let derived = calc.calculate(&net, None);
        let explicit = calc.calculate(&net, Some(&equity));

        assert_relative_eq!(derived.equity_multiple.unwrap(), 1.2);
        assert_relative_eq!(explicit.equity_multiple.unwrap(), 2.5);
        assert_eq!(derived.irr, explicit.irr);
        assert_eq!(derived.payback_period, Some(3));
    }

    #[test]
    fn test_all_positive_series_never_nan() {
        let calc = MetricsCalculator::new(0.10);
        let metrics = calc.calculate(&[100.0, 200.0, 300.0], None);
        assert_eq!(metrics.irr, None);
        assert_eq!(metrics.equity_multiple, None);
        assert!(metrics.npv.is_finite());
        assert_eq!(metrics.payback_period, Some(0));
    }
}
