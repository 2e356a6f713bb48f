//! Descriptive statistics and Pearson correlation
//!
//! Every function here is total: empty, mismatched or degenerate input
//! yields a defined value (0) instead of NaN or an error.

use std::collections::BTreeMap;

use crate::types::{CorrelationMatrix, CorrelationReport, DescriptiveStats};

/// Arithmetic mean, 0 for empty input
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

fn is_constant(data: &[f64]) -> bool {
    match data.first() {
        Some(first) => data.iter().all(|v| v == first),
        None => true,
    }
}

/// Pearson correlation coefficient of two equal-length series
///
/// Returns 0 when the lengths differ, either series is empty, or either
/// series has zero variance.
pub fn correlation(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }
    // A constant series can still leave rounding residue around its mean
    if is_constant(x) || is_constant(y) {
        return 0.0;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    let mut numerator = 0.0;
    let mut sum_x_sq = 0.0;
    let mut sum_y_sq = 0.0;

    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        numerator += dx * dy;
        sum_x_sq += dx * dx;
        sum_y_sq += dy * dy;
    }

    let denominator = (sum_x_sq * sum_y_sq).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }

    (numerator / denominator).clamp(-1.0, 1.0)
}

/// Mean and sample standard deviation (divisor n - 1)
///
/// Empty input gives `{0, 0}`; a single value gives `{v, 0}`.
pub fn descriptive_stats(data: &[f64]) -> DescriptiveStats {
    if data.is_empty() {
        return DescriptiveStats::default();
    }

    let average = mean(data);
    if data.len() == 1 {
        return DescriptiveStats {
            average,
            std_dev: 0.0,
        };
    }

    let variance = data
        .iter()
        .map(|v| {
            let diff = v - average;
            diff * diff
        })
        .sum::<f64>()
        / (data.len() - 1) as f64;

    DescriptiveStats {
        average,
        std_dev: variance.sqrt(),
    }
}

/// Sample covariance (divisor n - 1) of two equal-length series
pub fn covariance(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }
    if x.len() == 1 {
        return 0.0;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);

    x.iter()
        .zip(y)
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum::<f64>()
        / (x.len() - 1) as f64
}

/// Pairwise correlation over every ordered pair of symbols
///
/// The diagonal is set to exactly 1.0 for every symbol, including ones
/// whose series is constant and would otherwise correlate to 0.
pub fn correlation_matrix(prices: &[(String, Vec<f64>)]) -> CorrelationMatrix {
    let mut matrix = CorrelationMatrix::new();

    for (a, xs) in prices {
        for (b, ys) in prices {
            let value = if a == b { 1.0 } else { correlation(xs, ys) };
            matrix.set(a, b, value);
        }
    }

    matrix
}

/// Per-symbol statistics plus the full correlation matrix
pub fn build_report(prices: &[(String, Vec<f64>)], time_range: usize) -> CorrelationReport {
    let statistics: BTreeMap<String, DescriptiveStats> = prices
        .iter()
        .map(|(symbol, series)| (symbol.clone(), descriptive_stats(series)))
        .collect();

    CorrelationReport {
        matrix: correlation_matrix(prices),
        statistics,
        symbols: prices.iter().map(|(symbol, _)| symbol.clone()).collect(),
        time_range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn correlation_is_symmetric() {
        let x = [1.0, 2.0, 4.0, 3.0, 7.0];
        let y = [2.0, 1.0, 5.0, 6.0, 4.0];
        assert!(approx(correlation(&x, &y), correlation(&y, &x)));
    }

    #[test]
    fn self_correlation_is_one() {
        let x = [175.2, 176.0, 174.8, 177.3];
        assert!(approx(correlation(&x, &x), 1.0));
    }

    #[test]
    fn perfectly_inverse_series_correlate_to_minus_one() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [8.0, 6.0, 4.0, 2.0];
        assert!(approx(correlation(&x, &y), -1.0));
    }

    #[test]
    fn correlation_saturates_to_zero() {
        assert_eq!(correlation(&[], &[]), 0.0);
        assert_eq!(correlation(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(correlation(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(correlation(&[1.0, 2.0, 3.0], &[0.1, 0.1, 0.1]), 0.0);
    }

    #[test]
    fn correlation_stays_in_range() {
        let x = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let y = [0.2, 0.4, 0.6, 0.8, 1.0, 1.2];
        let r = correlation(&x, &y);
        assert!((-1.0..=1.0).contains(&r));
    }

    #[test]
    fn stats_of_empty_input_are_zero() {
        let stats = descriptive_stats(&[]);
        assert_eq!(stats.average, 0.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn stats_of_single_value_have_zero_std_dev() {
        let stats = descriptive_stats(&[42.5]);
        assert_eq!(stats.average, 42.5);
        assert_eq!(stats.std_dev, 0.0);
        assert!(!stats.std_dev.is_nan());
    }

    #[test]
    fn stats_use_sample_variance() {
        let stats = descriptive_stats(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!(approx(stats.average, 5.0));
        assert!((stats.std_dev - 2.138).abs() < 1e-3);
    }

    #[test]
    fn covariance_matches_sample_definition() {
        let x = [1.0, 2.0, 3.0];
        let y = [2.0, 4.0, 6.0];
        assert!(approx(covariance(&x, &y), 2.0));
        assert_eq!(covariance(&[1.0], &[2.0]), 0.0);
        assert_eq!(covariance(&[], &[]), 0.0);
        assert_eq!(covariance(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn matrix_diagonal_is_one_even_for_constant_series() {
        let prices = vec![
            ("AAPL".to_string(), vec![1.0, 2.0, 3.0]),
            ("FLAT".to_string(), vec![7.0, 7.0, 7.0]),
        ];
        let matrix = correlation_matrix(&prices);
        assert_eq!(matrix.get("AAPL", "AAPL"), Some(1.0));
        assert_eq!(matrix.get("FLAT", "FLAT"), Some(1.0));
        assert_eq!(matrix.get("AAPL", "FLAT"), Some(0.0));
    }

    #[test]
    fn matrix_is_symmetric() {
        let prices = vec![
            ("AAPL".to_string(), vec![1.0, 3.0, 2.0, 5.0]),
            ("GOOGL".to_string(), vec![2.0, 2.5, 4.0, 3.0]),
        ];
        let matrix = correlation_matrix(&prices);
        assert_eq!(matrix.get("AAPL", "GOOGL"), matrix.get("GOOGL", "AAPL"));
    }

    #[test]
    fn report_keeps_symbol_order_and_stats() {
        let prices = vec![
            ("TSLA".to_string(), vec![250.0, 252.0]),
            ("AAPL".to_string(), vec![175.0, 174.0]),
        ];
        let report = build_report(&prices, 2);
        assert_eq!(report.symbols, vec!["TSLA", "AAPL"]);
        assert!(approx(report.statistics["TSLA"].average, 251.0));
        assert_eq!(report.time_range, 2);
        assert_eq!(report.correlation("TSLA", "AAPL"), Some(-1.0));
    }
}
