//! Sample statistics and return transforms.
//!
//! Conventions:
//! - `sample_variance` uses the unbiased `n - 1` denominator.
//! - `empirical_quantile` interpolates linearly between order statistics,
//!   matching the common `rank = p * (n - 1)` definition.

const MIN_STD: f64 = 1.0e-12;

/// Computes simple returns from a price series.
///
/// `r_t = P_t / P_{t-1} - 1`
///
/// # Panics
/// Panics if fewer than 2 prices are supplied, or if any price is non-finite
/// or <= 0.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    assert!(prices.len() >= 2, "prices must contain at least two values");
    assert!(
        prices.iter().all(|x| x.is_finite() && *x > 0.0),
        "prices must be finite and strictly positive"
    );
    prices
        .windows(2)
        .map(|w| w[1] / w[0] - 1.0)
        .collect::<Vec<_>>()
}

/// Arithmetic mean of a non-empty sample.
///
/// # Panics
/// Panics if `values` is empty.
pub fn sample_mean(values: &[f64]) -> f64 {
    assert!(!values.is_empty(), "values must not be empty");
    values.iter().sum::<f64>() / values.len() as f64
}

/// Unbiased sample variance (denominator `n - 1`).
///
/// # Panics
/// Panics if fewer than 2 observations are supplied.
pub fn sample_variance(values: &[f64]) -> f64 {
    assert!(values.len() >= 2, "at least 2 observations are required");
    let mean = sample_mean(values);
    let mut sum = 0.0;
    for &x in values {
        let d = x - mean;
        sum += d * d;
    }
    sum / (values.len() as f64 - 1.0)
}

/// Sample standard deviation.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    sample_variance(values).max(0.0).sqrt()
}

/// Empirical `p`-quantile with linear interpolation between order statistics.
///
/// # Panics
/// Panics if `values` is empty or `p` is outside `[0, 1]`.
pub fn empirical_quantile(values: &[f64], p: f64) -> f64 {
    assert!(!values.is_empty(), "values must not be empty");
    assert!(
        p.is_finite() && (0.0..=1.0).contains(&p),
        "quantile level must be in [0,1]"
    );

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = p * (sorted.len() as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let w = rank - lo as f64;
        sorted[lo] + w * (sorted[hi] - sorted[lo])
    }
}

/// Returns true when the sample is numerically constant.
pub fn is_degenerate(values: &[f64]) -> bool {
    values.len() < 2 || sample_variance(values) <= MIN_STD * MIN_STD
}
