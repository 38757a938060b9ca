//! Aligned market data for the optimizer.
//!
//! The optimizer consumes daily simple returns per asset with no missing
//! values. This module provides:
//! - [`PricePanel`]: aligned daily closes indexed by trading date, with rows
//!   containing any missing price dropped at construction,
//! - [`ReturnPanel`]: the derived return series in `returns[asset][time]`
//!   layout,
//! - [`ReturnsSource`]: the retrieval seam the pipeline depends on (network
//!   retrieval itself stays out of scope), plus an in-memory implementation,
//! - [`synthetic_drift_series`]: seeded synthetic price paths used to build
//!   adversarial test assets.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::core::OptimizerError;
use crate::math::{sample_mean, simple_returns};

/// Aligned daily closing prices for a set of assets.
///
/// Invariant: every retained date carries a price for every asset.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePanel {
    assets: Vec<String>,
    dates: Vec<NaiveDate>,
    /// Layout: `closes[asset][time]`.
    closes: Vec<Vec<f64>>,
}

impl PricePanel {
    /// Builds a panel from per-date rows, dropping any row with a missing or
    /// non-positive price. Rows are sorted by date.
    ///
    /// # Panics
    /// Panics if `assets` is empty or a row's width does not match it.
    pub fn from_daily_rows(
        assets: Vec<String>,
        mut rows: Vec<(NaiveDate, Vec<Option<f64>>)>,
    ) -> Self {
        assert!(!assets.is_empty(), "assets must not be empty");
        rows.sort_by_key(|(date, _)| *date);

        let n = assets.len();
        let mut dates = Vec::with_capacity(rows.len());
        let mut closes = vec![Vec::with_capacity(rows.len()); n];

        for (date, row) in rows {
            assert!(
                row.len() == n,
                "row width {} does not match {} assets",
                row.len(),
                n
            );
            let complete = row
                .iter()
                .all(|p| matches!(p, Some(v) if v.is_finite() && *v > 0.0));
            if !complete {
                continue;
            }
            dates.push(date);
            for (i, p) in row.into_iter().enumerate() {
                closes[i].push(p.expect("row completeness checked above"));
            }
        }

        Self {
            assets,
            dates,
            closes,
        }
    }

    #[inline]
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    #[inline]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    #[inline]
    pub fn n_obs(&self) -> usize {
        self.dates.len()
    }

    /// Closing-price series for one asset, aligned to `dates()`.
    pub fn closes(&self, asset: &str) -> Option<&[f64]> {
        let idx = self.assets.iter().position(|a| a == asset)?;
        Some(&self.closes[idx])
    }

    /// Derives the simple-return panel.
    ///
    /// # Errors
    /// Returns `InsufficientData` when fewer than two aligned dates remain.
    pub fn returns(&self) -> Result<ReturnPanel, OptimizerError> {
        if self.n_obs() < 2 {
            return Err(OptimizerError::InsufficientData(format!(
                "need at least 2 aligned dates to compute returns, have {}",
                self.n_obs()
            )));
        }
        let returns = self
            .closes
            .iter()
            .map(|series| simple_returns(series))
            .collect();
        Ok(ReturnPanel {
            assets: self.assets.clone(),
            returns,
        })
    }
}

/// Aligned daily simple returns, `returns[asset][time]`, no missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnPanel {
    assets: Vec<String>,
    returns: Vec<Vec<f64>>,
}

impl ReturnPanel {
    /// Builds a panel directly from aligned return series.
    ///
    /// # Panics
    /// Panics on empty input, mismatched lengths, or non-finite values.
    pub fn from_returns(assets: Vec<String>, returns: Vec<Vec<f64>>) -> Self {
        assert!(
            !assets.is_empty() && assets.len() == returns.len(),
            "assets and return series counts must match and be non-empty"
        );
        let n_obs = returns[0].len();
        for (i, series) in returns.iter().enumerate() {
            assert!(
                series.len() == n_obs,
                "return series {i} length mismatch: {} vs {n_obs}",
                series.len()
            );
            assert!(
                series.iter().all(|r| r.is_finite()),
                "return series {i} contains non-finite values"
            );
        }
        Self { assets, returns }
    }

    #[inline]
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    #[inline]
    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    #[inline]
    pub fn n_obs(&self) -> usize {
        self.returns.first().map_or(0, |s| s.len())
    }

    /// Return series for asset index `i`.
    #[inline]
    pub fn series(&self, i: usize) -> &[f64] {
        &self.returns[i]
    }

    /// Historical mean return per asset, in asset order.
    pub fn historical_means(&self) -> Vec<f64> {
        self.returns.iter().map(|s| sample_mean(s)).collect()
    }

    /// Daily portfolio returns for the given weights (weights dotted with
    /// each day's cross-section).
    ///
    /// # Panics
    /// Panics when `weights` length does not match the asset count.
    pub fn portfolio_returns(&self, weights: &[f64]) -> Vec<f64> {
        assert!(
            weights.len() == self.n_assets(),
            "weights length {} does not match {} assets",
            weights.len(),
            self.n_assets()
        );
        let n_obs = self.n_obs();
        let mut out = vec![0.0; n_obs];
        for (series, &w) in self.returns.iter().zip(weights) {
            for (t, &r) in series.iter().enumerate() {
                out[t] += w * r;
            }
        }
        out
    }
}

/// Retrieval seam for aligned, gap-dropped return data.
///
/// The pipeline only needs this interface; where the prices come from
/// (vendor API, files, a test fixture) is the implementor's concern.
pub trait ReturnsSource {
    /// Returns aligned daily simple returns for `identifiers` over
    /// `[start, end]`, with incomplete rows already dropped.
    fn returns(
        &self,
        identifiers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReturnPanel, OptimizerError>;
}

/// In-memory [`ReturnsSource`] backed by per-asset dated closes.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    closes: BTreeMap<String, BTreeMap<NaiveDate, f64>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dated close series for one asset.
    pub fn insert(&mut self, asset: impl Into<String>, series: Vec<(NaiveDate, f64)>) {
        self.closes.insert(asset.into(), series.into_iter().collect());
    }
}

impl ReturnsSource for InMemorySource {
    fn returns(
        &self,
        identifiers: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<ReturnPanel, OptimizerError> {
        for id in identifiers {
            if !self.closes.contains_key(id) {
                return Err(OptimizerError::InsufficientData(format!(
                    "no price data registered for `{id}`"
                )));
            }
        }

        let mut dates: Vec<NaiveDate> = self
            .closes
            .values()
            .flat_map(|series| series.keys().copied())
            .filter(|d| *d >= start && *d <= end)
            .collect();
        dates.sort_unstable();
        dates.dedup();

        let rows = dates
            .into_iter()
            .map(|date| {
                let row = identifiers
                    .iter()
                    .map(|id| self.closes[id].get(&date).copied())
                    .collect();
                (date, row)
            })
            .collect();

        PricePanel::from_daily_rows(identifiers.to_vec(), rows).returns()
    }
}

/// Generates a synthetic daily price path with normal returns of the given
/// drift and volatility, starting at `last_price`.
///
/// Mirrors the adversarial low-quality asset of the reference setup: a
/// strongly negative drift with high volatility produces a series whose
/// historical mean return is reliably negative.
///
/// # Panics
/// Panics if `n == 0`, `last_price <= 0`, or `std_dev < 0`.
pub fn synthetic_drift_series(
    last_price: f64,
    mean: f64,
    std_dev: f64,
    n: usize,
    seed: u64,
) -> Vec<f64> {
    assert!(n > 0, "n must be > 0");
    assert!(
        last_price.is_finite() && last_price > 0.0,
        "last_price must be finite and > 0"
    );

    let normal = Normal::new(mean, std_dev).expect("std_dev must be finite and >= 0");
    let mut rng = StdRng::seed_from_u64(seed);

    let mut prices = Vec::with_capacity(n);
    let mut level = last_price;
    for _ in 0..n {
        let r: f64 = normal.sample(&mut rng);
        // Returns below -95% are truncated to keep the price path positive.
        level *= 1.0 + r.max(-0.95);
        prices.push(level);
    }
    prices
}
