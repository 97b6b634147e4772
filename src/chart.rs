//! Price-history chart windowing
//!
//! The server keeps no price history, so each chart renders a synthetic
//! random walk anchored at the live market price. The walk is generated
//! newest-first: the final sample is always exactly the current price, and
//! every step back perturbs the previous value by a per-range fraction.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Selectable chart window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    Day,
    Week,
    Month,
    Quarter,
    YearToDate,
    Year,
    All,
}

impl TimeRange {
    pub const ALL: [TimeRange; 7] = [
        TimeRange::Day,
        TimeRange::Week,
        TimeRange::Month,
        TimeRange::Quarter,
        TimeRange::YearToDate,
        TimeRange::Year,
        TimeRange::All,
    ];

    /// The label shown on the range selector.
    pub fn token(&self) -> &'static str {
        match self {
            TimeRange::Day => "1D",
            TimeRange::Week => "1W",
            TimeRange::Month => "1M",
            TimeRange::Quarter => "3M",
            TimeRange::YearToDate => "YTD",
            TimeRange::Year => "1Y",
            TimeRange::All => "ALL",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        TimeRange::ALL.into_iter().find(|r| r.token() == token)
    }

    /// Sample count and spacing for this window.
    pub fn window(&self) -> (usize, Duration) {
        match self {
            TimeRange::Day => (24, Duration::hours(1)),
            TimeRange::Week => (7, Duration::hours(24)),
            TimeRange::Month => (30, Duration::days(1)),
            TimeRange::Quarter => (13, Duration::weeks(1)),
            TimeRange::YearToDate => (26, Duration::weeks(1)),
            TimeRange::Year => (12, Duration::days(30)),
            TimeRange::All => (10, Duration::days(365)),
        }
    }

    /// Maximum relative move between adjacent samples. Wider windows get
    /// coarser steps so long-range charts still look like markets.
    fn step_fraction(&self) -> f64 {
        match self {
            TimeRange::Day => 0.005,
            TimeRange::Week => 0.01,
            TimeRange::Month => 0.02,
            TimeRange::Quarter => 0.03,
            TimeRange::YearToDate => 0.03,
            TimeRange::Year => 0.05,
            TimeRange::All => 0.08,
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub at: DateTime<Utc>,
    pub value: f64,
}

/// Build the synthetic series for one stock, oldest sample first. The
/// last point is `(now, price)` exactly.
pub fn price_series(price: Decimal, range: TimeRange, now: DateTime<Utc>) -> Vec<ChartPoint> {
    let (samples, step) = range.window();
    let fraction = range.step_fraction();
    let anchor = price.to_f64().unwrap_or(0.0);

    let mut rng = rand::rng();
    let mut points = Vec::with_capacity(samples);
    let mut value = anchor;

    for i in 0..samples {
        points.push(ChartPoint {
            at: now - step * (i as i32),
            value,
        });
        // Perturb backwards in time, never below zero.
        let drift: f64 = rng.random_range(-fraction..=fraction);
        value = (value * (1.0 + drift)).max(0.0);
    }

    points.reverse();
    points
}

/// Only-expanding y-axis accumulator. Feeding it successive series keeps
/// the axis stable while live prices wiggle.
#[derive(Debug, Default, Clone, Copy)]
pub struct AxisBounds {
    min: Option<f64>,
    max: Option<f64>,
}

impl AxisBounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, value: f64) {
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn observe_series(&mut self, series: &[ChartPoint]) {
        for point in series {
            self.observe(point.value);
        }
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        Some((self.min?, self.max?))
    }

    /// The range widened by `margin` of its span on each side, for axis
    /// headroom. A flat series pads by `margin` of the value itself.
    pub fn padded(&self, margin: f64) -> Option<(f64, f64)> {
        let (min, max) = self.range()?;
        let span = max - min;
        let pad = if span > 0.0 {
            span * margin
        } else {
            max.abs() * margin
        };
        Some((min - pad, max + pad))
    }

    /// Forget everything, e.g. when the user switches ranges.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn weekly_window_is_seven_daily_samples_ending_now() {
        let now = Utc::now();
        let series = price_series(dec!(150), TimeRange::Week, now);

        assert_eq!(series.len(), 7);
        assert_eq!(series[6].at, now);
        assert_eq!(series[0].at, now - Duration::hours(24 * 6));
        for pair in series.windows(2) {
            assert_eq!(pair[1].at - pair[0].at, Duration::hours(24));
        }
    }

    #[test]
    fn newest_sample_is_the_live_price() {
        let now = Utc::now();
        for range in TimeRange::ALL {
            let series = price_series(dec!(99.5), range, now);
            assert_eq!(series.last().unwrap().value, 99.5);
        }
    }

    #[test]
    fn walk_never_goes_negative() {
        let now = Utc::now();
        // A penny stock exercises the clamp.
        let series = price_series(dec!(0.01), TimeRange::All, now);
        assert!(series.iter().all(|p| p.value >= 0.0));
    }

    #[test]
    fn tokens_round_trip() {
        for range in TimeRange::ALL {
            assert_eq!(TimeRange::from_token(range.token()), Some(range));
        }
        assert_eq!(TimeRange::from_token("2D"), None);
    }

    #[test]
    fn axis_bounds_only_expand() {
        let mut bounds = AxisBounds::new();
        bounds.observe(10.0);
        bounds.observe(20.0);
        assert_eq!(bounds.range(), Some((10.0, 20.0)));

        bounds.observe(5.0);
        bounds.observe(15.0);
        assert_eq!(bounds.range(), Some((5.0, 20.0)));

        bounds.observe(12.0);
        bounds.observe(18.0);
        assert_eq!(bounds.range(), Some((5.0, 20.0)));
    }

    #[test]
    fn padded_adds_headroom_on_both_sides() {
        let mut bounds = AxisBounds::new();
        bounds.observe(100.0);
        bounds.observe(200.0);
        assert_eq!(bounds.padded(0.1), Some((90.0, 210.0)));
    }

    #[test]
    fn flat_series_still_pads() {
        let mut bounds = AxisBounds::new();
        bounds.observe(50.0);
        let (lo, hi) = bounds.padded(0.1).unwrap();
        assert!(lo < 50.0 && hi > 50.0);
    }

    #[test]
    fn reset_forgets_prior_observations() {
        let mut bounds = AxisBounds::new();
        bounds.observe(1.0);
        bounds.reset();
        assert_eq!(bounds.range(), None);
    }
}
