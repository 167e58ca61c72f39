//! Quantile-band support/resistance.
//!
//! Outer bands (default 25th/75th percentile of closes) describe the range;
//! inner bands (default 15th/85th) are the entry triggers. A bar closing
//! strictly below the inner support is `Support`, strictly above the inner
//! resistance is `Resistance`.

use super::{ZoneClassification, ZoneLevels, ZoneStrategy};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileLevels {
    pub support: f64,
    pub resistance: f64,
    pub inner_support: f64,
    pub inner_resistance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantileBandStrategy {
    pub support_q: f64,
    pub resistance_q: f64,
    pub inner_support_q: f64,
    pub inner_resistance_q: f64,
}

impl Default for QuantileBandStrategy {
    fn default() -> Self {
        Self {
            support_q: 0.25,
            resistance_q: 0.75,
            inner_support_q: 0.15,
            inner_resistance_q: 0.85,
        }
    }
}

impl QuantileBandStrategy {
    pub fn levels(&self, closes: &[f64]) -> Option<QuantileLevels> {
        if closes.is_empty() {
            return None;
        }
        let mut sorted = closes.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Some(QuantileLevels {
            support: quantile_sorted(&sorted, self.support_q),
            resistance: quantile_sorted(&sorted, self.resistance_q),
            inner_support: quantile_sorted(&sorted, self.inner_support_q),
            inner_resistance: quantile_sorted(&sorted, self.inner_resistance_q),
        })
    }
}

impl ZoneStrategy for QuantileBandStrategy {
    fn name(&self) -> &'static str {
        "quantile"
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn requires_trend_confirmation(&self) -> bool {
        true
    }

    fn classify(&self, closes: &[f64]) -> (Vec<ZoneClassification>, Option<ZoneLevels>) {
        let Some(levels) = self.levels(closes) else {
            return (Vec::new(), None);
        };
        let zones = closes
            .iter()
            .map(|&close| {
                if close < levels.inner_support {
                    ZoneClassification::Support
                } else if close > levels.inner_resistance {
                    ZoneClassification::Resistance
                } else {
                    ZoneClassification::None
                }
            })
            .collect();
        (zones, Some(ZoneLevels::Bands(levels)))
    }
}

/// Quantile of a sorted slice using linear interpolation between closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.0), 1.0);
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.5), 3.0);
        assert_abs_diff_eq!(quantile_sorted(&sorted, 1.0), 5.0);
        // rank = 0.15 * 4 = 0.6 → 1.0 + 0.6
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.15), 1.6, epsilon = 1e-12);
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.25), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn quantile_single_and_empty() {
        assert_eq!(quantile_sorted(&[7.0], 0.3), 7.0);
        assert_eq!(quantile_sorted(&[], 0.3), 0.0);
    }

    #[test]
    fn levels_ignore_input_order() {
        let strategy = QuantileBandStrategy::default();
        let a = strategy.levels(&[5.0, 1.0, 4.0, 2.0, 3.0]).unwrap();
        let b = strategy.levels(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn classify_marks_bars_outside_inner_bands() {
        let strategy = QuantileBandStrategy::default();
        let closes: Vec<f64> = (0..=20).map(|i| 1.0 + i as f64 * 0.01).collect();
        let (zones, levels) = strategy.classify(&closes);
        assert!(matches!(levels, Some(ZoneLevels::Bands(_))));
        assert_eq!(zones.len(), closes.len());
        assert_eq!(zones[0], ZoneClassification::Support);
        assert_eq!(zones[10], ZoneClassification::None);
        assert_eq!(zones[20], ZoneClassification::Resistance);
    }

    #[test]
    fn classify_uniform_data_is_never_a_zone() {
        let strategy = QuantileBandStrategy::default();
        let (zones, _) = strategy.classify(&[1.1; 10]);
        assert!(zones.iter().all(|z| *z == ZoneClassification::None));
    }

    proptest! {
        #[test]
        fn inner_bands_nest_inside_outer(closes in prop::collection::vec(0.5f64..2.0, 2..100)) {
            let levels = QuantileBandStrategy::default().levels(&closes).unwrap();
            prop_assert!(levels.inner_support <= levels.support);
            prop_assert!(levels.support <= levels.resistance);
            prop_assert!(levels.resistance <= levels.inner_resistance);
        }
    }
}
