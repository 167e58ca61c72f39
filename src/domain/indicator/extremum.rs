//! Local-extremum support/resistance.
//!
//! A bar is a local minimum when its close is <= every close within `order`
//! bars on either side, and a local maximum when it is >= all of them. The
//! neighborhood is clipped at the window edges, so the newest bar is judged
//! against its predecessors only.

use super::{ZoneClassification, ZoneLevels, ZoneStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalExtremumStrategy {
    pub order: usize,
}

impl Default for LocalExtremumStrategy {
    fn default() -> Self {
        Self { order: 5 }
    }
}

impl LocalExtremumStrategy {
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    /// Closes within `order` bars of `i`; empty when `i` is outside the window.
    fn neighborhood<'a>(&self, closes: &'a [f64], i: usize) -> &'a [f64] {
        if i >= closes.len() {
            return &[];
        }
        let lo = i.saturating_sub(self.order);
        let hi = (i + self.order).min(closes.len() - 1);
        &closes[lo..=hi]
    }

    fn is_local_min(&self, closes: &[f64], i: usize) -> bool {
        closes
            .get(i)
            .is_some_and(|&c| self.neighborhood(closes, i).iter().all(|&n| c <= n))
    }

    fn is_local_max(&self, closes: &[f64], i: usize) -> bool {
        closes
            .get(i)
            .is_some_and(|&c| self.neighborhood(closes, i).iter().all(|&n| c >= n))
    }
}

impl ZoneStrategy for LocalExtremumStrategy {
    fn name(&self) -> &'static str {
        "extremum"
    }

    fn min_bars(&self) -> usize {
        self.order + 1
    }

    fn requires_trend_confirmation(&self) -> bool {
        false
    }

    fn classify(&self, closes: &[f64]) -> (Vec<ZoneClassification>, Option<ZoneLevels>) {
        if closes.is_empty() {
            return (Vec::new(), None);
        }

        let mut last_min = None;
        let mut last_max = None;
        let zones = (0..closes.len())
            .map(|i| {
                let is_min = self.is_local_min(closes, i);
                let is_max = self.is_local_max(closes, i);
                match (is_min, is_max) {
                    (true, false) => {
                        last_min = Some(closes[i]);
                        ZoneClassification::Support
                    }
                    (false, true) => {
                        last_max = Some(closes[i]);
                        ZoneClassification::Resistance
                    }
                    // flat neighborhood
                    _ => ZoneClassification::None,
                }
            })
            .collect();

        let levels = ZoneLevels::Extrema {
            support: last_min,
            resistance: last_max,
        };
        (zones, Some(levels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_minimum_and_maximum() {
        let strategy = LocalExtremumStrategy::new(2);
        let closes = [1.5, 1.4, 1.2, 1.4, 1.6, 1.8, 1.7, 1.6];
        assert!(strategy.is_local_min(&closes, 2));
        assert!(!strategy.is_local_max(&closes, 2));
        assert!(strategy.is_local_max(&closes, 5));
        assert!(!strategy.is_local_min(&closes, 4));
    }

    #[test]
    fn out_of_window_index_is_neither() {
        let strategy = LocalExtremumStrategy::new(2);
        assert!(!strategy.is_local_min(&[], 0));
        assert!(!strategy.is_local_max(&[], 0));
        assert!(!strategy.is_local_min(&[1.2, 1.1], 2));
        assert_eq!(strategy.classify(&[]), (Vec::new(), None));
    }

    #[test]
    fn last_bar_judged_against_predecessors() {
        let strategy = LocalExtremumStrategy::new(3);
        let falling = [1.5, 1.4, 1.3, 1.2, 1.1];
        let (zones, _) = strategy.classify(&falling);
        assert_eq!(*zones.last().unwrap(), ZoneClassification::Support);

        let rising = [1.1, 1.2, 1.3, 1.4, 1.5];
        let (zones, _) = strategy.classify(&rising);
        assert_eq!(*zones.last().unwrap(), ZoneClassification::Resistance);
    }

    #[test]
    fn last_bar_inside_range_is_none() {
        let strategy = LocalExtremumStrategy::new(3);
        let closes = [1.1, 1.5, 1.2, 1.3];
        let (zones, _) = strategy.classify(&closes);
        assert_eq!(*zones.last().unwrap(), ZoneClassification::None);
    }

    #[test]
    fn flat_neighborhood_is_none() {
        let strategy = LocalExtremumStrategy::new(2);
        let (zones, _) = strategy.classify(&[1.2, 1.2, 1.2]);
        assert!(zones.iter().all(|z| *z == ZoneClassification::None));
    }

    #[test]
    fn levels_report_latest_extrema() {
        let strategy = LocalExtremumStrategy::new(1);
        let closes = [1.3, 1.1, 1.4, 1.2, 1.5];
        let (_, levels) = strategy.classify(&closes);
        assert_eq!(
            levels,
            Some(ZoneLevels::Extrema {
                support: Some(1.2),
                resistance: Some(1.5),
            })
        );
    }

    #[test]
    fn min_bars_is_order_plus_one() {
        assert_eq!(LocalExtremumStrategy::new(5).min_bars(), 6);
    }
}
