//! Live synthetic market: the walk generator feeding the sliding window.

use crate::config::WalkConfig;

use super::{Series, WalkGenerator};

/// Continuously extended sample window driving the chart.
#[derive(Debug, Clone)]
pub struct MarketFeed {
    walk: WalkGenerator,
    series: Series,
}

impl MarketFeed {
    /// Seed a full window of uniform in-band samples, as a fresh session does.
    pub fn new(config: &WalkConfig) -> Self {
        let walk = WalkGenerator::new(config);
        let mut rng = rand::rng();
        let series = Series::seeded(
            config.window,
            std::iter::repeat_with(|| walk.seed(&mut rng)).take(config.window),
        );
        Self { walk, series }
    }

    /// Advance the market by one generated sample and return it.
    pub fn tick(&mut self) -> f64 {
        let mut rng = rand::rng();
        let prev = self
            .series
            .latest()
            .unwrap_or_else(|| self.walk.seed(&mut rng));
        let next = self.walk.step(prev, &mut rng);
        self.series.push(next);
        next
    }

    /// Most recent sample; the band floor before any sample exists.
    pub fn latest(&self) -> f64 {
        self.series.latest().unwrap_or(self.walk.band().0)
    }

    /// Window of samples backing the chart.
    pub fn series(&self) -> &Series {
        &self.series
    }

    /// Inclusive band every sample lies in.
    pub fn band(&self) -> (f64, f64) {
        self.walk.band()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_a_full_window() {
        let feed = MarketFeed::new(&WalkConfig::default());
        assert_eq!(feed.series().len(), 15);
        let (min, max) = feed.band();
        for sample in feed.series().iter() {
            assert!((min..=max).contains(&sample));
        }
    }

    #[test]
    fn tick_slides_the_window() {
        let mut feed = MarketFeed::new(&WalkConfig::default());
        let before: Vec<f64> = feed.series().iter().collect();
        let produced = feed.tick();
        assert_eq!(feed.series().len(), 15);
        assert_eq!(feed.latest(), produced);
        // the oldest sample is gone, the rest shifted left by one
        let after: Vec<f64> = feed.series().iter().collect();
        assert_eq!(&after[..14], &before[1..]);
    }
}
