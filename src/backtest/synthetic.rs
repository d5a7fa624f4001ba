use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::Candle;

/// Market scenario types for synthetic candle generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketScenario {
    /// Steady uptrend with light noise (+2% daily drift)
    Uptrend,
    /// Steady downtrend with light noise (-2% daily drift)
    Downtrend,
    /// Mean-reverting chop around the base price
    Sideways,
    /// Large swings (±5% per candle)
    Volatile,
    /// Mild growth, then a sharp 25% decline over the second half
    Crash,
}

/// Generates deterministic synthetic OHLCV data for the demo binary and
/// the test suite. The same seed always produces the same series.
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 100.0,
            base_volume: 1_000_000.0,
        }
    }

    /// Generate candles ending roughly now
    pub fn generate(
        &mut self,
        scenario: MarketScenario,
        num_candles: usize,
        interval_minutes: i64,
    ) -> Vec<Candle> {
        let start = Utc::now() - Duration::minutes(num_candles as i64 * interval_minutes);
        self.generate_from(scenario, num_candles, interval_minutes, start)
    }

    /// Generate candles from an explicit start time.
    ///
    /// Tests that compare whole reports use this, so that two runs with the
    /// same seed agree on timestamps as well as prices.
    pub fn generate_from(
        &mut self,
        scenario: MarketScenario,
        num_candles: usize,
        interval_minutes: i64,
        start: DateTime<Utc>,
    ) -> Vec<Candle> {
        let intervals_per_day = 24.0 * 60.0 / interval_minutes as f64;
        let mut candles = Vec::with_capacity(num_candles);
        let mut price = self.base_price;

        for i in 0..num_candles {
            let step = match scenario {
                MarketScenario::Uptrend => {
                    price * (0.02 / intervals_per_day) + price * self.rng.gen_range(-0.001..0.001)
                }
                MarketScenario::Downtrend => {
                    price * (-0.02 / intervals_per_day) + price * self.rng.gen_range(-0.001..0.001)
                }
                MarketScenario::Sideways => {
                    // Pull back toward the base price, then jitter
                    (self.base_price - price) * 0.1 + price * self.rng.gen_range(-0.01..0.01)
                }
                MarketScenario::Volatile => price * self.rng.gen_range(-0.05..0.05),
                MarketScenario::Crash => {
                    if i < num_candles / 2 {
                        price * self.rng.gen_range(-0.005..0.01)
                    } else {
                        price * (-0.25 / (num_candles as f64 / 2.0))
                            + price * self.rng.gen_range(-0.005..0.005)
                    }
                }
            };

            price = (price + step).max(self.base_price * 0.05);

            let timestamp = start + Duration::minutes(i as i64 * interval_minutes);
            candles.push(self.candle_around(price, timestamp));
        }

        candles
    }

    /// Build a plausible OHLCV candle around a close price
    fn candle_around(&mut self, close: f64, timestamp: DateTime<Utc>) -> Candle {
        let intrabar = 0.002;
        let high = close * (1.0 + self.rng.gen_range(0.0..intrabar));
        let low = close * (1.0 - self.rng.gen_range(0.0..intrabar));
        let open = (close * (1.0 + self.rng.gen_range(-intrabar..intrabar))).clamp(low, high);
        let volume = self.base_volume * self.rng.gen_range(0.7..1.3);

        Candle {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}
