/// Calculate Exponential Moving Average (EMA)
///
/// Seeds with the arithmetic mean of the first `period` prices, then
/// applies the standard `2 / (period + 1)` smoothing over the rest.
/// Returns the latest value.
pub fn calculate_ema(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }

    let seed: f64 = prices[..period].iter().sum::<f64>() / period as f64;
    let alpha = 2.0 / (period as f64 + 1.0);

    let ema = prices[period..]
        .iter()
        .fold(seed, |ema, price| ema + alpha * (price - ema));

    Some(ema)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_tracks_rising_prices() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let ema = calculate_ema(&prices, 10).unwrap();

        // Lags the last price but sits above the window mean
        assert!(ema < 119.0);
        assert!(ema > 109.5);
    }

    #[test]
    fn test_ema_of_constant_series_is_constant() {
        let prices = vec![50.0; 30];
        assert_eq!(calculate_ema(&prices, 12), Some(50.0));
    }

    #[test]
    fn test_ema_insufficient_data() {
        let prices = vec![100.0, 101.0, 102.0];
        assert!(calculate_ema(&prices, 5).is_none());
        assert!(calculate_ema(&prices, 0).is_none());
    }

    #[test]
    fn test_ema_exact_period_equals_mean() {
        let prices = vec![10.0, 20.0, 30.0];
        assert_eq!(calculate_ema(&prices, 3), Some(20.0));
    }
}
