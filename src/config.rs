use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Execution simulator configuration.
///
/// Rates are fractions, not percentages: `0.0005` is 0.05%.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub initial_capital: f64,
    /// Market-order fee rate, charged on both entry and exit notional.
    pub taker_fee_rate: f64,
    /// Limit-order fee rate. Reserved: every simulated fill is a taker fill.
    #[serde(default)]
    pub maker_fee_rate: f64,
    /// Adverse price deviation applied to every fill.
    #[serde(default)]
    pub slippage_rate: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            taker_fee_rate: 0.0005, // OKX Lv1 taker
            maker_fee_rate: 0.0002,
            slippage_rate: 0.0,
        }
    }
}

impl SimConfig {
    /// Reject unusable configurations before a run starts.
    pub fn validate(&self) -> Result<(), SimError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(SimError::Configuration(format!(
                "initial_capital must be a positive number, got {}",
                self.initial_capital
            )));
        }
        for (name, rate) in [
            ("taker_fee_rate", self.taker_fee_rate),
            ("maker_fee_rate", self.maker_fee_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(SimError::Configuration(format!(
                    "{} must be >= 0, got {}",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_capital() {
        let config = SimConfig {
            initial_capital: 0.0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("initial_capital"));
    }

    #[test]
    fn test_rejects_negative_fee_rate() {
        let config = SimConfig {
            taker_fee_rate: -0.0005,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("taker_fee_rate"));
    }

    #[test]
    fn test_rejects_nan_slippage() {
        let config = SimConfig {
            slippage_rate: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserializes_without_optional_rates() {
        let config: SimConfig =
            serde_json::from_str(r#"{"initial_capital": 300.0, "taker_fee_rate": 0.0005}"#)
                .unwrap();
        assert_eq!(config.initial_capital, 300.0);
        assert_eq!(config.maker_fee_rate, 0.0);
        assert_eq!(config.slippage_rate, 0.0);
    }
}
