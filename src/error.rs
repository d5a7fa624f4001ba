use thiserror::Error;

/// Fatal errors a backtest run can end with.
///
/// Recoverable conditions (insufficient margin, unusable signal payloads)
/// are not errors: the simulator logs them and drops the signal, and the
/// run continues. A `SimError` means the run produced no report and the
/// ledger state must be discarded.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid simulator configuration, rejected before the run starts.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The strategy failed while analyzing a window. Propagated unmodified.
    #[error("strategy fault: {0}")]
    Strategy(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_message() {
        let err = SimError::Configuration("initial_capital must be positive".to_string());
        assert!(err.to_string().contains("initial_capital"));
    }

    #[test]
    fn test_strategy_fault_preserves_source() {
        let fault = anyhow::anyhow!("indicator buffer underflow");
        let err: SimError = fault.into();
        assert!(err.to_string().contains("indicator buffer underflow"));
    }
}
