// Technical indicators used by the bundled demo strategy

pub mod ema;
pub mod rsi;

pub use ema::calculate_ema;
pub use rsi::calculate_rsi;
