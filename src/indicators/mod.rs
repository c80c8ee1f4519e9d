// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators the screener
// derives from daily closing prices.  Every output series stays aligned with
// its input: one slot per close, `None` wherever not enough history has
// accumulated, so an undefined reading can never be mistaken for a real zero.

pub mod rsi;
pub mod sma;
