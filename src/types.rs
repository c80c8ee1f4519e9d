// =============================================================================
// Shared types used across the KOSPI Scout screener
// =============================================================================

use serde::{Deserialize, Serialize};

/// Signal group a selected ticker is filed under.
///
/// `A` — golden cross only, `B` — oversold only, `C` — both on the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalGroup {
    A,
    B,
    C,
}

impl std::fmt::Display for SignalGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
        }
    }
}

/// A ticker accepted by the classifier, ready for the daily report.
///
/// Indicator values are rounded to two decimal places at creation time and
/// the record is never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub code: String,
    pub name: String,
    pub ma20: f64,
    pub ma50: f64,
    pub rsi: f64,
    pub group: SignalGroup,
}
