// =============================================================================
// Candidate Selection — golden cross + oversold screening
// =============================================================================
//
// Inspects the last two sessions of one ticker's aligned indicator window:
//
//   golden cross — MA20 sits at or below MA50 yesterday and strictly above
//                  it today (already above on both days does NOT count)
//   oversold     — today's RSI is strictly below the threshold (default 30)
//
// Group C = both at once, A = cross only, B = oversold only.  Anything
// else — including any missing value at the five inspected slots — yields
// no candidate.  Bad data and no-signal are indistinguishable on purpose:
// a batch run over the whole market must never abort on one broken series.
// =============================================================================

use tracing::debug;

use crate::types::{Candidate, SignalGroup};

/// Aligned view over one ticker's daily series, oldest first.  All four
/// slices must have the same length.
#[derive(Debug, Clone, Copy)]
pub struct ScreenWindow<'a> {
    pub close: &'a [f64],
    pub ma20: &'a [Option<f64>],
    pub ma50: &'a [Option<f64>],
    pub rsi: &'a [Option<f64>],
}

/// Knobs for the selection rule.
#[derive(Debug, Clone)]
pub struct SelectionParams {
    /// Minimum window length before the last two sessions are inspected.
    /// The long MA needs 50 sessions and the crossover test one more.
    pub min_rows: usize,
    /// RSI threshold below which a ticker counts as oversold.
    pub oversold: f64,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            min_rows: 51,
            oversold: 30.0,
        }
    }
}

/// Classify one ticker's window into a signal group, or `None` when there is
/// no signal (or not enough clean data to tell — the two cases are
/// deliberately indistinguishable here).
pub fn select_candidates(
    code: &str,
    name: &str,
    window: &ScreenWindow<'_>,
    params: &SelectionParams,
) -> Option<Candidate> {
    let len = window.close.len();
    if len < params.min_rows || len < 2 {
        return None;
    }
    // Misaligned series are treated exactly like missing data.
    if window.ma20.len() != len || window.ma50.len() != len || window.rsi.len() != len {
        return None;
    }

    let ma20_yesterday = window.ma20[len - 2]?;
    let ma50_yesterday = window.ma50[len - 2]?;
    let ma20_today = window.ma20[len - 1]?;
    let ma50_today = window.ma50[len - 1]?;
    let rsi_today = window.rsi[len - 1]?;

    if ![ma20_yesterday, ma50_yesterday, ma20_today, ma50_today, rsi_today]
        .iter()
        .all(|v| v.is_finite())
    {
        return None;
    }

    let golden_cross = ma20_yesterday <= ma50_yesterday && ma20_today > ma50_today;
    let oversold = rsi_today < params.oversold;

    // Priority-ordered: C outranks A outranks B.
    let group = if golden_cross && oversold {
        SignalGroup::C
    } else if golden_cross {
        SignalGroup::A
    } else if oversold {
        SignalGroup::B
    } else {
        return None;
    };

    debug!(code, %group, ma20 = ma20_today, ma50 = ma50_today, rsi = rsi_today, "candidate selected");

    Some(Candidate {
        code: code.to_string(),
        name: name.to_string(),
        ma20: round2(ma20_today),
        ma50: round2(ma50_today),
        rsi: round2(rsi_today),
        group,
    })
}

/// Round to two decimal places for the report.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        close: Vec<f64>,
        ma20: Vec<Option<f64>>,
        ma50: Vec<Option<f64>>,
        rsi: Vec<Option<f64>>,
    }

    impl Fixture {
        fn window(&self) -> ScreenWindow<'_> {
            ScreenWindow {
                close: &self.close,
                ma20: &self.ma20,
                ma50: &self.ma50,
                rsi: &self.rsi,
            }
        }
    }

    /// Build a 51-row window wired to trigger a specific group.
    fn make_fixture(group: &str) -> Fixture {
        let close = vec![100.0; 51];
        let (ma20, ma50, rsi): (Vec<f64>, Vec<f64>, Vec<f64>) = match group {
            // Cross today, RSI not oversold.
            "A" => {
                let mut ma20 = vec![1.0; 51];
                ma20[50] = 2.0;
                (ma20, vec![1.0; 51], vec![50.0; 51])
            }
            // No cross, RSI oversold today.
            "B" => {
                let mut rsi = vec![50.0; 51];
                rsi[50] = 20.0;
                (vec![1.0; 51], vec![1.0; 51], rsi)
            }
            // Cross today AND oversold today.
            "C" => {
                let mut ma20 = vec![1.0; 51];
                ma20[50] = 2.0;
                let mut rsi = vec![50.0; 51];
                rsi[50] = 20.0;
                (ma20, vec![1.0; 51], rsi)
            }
            // Neither predicate.
            _ => (vec![1.0; 51], vec![1.0; 51], vec![50.0; 51]),
        };

        Fixture {
            close,
            ma20: ma20.into_iter().map(Some).collect(),
            ma50: ma50.into_iter().map(Some).collect(),
            rsi: rsi.into_iter().map(Some).collect(),
        }
    }

    fn params() -> SelectionParams {
        SelectionParams::default()
    }

    #[test]
    fn selects_group_a_on_golden_cross() {
        let f = make_fixture("A");
        let c = select_candidates("000111", "TESTA", &f.window(), &params()).unwrap();
        assert_eq!(c.group, SignalGroup::A);
        assert_eq!(c.code, "000111");
        assert_eq!(c.ma20, 2.0);
        assert_eq!(c.ma50, 1.0);
    }

    #[test]
    fn selects_group_b_on_oversold() {
        let f = make_fixture("B");
        let c = select_candidates("000222", "TESTB", &f.window(), &params()).unwrap();
        assert_eq!(c.group, SignalGroup::B);
        assert_eq!(c.rsi, 20.0);
    }

    #[test]
    fn selects_group_c_when_both_fire() {
        let f = make_fixture("C");
        let c = select_candidates("000333", "TESTC", &f.window(), &params()).unwrap();
        // C must win whenever both predicates hold — never A or B.
        assert_eq!(c.group, SignalGroup::C);
    }

    #[test]
    fn no_signal_yields_none() {
        let f = make_fixture("N");
        assert!(select_candidates("000444", "TEST", &f.window(), &params()).is_none());
    }

    #[test]
    fn already_above_both_days_is_not_a_cross() {
        let mut f = make_fixture("N");
        // MA20 above MA50 on both days: no transition, no signal.
        f.ma20 = vec![Some(2.0); 51];
        f.ma50 = vec![Some(1.0); 51];
        assert!(select_candidates("000555", "TEST", &f.window(), &params()).is_none());
    }

    #[test]
    fn equal_yesterday_still_counts_as_cross() {
        let mut f = make_fixture("N");
        // Same-or-below yesterday qualifies; strictly above today fires.
        f.ma20 = vec![Some(1.0); 51];
        f.ma20[50] = Some(1.5);
        f.ma50 = vec![Some(1.0); 51];
        let c = select_candidates("000666", "TEST", &f.window(), &params()).unwrap();
        assert_eq!(c.group, SignalGroup::A);
    }

    #[test]
    fn undefined_scalar_yields_none() {
        let mut f = make_fixture("C");
        f.ma20[50] = None;
        assert!(select_candidates("000777", "TEST", &f.window(), &params()).is_none());
    }

    #[test]
    fn nan_scalar_yields_none() {
        let mut f = make_fixture("C");
        f.rsi[50] = Some(f64::NAN);
        assert!(select_candidates("000888", "TEST", &f.window(), &params()).is_none());
    }

    #[test]
    fn short_window_yields_none() {
        let mut f = make_fixture("A");
        f.close.truncate(50);
        f.ma20.truncate(50);
        f.ma50.truncate(50);
        f.rsi.truncate(50);
        assert!(select_candidates("000999", "TEST", &f.window(), &params()).is_none());
    }

    #[test]
    fn misaligned_window_yields_none() {
        let mut f = make_fixture("A");
        f.rsi.pop();
        assert!(select_candidates("001000", "TEST", &f.window(), &params()).is_none());
    }

    #[test]
    fn oversold_threshold_is_strict() {
        let mut f = make_fixture("N");
        f.rsi[50] = Some(30.0);
        // Exactly at the threshold is NOT oversold.
        assert!(select_candidates("001100", "TEST", &f.window(), &params()).is_none());
    }

    #[test]
    fn values_are_rounded_to_two_decimals() {
        let mut f = make_fixture("B");
        f.rsi[50] = Some(19.996);
        let c = select_candidates("001200", "TEST", &f.window(), &params()).unwrap();
        assert_eq!(c.rsi, 20.0);
    }
}
