// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Seed average gain / average loss with the SMA of the first `period`
//          gains / losses; the seed RSI lands at output index `period`.
// Step 3 — Apply Wilder's exponential smoothing for every later index:
//            avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// When the average loss is zero the RSI saturates at exactly 100.0 instead
// of dividing by zero.  This covers the flat-series case too: no movement
// means no losses, so the reading pegs at 100 rather than some neutral
// stand-in.
// =============================================================================

/// Compute the full RSI series for the given `closes` and `period`, aligned
/// one-to-one with the input.
///
/// Output index `period` (0-based) carries the seed value; every earlier
/// slot is `None`.  The smoothing recurrence feeds on the immediately
/// preceding averages, so the walk is strictly chronological.
///
/// # Edge cases
/// - `period == 0` => all `None`
/// - `closes.len() <= period` => all `None` (need at least `period` deltas)
/// - Any non-finite close => all `None` (a poisoned series is worthless)
/// - Zero average loss => RSI is exactly 100.0
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return result;
    }
    if closes.iter().any(|c| !c.is_finite()) {
        return result;
    }

    // --- Compute price deltas ------------------------------------------------
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    // --- Seed averages with SMA of first `period` deltas ---------------------
    let (sum_gain, sum_loss) = deltas[..period].iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
        if d > 0.0 {
            (g + d, l)
        } else {
            (g, l + d.abs())
        }
    });

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    result[period] = Some(rsi_from_averages(avg_gain, avg_loss));

    // --- Wilder's smoothing for subsequent values ----------------------------
    // deltas[i] is close[i + 1] - close[i], so delta index i lands at output
    // index i + 1.
    for (i, &delta) in deltas.iter().enumerate().skip(period) {
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        result[i + 1] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    result
}

/// Calculate RSI with the conventional default period (14).
pub fn calculate_rsi_default(closes: &[f64]) -> Vec<Option<f64>> {
    calculate_rsi(closes, 14)
}

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// A zero average loss saturates the index at 100.0 — the deliberate
/// division-by-zero clamp, not an error.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}
