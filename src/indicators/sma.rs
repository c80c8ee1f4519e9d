// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// SMA is the unweighted mean of the trailing `period` closes:
//   SMA_i = (close_{i-period+1} + ... + close_i) / period
//
// A running window sum keeps the whole series O(N).

/// Compute the SMA series for `closes`, aligned one-to-one with the input.
///
/// Index `i` holds the mean of `closes[i - period + 1..=i]` once `i >=
/// period - 1`; earlier slots are `None`.
///
/// # Edge cases
/// - `period == 0` => all `None` (division guard)
/// - `closes.len() < period` => all `None`
pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return result;
    }

    let mut window_sum: f64 = closes[..period].iter().sum();
    result[period - 1] = Some(window_sum / period as f64);

    for i in period..closes.len() {
        window_sum += closes[i] - closes[i - period];
        result[i] = Some(window_sum / period as f64);
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_known_values() {
        let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let sma = calculate_sma(&closes, 3);
        assert_eq!(sma, vec![None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn sma_empty_input() {
        assert!(calculate_sma(&[], 5).is_empty());
    }

    #[test]
    fn sma_period_zero() {
        assert_eq!(calculate_sma(&[1.0, 2.0, 3.0], 0), vec![None, None, None]);
    }

    #[test]
    fn sma_insufficient_data() {
        // Shorter than the period => every slot stays undefined.
        assert_eq!(calculate_sma(&[1.0, 2.0], 5), vec![None, None]);
    }

    #[test]
    fn sma_period_equals_length() {
        let sma = calculate_sma(&[2.0, 4.0, 6.0], 3);
        assert_eq!(sma, vec![None, None, Some(4.0)]);
    }

    #[test]
    fn sma_output_is_aligned_with_input() {
        let closes: Vec<f64> = (1..=80).map(|x| x as f64).collect();
        let sma = calculate_sma(&closes, 20);
        assert_eq!(sma.len(), closes.len());
        assert!(sma[..19].iter().all(Option::is_none));
        assert!(sma[19..].iter().all(Option::is_some));
    }

    #[test]
    fn sma_running_sum_matches_naive_mean() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let period = 5;
        let sma = calculate_sma(&closes, period);
        for i in (period - 1)..closes.len() {
            let naive: f64 =
                closes[i + 1 - period..=i].iter().sum::<f64>() / period as f64;
            let got = sma[i].unwrap();
            assert!((got - naive).abs() < 1e-9, "index {i}: got {got}, expected {naive}");
        }
    }
}
