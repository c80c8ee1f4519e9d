// =============================================================================
// Runtime Configuration — screener settings with atomic save
// =============================================================================
//
// Every tunable of the screener lives here: indicator periods, the oversold
// threshold, vendor pacing, report location, and the daily schedule.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_market() -> String {
    "KOSPI".to_string()
}

fn default_ma_short_period() -> usize {
    20
}

fn default_ma_long_period() -> usize {
    50
}

fn default_rsi_period() -> usize {
    14
}

fn default_rsi_oversold() -> f64 {
    30.0
}

fn default_history_days() -> usize {
    51
}

fn default_request_pause_ms() -> u64 {
    200
}

fn default_max_retries() -> u32 {
    3
}

fn default_output_dir() -> String {
    "reports".to_string()
}

fn default_report_base_name() -> String {
    "candidates".to_string()
}

fn default_schedule() -> String {
    // 16:05 KST, Monday through Friday — just after the KOSPI close.
    "0 5 16 * * Mon-Fri".to_string()
}

// =============================================================================
// ScreenerConfig
// =============================================================================

/// Top-level configuration for the screener.
///
/// Every field has a serde default so that older JSON files missing new
/// fields will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerConfig {
    // --- Universe ------------------------------------------------------------

    /// Market whose ticker universe is screened.
    #[serde(default = "default_market")]
    pub market: String,

    // --- Indicator periods ---------------------------------------------------

    /// Short moving-average period (the fast line of the crossover).
    #[serde(default = "default_ma_short_period")]
    pub ma_short_period: usize,

    /// Long moving-average period (the slow line of the crossover).
    #[serde(default = "default_ma_long_period")]
    pub ma_long_period: usize,

    /// Wilder RSI look-back period.
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// RSI below this threshold counts as oversold.
    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: f64,

    // --- Data acquisition ----------------------------------------------------

    /// Daily sessions requested per ticker.  Must cover the long MA plus the
    /// two sessions the classifier inspects.
    #[serde(default = "default_history_days")]
    pub history_days: usize,

    /// Pause between per-ticker requests, in milliseconds.
    #[serde(default = "default_request_pause_ms")]
    pub request_pause_ms: u64,

    /// Fetch attempts per ticker before it is skipped.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    // --- Reporting -----------------------------------------------------------

    /// Directory the dated CSV reports are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Report filename stem; the run date is appended.
    #[serde(default = "default_report_base_name")]
    pub report_base_name: String,

    // --- Scheduling ----------------------------------------------------------

    /// 6-field cron expression (sec min hour day month weekday), evaluated
    /// in KST.
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            market: default_market(),
            ma_short_period: default_ma_short_period(),
            ma_long_period: default_ma_long_period(),
            rsi_period: default_rsi_period(),
            rsi_oversold: default_rsi_oversold(),
            history_days: default_history_days(),
            request_pause_ms: default_request_pause_ms(),
            max_retries: default_max_retries(),
            output_dir: default_output_dir(),
            report_base_name: default_report_base_name(),
            schedule: default_schedule(),
        }
    }
}

impl ScreenerConfig {
    /// Minimum window length the classifier needs: the long MA period plus
    /// the extra session for the crossover comparison.
    pub fn min_rows(&self) -> usize {
        self.ma_long_period + 1
    }

    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read screener config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse screener config from {}", path.display()))?;

        info!(
            path = %path.display(),
            market = %config.market,
            "screener config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise screener config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "screener config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = ScreenerConfig::default();
        assert_eq!(cfg.market, "KOSPI");
        assert_eq!(cfg.ma_short_period, 20);
        assert_eq!(cfg.ma_long_period, 50);
        assert_eq!(cfg.rsi_period, 14);
        assert!((cfg.rsi_oversold - 30.0).abs() < f64::EPSILON);
        assert_eq!(cfg.history_days, 51);
        assert_eq!(cfg.request_pause_ms, 200);
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.output_dir, "reports");
        assert_eq!(cfg.report_base_name, "candidates");
        assert_eq!(cfg.schedule, "0 5 16 * * Mon-Fri");
    }

    #[test]
    fn min_rows_covers_long_ma_plus_one() {
        let cfg = ScreenerConfig::default();
        assert_eq!(cfg.min_rows(), 51);

        let mut cfg = cfg;
        cfg.ma_long_period = 120;
        assert_eq!(cfg.min_rows(), 121);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: ScreenerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.market, "KOSPI");
        assert_eq!(cfg.ma_long_period, 50);
        assert_eq!(cfg.history_days, 51);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "market": "KOSDAQ", "rsi_oversold": 25.0 }"#;
        let cfg: ScreenerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.market, "KOSDAQ");
        assert!((cfg.rsi_oversold - 25.0).abs() < f64::EPSILON);
        assert_eq!(cfg.ma_short_period, 20);
        assert_eq!(cfg.max_retries, 3);
    }

    #[test]
    fn roundtrip_serialisation() {
        let cfg = ScreenerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: ScreenerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.market, cfg2.market);
        assert_eq!(cfg.ma_long_period, cfg2.ma_long_period);
        assert_eq!(cfg.schedule, cfg2.schedule);
    }
}
