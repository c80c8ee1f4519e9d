// =============================================================================
// Screener — one full pass over the market universe
// =============================================================================
//
// Pipeline per ticker:
//   1. Fetch `history_days` daily closes (retry with backoff, skip the
//      ticker on persistent failure — one bad series never aborts the run)
//   2. Compute MA(short), MA(long) and Wilder RSI as aligned series
//   3. Resolve the display name ("Unknown" when the vendor has none)
//   4. Classify the last two sessions into group A / B / C
//   5. Pause between tickers to respect the vendor call budget
//
// Tickers are walked sequentially — the vendor rate limit dominates, so
// there is nothing to win by fanning out.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::indicators::rsi::calculate_rsi;
use crate::indicators::sma::calculate_sma;
use crate::krx::KrxClient;
use crate::report;
use crate::runtime_config::ScreenerConfig;
use crate::scheduler::kst_now;
use crate::strategy::{select_candidates, ScreenWindow, SelectionParams};
use crate::types::Candidate;

/// Outcome of one full screening pass.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Tickers in the universe listing.
    pub scanned: usize,
    /// Tickers dropped for missing or broken price data.
    pub skipped: usize,
    /// Accepted classification records, in universe order.
    pub candidates: Vec<Candidate>,
}

pub struct Screener {
    client: Arc<KrxClient>,
    config: ScreenerConfig,
}

impl Screener {
    pub fn new(client: Arc<KrxClient>, config: ScreenerConfig) -> Self {
        Self { client, config }
    }

    /// Run one screening pass over the configured market.
    pub async fn run(&self) -> Result<RunSummary> {
        let codes = self
            .client
            .list_codes(&self.config.market)
            .await
            .context("failed to list market universe")?;

        info!(market = %self.config.market, count = codes.len(), "universe listed");

        let params = SelectionParams {
            min_rows: self.config.min_rows(),
            oversold: self.config.rsi_oversold,
        };

        let mut candidates = Vec::new();
        let mut skipped = 0usize;

        for (idx, code) in codes.iter().enumerate() {
            info!("[{}/{}] {} — fetching daily closes", idx + 1, codes.len(), code);

            let Some(closes) = self.fetch_closes_with_retry(code).await else {
                skipped += 1;
                continue;
            };

            let ma20 = calculate_sma(&closes, self.config.ma_short_period);
            let ma50 = calculate_sma(&closes, self.config.ma_long_period);
            let rsi = calculate_rsi(&closes, self.config.rsi_period);

            let name = match self.client.get_stock_name(code).await {
                Ok(name) if !name.is_empty() => name,
                _ => "Unknown".to_string(),
            };

            let window = ScreenWindow {
                close: &closes,
                ma20: &ma20,
                ma50: &ma50,
                rsi: &rsi,
            };

            if let Some(candidate) = select_candidates(code, &name, &window, &params) {
                info!(
                    code = %candidate.code,
                    name = %candidate.name,
                    group = %candidate.group,
                    "candidate selected"
                );
                candidates.push(candidate);
            }

            tokio::time::sleep(Duration::from_millis(self.config.request_pause_ms)).await;
        }

        Ok(RunSummary {
            scanned: codes.len(),
            skipped,
            candidates,
        })
    }

    /// Run one pass and write the dated CSV report.
    pub async fn run_and_report(&self) -> Result<RunSummary> {
        let summary = self.run().await?;

        info!(
            scanned = summary.scanned,
            skipped = summary.skipped,
            candidates = summary.candidates.len(),
            rate_limits = ?self.client.rate_limit_snapshot(),
            "screening pass complete"
        );

        report::save_candidates(
            &summary.candidates,
            std::path::Path::new(&self.config.output_dir),
            &self.config.report_base_name,
            kst_now().date_naive(),
        )?;

        Ok(summary)
    }

    /// Fetch one ticker's closes, retrying with a linear backoff before
    /// giving the ticker up for the day.
    async fn fetch_closes_with_retry(&self, code: &str) -> Option<Vec<f64>> {
        for attempt in 1..=self.config.max_retries {
            match self
                .client
                .get_daily_closes(code, self.config.history_days)
                .await
            {
                Ok(closes) => return Some(closes),
                Err(e) => {
                    warn!(code, attempt, error = %e, "daily close fetch failed");
                    tokio::time::sleep(Duration::from_millis(
                        self.config.request_pause_ms * attempt as u64,
                    ))
                    .await;
                }
            }
        }

        warn!(
            code,
            attempts = self.config.max_retries,
            "giving up — ticker skipped for this run"
        );
        None
    }
}
