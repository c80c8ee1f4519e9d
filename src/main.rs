// =============================================================================
// KOSPI Scout — Main Entry Point
// =============================================================================
//
// Daily screener over the KOSPI universe: moving-average golden crosses and
// oversold RSI readings, written to a dated CSV report.  `--once` runs a
// single pass and exits; otherwise the process stays up and fires after
// each weekday market close.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod indicators;
mod krx;
mod report;
mod runtime_config;
mod scheduler;
mod screener;
mod strategy;
mod types;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::krx::KrxClient;
use crate::runtime_config::ScreenerConfig;
use crate::screener::Screener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        KOSPI Scout — Daily Buy-Candidate Screener        ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let config_path = "screener_config.json";
    let mut config = ScreenerConfig::load(config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        let defaults = ScreenerConfig::default();
        // Leave a template on disk so the defaults are discoverable.
        if let Err(e) = defaults.save(config_path) {
            warn!(error = %e, "Failed to write default config");
        }
        defaults
    });

    // Override universe and report location from env if available.
    if let Ok(market) = std::env::var("SCOUT_MARKET") {
        if !market.is_empty() {
            config.market = market.trim().to_uppercase();
        }
    }
    if let Ok(dir) = std::env::var("SCOUT_OUTPUT_DIR") {
        if !dir.is_empty() {
            config.output_dir = dir;
        }
    }

    info!(
        market = %config.market,
        ma_short = config.ma_short_period,
        ma_long = config.ma_long_period,
        rsi_period = config.rsi_period,
        history_days = config.history_days,
        "screener configured"
    );

    // ── 2. Build vendor client ───────────────────────────────────────────
    let app_key = std::env::var("KRX_APP_KEY").unwrap_or_default();
    let app_secret = std::env::var("KRX_APP_SECRET").unwrap_or_default();
    if app_key.is_empty() || app_secret.is_empty() {
        warn!("KRX_APP_KEY / KRX_APP_SECRET not set — vendor calls will be rejected");
    }

    let mut client = KrxClient::new(app_key, app_secret);
    if let Ok(base_url) = std::env::var("KRX_BASE_URL") {
        if !base_url.is_empty() {
            client = client.with_base_url(base_url);
        }
    }

    let screener = Screener::new(Arc::new(client), config.clone());

    // ── 3. Run once or on the daily schedule ─────────────────────────────
    if std::env::args().any(|arg| arg == "--once") {
        let summary = screener.run_and_report().await?;
        info!(
            scanned = summary.scanned,
            skipped = summary.skipped,
            candidates = summary.candidates.len(),
            "single screening run complete"
        );
        return Ok(());
    }

    scheduler::run_daily(&config.schedule, screener).await
}
