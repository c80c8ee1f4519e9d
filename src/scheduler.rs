// =============================================================================
// Daily Scheduler — fires one screening pass after each market close
// =============================================================================
//
// The cron expression uses the 6-field `sec min hour day month weekday`
// layout and is evaluated in fixed KST (UTC+9 — Korea observes no daylight
// saving).  Default: 16:05 Monday through Friday, shortly after the KOSPI
// close.
// =============================================================================

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use cron::Schedule;
use tracing::{error, info};

use crate::screener::Screener;

/// Korea Standard Time as a fixed offset.
pub fn kst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).expect("UTC+9 is a valid offset")
}

/// Current wall-clock time in KST.
pub fn kst_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&kst())
}

/// Next fire time strictly after `now`, if the schedule has one.
fn next_fire(schedule: &Schedule, now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    schedule.after(&now).next()
}

/// Run the screener on `expr`'s cadence, forever.
///
/// A failed run is logged and the loop keeps going — one bad trading day
/// must not take the scheduler down with it.
pub async fn run_daily(expr: &str, screener: Screener) -> Result<()> {
    let schedule =
        Schedule::from_str(expr).with_context(|| format!("invalid cron expression '{expr}'"))?;

    info!(cron = expr, "scheduler started — waiting for the next market close");

    loop {
        let now = kst_now();
        let next = next_fire(&schedule, now)
            .with_context(|| format!("cron expression '{expr}' has no upcoming fire time"))?;
        let wait = (next - now).to_std().unwrap_or_default();

        info!(next = %next, wait_secs = wait.as_secs(), "next screening run scheduled");
        tokio::time::sleep(wait).await;

        match screener.run_and_report().await {
            Ok(summary) => info!(
                scanned = summary.scanned,
                skipped = summary.skipped,
                candidates = summary.candidates.len(),
                "scheduled screening run finished"
            ),
            Err(e) => error!(error = %e, "scheduled screening run failed"),
        }
    }
}
