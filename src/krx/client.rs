// =============================================================================
// KRX OpenAPI REST Client — HMAC-SHA256 signed requests
// =============================================================================
//
// SECURITY: The application secret is only ever used for signing and never
// logged or serialised.  Every request carries the application key in the
// `X-KRX-APPKEY` header and an HMAC-SHA256 hex signature of the query string
// in `X-KRX-SIGN`.
//
// Daily price history is paged: each response carries a `next_cursor` token
// while older sessions remain, newest rows first.  The client walks the
// cursor chain until it has enough history, then normalises to an
// oldest-first series.
// =============================================================================

use anyhow::{Context, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{debug, instrument, warn};

use crate::krx::rate_limit::RateLimitTracker;
use crate::scheduler::kst_now;

type HmacSha256 = Hmac<Sha256>;

/// Backoff applied when the per-second call budget is exhausted.
const WINDOW_BACKOFF_MS: u64 = 250;

/// KRX market-data REST client with HMAC-SHA256 request signing.
pub struct KrxClient {
    secret: String,
    base_url: String,
    client: reqwest::Client,
    limits: RateLimitTracker,
}

impl KrxClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new `KrxClient`.
    ///
    /// # Arguments
    /// * `app_key` — vendor application key (sent as a header on every call).
    /// * `secret`  — vendor application secret used exclusively for signing.
    pub fn new(app_key: impl Into<String>, secret: impl Into<String>) -> Self {
        let app_key = app_key.into();
        let secret = secret.into();

        let mut default_headers = reqwest::header::HeaderMap::new();
        if let Ok(val) = reqwest::header::HeaderValue::from_str(&app_key) {
            default_headers.insert("X-KRX-APPKEY", val);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        debug!("KrxClient initialised (base_url=https://openapi.krxdata.co.kr)");

        Self {
            secret,
            base_url: "https://openapi.krxdata.co.kr".to_string(),
            client,
            limits: RateLimitTracker::new(),
        }
    }

    /// Point the client at a different host (staging, local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Current rate-limit counters, for end-of-run summary logging.
    pub fn rate_limit_snapshot(&self) -> crate::krx::rate_limit::RateLimitSnapshot {
        self.limits.snapshot()
    }

    // -------------------------------------------------------------------------
    // Signing helpers
    // -------------------------------------------------------------------------

    /// Produce an HMAC-SHA256 hex signature of `query`.
    pub fn sign(&self, query: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key size");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Perform a signed GET against `path`, respecting the call budget, and
    /// parse the JSON body.
    async fn get_json(&self, path: &str, query: &str) -> Result<serde_json::Value> {
        if !self.limits.can_send_request(1) {
            tokio::time::sleep(std::time::Duration::from_millis(WINDOW_BACKOFF_MS)).await;
            self.limits.reset_window();
        }

        let url = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        };

        let resp = self
            .client
            .get(&url)
            .header("X-KRX-SIGN", self.sign(query))
            .send()
            .await
            .with_context(|| format!("GET {path} request failed"))?;

        self.limits.record_request();
        self.limits.update_from_headers(resp.headers());

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse {path} response"))?;

        if !status.is_success() {
            anyhow::bail!("KRX GET {} returned {}: {}", path, status, body);
        }

        Ok(body)
    }

    // -------------------------------------------------------------------------
    // Universe
    // -------------------------------------------------------------------------

    /// GET /v1/market/codes — every tradable ticker code for `market`
    /// (e.g. "KOSPI").
    #[instrument(skip(self), name = "krx::list_codes")]
    pub async fn list_codes(&self, market: &str) -> Result<Vec<String>> {
        let body = self.get_json("/v1/market/codes", &format!("market={market}")).await?;

        let raw = body["codes"]
            .as_array()
            .context("codes response missing 'codes' array")?;

        let mut codes = Vec::with_capacity(raw.len());
        for entry in raw {
            match entry.as_str() {
                Some(code) if !code.is_empty() => codes.push(code.to_string()),
                _ => warn!("skipping malformed code entry: {entry}"),
            }
        }

        debug!(market, count = codes.len(), "market codes listed");
        Ok(codes)
    }

    /// GET /v1/stock/name — display name for a single ticker code.
    #[instrument(skip(self), name = "krx::get_stock_name")]
    pub async fn get_stock_name(&self, code: &str) -> Result<String> {
        let body = self.get_json("/v1/stock/name", &format!("code={code}")).await?;

        let name = body["name"]
            .as_str()
            .context("name response missing 'name' field")?;

        Ok(name.trim().to_string())
    }

    // -------------------------------------------------------------------------
    // Daily price history
    // -------------------------------------------------------------------------

    /// GET /v1/stock/daily (paged) — the most recent `count` daily closes
    /// for `code`, oldest first.
    ///
    /// The vendor returns sessions newest-first and pages backwards in time
    /// via `next_cursor`.  Fewer than `count` sessions on record is an error;
    /// the caller decides whether to skip the ticker.
    #[instrument(skip(self), name = "krx::get_daily_closes")]
    pub async fn get_daily_closes(&self, code: &str, count: usize) -> Result<Vec<f64>> {
        let base_date = kst_now().format("%Y%m%d").to_string();
        let mut newest_first: Vec<f64> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = format!("code={code}&base_date={base_date}");
            if let Some(ref c) = cursor {
                query.push_str(&format!("&cursor={c}"));
            }

            let body = self.get_json("/v1/stock/daily", &query).await?;
            let (closes, next_cursor) = Self::parse_daily_page(&body)
                .with_context(|| format!("bad daily page for {code}"))?;

            if closes.is_empty() {
                break;
            }
            newest_first.extend(closes);

            match next_cursor {
                Some(c) if newest_first.len() < count => cursor = Some(c),
                _ => break,
            }
        }

        if newest_first.len() < count {
            anyhow::bail!(
                "{} has {} daily closes on record, need {}",
                code,
                newest_first.len(),
                count
            );
        }

        // Keep the most recent `count` sessions and flip to oldest-first —
        // indicator maths depends on chronological order.
        newest_first.truncate(count);
        newest_first.reverse();

        debug!(code, count = newest_first.len(), "daily closes fetched");
        Ok(newest_first)
    }

    // -------------------------------------------------------------------------
    // Parsing helpers
    // -------------------------------------------------------------------------

    /// Parse one page of the daily endpoint: newest-first closes plus the
    /// cursor for the next (older) page, if any.
    fn parse_daily_page(body: &serde_json::Value) -> Result<(Vec<f64>, Option<String>)> {
        let raw = body["prices"]
            .as_array()
            .context("daily response missing 'prices' array")?;

        let mut closes = Vec::with_capacity(raw.len());
        for entry in raw {
            closes.push(Self::parse_str_f64(&entry["close"])?);
        }

        let next_cursor = body["next_cursor"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        Ok((closes, next_cursor))
    }

    /// The vendor serialises prices as strings ("71900"); tolerate plain
    /// numbers too.
    fn parse_str_f64(val: &serde_json::Value) -> Result<f64> {
        if let Some(s) = val.as_str() {
            s.parse::<f64>()
                .with_context(|| format!("failed to parse '{s}' as f64"))
        } else {
            val.as_f64().context("value is neither string nor number")
        }
    }
}

impl std::fmt::Debug for KrxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The secret stays out of debug output.
        f.debug_struct("KrxClient")
            .field("base_url", &self.base_url)
            .field("limits", &self.limits)
            .finish()
    }
}
