pub mod client;
pub mod rate_limit;

// Re-export for convenient access (e.g. `use crate::krx::KrxClient`).
pub use client::KrxClient;
pub use rate_limit::RateLimitTracker;
