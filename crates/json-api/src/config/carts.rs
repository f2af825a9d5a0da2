//! Cart Cleanup Config

use std::time::Duration;

use clap::Args;
use jiff::SignedDuration;

/// Abandoned anonymous cart cleanup.
#[derive(Debug, Args)]
pub struct CartsConfig {
    /// Hours since last change after which an anonymous cart is purged
    #[arg(
        long,
        env = "CART_TTL_HOURS",
        default_value_t = 720,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub cart_ttl_hours: u32,

    /// Seconds between cleanup sweeps
    #[arg(long, env = "CART_SWEEP_INTERVAL_SECONDS", default_value_t = 3_600)]
    pub cart_sweep_interval_seconds: u64,

    /// Run the cleanup sweeper in this process
    #[arg(long, env = "CART_SWEEP_ENABLED", default_value_t = true, action = clap::ArgAction::Set)]
    pub cart_sweep_enabled: bool,
}

impl CartsConfig {
    #[must_use]
    pub fn ttl(&self) -> SignedDuration {
        SignedDuration::from_hours(i64::from(self.cart_ttl_hours))
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cart_sweep_interval_seconds.max(1))
    }
}
