//! Abandoned Cart Sweeper

use std::{sync::Arc, time::Duration};

use jiff::{SignedDuration, Timestamp};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use stride_app::domain::carts::{CartsService, CartsServiceError};

use crate::{config::carts::CartsConfig, observability::record_purged_carts};

/// Periodically deletes anonymous carts nobody has touched within the TTL.
pub(crate) struct CartSweeper {
    carts: Arc<dyn CartsService>,
    ttl: SignedDuration,
    interval: Duration,
}

impl CartSweeper {
    pub(crate) fn new(carts: Arc<dyn CartsService>, config: &CartsConfig) -> Self {
        Self {
            carts,
            ttl: config.ttl(),
            interval: config.sweep_interval(),
        }
    }

    /// Run one purge pass against `now`.
    pub(crate) async fn sweep_once(&self, now: Timestamp) -> Result<u64, CartsServiceError> {
        let cutoff = now.checked_sub(self.ttl).unwrap_or(Timestamp::MIN);

        let purged = self.carts.purge_abandoned(cutoff).await?;

        record_purged_carts(purged);

        Ok(purged)
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        info!(
            ttl = %self.ttl,
            interval_seconds = self.interval.as_secs(),
            "starting abandoned cart sweeper"
        );

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);

            loop {
                interval.tick().await;

                if let Err(error) = self.sweep_once(Timestamp::now()).await {
                    warn!("abandoned cart sweep failed: {error}");
                }
            }
        })
    }
}
