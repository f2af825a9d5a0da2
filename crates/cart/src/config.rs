//! Client Config

use std::{path::PathBuf, time::Duration};

use clap::Args;

use crate::{engine::EngineSettings, ids::BearerToken};

/// Where the storefront lives and where local state is kept.
#[derive(Debug, Clone, Args)]
pub struct CartClientConfig {
    /// Storefront JSON API base URL
    #[arg(long, env = "STRIDE_SERVER_URL", default_value = "http://127.0.0.1:8698")]
    pub server_url: String,

    /// Per-request timeout for server calls, in milliseconds
    #[arg(long, env = "STRIDE_REQUEST_TIMEOUT_MS", default_value_t = 5_000)]
    pub request_timeout_ms: u64,

    /// Directory holding the local cart and wishlist documents
    #[arg(long, env = "STRIDE_STATE_DIR", default_value = ".stride")]
    pub state_dir: PathBuf,

    /// API token of the signed-in customer; anonymous when absent
    #[arg(long, env = "STRIDE_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
}

impl CartClientConfig {
    /// Bound on each server call.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Engine settings derived from this config.
    #[must_use]
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            request_timeout: self.request_timeout(),
        }
    }

    /// The local cart document.
    #[must_use]
    pub fn cart_path(&self) -> PathBuf {
        self.state_dir.join("cart.json")
    }

    /// The local wishlist document.
    #[must_use]
    pub fn wishlist_path(&self) -> PathBuf {
        self.state_dir.join("wishlist.json")
    }

    /// A blank token counts as signed out.
    #[must_use]
    pub fn bearer(&self) -> Option<BearerToken> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(BearerToken::new)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(flatten)]
        config: CartClientConfig,
    }

    #[test]
    fn flags_override_defaults() {
        let harness = Harness::parse_from([
            "stride-cart",
            "--server-url",
            "http://shop.test",
            "--request-timeout-ms",
            "250",
            "--state-dir",
            "/tmp/stride",
        ]);

        assert_eq!(harness.config.server_url, "http://shop.test");
        assert_eq!(harness.config.request_timeout(), Duration::from_millis(250));
        assert_eq!(
            harness.config.cart_path(),
            PathBuf::from("/tmp/stride/cart.json")
        );
    }

    #[test]
    fn blank_tokens_are_ignored() {
        let harness = Harness::parse_from(["stride-cart", "--api-token", "  "]);

        assert!(harness.config.bearer().is_none());

        let harness = Harness::parse_from(["stride-cart", "--api-token", "st_v1_a.b"]);

        assert_eq!(
            harness.config.bearer().map(|token| token.expose().to_owned()),
            Some("st_v1_a.b".to_string())
        );
    }
}
