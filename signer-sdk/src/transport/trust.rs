//! Trust bootstrap: fetching the root key of a development network.

use super::core::HttpTransport;
use crate::cross_log;

/// Non-fatal outcome of a failed trust bootstrap.
///
/// The client was still built, but update replies will only verify against
/// the configured root key, or the agent's built-in one when none is
/// configured.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("trust bootstrap failed, keeping the configured root key: {reason}")]
pub struct TrustBootstrapWarning {
    reason: String,
}

impl TrustBootstrapWarning {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Why the root key could not be obtained.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Ask the network for its root key once and install it into `transport`.
///
/// Failures are logged and returned as a warning; they never abort construction.
pub(crate) async fn bootstrap(transport: &HttpTransport) -> Option<TrustBootstrapWarning> {
    match transport.agent().fetch_root_key().await {
        Ok(()) => {
            cross_log!(
                debug,
                "installed root key {}",
                hex::encode(transport.root_key())
            );
            None
        }
        Err(err) => {
            let warning = TrustBootstrapWarning::new(err.to_string());
            cross_log!(warn, "{warning}");
            Some(warning)
        }
    }
}
