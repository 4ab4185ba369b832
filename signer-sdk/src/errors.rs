//! Unified error types for the `signer-client` crate.
//!
//! Every failure surfaces as one top-level [`Error`] with the [`Result`] alias.
//! Lower-layer errors (`ic-agent`, the contract codec, principals, TOML) are
//! mapped into structured variants so callers can tell configuration mistakes,
//! authentication problems and remote-call failures apart.

use std::path::PathBuf;

use candid::types::principal::PrincipalError;
use ic_agent::AgentError;
use signer_common::contract::ContractError;
use thiserror::Error;

use crate::transport::binding::INVALIDATED;

// --- Build-Time Error ---

/// Errors that can occur while building the transport.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to build the HTTP client (reqwest configuration).
    #[error("Failed to build the HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// The agent rejected its configuration.
    #[error("Failed to build the agent: {0}")]
    Agent(#[source] AgentError),
}

// --- The Main Operational Error Enum ---

/// The crate's top-level error type.
///
/// - [`Error::Configuration`]: deployment configuration is missing or invalid
/// - [`Error::Authentication`]: no usable identity
/// - [`Error::RemoteCall`]: the call failed on the wire or was refused
/// - [`Error::Build`]: the transport could not be constructed
#[derive(Debug, Error)]
pub enum Error {
    /// Deployment configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// No usable identity.
    #[error("Authentication error: {0}")]
    Authentication(#[from] AuthError),

    /// A remote operation failed.
    #[error("Remote call failed: {0}")]
    RemoteCall(#[from] RemoteCallError),

    /// Building the client failed.
    #[error("Client build failed: {0}")]
    Build(#[from] BuildError),
}

// --- Configuration ---

/// Invalid or missing deployment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The service address is empty or was never configured.
    #[error("no service address configured")]
    MissingServiceAddress,

    /// The service address is not principal text.
    #[error("invalid service address {address:?}: {source}")]
    InvalidServiceAddress {
        /// The offending value.
        address: String,
        /// Parse failure.
        source: PrincipalError,
    },

    /// A configured URL does not parse.
    #[error("invalid URL {url:?}: {source}")]
    InvalidNetworkUrl {
        /// The offending value.
        url: String,
        /// Parse failure.
        source: url::ParseError,
    },

    /// The embedded root key is not hex.
    #[error("invalid root key: {0}")]
    InvalidRootKey(#[source] hex::FromHexError),

    /// The idle timeout is not a positive number of seconds.
    #[error("invalid idle timeout {0:?}")]
    InvalidIdleTimeout(String),

    /// A configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// I/O failure.
        source: std::io::Error,
    },

    /// TOML configuration does not parse.
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A service id map does not parse.
    #[error("invalid service id map: {0}")]
    ServiceIds(#[from] serde_json::Error),

    /// The service id map has no entry for this name and network.
    #[error("no id for service {name:?} on network {network:?}")]
    UnknownService {
        /// Service name.
        name: String,
        /// Network name.
        network: String,
    },
}

// --- Authentication ---

/// Errors tied to the identity calls are signed with.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The authenticator had no identity to offer.
    #[error("the authenticator returned no identity")]
    MissingIdentity,

    /// The identity binding was invalidated after an idle signal.
    #[error("the identity was invalidated; authenticate again")]
    IdentityInvalidated,

    /// The identity could not name itself or refused to sign.
    #[error("identity error: {0}")]
    Identity(String),
}

// --- Remote calls ---

/// Failures of one remote operation.
#[derive(Debug, Error)]
pub enum RemoteCallError {
    /// The network could not be reached, or the call timed out.
    #[error("transport error: {0}")]
    Transport(#[source] AgentError),

    /// The network answered with a non-success HTTP status.
    #[error("Server responded with an error: {status} - {message}")]
    Server {
        /// The HTTP status code returned.
        status: u16,
        /// The response body, lossily decoded.
        message: String,
    },

    /// The service refused the call.
    #[error("call rejected with code {code}: {message}")]
    Rejected {
        /// Reject code.
        code: u8,
        /// Reject reason.
        message: String,
    },

    /// The reply failed certificate or signature checks, or is malformed.
    #[error("protocol error: {0}")]
    Protocol(#[source] AgentError),

    /// Arguments or reply do not match the interface contract.
    #[error("contract violation: {0}")]
    Contract(#[from] ContractError),

    /// The contract declares no operation with this name.
    #[error("unknown operation {0:?}")]
    UnknownOperation(String),
}

impl RemoteCallError {
    /// Returns true for failures that might succeed if the caller retries.
    ///
    /// The client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteCallError::Transport(_) => true,
            RemoteCallError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<AgentError> for RemoteCallError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::TransportError(..) | AgentError::TimeoutWaitingForResponse(..) => {
                RemoteCallError::Transport(err)
            }
            AgentError::HttpError(payload) => RemoteCallError::Server {
                status: payload.status,
                message: String::from_utf8_lossy(&payload.content).into_owned(),
            },
            AgentError::CertifiedReject(reject) | AgentError::UncertifiedReject(reject) => {
                RemoteCallError::Rejected {
                    code: reject.reject_code as u8,
                    message: reject.reject_message,
                }
            }
            other => RemoteCallError::Protocol(other),
        }
    }
}

/// A specialized `Result` type for `signer-client` operations.
pub type Result<T> = std::result::Result<T, Error>;

macro_rules! impl_from_for_error {
    ($from_type:ty, $to_variant:path) => {
        impl From<$from_type> for Error {
            fn from(err: $from_type) -> Self {
                $to_variant(err.into())
            }
        }
    };
}

impl_from_for_error!(ContractError, Error::RemoteCall);
impl_from_for_error!(candid::Error, Error::RemoteCall);
impl_from_for_error!(toml::de::Error, Error::Configuration);

impl From<candid::Error> for RemoteCallError {
    fn from(err: candid::Error) -> Self {
        RemoteCallError::Contract(err.into())
    }
}

/// Signing failures belong to the session, everything else to the call.
impl From<AgentError> for Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::SigningError(message) if message == INVALIDATED => {
                AuthError::IdentityInvalidated.into()
            }
            AgentError::SigningError(message) => AuthError::Identity(message).into(),
            other => RemoteCallError::from(other).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ic_agent::agent::{RejectCode, RejectResponse};
    use ic_agent::agent_error::HttpErrorPayload;

    #[test]
    fn retryable_server_errors() {
        let server = |status| RemoteCallError::Server {
            status,
            message: String::new(),
        };
        assert!(server(503).is_retryable());
        assert!(!server(400).is_retryable());
        assert!(
            !RemoteCallError::Rejected {
                code: 5,
                message: "trapped".into()
            }
            .is_retryable()
        );
        let contract = candid::Error::msg("bad reply");
        assert!(!RemoteCallError::from(contract).is_retryable());
    }

    #[test]
    fn agent_errors_are_classified() {
        let http = AgentError::HttpError(HttpErrorPayload {
            status: 502,
            content_type: None,
            content: b"bad gateway".to_vec(),
        });
        match RemoteCallError::from(http) {
            RemoteCallError::Server { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "bad gateway");
            }
            other => panic!("unexpected {other:?}"),
        }

        let reject = AgentError::UncertifiedReject(RejectResponse {
            reject_code: RejectCode::CanisterError,
            reject_message: "trapped".into(),
            error_code: None,
        });
        assert!(matches!(
            RemoteCallError::from(reject),
            RemoteCallError::Rejected { code: 5, .. }
        ));

        assert!(matches!(
            RemoteCallError::from(AgentError::CertificateVerificationFailed()),
            RemoteCallError::Protocol(_)
        ));
    }

    #[test]
    fn signing_errors_are_authentication_errors() {
        let err: Error = AgentError::SigningError(INVALIDATED.to_string()).into();
        assert!(matches!(
            err,
            Error::Authentication(AuthError::IdentityInvalidated)
        ));

        let err: Error = AgentError::SigningError("locked".into()).into();
        assert!(matches!(err, Error::Authentication(AuthError::Identity(_))));
    }
}
