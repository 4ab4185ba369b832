#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(any(), deny(clippy::unwrap_used))]

mod client;
pub mod config;
pub mod errors;
mod macros;
mod session;
mod transport;

pub mod prelude;

// --- PUBLIC API EXPORTS ---
// Configuration
pub use config::{DeploymentConfig, DeploymentMode, ServiceIds};
// Client construction
pub use client::core::{Client, IssuedKeyPair};
pub use client::factory::{ClientFactory, ClientOptions};
pub use transport::{DispatchOptions, TrustBootstrapWarning};
// Sessions
pub use session::core::{Authenticator, SessionManager, SessionState};
pub use session::idle::{IdleCallback, IdleManager, IdleMonitor, SubscriptionId};

// Errors
pub use errors::{AuthError, BuildError, ConfigError, Error, RemoteCallError, Result};

// Re-exports
pub use async_trait::async_trait;
pub use candid::{IDLArgs, IDLValue, Principal};
pub use ic_agent::Identity;
pub use ic_agent::identity::{AnonymousIdentity, BasicIdentity};
pub use signer_common::contract::{
    CallMode, Capability, ContractError, HttpHeader, HttpRequest, HttpResponse, InterfaceContract,
    IssuesKeys, KEY_ISSUANCE_CONTRACT, SIGNING_CONTRACT, Signing, SigningAndKeyIssuance,
};

/// Capability of the service variant this build targets.
#[cfg(feature = "key-issuance")]
pub type DeployedCapability = SigningAndKeyIssuance;
/// Capability of the service variant this build targets.
#[cfg(not(feature = "key-issuance"))]
pub type DeployedCapability = Signing;

/// Contract of the service variant this build targets.
pub const DEPLOYED_CONTRACT: InterfaceContract<DeployedCapability> = InterfaceContract::new();
