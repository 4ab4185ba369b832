//! Agent transport bound to one identity and one service.
//!
//! Calls go through [`ic_agent::Agent`]: envelopes are signed by the bound
//! identity, update replies are certified against the root key, and query
//! replies are checked against node signatures.

pub(crate) mod binding;
pub(crate) mod core;
pub(crate) mod trust;

pub use self::core::DispatchOptions;
pub use self::trust::TrustBootstrapWarning;

#[cfg(test)]
pub(crate) mod replica;
