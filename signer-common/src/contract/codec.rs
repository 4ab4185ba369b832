//! Bounded Candid decoding for replies, and the untyped encoding used by
//! dynamic calls.
//!
//! Every reply is decoded through [`decoder_config`], so a hostile or broken
//! service cannot make the client spend unbounded time on a small message.

use candid::types::TypeEnv;
use candid::{CandidType, DecoderConfig, IDLArgs};
use serde::de::DeserializeOwned;

use super::service::RemoteOperation;

/// Upper bound on the work spent decoding one reply.
pub const DECODING_QUOTA: usize = 20_000_000;

/// Upper bound on the work spent skipping values the client does not keep.
pub const SKIPPING_QUOTA: usize = 100_000;

/// Upper bound on the number of entries in a reply's type table.
pub const MAX_TYPE_LEN: usize = 1_000;

/// Errors raised while encoding arguments or decoding replies.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// The bytes are not valid Candid for the expected types, or decoding
    /// exceeded one of the quotas.
    #[error(transparent)]
    Candid(#[from] candid::Error),

    /// A dynamic call supplied the wrong number of arguments.
    #[error("{method} takes {expected} argument(s), {found} given")]
    ArgumentCount {
        /// Operation name.
        method: &'static str,
        /// Declared argument count.
        expected: usize,
        /// Supplied argument count.
        found: usize,
    },
}

/// The decoder limits applied to every reply.
pub fn decoder_config() -> DecoderConfig {
    let mut config = DecoderConfig::new();
    config
        .set_decoding_quota(DECODING_QUOTA)
        .set_skipping_quota(SKIPPING_QUOTA)
        .set_max_type_len(MAX_TYPE_LEN)
        .set_full_error_message(false);
    config
}

/// Decode a single-value reply into `T`.
pub fn decode_reply<T>(bytes: &[u8]) -> Result<T, ContractError>
where
    T: CandidType + DeserializeOwned,
{
    Ok(candid::decode_one_with_config(bytes, &decoder_config())?)
}

/// Encode `args` against the declared argument types of `operation`.
pub fn encode_dynamic(
    operation: &RemoteOperation,
    args: &IDLArgs,
) -> Result<Vec<u8>, ContractError> {
    let types = operation.arg_types();
    if types.len() != args.args.len() {
        return Err(ContractError::ArgumentCount {
            method: operation.name(),
            expected: types.len(),
            found: args.args.len(),
        });
    }
    Ok(args.to_bytes_with_types(&TypeEnv::new(), &types)?)
}

/// Decode a reply against the declared return types of `operation`.
pub fn decode_dynamic(
    operation: &RemoteOperation,
    bytes: &[u8],
) -> Result<IDLArgs, ContractError> {
    Ok(IDLArgs::from_bytes_with_types_with_config(
        bytes,
        &TypeEnv::new(),
        &operation.ret_types(),
        &decoder_config(),
    )?)
}
