//! The interface contract of the remote signing service.
//!
//! Arguments and replies are Candid. Typed replies go through
//! [`codec::decode_reply`], which applies the decoder quotas; Candid's
//! subtyping rules decide which replies are accepted.

pub mod codec;
pub mod http;
pub mod service;

pub use codec::{decode_dynamic, decode_reply, decoder_config, encode_dynamic, ContractError};
pub use http::{
    CallbackStrategy, HttpHeader, HttpRequest, HttpResponse, StreamingCallback, StreamingStrategy,
};
pub use service::{
    names, CallMode, Capability, InterfaceContract, IssuesKeys, RemoteOperation, Signing,
    SigningAndKeyIssuance, KEY_ISSUANCE_CONTRACT, SIGNING_CONTRACT,
};
