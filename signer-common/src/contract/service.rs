//! The operation table of the remote signing service.

use core::fmt;
use core::marker::PhantomData;

use candid::types::{FuncMode, Function, Type};
use candid::CandidType;

use super::http::{HttpRequest, HttpResponse};

/// Names of the declared operations.
pub mod names {
    /// Sign a hex digest with the network's threshold key (update).
    pub const SIGN_DIGEST_IC: &str = "sign_digest_ic";
    /// Sign a hex digest with a multi-party key (query).
    pub const SIGN_DIGEST_MPC: &str = "sign_digest_mpc";
    /// Issue a fresh key pair (update, key issuance only).
    pub const GENERATE_PRIVKEY: &str = "generate_privkey";
    /// Issue an API key (update, key issuance only).
    pub const GENERATE_APIKEY: &str = "generate_apikey";
    /// Generic HTTP-style façade (query, upgradable to update).
    pub const HTTP_REQUEST: &str = "http_request";
}

/// How an operation is dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallMode {
    /// Read-only, answered by a single replica, possibly unauthenticated.
    Query,
    /// Side-effecting, goes through agreement before replying.
    Update,
}

/// One named entry of the contract.
#[derive(Clone, Copy)]
pub struct RemoteOperation {
    name: &'static str,
    mode: CallMode,
    args: fn() -> Vec<Type>,
    rets: fn() -> Vec<Type>,
    key_issuance: bool,
}

impl RemoteOperation {
    /// Operation name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared call mode.
    pub fn mode(&self) -> CallMode {
        self.mode
    }

    /// Argument types, in order.
    pub fn arg_types(&self) -> Vec<Type> {
        (self.args)()
    }

    /// Return types, in order.
    pub fn ret_types(&self) -> Vec<Type> {
        (self.rets)()
    }

    /// Whether the operation only exists on the key-issuance contract.
    pub fn is_key_issuance(&self) -> bool {
        self.key_issuance
    }

    /// The operation's signature as a `func` type.
    pub fn signature(&self) -> Function {
        Function {
            modes: match self.mode {
                CallMode::Query => vec![FuncMode::Query],
                CallMode::Update => vec![],
            },
            args: self.arg_types(),
            rets: self.ret_types(),
        }
    }
}

impl fmt::Debug for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteOperation")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

fn none() -> Vec<Type> {
    Vec::new()
}

fn text() -> Vec<Type> {
    vec![String::ty()]
}

fn two_texts() -> Vec<Type> {
    vec![String::ty(), String::ty()]
}

fn key_pair() -> Vec<Type> {
    vec![<(String, String)>::ty()]
}

fn http_request() -> Vec<Type> {
    vec![HttpRequest::ty()]
}

fn http_response() -> Vec<Type> {
    vec![HttpResponse::ty()]
}

/// Every operation of the extended service, sorted by name.
const OPERATIONS: &[RemoteOperation] = &[
    RemoteOperation {
        name: names::GENERATE_APIKEY,
        mode: CallMode::Update,
        args: none,
        rets: text,
        key_issuance: true,
    },
    RemoteOperation {
        name: names::GENERATE_PRIVKEY,
        mode: CallMode::Update,
        args: none,
        rets: key_pair,
        key_issuance: true,
    },
    RemoteOperation {
        name: names::HTTP_REQUEST,
        mode: CallMode::Query,
        args: http_request,
        rets: http_response,
        key_issuance: false,
    },
    RemoteOperation {
        name: names::SIGN_DIGEST_IC,
        mode: CallMode::Update,
        args: text,
        rets: text,
        key_issuance: false,
    },
    RemoteOperation {
        name: names::SIGN_DIGEST_MPC,
        mode: CallMode::Query,
        args: two_texts,
        rets: text,
        key_issuance: false,
    },
];

/// Tag selecting which operations a contract exposes.
pub trait Capability: Copy + fmt::Debug + Send + Sync + 'static {
    /// Human-readable name of the contract variant.
    const NAME: &'static str;
    /// Whether key-generation operations are part of the contract.
    const ISSUES_KEYS: bool;
}

/// Capabilities that include key generation.
pub trait IssuesKeys: Capability {}

/// The minimal service: digest signing and the HTTP façade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Signing;

/// The extended service, which also issues keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SigningAndKeyIssuance;

impl Capability for Signing {
    const NAME: &'static str = "signing";
    const ISSUES_KEYS: bool = false;
}

impl Capability for SigningAndKeyIssuance {
    const NAME: &'static str = "signing+key-issuance";
    const ISSUES_KEYS: bool = true;
}

impl IssuesKeys for SigningAndKeyIssuance {}

/// The immutable interface contract of one service variant.
pub struct InterfaceContract<C> {
    capability: PhantomData<fn() -> C>,
}

/// Contract of the signing-only service.
pub const SIGNING_CONTRACT: InterfaceContract<Signing> = InterfaceContract::new();

/// Contract of the service that also issues keys.
pub const KEY_ISSUANCE_CONTRACT: InterfaceContract<SigningAndKeyIssuance> =
    InterfaceContract::new();

impl<C: Capability> InterfaceContract<C> {
    /// The contract for capability `C`.
    pub const fn new() -> Self {
        Self {
            capability: PhantomData,
        }
    }

    /// Name of the contract variant.
    pub fn variant_name(&self) -> &'static str {
        C::NAME
    }

    /// Declared operations, sorted by name.
    pub fn operations(&self) -> impl Iterator<Item = &'static RemoteOperation> {
        OPERATIONS
            .iter()
            .filter(|op| C::ISSUES_KEYS || !op.key_issuance)
    }

    /// Look up an operation by name.
    pub fn operation(&self, name: &str) -> Option<&'static RemoteOperation> {
        self.operations().find(|op| op.name == name)
    }
}

impl<C: Capability> Default for InterfaceContract<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for InterfaceContract<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for InterfaceContract<C> {}

impl<C: Capability> fmt::Debug for InterfaceContract<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InterfaceContract").field(&C::NAME).finish()
    }
}

/// Renders the contract as IDL text.
impl<C: Capability> fmt::Display for InterfaceContract<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "service : {{")?;
        for op in self.operations() {
            writeln!(f, "  {} : {};", op.name, op.signature())?;
        }
        write!(f, "}}")
    }
}
