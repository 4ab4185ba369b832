use std::fmt;
use std::sync::Arc;

use candid::{CandidType, IDLArgs, Principal};
use serde::de::DeserializeOwned;
use signer_common::contract::{
    CallMode, Capability, HttpRequest, HttpResponse, InterfaceContract, IssuesKeys,
    RemoteOperation, decode_dynamic, decode_reply, encode_dynamic, names,
};

use crate::cross_log;
use crate::errors::{RemoteCallError, Result};
use crate::transport::binding::IdentityBinding;
use crate::transport::core::HttpTransport;
use crate::transport::trust::TrustBootstrapWarning;

/// A key pair issued by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedKeyPair {
    /// Public half.
    pub public_key: String,
    /// Private half.
    pub private_key: String,
}

/// Typed client of the remote signing service, bound to one identity.
///
/// Obtained from [`ClientFactory::create`](crate::ClientFactory::create).
/// Clones share the transport and the identity binding; once the binding is
/// invalidated every clone refuses to sign.
///
/// Methods are generated from the contract: digest signing and
/// [`http_request`](Self::http_request) exist on every client, key issuance
/// only when `C` [`IssuesKeys`].
pub struct Client<C> {
    contract: InterfaceContract<C>,
    transport: Arc<HttpTransport>,
    bootstrap_warning: Option<TrustBootstrapWarning>,
}

impl<C> Client<C> {
    pub(crate) fn new(
        contract: InterfaceContract<C>,
        transport: HttpTransport,
        bootstrap_warning: Option<TrustBootstrapWarning>,
    ) -> Self {
        Self {
            contract,
            transport: Arc::new(transport),
            bootstrap_warning,
        }
    }

    /// The contract this client speaks.
    pub fn contract(&self) -> InterfaceContract<C> {
        self.contract
    }

    /// Address of the remote service.
    pub fn service_address(&self) -> Principal {
        self.transport.service()
    }

    /// Principal calls are sent as.
    pub fn sender(&self) -> Principal {
        self.transport.sender()
    }

    /// Set when trust bootstrap failed during construction.
    pub fn bootstrap_warning(&self) -> Option<&TrustBootstrapWarning> {
        self.bootstrap_warning.as_ref()
    }

    /// The root key update replies are certified against.
    pub fn root_key(&self) -> Vec<u8> {
        self.transport.root_key()
    }

    /// Whether the bound identity was invalidated.
    pub fn is_invalidated(&self) -> bool {
        self.transport.binding().is_invalidated()
    }

    pub(crate) fn binding(&self) -> Arc<IdentityBinding> {
        Arc::clone(self.transport.binding())
    }
}

impl<C: Capability> Client<C> {
    /// Sign a hex `digest` with the network's threshold key.
    pub async fn sign_digest_ic(&self, digest: &str) -> Result<String> {
        self.invoke_typed(names::SIGN_DIGEST_IC, None, candid::encode_one(digest)?)
            .await
    }

    /// Sign a hex `digest` with the multi-party key `key_id`.
    pub async fn sign_digest_mpc(&self, digest: &str, key_id: &str) -> Result<String> {
        self.invoke_typed(
            names::SIGN_DIGEST_MPC,
            None,
            candid::encode_args((digest, key_id))?,
        )
        .await
    }

    /// Send an HTTP-style request through the service's façade.
    ///
    /// A reply with `upgrade = Some(true)` is discarded and the same request is
    /// re-issued as an update call; that second reply is returned as is.
    pub async fn http_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let arg = candid::encode_one(&request)?;
        let response: HttpResponse = self
            .invoke_typed(names::HTTP_REQUEST, None, arg.clone())
            .await?;
        if !response.wants_upgrade() {
            return Ok(response);
        }

        cross_log!(
            debug,
            "{} {} asked for an upgrade, re-issuing as an update call",
            request.method,
            request.url
        );
        self.invoke_typed(names::HTTP_REQUEST, Some(CallMode::Update), arg)
            .await
    }

    /// Call any declared operation with dynamic values.
    ///
    /// Arguments are annotated with the declared argument types; the reply is
    /// decoded against the declared return types.
    pub async fn call(&self, name: &str, args: &IDLArgs) -> Result<IDLArgs> {
        let operation = self.operation(name)?;
        let arg = encode_dynamic(operation, args)?;
        let reply = self
            .transport
            .dispatch(operation.name(), operation.mode(), arg)
            .await?;
        Ok(decode_dynamic(operation, &reply)?)
    }

    fn operation(&self, name: &str) -> Result<&'static RemoteOperation> {
        self.contract
            .operation(name)
            .ok_or_else(|| RemoteCallError::UnknownOperation(name.to_string()).into())
    }

    async fn invoke_typed<T>(
        &self,
        name: &str,
        mode: Option<CallMode>,
        arg: Vec<u8>,
    ) -> Result<T>
    where
        T: CandidType + DeserializeOwned,
    {
        let operation = self.operation(name)?;
        let mode = mode.unwrap_or(operation.mode());
        let reply = self.transport.dispatch(operation.name(), mode, arg).await?;
        Ok(decode_reply(&reply)?)
    }
}

impl<C: IssuesKeys> Client<C> {
    /// Ask the service to issue a fresh key pair.
    pub async fn generate_privkey(&self) -> Result<IssuedKeyPair> {
        let (public_key, private_key): (String, String) = self
            .invoke_typed(names::GENERATE_PRIVKEY, None, candid::encode_args(())?)
            .await?;
        Ok(IssuedKeyPair {
            public_key,
            private_key,
        })
    }

    /// Ask the service to issue an API key.
    pub async fn generate_apikey(&self) -> Result<String> {
        self.invoke_typed(names::GENERATE_APIKEY, None, candid::encode_args(())?)
            .await
    }
}

impl<C> Clone for Client<C> {
    fn clone(&self) -> Self {
        Self {
            contract: self.contract,
            transport: Arc::clone(&self.transport),
            bootstrap_warning: self.bootstrap_warning.clone(),
        }
    }
}

impl<C: Capability> fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("contract", &self.contract)
            .field("service", &self.service_address().to_text())
            .field("sender", &self.sender().to_text())
            .finish_non_exhaustive()
    }
}
