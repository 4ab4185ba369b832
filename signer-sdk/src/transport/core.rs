use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use candid::Principal;
use ic_agent::Agent;
use signer_common::contract::CallMode;
use url::Url;

use super::binding::IdentityBinding;
use crate::cross_log;
use crate::errors::{AuthError, BuildError, Result};

const DEFAULT_USER_AGENT: &str = concat!("signer-client", "@", env!("CARGO_PKG_VERSION"));

/// Per-client knobs for how calls are dispatched.
///
/// # Defaults
/// - Request timeout: reqwest default (none) unless set; ignored on WASM
/// - User-agent: `signer-client@<crate-version>` plus any `user_agent_extra`
/// - Query replies must carry valid node signatures
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct DispatchOptions {
    /// Timeout applied to every HTTP request.
    pub request_timeout: Option<Duration>,
    /// Segment appended to the default user-agent.
    pub user_agent_extra: Option<String>,
    /// Whether query replies are checked against the subnet's node keys.
    pub verify_query_signatures: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            request_timeout: None,
            user_agent_extra: None,
            verify_query_signatures: true,
        }
    }
}

impl DispatchOptions {
    /// Set the HTTP request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Append a user-agent segment, e.g. `"myapp/1.2.3"`.
    pub fn user_agent_extra(mut self, extra: impl Into<String>) -> Self {
        self.user_agent_extra = Some(extra.into());
        self
    }

    /// Turn query signature checks on or off. Only local test replicas
    /// should ever need them off.
    pub fn verify_query_signatures(mut self, verify: bool) -> Self {
        self.verify_query_signatures = verify;
        self
    }
}

/// An agent bound to one identity and one service.
///
/// Update replies are certified against the agent's root key; query replies
/// are checked against node signatures unless that was turned off.
pub(crate) struct HttpTransport {
    agent: Agent,
    service: Principal,
    binding: Arc<IdentityBinding>,
}

impl HttpTransport {
    pub(crate) fn new(
        network: &Url,
        service: Principal,
        binding: IdentityBinding,
        options: &DispatchOptions,
    ) -> Result<Self> {
        let binding = Arc::new(binding);
        let agent = Agent::builder()
            .with_url(network.as_str())
            .with_http_client(build_http_client(options)?)
            .with_arc_identity(Arc::clone(&binding) as Arc<dyn ic_agent::Identity>)
            .with_verify_query_signatures(options.verify_query_signatures)
            .build()
            .map_err(BuildError::Agent)?;

        Ok(Self {
            agent,
            service,
            binding,
        })
    }

    pub(crate) fn agent(&self) -> &Agent {
        &self.agent
    }

    pub(crate) fn service(&self) -> Principal {
        self.service
    }

    pub(crate) fn sender(&self) -> Principal {
        self.binding.principal()
    }

    pub(crate) fn binding(&self) -> &Arc<IdentityBinding> {
        &self.binding
    }

    /// The root key replies are verified against.
    pub(crate) fn root_key(&self) -> Vec<u8> {
        self.agent.read_root_key()
    }

    pub(crate) fn set_root_key(&self, root_key: Vec<u8>) {
        self.agent.set_root_key(root_key);
    }

    /// Sign and send one call, returning the encoded reply.
    pub(crate) async fn dispatch(
        &self,
        method: &str,
        mode: CallMode,
        arg: Vec<u8>,
    ) -> Result<Vec<u8>> {
        if self.binding.is_invalidated() {
            return Err(AuthError::IdentityInvalidated.into());
        }
        cross_log!(
            debug,
            "dispatching {method} as {mode:?} to {} from {}",
            self.service,
            self.binding.principal()
        );

        let reply = match mode {
            CallMode::Query => {
                self.agent
                    .query(&self.service, method)
                    .with_arg(arg)
                    .call()
                    .await?
            }
            CallMode::Update => {
                self.agent
                    .update(&self.service, method)
                    .with_arg(arg)
                    .call_and_wait()
                    .await?
            }
        };
        Ok(reply)
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("service", &self.service.to_text())
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}

fn build_http_client(options: &DispatchOptions) -> std::result::Result<reqwest::Client, BuildError> {
    let user_agent = match &options.user_agent_extra {
        Some(extra) if !extra.trim().is_empty() => {
            &format!("{DEFAULT_USER_AGENT} {}", extra.trim())
        }
        _ => DEFAULT_USER_AGENT,
    };

    #[cfg(not(target_arch = "wasm32"))]
    let mut builder = reqwest::Client::builder().user_agent(user_agent);

    #[cfg(target_arch = "wasm32")]
    let builder = reqwest::Client::builder().user_agent(user_agent);

    #[cfg(not(target_arch = "wasm32"))]
    if let Some(timeout) = options.request_timeout {
        builder = builder.timeout(timeout);
    }

    Ok(builder.build()?)
}
