use std::fmt;
use std::sync::Arc;

use ic_agent::Identity;
use signer_common::contract::{Capability, InterfaceContract};

use super::core::Client;
use crate::config::DeploymentConfig;
use crate::cross_log;
use crate::errors::Result;
use crate::transport::DispatchOptions;
use crate::transport::binding::IdentityBinding;
use crate::transport::core::HttpTransport;
use crate::transport::trust::bootstrap;

/// Per-client options for [`ClientFactory::create`].
#[derive(Clone, Default)]
#[must_use]
pub struct ClientOptions {
    /// Identity to sign with; anonymous when `None`.
    pub identity: Option<Arc<dyn Identity>>,
    /// Force trust bootstrap on or off. Defaults to on outside production.
    pub trust_bootstrap: Option<bool>,
    /// HTTP dispatch settings.
    pub dispatch: DispatchOptions,
}

impl ClientOptions {
    /// Sign calls with `identity`.
    pub fn identity(mut self, identity: Arc<dyn Identity>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Override whether the root key is fetched from the network.
    pub fn trust_bootstrap(mut self, enabled: bool) -> Self {
        self.trust_bootstrap = Some(enabled);
        self
    }

    /// Replace the dispatch settings.
    pub fn dispatch(mut self, dispatch: DispatchOptions) -> Self {
        self.dispatch = dispatch;
        self
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field(
                "identity",
                &self.identity.as_ref().map(|identity| identity.sender()),
            )
            .field("trust_bootstrap", &self.trust_bootstrap)
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

/// Builds [`Client`]s for one deployment.
///
/// Every call to [`create`](Self::create) yields an independent client with
/// its own transport; nothing is cached between calls.
///
/// ```no_run
/// # use signer_client::{ClientFactory, ClientOptions, DeploymentConfig, SIGNING_CONTRACT};
/// # async fn run() -> signer_client::Result<()> {
/// let config = DeploymentConfig::from_env()?;
/// let client = ClientFactory::new(&config)
///     .create(SIGNING_CONTRACT, ClientOptions::default())
///     .await?;
/// let signature = client.sign_digest_mpc("deadbeef", "key-1").await?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct ClientFactory {
    config: DeploymentConfig,
}

impl ClientFactory {
    /// A factory for `config`.
    pub fn new(config: &DeploymentConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// The deployment this factory builds clients for.
    pub fn config(&self) -> &DeploymentConfig {
        &self.config
    }

    /// Build a client speaking `contract`.
    ///
    /// Fails with a configuration error, before any network traffic, when
    /// the service address is blank or not principal text. Outside production
    /// the network root key is fetched once before this returns; a failure
    /// there only leaves a [`bootstrap_warning`](Client::bootstrap_warning) on
    /// the client. The configured root key is installed whenever no key was
    /// fetched.
    pub async fn create<C: Capability>(
        &self,
        contract: InterfaceContract<C>,
        options: ClientOptions,
    ) -> Result<Client<C>> {
        let service = self.config.require_service_address()?;

        let binding = match options.identity {
            Some(identity) => IdentityBinding::new(identity)?,
            None => IdentityBinding::anonymous(),
        };
        let transport =
            HttpTransport::new(&self.config.network_url, service, binding, &options.dispatch)?;

        let bootstrap_enabled = options
            .trust_bootstrap
            .unwrap_or(!self.config.mode.is_production());
        // The agent only fetches while it still holds its built-in key, so
        // the configured key goes in afterwards.
        let (fetched, warning) = if bootstrap_enabled {
            let warning = bootstrap(&transport).await;
            (warning.is_none(), warning)
        } else {
            (false, None)
        };
        if let (false, Some(root_key)) = (fetched, &self.config.root_key) {
            transport.set_root_key(root_key.clone());
        }

        cross_log!(
            debug,
            "created {} client for {service} as {}",
            contract.variant_name(),
            transport.sender()
        );
        Ok(Client::new(contract, transport, warning))
    }
}
