//! Deployment configuration.
//!
//! A [`DeploymentConfig`] is built once at process start, from environment
//! variables or a TOML file, and handed to the [`ClientFactory`](crate::ClientFactory).
//! Fields that are not given take the defaults of the [`DeploymentMode`].
//!
//! ```toml
//! service_address = "rrkah-fqaaa-aaaaa-aaaaq-cai"
//! mode = "development"
//! network_url = "http://localhost:8000"
//! idle_timeout_secs = 600
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use candid::Principal;
use serde::Deserialize;
use url::Url;

use crate::errors::ConfigError;

/// Environment variable naming the remote service.
pub const ENV_SERVICE_ADDRESS: &str = "SIGNER_SERVICE_ADDRESS";
/// Environment variable selecting the deployment mode.
pub const ENV_DEPLOYMENT_MODE: &str = "SIGNER_DEPLOYMENT_MODE";
/// Environment variable overriding the network URL.
pub const ENV_NETWORK_URL: &str = "SIGNER_NETWORK_URL";
/// Environment variable overriding the identity provider URL.
pub const ENV_IDENTITY_PROVIDER: &str = "SIGNER_IDENTITY_PROVIDER";
/// Environment variable carrying the hex root key for production.
pub const ENV_ROOT_KEY: &str = "SIGNER_ROOT_KEY";
/// Environment variable overriding the idle timeout, in seconds.
pub const ENV_IDLE_TIMEOUT_SECS: &str = "SIGNER_IDLE_TIMEOUT_SECS";

/// Idle timeout used when none is configured.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Production or development network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// The public network. Trust bootstrap is skipped.
    Production,
    /// A local replica. The root key is fetched from the network.
    #[default]
    Development,
}

impl DeploymentMode {
    /// Whether this is the production network.
    pub fn is_production(self) -> bool {
        self == DeploymentMode::Production
    }

    /// Network URL used when none is configured.
    pub fn default_network_url(self) -> &'static str {
        match self {
            DeploymentMode::Production => "https://icp-api.io",
            DeploymentMode::Development => "http://localhost:8000",
        }
    }

    /// Identity provider used when none is configured.
    pub fn default_identity_provider(self) -> &'static str {
        match self {
            DeploymentMode::Production => "https://identity.ic0.app",
            DeploymentMode::Development => {
                "http://rwlgt-iiaaa-aaaaa-aaaaa-cai.localhost:8000/#authorize"
            }
        }
    }

    /// Network key in a service id map.
    pub fn network_name(self) -> &'static str {
        match self {
            DeploymentMode::Production => "ic",
            DeploymentMode::Development => "local",
        }
    }
}

/// `production`, in any case, selects production; anything else is development.
/// Environment variables and TOML files both go through this.
impl FromStr for DeploymentMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("production") {
            Ok(DeploymentMode::Production)
        } else {
            Ok(DeploymentMode::Development)
        }
    }
}

/// Everything a [`ClientFactory`](crate::ClientFactory) needs to know about the deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentConfig {
    /// Address of the remote service. `None` or blank fails client construction.
    pub service_address: Option<String>,
    /// Deployment mode.
    pub mode: DeploymentMode,
    /// Base URL of the network the service runs on.
    pub network_url: Url,
    /// Where users are sent to authenticate.
    pub identity_provider: Url,
    /// Root key embedded for production, DER-encoded.
    pub root_key: Option<Vec<u8>>,
    /// Inactivity after which the session's identity is invalidated.
    pub idle_timeout: Duration,
}

impl DeploymentConfig {
    /// A configuration with the defaults of `mode`.
    ///
    /// Fails only if one of the mode's default URLs does not parse.
    pub fn new(
        service_address: impl Into<String>,
        mode: DeploymentMode,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            service_address: Some(service_address.into()),
            mode,
            network_url: parse_url(mode.default_network_url())?,
            identity_provider: parse_url(mode.default_identity_provider())?,
            root_key: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        })
    }

    /// Read the `SIGNER_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, keyed like the environment variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let idle_timeout_secs = lookup(ENV_IDLE_TIMEOUT_SECS)
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidIdleTimeout(raw))
            })
            .transpose()?;

        ConfigToml {
            service_address: lookup(ENV_SERVICE_ADDRESS),
            mode: lookup(ENV_DEPLOYMENT_MODE),
            network_url: lookup(ENV_NETWORK_URL),
            identity_provider: lookup(ENV_IDENTITY_PROVIDER),
            root_key: lookup(ENV_ROOT_KEY),
            idle_timeout_secs,
        }
        .resolve()
    }

    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let raw: ConfigToml = toml::from_str(s)?;
        raw.resolve()
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// The configured service address as a principal.
    ///
    /// Blank or missing addresses and anything that is not principal text are rejected.
    pub fn require_service_address(&self) -> Result<Principal, ConfigError> {
        let address = self
            .service_address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .ok_or(ConfigError::MissingServiceAddress)?;
        Principal::from_text(address).map_err(|source| ConfigError::InvalidServiceAddress {
            address: address.to_string(),
            source,
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidNetworkUrl {
        url: raw.to_string(),
        source,
    })
}

/// The on-disk shape of [`DeploymentConfig`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    service_address: Option<String>,
    mode: Option<String>,
    network_url: Option<String>,
    identity_provider: Option<String>,
    root_key: Option<String>,
    idle_timeout_secs: Option<u64>,
}

impl ConfigToml {
    fn resolve(self) -> Result<DeploymentConfig, ConfigError> {
        let mode: DeploymentMode = self
            .mode
            .as_deref()
            .map(|raw| raw.parse().unwrap_or_default())
            .unwrap_or_default();
        let network_url = parse_url(
            self.network_url
                .as_deref()
                .unwrap_or(mode.default_network_url()),
        )?;
        let identity_provider = parse_url(
            self.identity_provider
                .as_deref()
                .unwrap_or(mode.default_identity_provider()),
        )?;
        let root_key = self
            .root_key
            .as_deref()
            .map(|raw| hex::decode(raw.trim()))
            .transpose()
            .map_err(ConfigError::InvalidRootKey)?;
        let idle_timeout = match self.idle_timeout_secs {
            Some(0) => return Err(ConfigError::InvalidIdleTimeout("0".into())),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_IDLE_TIMEOUT,
        };

        Ok(DeploymentConfig {
            service_address: self.service_address,
            mode,
            network_url,
            identity_provider,
            root_key,
            idle_timeout,
        })
    }
}

/// Service ids per network, in the `canister_ids.json` layout:
/// `{ "signer": { "ic": "...", "local": "..." } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ServiceIds(BTreeMap<String, BTreeMap<String, String>>);

impl ServiceIds {
    /// Parse the JSON map.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read and parse a JSON file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// The id of service `name` on the network of `mode`.
    pub fn resolve(&self, name: &str, mode: DeploymentMode) -> Result<&str, ConfigError> {
        let network = mode.network_name();
        self.0
            .get(name)
            .and_then(|networks| networks.get(network))
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownService {
                name: name.to_string(),
                network: network.to_string(),
            })
    }
}
