//! Common imports for quick starts.

// Common
pub use crate::{Error, Identity, Principal, Result};

// Configuration
pub use crate::{DeploymentConfig, DeploymentMode};

// Client construction
pub use crate::{Client, ClientFactory, ClientOptions, DispatchOptions};

// Contracts and dynamic values
pub use crate::{IDLArgs, IDLValue};
pub use crate::{DEPLOYED_CONTRACT, KEY_ISSUANCE_CONTRACT, SIGNING_CONTRACT};

// Sessions and idle invalidation
pub use crate::{Authenticator, IdleManager, IdleMonitor, SessionManager, SessionState};
