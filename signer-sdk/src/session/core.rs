use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use candid::Principal;
use ic_agent::Identity;
use signer_common::contract::{Capability, InterfaceContract};

use super::idle::{IdleCallback, IdleMonitor, SubscriptionId};
use crate::client::core::Client;
use crate::client::factory::{ClientFactory, ClientOptions};
use crate::cross_log;
use crate::errors::{AuthError, Result};
use crate::transport::binding::IdentityBinding;

/// Whatever completed the login: hands out the identity and, optionally, an
/// idle signal source.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Authenticator: Send + Sync {
    /// The identity of the user who just authenticated, if any.
    async fn identity(&self) -> Option<Arc<dyn Identity>>;

    /// Where idle signals come from. `None` disables idle invalidation.
    fn idle_monitor(&self) -> Option<Arc<dyn IdleMonitor>>;
}

/// Lifecycle of a [`SessionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No client has been built yet, or the session was torn down.
    Unauthenticated,
    /// A client is bound to this principal's identity.
    Authenticated(Principal),
    /// The idle signal fired; the client refuses to sign until the user authenticates again.
    Invalidated(Principal),
}

/// Ties the client's identity to the login lifecycle.
///
/// On every successful authentication it builds a fresh [`Client`] and
/// subscribes to the authenticator's idle signal. The first idle signal
/// invalidates the client's identity binding; later ones are no-ops. Calls
/// already in flight are not cancelled.
///
/// Dropping the manager, like [`teardown`](Self::teardown), removes the idle
/// subscription.
pub struct SessionManager<C> {
    factory: ClientFactory,
    contract: InterfaceContract<C>,
    options: ClientOptions,
    active: Option<ActiveSession<C>>,
    invalidations: Arc<AtomicUsize>,
}

struct ActiveSession<C> {
    client: Client<C>,
    principal: Principal,
    _subscription: Option<Subscription>,
}

#[derive(Debug)]
struct Subscription {
    monitor: Arc<dyn IdleMonitor>,
    id: SubscriptionId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.monitor.unsubscribe(self.id);
    }
}

impl<C: Capability> SessionManager<C> {
    /// A manager building `contract` clients with `factory`.
    pub fn new(factory: ClientFactory, contract: InterfaceContract<C>) -> Self {
        Self {
            factory,
            contract,
            options: ClientOptions::default(),
            active: None,
            invalidations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Options applied to every client built. Their identity is replaced by the authenticated one.
    #[must_use]
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Bind a new client to the identity `authenticator` provides.
    ///
    /// Without an identity this fails with [`AuthError::MissingIdentity`] and
    /// leaves the current state untouched. Otherwise any previous session is
    /// replaced, its idle subscription dropped.
    pub async fn on_authenticated(
        &mut self,
        authenticator: &dyn Authenticator,
    ) -> Result<&Client<C>> {
        let identity = authenticator
            .identity()
            .await
            .ok_or(AuthError::MissingIdentity)?;
        let options = self.options.clone().identity(identity);
        let client = self.factory.create(self.contract, options).await?;
        let principal = client.sender();

        self.teardown();

        let subscription = authenticator.idle_monitor().map(|monitor| {
            let callback = invalidate_on_idle(client.binding(), Arc::clone(&self.invalidations));
            let id = monitor.subscribe(callback);
            Subscription { monitor, id }
        });

        cross_log!(info, "session authenticated as {principal}");
        let session = self.active.insert(ActiveSession {
            client,
            principal,
            _subscription: subscription,
        });
        Ok(&session.client)
    }
}

impl<C> SessionManager<C> {
    /// The current client, also while it is invalidated.
    pub fn client(&self) -> Option<&Client<C>> {
        self.active.as_ref().map(|session| &session.client)
    }

    /// Where the session stands.
    pub fn state(&self) -> SessionState {
        match &self.active {
            None => SessionState::Unauthenticated,
            Some(session) if session.client.is_invalidated() => {
                SessionState::Invalidated(session.principal.clone())
            }
            Some(session) => SessionState::Authenticated(session.principal.clone()),
        }
    }

    /// How many identities idle signals have invalidated so far.
    pub fn invalidation_count(&self) -> usize {
        self.invalidations.load(Ordering::Acquire)
    }

    /// Drop the client and its idle subscription.
    pub fn teardown(&mut self) {
        if let Some(session) = self.active.take() {
            cross_log!(debug, "tearing down session of {}", session.principal);
        }
    }
}

fn invalidate_on_idle(binding: Arc<IdentityBinding>, count: Arc<AtomicUsize>) -> IdleCallback {
    Arc::new(move || {
        if binding.invalidate() {
            count.fetch_add(1, Ordering::AcqRel);
            cross_log!(info, "idle timeout reached, invalidated identity {:?}", binding.sender());
        }
    })
}

impl<C: Capability> fmt::Debug for SessionManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("contract", &self.contract)
            .field("state", &self.state())
            .field("invalidations", &self.invalidation_count())
            .finish_non_exhaustive()
    }
}
