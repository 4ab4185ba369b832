use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use candid::Principal;
use ic_agent::agent::EnvelopeContent;
use ic_agent::identity::{AnonymousIdentity, Delegation, SignedDelegation};
use ic_agent::{Identity, Signature};

use crate::errors::AuthError;

/// Signing error reported once a binding has been invalidated.
pub(crate) const INVALIDATED: &str = "identity binding invalidated";

/// The identity a transport signs with, and whether it may still be used.
///
/// Invalidation is one-way: the identity itself is kept, but the binding
/// refuses to sign again. The agent holds the binding as its identity, so
/// every envelope goes through [`Identity::sign`] below.
pub(crate) struct IdentityBinding {
    identity: Arc<dyn Identity>,
    sender: Principal,
    invalidated: AtomicBool,
}

impl IdentityBinding {
    pub(crate) fn new(identity: Arc<dyn Identity>) -> Result<Self, AuthError> {
        let sender = identity.sender().map_err(AuthError::Identity)?;
        Ok(Self {
            identity,
            sender,
            invalidated: AtomicBool::new(false),
        })
    }

    pub(crate) fn anonymous() -> Self {
        Self {
            identity: Arc::new(AnonymousIdentity),
            sender: Principal::anonymous(),
            invalidated: AtomicBool::new(false),
        }
    }

    pub(crate) fn principal(&self) -> Principal {
        self.sender
    }

    pub(crate) fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::Acquire)
    }

    /// Mark the binding unusable. Returns `true` only for the call that flipped it.
    pub(crate) fn invalidate(&self) -> bool {
        !self.invalidated.swap(true, Ordering::AcqRel)
    }

    fn check(&self) -> Result<(), String> {
        if self.is_invalidated() {
            Err(INVALIDATED.to_string())
        } else {
            Ok(())
        }
    }
}

impl Identity for IdentityBinding {
    fn sender(&self) -> Result<Principal, String> {
        Ok(self.sender)
    }

    fn public_key(&self) -> Option<Vec<u8>> {
        self.identity.public_key()
    }

    fn sign(&self, content: &EnvelopeContent) -> Result<Signature, String> {
        self.check()?;
        self.identity.sign(content)
    }

    fn sign_delegation(&self, content: &Delegation) -> Result<Signature, String> {
        self.check()?;
        self.identity.sign_delegation(content)
    }

    fn sign_arbitrary(&self, content: &[u8]) -> Result<Signature, String> {
        self.check()?;
        self.identity.sign_arbitrary(content)
    }

    fn delegation_chain(&self) -> Vec<SignedDelegation> {
        self.identity.delegation_chain()
    }
}

impl fmt::Debug for IdentityBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityBinding")
            .field("sender", &self.sender.to_text())
            .field("invalidated", &self.is_invalidated())
            .finish_non_exhaustive()
    }
}
