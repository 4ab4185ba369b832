//! Idle detection.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use web_time::Instant;

use crate::config::{DEFAULT_IDLE_TIMEOUT, DeploymentConfig};

/// Callback run when the user goes idle.
pub type IdleCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`IdleMonitor::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wrap a monitor-assigned id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A source of idle signals.
pub trait IdleMonitor: Send + Sync + fmt::Debug {
    /// Run `callback` on every idle signal until unsubscribed.
    fn subscribe(&self, callback: IdleCallback) -> SubscriptionId;

    /// Stop delivering signals to the subscription `id`. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// Inactivity timer implementing [`IdleMonitor`].
///
/// Activity is reported with [`record_activity`](Self::record_activity) and the
/// timer is checked with [`poll`](Self::poll), typically from the host's event
/// loop. Callbacks fire once when the timeout elapses, then not again until
/// activity resumes.
pub struct IdleManager {
    timeout: Duration,
    next_id: AtomicU64,
    state: Mutex<IdleState>,
}

struct IdleState {
    last_activity: Instant,
    idle: bool,
    subscribers: Vec<(SubscriptionId, IdleCallback)>,
}

impl IdleManager {
    /// A timer that fires after `timeout` without activity.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            next_id: AtomicU64::new(0),
            state: Mutex::new(IdleState {
                last_activity: Instant::now(),
                idle: false,
                subscribers: Vec::new(),
            }),
        }
    }

    /// A timer using the configured idle timeout.
    pub fn from_config(config: &DeploymentConfig) -> Self {
        Self::new(config.idle_timeout)
    }

    /// The idle timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Note user activity, ending any idle period.
    pub fn record_activity(&self) {
        let mut state = self.lock();
        state.last_activity = Instant::now();
        state.idle = false;
    }

    /// Whether the current idle period has already been signalled.
    pub fn is_idle(&self) -> bool {
        self.lock().idle
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Fire if `now` is at least one timeout past the last activity.
    ///
    /// Returns `true` when this call signalled idleness.
    pub fn poll(&self, now: Instant) -> bool {
        let callbacks = {
            let mut state = self.lock();
            if state.idle || now.saturating_duration_since(state.last_activity) < self.timeout {
                return false;
            }
            state.idle = true;
            Self::snapshot(&state)
        };
        callbacks.iter().for_each(|callback| callback());
        true
    }

    /// Signal idleness now, regardless of the timer.
    ///
    /// Does nothing when the current idle period was already signalled.
    pub fn trigger_idle(&self) -> bool {
        let callbacks = {
            let mut state = self.lock();
            if state.idle {
                return false;
            }
            state.idle = true;
            Self::snapshot(&state)
        };
        callbacks.iter().for_each(|callback| callback());
        true
    }

    // Callbacks run outside the lock so they may unsubscribe.
    fn snapshot(state: &IdleState) -> Vec<IdleCallback> {
        state
            .subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, IdleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for IdleManager {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}

impl IdleMonitor for IdleManager {
    fn subscribe(&self, callback: IdleCallback) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().subscribers.push((id, callback));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().subscribers.retain(|(existing, _)| *existing != id);
    }
}

impl fmt::Debug for IdleManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("IdleManager")
            .field("timeout", &self.timeout)
            .field("idle", &state.idle)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}
