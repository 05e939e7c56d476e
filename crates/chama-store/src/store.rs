use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{trace, warn};

use chama_api::{SessionHooks, TokenStore};

use crate::tracker::{Resource, Ticket};
use crate::{Action, AppState};

/// Shared state container; all mutation goes through [`Store::dispatch`]
#[derive(Clone)]
pub struct Store {
    state: Arc<RwLock<AppState>>,

    /// Next request sequence number
    next_seq: Arc<AtomicU64>,
}

impl Store {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn dispatch(&self, action: Action) {
        trace!(action = action.name(), "dispatch");
        self.state.write().reduce(action);
    }

    /// Read derived data without holding the lock past the closure
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.read())
    }

    /// Clone of the whole state
    pub fn snapshot(&self) -> AppState {
        self.state.read().clone()
    }

    /// Reserve the next request sequence number
    pub fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Issue a ticket for a new request on `resource`
    pub fn ticket(&self, resource: Resource) -> Ticket {
        Ticket {
            resource,
            seq: self.next_seq(),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

/// Session hooks that act on the store: logout on 401, alert on transport failure
pub struct StoreHooks {
    store: Store,
    tokens: TokenStore,
}

impl StoreHooks {
    pub fn new(store: Store, tokens: TokenStore) -> Self {
        Self { store, tokens }
    }
}

impl SessionHooks for StoreHooks {
    fn on_unauthorized(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "failed to clear stored session");
        }
        self.store.dispatch(Action::Logout);
    }

    fn on_transport_failure(&self, message: &str) {
        self.store.dispatch(Action::ShowAlert(message.to_string()));
    }
}
