use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::ApiResult;

/// FetchScope
///
/// Ties fetches to the lifetime of the component that issued them. Each fetch takes a
/// ticket; a ticket stays current until a newer fetch starts or the component is torn
/// down. Responses carried by a stale ticket are dropped instead of applied.
#[derive(Clone, Default)]
pub struct FetchScope {
    generation: Arc<AtomicU64>,
    torn_down: Arc<AtomicBool>,
}

/// FetchTicket
///
/// Issued by `FetchScope::begin`; checked before a response is applied.
pub struct FetchTicket {
    issued: u64,
    scope: FetchScope,
}

impl FetchScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> FetchTicket {
        let issued = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        FetchTicket {
            issued,
            scope: self.clone(),
        }
    }

    /// teardown
    ///
    /// The component is gone. Every outstanding ticket becomes stale and no new one
    /// will ever be current.
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        !self.torn_down.load(Ordering::SeqCst)
    }
}

impl FetchTicket {
    pub fn is_current(&self) -> bool {
        self.scope.is_active() && self.scope.generation.load(Ordering::SeqCst) == self.issued
    }
}

/// LoadState
///
/// The fetch lifecycle of a list component. A failure resets the list to empty rather
/// than keeping the previous items.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Failed(String),
    Ready(Vec<T>),
}

impl<T> LoadState<T> {
    pub fn items(&self) -> &[T] {
        match self {
            LoadState::Ready(items) => items,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Mutation
///
/// Outcome of an optimistic change. `Pending` while the call is in flight; `Applied`
/// once the server accepted it; `RolledBack` when it failed and the prior list was
/// restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Pending,
    Applied,
    RolledBack(String),
}

/// ListResource
///
/// Component-local state for a fetched list: the load state, the fetch scope and the
/// last optimistic mutation. Cloning shares the state, so a clone handed to a spawned
/// task updates the same component.
pub struct ListResource<T> {
    state: Arc<Mutex<LoadState<T>>>,
    mutation: Arc<Mutex<Option<Mutation>>>,
    scope: FetchScope,
}

impl<T> Clone for ListResource<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            mutation: Arc::clone(&self.mutation),
            scope: self.scope.clone(),
        }
    }
}

impl<T: Clone> Default for ListResource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ListResource<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(LoadState::Loading)),
            mutation: Arc::new(Mutex::new(None)),
            scope: FetchScope::new(),
        }
    }

    pub fn state(&self) -> LoadState<T> {
        self.state.lock().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.state.lock().items().to_vec()
    }

    pub fn last_mutation(&self) -> Option<Mutation> {
        self.mutation.lock().clone()
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }

    pub fn is_active(&self) -> bool {
        self.scope.is_active()
    }

    /// load
    ///
    /// Runs one fetch and applies its result if the ticket is still current. Returns
    /// the state after the attempt (unchanged when the response was discarded).
    pub async fn load<Fut>(&self, fetch: Fut, default_error: &str) -> LoadState<T>
    where
        Fut: Future<Output = ApiResult<Vec<T>>>,
    {
        let ticket = self.scope.begin();
        *self.state.lock() = LoadState::Loading;

        let result = fetch.await;

        if !ticket.is_current() {
            tracing::debug!("Discarding stale fetch response");
            return self.state();
        }

        let next = match result {
            Ok(items) => LoadState::Ready(items),
            Err(e) => {
                tracing::warn!("Fetch failed: {}", e);
                LoadState::Failed(e.user_message(default_error))
            }
        };
        *self.state.lock() = next.clone();
        next
    }

    /// mutate_optimistic
    ///
    /// Applies `patch` to the local list immediately, then runs `call`. On failure the
    /// list captured before the patch is restored. The result is also kept as
    /// `last_mutation`.
    pub async fn mutate_optimistic<P, Fut>(
        &self,
        patch: P,
        call: Fut,
        default_error: &str,
    ) -> Mutation
    where
        P: FnOnce(&mut Vec<T>),
        Fut: Future<Output = ApiResult<()>>,
    {
        let prior = {
            let mut state = self.state.lock();
            let prior = state.clone();
            if let LoadState::Ready(items) = &mut *state {
                patch(items);
            }
            prior
        };
        *self.mutation.lock() = Some(Mutation::Pending);

        let outcome = match call.await {
            Ok(()) => Mutation::Applied,
            Err(e) => {
                tracing::warn!("Mutation failed, restoring prior state: {}", e);
                if self.scope.is_active() {
                    *self.state.lock() = prior;
                }
                Mutation::RolledBack(e.user_message(default_error))
            }
        };
        *self.mutation.lock() = Some(outcome.clone());
        outcome
    }
}
