use super::file::{FileStorage, StoreState};
use crate::error::Result;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};
use tracing::warn;

/// Process-wide ticket state with write-through persistence
///
/// Every mutation is applied to a copy of the state, saved, and only then
/// committed in memory. A failed save leaves both the file and the in-memory
/// state untouched.
#[derive(Debug)]
pub struct TicketStore {
    storage: FileStorage,
    state: RwLock<StoreState>,
}

impl TicketStore {
    /// Open the store, loading whatever state the file holds
    ///
    /// Tickets that were never bound to a channel (the process stopped while
    /// provisioning) are dropped; the ticket counter is kept.
    pub fn open(storage: FileStorage) -> Self {
        let mut state = storage.load_state();
        let before = state.tickets.len();
        state.tickets.retain(|_, ticket| ticket.channel_id.is_some());
        let dropped = before - state.tickets.len();
        if dropped > 0 {
            warn!(dropped, "discarded tickets without a channel");
        }

        Self {
            storage,
            state: RwLock::new(state),
        }
    }

    /// Storage backend of this store
    #[must_use]
    pub const fn storage(&self) -> &FileStorage {
        &self.storage
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a mutation and persist it before committing
    pub(super) fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> Result<T>) -> Result<T> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.clone();
        let out = f(&mut next)?;
        if next != *guard {
            self.storage.save_state(&next)?;
            *guard = next;
        }
        Ok(out)
    }
}
