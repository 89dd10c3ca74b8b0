//! Bounded replay cache for OpenID response nonces.

use crate::constants::DEFAULT_NONCE_CAPACITY;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

/// A response nonce the cache has accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceRecord {
    /// Nonce value as received from the provider
    pub value: String,
    /// When the nonce was first observed
    pub observed_at: DateTime<Utc>,
}

/// Remembers previously accepted response nonces so a callback cannot be
/// replayed.
///
/// Entries are evicted strictly in insertion order once `capacity` is
/// exceeded. Presenting a nonce again never refreshes it, so a burst of new
/// logins can push out recently seen nonces before the full history depth is
/// reached.
pub struct NonceCache {
    inner: RwLock<NonceState>,
    capacity: usize,
}

#[derive(Default)]
struct NonceState {
    entries: HashMap<String, DateTime<Utc>>,
    // Oldest at the front, newest at the back
    order: VecDeque<String>,
}

impl NonceCache {
    /// Create a cache holding up to `DEFAULT_NONCE_CAPACITY` nonces
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_NONCE_CAPACITY)
    }

    /// Create a cache holding up to `capacity` nonces (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(NonceState::default()),
            capacity: capacity.max(1),
        }
    }

    /// Record `nonce` if it has not been seen.
    ///
    /// Returns `true` when the nonce was new and is now recorded, `false` when
    /// it is already present. Callers must treat `false` as a replay.
    pub fn add(&self, nonce: &str) -> bool {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if state.entries.contains_key(nonce) {
            return false;
        }

        state.entries.insert(nonce.to_string(), Utc::now());
        state.order.push_back(nonce.to_string());

        while state.entries.len() > self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
        }

        true
    }

    /// Whether `nonce` is currently remembered
    pub fn contains(&self, nonce: &str) -> bool {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.contains_key(nonce)
    }

    /// Number of remembered nonces
    pub fn len(&self) -> usize {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of remembered nonces
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Consistent copy of the cache contents, newest first
    pub fn snapshot(&self) -> Vec<NonceRecord> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state
            .order
            .iter()
            .rev()
            .filter_map(|value| {
                state.entries.get(value).map(|observed_at| NonceRecord {
                    value: value.clone(),
                    observed_at: *observed_at,
                })
            })
            .collect()
    }
}

impl Default for NonceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NonceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
