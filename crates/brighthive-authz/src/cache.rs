//! Decision memoization.

use std::{
    num::NonZeroUsize,
    sync::{Arc, OnceLock},
};

use brighthive_common::{claims::Fingerprint, decision::Decision, permission::Permission};
use fnv::FnvBuildHasher;
use lru::LruCache;
use parking_lot::Mutex;
use tracing::trace;

/// The cache key of a resource authorization decision.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct DecisionKey {
    /// Fingerprint of the claim set the decision was made for.
    pub fingerprint: Fingerprint,

    /// The data resource.
    pub resource_id: String,

    /// The requested permission.
    pub permission: Permission,
}

struct Slot {
    expires_at: i64,
    decision: Arc<OnceLock<Decision>>,
}

/// A bounded, least-recently-used cache of authorization decisions.
///
/// Concurrent lookups of the same cached key share one computation. The lock is only held while
/// finding or inserting the slot of a key, never while computing.
pub struct DecisionCache {
    slots: Mutex<LruCache<DecisionKey, Slot, FnvBuildHasher>>,
}

impl DecisionCache {
    /// A cache holding at most `capacity` decisions.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            slots: Mutex::new(LruCache::with_hasher(capacity, FnvBuildHasher::default())),
        }
    }

    /// Return the cached decision for `key`, or compute and cache it.
    ///
    /// `expires_at` is the expiry of the token the decision belongs to. No decision is served
    /// from the cache at or after that instant.
    ///
    /// Concurrent callers compute at most once per key while the key stays cached. If the
    /// key is evicted while its decision is still being computed, the next caller inserts a
    /// fresh slot and computes again. This only happens under eviction pressure.
    pub fn get_or_compute(
        &self,
        key: DecisionKey,
        expires_at: i64,
        now: i64,
        compute: impl FnOnce() -> Decision,
    ) -> Decision {
        if now >= expires_at {
            self.slots.lock().pop(&key);
            return compute();
        }

        let decision = {
            let mut slots = self.slots.lock();

            let cached = slots
                .get(&key)
                .filter(|slot| now < slot.expires_at)
                .map(|slot| slot.decision.clone());

            match cached {
                Some(decision) => {
                    trace!(
                        fingerprint = %key.fingerprint,
                        resource_id = %key.resource_id,
                        "decision cache hit"
                    );
                    decision
                }
                None => {
                    trace!(
                        fingerprint = %key.fingerprint,
                        resource_id = %key.resource_id,
                        "decision cache miss"
                    );
                    let decision = Arc::new(OnceLock::new());
                    slots.put(
                        key,
                        Slot {
                            expires_at,
                            decision: decision.clone(),
                        },
                    );
                    decision
                }
            }
        };

        *decision.get_or_init(compute)
    }

    /// Drop every cached decision.
    pub fn invalidate_all(&self) {
        self.slots.lock().clear();
    }

    /// The number of cached decisions.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// The maximum number of cached decisions.
    pub fn capacity(&self) -> NonZeroUsize {
        self.slots.lock().cap()
    }
}
