use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::store::SnapshotKey;

type Slots = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Per-key render guard: at most one render per `(application, key)` at a time.
///
/// Lazily creates one async mutex per key and drops it again once nobody
/// holds or awaits it: on guard drop, or on the next `acquire` when the last
/// waiter was cancelled instead.
#[derive(Clone, Default)]
pub struct InFlightRenders {
    slots: Slots,
}

/// Held for the duration of one render. Releases the key on drop.
pub struct InFlightGuard {
    slot_id: String,
    slots: Slots,
    guard: Option<OwnedMutexGuard<()>>,
    waited: bool,
}

impl InFlightRenders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the render slot for a key, waiting while another request holds it.
    pub async fn acquire(&self, application: &str, key: &SnapshotKey) -> InFlightGuard {
        let slot_id = format!("{}/{}", application, key);
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // A waiter cancelled mid-wait leaves its slot behind with no other owner.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots
                .entry(slot_id.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let (guard, waited) = match slot.clone().try_lock_owned() {
            Ok(guard) => (guard, false),
            Err(_) => (slot.lock_owned().await, true),
        };

        InFlightGuard {
            slot_id,
            slots: self.slots.clone(),
            guard: Some(guard),
            waited,
        }
    }

    /// Number of keys currently being rendered or awaited.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InFlightGuard {
    /// Whether another render of the same key finished while this one waited.
    pub fn waited(&self) -> bool {
        self.waited
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // Only the table's own reference left: nobody holds or awaits the slot.
        if slots
            .get(&self.slot_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.slot_id);
        }
    }
}
