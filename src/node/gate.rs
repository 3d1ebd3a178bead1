use std::collections::BTreeMap;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Origin-ordered admission of sequence-numbered hops.
///
/// Arriving hops register their sequence number; only the lowest pending
/// number may execute at any time, so a later-numbered hop that arrives
/// first waits in the buffer. Waiters block at the head of the line until
/// every earlier-numbered hop has arrived and released.
///
/// Sequence counters are per-origin, so two origins can hold the same
/// number at the same destination. Each number therefore carries a
/// registration count, and a release frees exactly one registration; the
/// number stays pending until every holder has released it.
pub struct SequenceGate {
    pending: Mutex<BTreeMap<u64, usize>>,
    wakeup: Notify,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(BTreeMap::new()),
            wakeup: Notify::new(),
        }
    }

    /// Adds one registration of a sequence number to the pending buffer.
    /// Registration is synchronous so arrival order is captured before any
    /// await point.
    pub fn register(&self, sequence_number: u64) {
        *self
            .pending
            .lock()
            .unwrap()
            .entry(sequence_number)
            .or_insert(0) += 1;
    }

    /// Waits until `sequence_number` is the lowest pending entry.
    pub async fn wait_turn(&self, sequence_number: u64) {
        loop {
            // Arm the wakeup before checking, so a release between the check
            // and the await is not lost.
            let notified = self.wakeup.notified();
            {
                let pending = self.pending.lock().unwrap();
                if pending.keys().next() == Some(&sequence_number) {
                    return;
                }
            }
            notified.await;
        }
    }

    /// Drops one registration of a completed entry and wakes the remaining
    /// waiters once the entry's count reaches zero.
    pub fn release(&self, sequence_number: u64) {
        let mut pending = self.pending.lock().unwrap();
        if let Some(count) = pending.get_mut(&sequence_number) {
            *count -= 1;
            if *count == 0 {
                pending.remove(&sequence_number);
            }
        }
        drop(pending);
        self.wakeup.notify_waiters();
    }

    /// Total outstanding registrations, counting duplicates.
    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().values().sum()
    }
}

impl Default for SequenceGate {
    fn default() -> Self {
        Self::new()
    }
}
