//! src/peer/rematch.rs
//!
//! The rematch answer slot (spec §5/§9): "a condition variable on a nullable
//! boolean... re-expressed as a single-shot promise/future whose value is
//! set at most once per session and cleared on endGame/startRematch."
//!
//! Writers (`set`) publish the local user's yes/no answer and wake every
//! waiter; readers (`wait`, used by the inbound `getRematchDecision`
//! handler) block until a decision is published, re-checking on every wake
//! to tolerate spurious notifications.

use tokio::sync::Notify;

#[derive(Default)]
pub struct RematchSlot {
    value: std::sync::Mutex<Option<bool>>,
    notify: Notify,
}

impl RematchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the decision and wakes any pending `wait`.
    pub fn set(&self, decision: bool) {
        *self.value.lock().unwrap() = Some(decision);
        self.notify.notify_waiters();
    }

    /// Clears the slot: called by `startRematch` and `endGame` (spec
    /// §4.4.3/§4.4.4) so a stale decision from the previous session can
    /// never leak into the next one.
    pub fn clear(&self) {
        *self.value.lock().unwrap() = None;
    }

    /// Blocks until a decision has been published, returning it. Registers
    /// interest in the notification before checking the value, so a `set`
    /// that lands between the check and the await is never missed.
    pub async fn wait(&self) -> bool {
        loop {
            let notified = self.notify.notified();
            if let Some(v) = *self.value.lock().unwrap() {
                return v;
            }
            notified.await;
        }
    }
}
