//! Connection handles
//!
//! A [`Connection`] represents one established link between a signal and a
//! slot. It owns no slot data itself; it can sever the link and report
//! whether the link is still active. Handles are cheap to clone and safe to
//! query after either endpoint is gone.

use std::cell::RefCell;
use std::rc::Weak;

use slotmap::new_key_type;
use tracing::trace;

new_key_type! {
    /// Generational key identifying one slot entry within a signal.
    ///
    /// Keys are never reused for a logically different connection: severing
    /// a link and connecting the same closure again yields a fresh key, so a
    /// stale handle can never resurrect or observe the new link.
    pub struct ConnectionKey;
}

/// Type-erased view of a signal's slot storage.
///
/// Lets the non-generic [`Connection`] sever and inspect entries inside a
/// `Signal<T>` without knowing the payload type.
pub(crate) trait ErasedSlots {
    /// Removes the entry, returning whether it was still present.
    fn sever(&mut self, key: ConnectionKey) -> bool;

    /// Whether the entry is still registered.
    fn contains(&self, key: ConnectionKey) -> bool;
}

/// A revocable link between one signal and one slot.
///
/// The handle holds only a weak reference to the signal's slot storage:
/// dropping the emitter degrades every outstanding handle to the
/// disconnected state rather than leaving it dangling. Dropping the handle
/// itself does *not* sever the link -- the link lives until it is explicitly
/// disconnected or either endpoint is destroyed.
#[derive(Clone, Debug)]
pub struct Connection {
    slots: Weak<RefCell<dyn ErasedSlots>>,
    key: ConnectionKey,
}

impl Connection {
    pub(crate) fn new(slots: Weak<RefCell<dyn ErasedSlots>>, key: ConnectionKey) -> Self {
        Self { slots, key }
    }

    /// Whether the link is still active.
    ///
    /// Returns `false` once the link has been severed or the emitter has
    /// been dropped. A connection never returns to the connected state.
    pub fn is_connected(&self) -> bool {
        match self.slots.upgrade() {
            Some(slots) => slots.borrow().contains(self.key),
            None => false,
        }
    }

    /// Severs the link.
    ///
    /// Idempotent: disconnecting an already-disconnected connection (or one
    /// whose emitter is gone) is a no-op.
    pub fn disconnect(&self) {
        if let Some(slots) = self.slots.upgrade() {
            if slots.borrow_mut().sever(self.key) {
                trace!(key = ?self.key, "connection severed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::signal::Signal;

    #[test]
    fn test_clone_shares_link() {
        let signal: Signal<()> = Signal::new();
        let conn = signal.connect(|_| {});
        let alias = conn.clone();

        alias.disconnect();
        assert!(!conn.is_connected());
        assert!(!alias.is_connected());
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_handle_outlives_signal() {
        let conn = {
            let signal: Signal<u32> = Signal::new();
            signal.connect(|_| {})
        };

        // The emitter is gone; querying the dead handle stays safe.
        assert!(!conn.is_connected());
        conn.disconnect();
        conn.disconnect();
        assert!(!conn.is_connected());
    }
}
