//! Receiver guard
//!
//! Embedding a [`Receiver`] in an object and connecting slots through
//! [`Signal::connect_to`](crate::Signal::connect_to) ties those links to the
//! object's lifetime: when it drops, every incoming connection is severed and
//! the emitters stop attempting delivery. Free-function and plain closure
//! slots have no receiver and are only revoked explicitly or by their
//! emitter's destruction.

use std::cell::RefCell;

use smallvec::SmallVec;
use tracing::trace;

use crate::connection::Connection;

/// Owns the incoming half of an object's connections and severs them all on
/// drop.
///
/// The emitter-side counterpart needs no bookkeeping here: connections are
/// weak links into the emitter's slot storage, so an emitter dropped first
/// leaves this receiver holding already-dead entries, which are pruned on
/// the next attachment and excluded from [`connection_count`].
///
/// [`connection_count`]: Receiver::connection_count
#[derive(Default)]
pub struct Receiver {
    incoming: RefCell<SmallVec<[Connection; 2]>>,
}

impl Receiver {
    /// Creates a receiver with no incoming connections.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&self, conn: Connection) {
        let mut incoming = self.incoming.borrow_mut();
        incoming.retain(|c| c.is_connected());
        incoming.push(conn);
    }

    /// Number of incoming connections that are still live.
    pub fn connection_count(&self) -> usize {
        self.incoming
            .borrow()
            .iter()
            .filter(|c| c.is_connected())
            .count()
    }

    /// Severs every incoming connection now instead of at drop time.
    pub fn disconnect_all(&self) {
        let incoming = std::mem::take(&mut *self.incoming.borrow_mut());
        for conn in incoming {
            conn.disconnect();
        }
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        trace!("receiver dropped; severing incoming connections");
        self.disconnect_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Signal;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_receiver_drop_severs_incoming() {
        let signal: Signal<()> = Signal::new();
        let count = Rc::new(Cell::new(0));

        let receiver = Receiver::new();
        let seen = count.clone();
        signal.connect_to(&receiver, move |_| seen.set(seen.get() + 1));

        signal.emit(&()).unwrap();
        assert_eq!(count.get(), 1);

        drop(receiver);
        assert_eq!(signal.connection_count(), 0);

        signal.emit(&()).unwrap();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_emitter_dropped_before_receiver() {
        let receiver = Receiver::new();
        {
            let signal: Signal<u32> = Signal::new();
            signal.connect_to(&receiver, |_| {});
            assert_eq!(receiver.connection_count(), 1);
        }

        // Emitter gone first: the incoming link reports dead and dropping
        // the receiver afterwards must not touch freed storage.
        assert_eq!(receiver.connection_count(), 0);
        drop(receiver);
    }

    #[test]
    fn test_receiver_dropped_before_emitter() {
        let signal: Signal<u32> = Signal::new();
        {
            let receiver = Receiver::new();
            signal.connect_to(&receiver, |_| {});
            assert_eq!(signal.connection_count(), 1);
        }

        assert_eq!(signal.connection_count(), 0);
        signal.emit(&3).unwrap();
    }

    #[test]
    fn test_disconnect_all() {
        let signal: Signal<()> = Signal::new();
        let receiver = Receiver::new();

        signal.connect_to(&receiver, |_| {});
        signal.connect_to(&receiver, |_| {});
        assert_eq!(receiver.connection_count(), 2);

        receiver.disconnect_all();
        assert_eq!(receiver.connection_count(), 0);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_explicit_disconnect_updates_count() {
        let signal: Signal<()> = Signal::new();
        let receiver = Receiver::new();

        let conn = signal.connect_to(&receiver, |_| {});
        signal.connect_to(&receiver, |_| {});

        conn.disconnect();
        assert_eq!(receiver.connection_count(), 1);
        assert_eq!(signal.connection_count(), 1);
    }

    #[test]
    fn test_mixed_slots_survive_receiver_drop() {
        let signal: Signal<()> = Signal::new();
        let free_calls = Rc::new(Cell::new(0));

        let receiver = Receiver::new();
        signal.connect_to(&receiver, |_| {});
        let seen = free_calls.clone();
        signal.connect(move |_| seen.set(seen.get() + 1));

        drop(receiver);
        signal.emit(&()).unwrap();

        // The receiver-less slot is unaffected by the receiver's death.
        assert_eq!(free_calls.get(), 1);
    }
}
