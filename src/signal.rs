//! Typed signals and snapshot-based emission
//!
//! A [`Signal<T>`] is the emitter-owned endpoint of the interconnect: the
//! declaring type holds it as a (typically private) field, hands out
//! connect-only [`SignalHandle`]s, and triggers delivery itself via
//! [`Signal::emit`]. Because each declared signal is a distinct typed field,
//! signal identity is checked by the compiler -- there are no string or
//! integer tags to mismatch.
//!
//! Emission snapshots the connection list before invoking anything, so slot
//! bodies may freely connect and disconnect (including on the signal
//! currently being emitted):
//!
//! - a slot disconnected after the snapshot is skipped;
//! - a slot connected during the pass is delivered starting with the *next*
//!   emission;
//! - severing and re-establishing a link during the pass counts as a new
//!   connection (generational keys), so it is also deferred to the next
//!   emission.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use slotmap::SlotMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::connection::{Connection, ConnectionKey, ErasedSlots};
use crate::error::{EmitError, SlotResult};
use crate::receiver::Receiver;

/// Stored slot callable. `Fn` rather than `FnMut` keeps recursive emission
/// safe; stateful slots capture `Rc<Cell>` / `Rc<RefCell>` state.
type SlotFn<T> = dyn Fn(&T) -> SlotResult;

/// Slot storage for one signal: a generational arena of callables plus the
/// insertion-order list that defines emission order.
pub(crate) struct SlotList<T> {
    slots: SlotMap<ConnectionKey, Rc<SlotFn<T>>>,
    order: SmallVec<[ConnectionKey; 4]>,
}

impl<T> SlotList<T> {
    fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: SmallVec::new(),
        }
    }

    fn insert(&mut self, slot: Rc<SlotFn<T>>) -> ConnectionKey {
        let key = self.slots.insert(slot);
        self.order.push(key);
        key
    }
}

impl<T: 'static> ErasedSlots for SlotList<T> {
    fn sever(&mut self, key: ConnectionKey) -> bool {
        if self.slots.remove(key).is_some() {
            self.order.retain(|k| *k != key);
            true
        } else {
            false
        }
    }

    fn contains(&self, key: ConnectionKey) -> bool {
        self.slots.contains_key(key)
    }
}

pub(crate) type SharedSlots<T> = Rc<RefCell<SlotList<T>>>;

fn connect_slot<T: 'static>(inner: &SharedSlots<T>, slot: Rc<SlotFn<T>>) -> Connection {
    let key = inner.borrow_mut().insert(slot);
    trace!(key = ?key, "slot connected");
    // Bind first so the weak downgrades at the concrete type, then unsize.
    let weak = Rc::downgrade(inner);
    let erased: Weak<RefCell<dyn ErasedSlots>> = weak;
    Connection::new(erased, key)
}

/// Invokes every slot that was connected when the snapshot was taken and is
/// still connected when its turn comes. No borrow of the slot storage is
/// held across a slot invocation, so slot bodies may mutate the connection
/// set at will.
pub(crate) fn deliver<T>(inner: &SharedSlots<T>, args: &T) -> Result<(), EmitError> {
    let snapshot: SmallVec<[ConnectionKey; 4]> = inner.borrow().order.clone();
    if snapshot.is_empty() {
        return Ok(());
    }
    trace!(slots = snapshot.len(), "emitting");
    for key in snapshot {
        let slot = inner.borrow().slots.get(key).cloned();
        let Some(slot) = slot else {
            // Disconnected mid-pass.
            continue;
        };
        (*slot)(args).map_err(EmitError)?;
    }
    Ok(())
}

/// A named, typed event endpoint owned by its declaring emitter.
///
/// Keep the field private and expose [`Signal::handle`] so that outside code
/// can connect but never trigger emission:
///
/// ```
/// use interlink::{Signal, SignalHandle};
///
/// struct Download {
///     progress: Signal<u8>,
/// }
///
/// impl Download {
///     fn progress(&self) -> SignalHandle<u8> {
///         self.progress.handle()
///     }
///
///     fn poll(&self) {
///         // Only the emitter itself can reach `emit`.
///         self.progress.emit(&42).expect("no failing slots connected");
///     }
/// }
/// # let d = Download { progress: Signal::new() };
/// # let seen = std::rc::Rc::new(std::cell::Cell::new(0u8));
/// # let sink = seen.clone();
/// # d.progress().connect(move |pct| sink.set(*pct));
/// # d.poll();
/// # assert_eq!(seen.get(), 42);
/// ```
///
/// Dropping the signal (i.e. its emitter) invalidates every outstanding
/// [`Connection`] and [`SignalHandle`].
pub struct Signal<T> {
    inner: SharedSlots<T>,
}

impl<T: 'static> Signal<T> {
    /// Creates a signal with no connections.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SlotList::new())),
        }
    }

    /// Connects a slot. Slots are invoked in connection order.
    pub fn connect<F>(&self, slot: F) -> Connection
    where
        F: Fn(&T) + 'static,
    {
        self.connect_fallible(move |args| {
            slot(args);
            Ok(())
        })
    }

    /// Connects a slot that may fail. A returned error aborts the emission
    /// pass and propagates to the emission caller.
    pub fn connect_fallible<F>(&self, slot: F) -> Connection
    where
        F: Fn(&T) -> SlotResult + 'static,
    {
        connect_slot(&self.inner, Rc::new(slot))
    }

    /// Connects a slot on behalf of `receiver`: the link is severed when the
    /// receiver is dropped, in addition to the usual revocation paths.
    pub fn connect_to<F>(&self, receiver: &Receiver, slot: F) -> Connection
    where
        F: Fn(&T) + 'static,
    {
        let conn = self.connect(slot);
        receiver.attach(conn.clone());
        conn
    }

    /// Fallible twin of [`Signal::connect_to`].
    pub fn connect_to_fallible<F>(&self, receiver: &Receiver, slot: F) -> Connection
    where
        F: Fn(&T) -> SlotResult + 'static,
    {
        let conn = self.connect_fallible(slot);
        receiver.attach(conn.clone());
        conn
    }

    /// Synchronously invokes every currently-connected slot with `args`, in
    /// connection order. Fire-and-forget: slot return values are discarded.
    ///
    /// Delivery is fail-fast: the first slot error aborts the pass and is
    /// returned as [`EmitError`]. The connection set stays structurally
    /// consistent either way.
    pub fn emit(&self, args: &T) -> Result<(), EmitError> {
        deliver(&self.inner, args)
    }

    /// Returns a connect-only view of this signal.
    pub fn handle(&self) -> SignalHandle<T> {
        SignalHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Number of currently-connected slots.
    pub fn connection_count(&self) -> usize {
        self.inner.borrow().slots.len()
    }

    pub(crate) fn shared(&self) -> SharedSlots<T> {
        Rc::clone(&self.inner)
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Connect-only view of a [`Signal`] -- the signal's public identity.
///
/// Handles are weak: once the owning signal is dropped, [`connect`] yields
/// an already-disconnected [`Connection`] instead of re-arming anything.
///
/// [`connect`]: SignalHandle::connect
pub struct SignalHandle<T> {
    inner: Weak<RefCell<SlotList<T>>>,
}

impl<T> Clone for SignalHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> SignalHandle<T> {
    /// Connects a slot, like [`Signal::connect`].
    pub fn connect<F>(&self, slot: F) -> Connection
    where
        F: Fn(&T) + 'static,
    {
        self.connect_fallible(move |args| {
            slot(args);
            Ok(())
        })
    }

    /// Connects a fallible slot, like [`Signal::connect_fallible`].
    pub fn connect_fallible<F>(&self, slot: F) -> Connection
    where
        F: Fn(&T) -> SlotResult + 'static,
    {
        match self.inner.upgrade() {
            Some(inner) => connect_slot(&inner, Rc::new(slot)),
            None => {
                debug!("connect on a dropped signal; returning a dead connection");
                let erased: Weak<RefCell<dyn ErasedSlots>> = self.inner.clone();
                Connection::new(erased, ConnectionKey::default())
            }
        }
    }

    /// Connects a slot on behalf of `receiver`, like [`Signal::connect_to`].
    pub fn connect_to<F>(&self, receiver: &Receiver, slot: F) -> Connection
    where
        F: Fn(&T) + 'static,
    {
        let conn = self.connect(slot);
        receiver.attach(conn.clone());
        conn
    }

    /// Fallible twin of [`SignalHandle::connect_to`].
    pub fn connect_to_fallible<F>(&self, receiver: &Receiver, slot: F) -> Connection
    where
        F: Fn(&T) -> SlotResult + 'static,
    {
        let conn = self.connect_fallible(slot);
        receiver.attach(conn.clone());
        conn
    }

    /// Whether the owning signal still exists.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}
