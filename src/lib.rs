//! Interlink Runtime
//!
//! An in-process, single-threaded event-notification runtime:
//!
//! - **Signals**: typed events declared as fields of their emitter, so
//!   identity and argument types are checked at compile time
//! - **Connections**: individually revocable links, automatically
//!   invalidated when either endpoint is destroyed
//! - **Receivers**: drop guards that sever an object's incoming
//!   connections with its lifetime
//! - **State machines**: compile-time-bounded transition tables driving
//!   per-state `entered`/`exited` and per-edge `stepped` signals
//!
//! Delivery is synchronous and immediate, in connection order, with a
//! snapshot taken before each emission pass so slot bodies may connect and
//! disconnect freely. Everything is `!Send` by construction: cross-thread
//! use is out of scope and the type system enforces it.
//!
//! # Example
//!
//! ```rust
//! use interlink::{Signal, SignalHandle};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! struct Counter {
//!     changed: Signal<i32>,
//!     value: Cell<i32>,
//! }
//!
//! impl Counter {
//!     fn new() -> Self {
//!         Self { changed: Signal::new(), value: Cell::new(0) }
//!     }
//!
//!     /// Connect-only view; emission stays internal to the counter.
//!     fn changed(&self) -> SignalHandle<i32> {
//!         self.changed.handle()
//!     }
//!
//!     fn add(&self, delta: i32) {
//!         self.value.set(self.value.get() + delta);
//!         self.changed.emit(&self.value.get()).expect("slots are infallible");
//!     }
//! }
//!
//! let counter = Counter::new();
//! let last_seen = Rc::new(Cell::new(0));
//!
//! let sink = last_seen.clone();
//! let conn = counter.changed().connect(move |value| sink.set(*value));
//!
//! counter.add(2);
//! counter.add(3);
//! assert_eq!(last_seen.get(), 5);
//!
//! conn.disconnect();
//! counter.add(10);
//! assert_eq!(last_seen.get(), 5);
//! ```

pub mod connection;
pub mod error;
pub mod fsm;
pub mod receiver;
pub mod signal;

pub use connection::{Connection, ConnectionKey};
pub use error::{BoxedError, EmitError, SlotResult};
pub use fsm::{Indexed, StateMachine};
pub use receiver::Receiver;
pub use signal::{Signal, SignalHandle};
