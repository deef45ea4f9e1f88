//! Table-driven state machines
//!
//! [`StateMachine`] is a showcase emitter built on the signal core: a
//! fixed-capacity `(state, input) -> next state` table drives transitions,
//! and every successful [`step`](StateMachine::step) announces itself
//! through three signals, in order:
//!
//! 1. `exited(state)` with the state being entered as argument;
//! 2. `stepped(from, to)` with no payload, announcing the specific edge;
//! 3. `entered(state)` with the state just departed as argument.
//!
//! An input with no table entry for the current state is silently ignored --
//! the machine stays put and nothing fires. Use [`can_step`] to detect that
//! case up front.
//!
//! [`can_step`]: StateMachine::can_step
//!
//! ```
//! use interlink::{Indexed, StateMachine};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! #[derive(Clone, Copy, PartialEq, Debug)]
//! enum Mode {
//!     Idle,
//!     Active,
//! }
//!
//! impl Indexed for Mode {
//!     fn index(self) -> usize {
//!         self as usize
//!     }
//! }
//!
//! #[derive(Clone, Copy)]
//! enum Key {
//!     Toggle,
//! }
//!
//! impl Indexed for Key {
//!     fn index(self) -> usize {
//!         self as usize
//!     }
//! }
//!
//! let mut machine: StateMachine<Mode, Key, 2, 1> = StateMachine::new(Mode::Idle);
//! machine.add_transitions([
//!     (Mode::Idle, Key::Toggle, Mode::Active),
//!     (Mode::Active, Key::Toggle, Mode::Idle),
//! ]);
//!
//! let activations = Rc::new(Cell::new(0));
//! let seen = activations.clone();
//! machine.entered(Mode::Active).connect(move |_previous| seen.set(seen.get() + 1));
//!
//! machine.step(Key::Toggle).unwrap();
//! assert!(machine.is_in(Mode::Active));
//! assert_eq!(activations.get(), 1);
//! ```

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::EmitError;
use crate::signal::{self, Signal, SignalHandle};

/// Compact integer encoding for a finite state or input enumeration.
///
/// Implementations must return a stable index below the machine's capacity
/// bound (`MAX_STATES` for states, `MAX_INPUTS` for inputs). For a plain
/// fieldless enum this is just `self as usize`. Blanket impls cover the
/// unsigned integer types for callers that prefer raw ids.
pub trait Indexed: Copy {
    fn index(self) -> usize;
}

macro_rules! impl_indexed {
    ($($ty:ty),*) => {
        $(impl Indexed for $ty {
            fn index(self) -> usize {
                self as usize
            }
        })*
    };
}

impl_indexed!(u8, u16, u32, usize);

/// A finite-state machine emitting per-state and per-transition signals.
///
/// `MAX_STATES` and `MAX_INPUTS` bound the state and input encodings at
/// compile time and size the transition table. The per-state `entered` /
/// `exited` signals are fixed at construction, independent of the table
/// contents; per-edge `stepped` signals are materialized on first use.
pub struct StateMachine<S, I, const MAX_STATES: usize, const MAX_INPUTS: usize> {
    current: S,
    table: [[Option<S>; MAX_INPUTS]; MAX_STATES],
    entered: [Signal<S>; MAX_STATES],
    exited: [Signal<S>; MAX_STATES],
    stepped: RefCell<FxHashMap<(usize, usize), Signal<()>>>,
    history: Vec<(S, I, S)>,
}

impl<S, I, const MAX_STATES: usize, const MAX_INPUTS: usize>
    StateMachine<S, I, MAX_STATES, MAX_INPUTS>
where
    S: Indexed + 'static,
    I: Indexed,
{
    /// Creates a machine resting in `initial` with an empty table.
    ///
    /// # Panics
    ///
    /// Panics if `initial.index() >= MAX_STATES`.
    pub fn new(initial: S) -> Self {
        Self::state_index(initial);
        Self {
            current: initial,
            table: [[None; MAX_INPUTS]; MAX_STATES],
            entered: std::array::from_fn(|_| Signal::new()),
            exited: std::array::from_fn(|_| Signal::new()),
            stepped: RefCell::new(FxHashMap::default()),
            history: Vec::new(),
        }
    }

    /// The state the machine currently rests in.
    pub fn current_state(&self) -> S {
        self.current
    }

    /// Whether the machine currently rests in `state`.
    pub fn is_in(&self, state: S) -> bool {
        self.current.index() == state.index()
    }

    /// Bulk-installs table entries. A later entry overwrites any earlier one
    /// for the same `(from, input)` pair, within one call or across calls.
    ///
    /// # Panics
    ///
    /// Panics if any state or input index exceeds the capacity bounds.
    pub fn add_transitions<T>(&mut self, transitions: T) -> &mut Self
    where
        T: IntoIterator<Item = (S, I, S)>,
    {
        for (from, input, to) in transitions {
            let fi = Self::state_index(from);
            let ii = Self::input_index(input);
            Self::state_index(to);
            self.table[fi][ii] = Some(to);
        }
        self
    }

    /// The table entry for `(from, input)`, if one is defined.
    ///
    /// # Panics
    ///
    /// Panics if the state or input index exceeds the capacity bounds.
    pub fn transition_target(&self, from: S, input: I) -> Option<S> {
        self.table[Self::state_index(from)][Self::input_index(input)]
    }

    /// Whether `input` would move the machine out of its current state.
    ///
    /// # Panics
    ///
    /// Panics if `input.index() >= MAX_INPUTS`.
    pub fn can_step(&self, input: I) -> bool {
        self.transition_target(self.current, input).is_some()
    }

    /// Feeds `input` to the machine.
    ///
    /// With no table entry for the current state this is a no-op: the state
    /// is unchanged and nothing fires (unrecognized input is deliberately
    /// ignored, like a key event irrelevant to the current mode). Otherwise
    /// the `exited`, `stepped` and `entered` signals fire in that order; the
    /// current state is updated right after the `exited` emission, so exit
    /// slots that fail leave the machine where it was while later failures
    /// leave it in the new state.
    ///
    /// Returns `&mut Self` on success so calls chain:
    /// `machine.step(a)?.step(b)?`.
    ///
    /// # Panics
    ///
    /// Panics if `input.index() >= MAX_INPUTS`.
    pub fn step(&mut self, input: I) -> Result<&mut Self, EmitError> {
        let from = self.current;
        let fi = Self::state_index(from);
        let ii = Self::input_index(input);
        let Some(next) = self.table[fi][ii] else {
            trace!(state = fi, input = ii, "no transition defined; input ignored");
            return Ok(self);
        };
        let ni = Self::state_index(next);
        trace!(from = fi, to = ni, "stepping");

        // Exit slots still observe the pre-transition state.
        self.exited[fi].emit(&next)?;
        self.current = next;
        self.history.push((from, input, next));

        let stepped = {
            let mut edges = self.stepped.borrow_mut();
            edges.entry((fi, ni)).or_insert_with(Signal::new).shared()
        };
        signal::deliver(&stepped, &())?;

        self.entered[ni].emit(&from)?;
        Ok(self)
    }

    /// Connect-only handle for the signal fired when `state` is entered.
    /// The slot argument is the state that was just departed.
    ///
    /// # Panics
    ///
    /// Panics if `state.index() >= MAX_STATES`.
    pub fn entered(&self, state: S) -> SignalHandle<S> {
        self.entered[Self::state_index(state)].handle()
    }

    /// Connect-only handle for the signal fired when `state` is departed.
    /// The slot argument is the state being entered.
    ///
    /// # Panics
    ///
    /// Panics if `state.index() >= MAX_STATES`.
    pub fn exited(&self, state: S) -> SignalHandle<S> {
        self.exited[Self::state_index(state)].handle()
    }

    /// Connect-only handle for the signal fired when the machine takes the
    /// `from -> to` edge. Carries no payload.
    ///
    /// # Panics
    ///
    /// Panics if either state index exceeds `MAX_STATES`.
    pub fn stepped(&self, from: S, to: S) -> SignalHandle<()> {
        let edge = (Self::state_index(from), Self::state_index(to));
        self.stepped
            .borrow_mut()
            .entry(edge)
            .or_insert_with(Signal::new)
            .handle()
    }

    /// Transitions taken so far, oldest first.
    pub fn history(&self) -> &[(S, I, S)] {
        &self.history
    }

    /// Clears the recorded transition history.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn state_index(state: S) -> usize {
        let index = state.index();
        assert!(
            index < MAX_STATES,
            "state index {index} out of range (MAX_STATES = {MAX_STATES})"
        );
        index
    }

    fn input_index(input: I) -> usize {
        let index = input.index();
        assert!(
            index < MAX_INPUTS,
            "input index {index} out of range (MAX_INPUTS = {MAX_INPUTS})"
        );
        index
    }
}
