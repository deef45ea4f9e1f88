//! Emission error types

use thiserror::Error;

/// Boxed error raised by a failing slot.
///
/// The crate is single-threaded by design, so no `Send + Sync` bounds are
/// imposed on slot errors.
pub type BoxedError = Box<dyn std::error::Error>;

/// Result type returned by fallible slots.
pub type SlotResult = Result<(), BoxedError>;

/// A slot raised an error during emission.
///
/// Emission is fail-fast: the first failing slot aborts the pass and its
/// error is surfaced to the emission caller (or, for state machines, to the
/// caller of [`StateMachine::step`](crate::StateMachine::step)). Slots queued
/// after the failing one are not invoked. Callers that need every slot to run
/// regardless of failures should connect slots that catch and report
/// internally instead of returning an error.
#[derive(Debug, Error)]
#[error("slot failed during emission: {0}")]
pub struct EmitError(pub BoxedError);
