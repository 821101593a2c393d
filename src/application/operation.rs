//! Sequence-tagged operation state.
//!
//! Each operation kind owns one slot. Starting an operation takes a ticket;
//! only the holder of the latest ticket may settle the slot, so a slow
//! response from an older call can never overwrite a newer state.

use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

use crate::domain::{ErrorInfo, OperationKind, OperationState, Result};

/// Proof that an operation instance was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
}

impl Ticket {
    #[must_use]
    pub const fn seq(self) -> u64 {
        self.seq
    }
}

/// How an operation instance ended, from the UI's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T> {
    /// This instance was the latest; its outcome is now the slot's state.
    Applied(OperationState<T>),
    /// A newer instance started first; this outcome was discarded.
    Superseded,
}

impl<T> Completion<T> {
    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }

    /// The applied success value, if any.
    #[must_use]
    pub const fn success(&self) -> Option<&T> {
        match self {
            Self::Applied(state) => state.success(),
            Self::Superseded => None,
        }
    }

    /// The applied failure, if any.
    #[must_use]
    pub const fn failure(&self) -> Option<&ErrorInfo> {
        match self {
            Self::Applied(state) => state.failure(),
            Self::Superseded => None,
        }
    }
}

/// Latest-started-wins state holder for one operation kind.
pub struct OperationSlot<T> {
    kind: OperationKind,
    latest: Mutex<u64>,
    state: watch::Sender<OperationState<T>>,
}

impl<T: Clone> OperationSlot<T> {
    #[must_use]
    pub fn new(kind: OperationKind) -> Self {
        let (state, _) = watch::channel(OperationState::Idle);
        Self {
            kind,
            latest: Mutex::new(0),
            state,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        self.kind
    }

    fn latest(&self) -> std::sync::MutexGuard<'_, u64> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new instance: supersede any earlier one and go `Pending`.
    pub fn begin(&self) -> Ticket {
        let mut latest = self.latest();
        *latest += 1;
        self.state.send_replace(OperationState::Pending);
        tracing::trace!(kind = %self.kind, seq = *latest, "Operation started");
        Ticket { seq: *latest }
    }

    /// Whether `ticket` still belongs to the latest instance.
    #[must_use]
    pub fn is_current(&self, ticket: Ticket) -> bool {
        *self.latest() == ticket.seq
    }

    /// Record the outcome of the instance identified by `ticket`.
    ///
    /// Outcomes of superseded instances are dropped.
    pub fn settle(&self, ticket: Ticket, result: Result<T>) -> Completion<T> {
        let latest = self.latest();
        if *latest != ticket.seq {
            tracing::debug!(
                kind = %self.kind,
                seq = ticket.seq,
                latest = *latest,
                "Discarding superseded result"
            );
            return Completion::Superseded;
        }

        let state = match result {
            Ok(value) => OperationState::Success(value),
            Err(e) => {
                tracing::debug!(kind = %self.kind, error = %e, "Operation failed");
                OperationState::Failure(ErrorInfo::from_error(&e, self.kind.fallback_message()))
            }
        };
        self.state.send_replace(state.clone());
        Completion::Applied(state)
    }

    /// Return to `Idle`, superseding any instance still in flight.
    pub fn reset(&self) {
        let mut latest = self.latest();
        *latest += 1;
        self.state.send_replace(OperationState::Idle);
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> OperationState<T> {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<OperationState<T>> {
        self.state.subscribe()
    }
}
