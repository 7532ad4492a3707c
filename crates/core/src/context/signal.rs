//! One-shot signals for navigation lifecycle synchronization.
//!
//! A [`Deferred`] settles at most once. Rearming means replacing the
//! instance; waiters holding the old one still observe its outcome.

use thiserror::Error;
use tokio::sync::watch;

/// Settlement state of a [`Deferred`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalState<T> {
	Pending,
	Resolved(T),
	Rejected(String),
}

/// Why a wait ended without a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
	#[error("{0}")]
	Rejected(String),
	#[error("signal dropped before it settled")]
	Dropped,
}

/// A value resolved exactly once by an external event and observable by any
/// number of waiters.
#[derive(Debug)]
pub struct Deferred<T> {
	tx: watch::Sender<SignalState<T>>,
}

impl<T: Clone> Default for Deferred<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Clone> Deferred<T> {
	pub fn new() -> Self {
		let (tx, _rx) = watch::channel(SignalState::Pending);
		Self { tx }
	}

	/// Resolves the signal. Returns false if it had already settled.
	pub fn resolve(&self, value: T) -> bool {
		self.settle(SignalState::Resolved(value))
	}

	/// Rejects the signal. Returns false if it had already settled.
	pub fn reject(&self, reason: impl Into<String>) -> bool {
		self.settle(SignalState::Rejected(reason.into()))
	}

	fn settle(&self, outcome: SignalState<T>) -> bool {
		let mut settled = false;
		self.tx.send_if_modified(|state| {
			if matches!(state, SignalState::Pending) {
				*state = outcome;
				settled = true;
			}
			settled
		});
		if !settled {
			tracing::debug!("Ignoring second settlement of a one-shot signal");
		}
		settled
	}

	pub fn is_finished(&self) -> bool {
		!matches!(*self.tx.borrow(), SignalState::Pending)
	}

	pub fn state(&self) -> SignalState<T> {
		self.tx.borrow().clone()
	}

	/// Returns a handle that can be awaited after the owner's lock is released.
	pub fn waiter(&self) -> Waiter<T> {
		Waiter { rx: self.tx.subscribe() }
	}
}

/// Detached view of a [`Deferred`].
#[derive(Debug)]
pub struct Waiter<T> {
	rx: watch::Receiver<SignalState<T>>,
}

impl<T: Clone> Waiter<T> {
	/// Waits for the signal to settle.
	pub async fn wait(mut self) -> Result<T, SignalError> {
		let state = self
			.rx
			.wait_for(|state| !matches!(state, SignalState::Pending))
			.await
			.map_err(|_| SignalError::Dropped)?;
		match &*state {
			SignalState::Resolved(value) => Ok(value.clone()),
			SignalState::Rejected(reason) => Err(SignalError::Rejected(reason.clone())),
			SignalState::Pending => unreachable!("wait_for only returns settled states"),
		}
	}
}
