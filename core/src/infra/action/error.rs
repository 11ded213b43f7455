//! Action error types

use crate::{
	domain::{EntityKind, ModelError},
	infra::{db::StoreError, event::EventError},
};
use thiserror::Error;

/// Contract violations of a record action. Validation and persistence
/// failures are reported as failed events instead.
#[derive(Debug, Error)]
pub enum ActionError {
	#[error("{0} is busy with another operation")]
	Busy(EntityKind),

	#[error("Model error: {0}")]
	Model(#[from] ModelError),

	#[error("Event error: {0}")]
	Event(#[from] EventError),

	/// Loading failed; saves and deletes report this as a faulted event
	#[error("Store error: {0}")]
	Store(#[from] StoreError),

	#[error("Worker task failed: {0}")]
	Join(#[from] tokio::task::JoinError),
}

pub type ActionResult<T> = Result<T, ActionError>;
