//! Record actions - user-initiated saves and deletes
//!
//! An action validates on the calling thread, persists on a tokio worker and
//! raises the outcome as an event on the [`EventBus`](crate::infra::event::EventBus).

pub mod error;
pub mod manager;

pub use error::{ActionError, ActionResult};
pub use manager::ActionManager;
