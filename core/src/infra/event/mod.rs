//! Entity events - typed notifications of record requests and outcomes
//!
//! Each entity kind shares one closed tree of event kinds. Leaves are concrete
//! event identities; inner nodes only exist so handlers can subscribe to a
//! whole branch (every failure, every save failure, ...).

pub mod bus;

use crate::domain::{
	validation::Violation, Address, Appointment, City, Country, Customer, Entity, EntityKind,
	ModelId, ModelRef, RowState, User,
};
use serde::{Deserialize, Serialize};
use std::{error::Error as StdError, fmt, sync::Arc};
use thiserror::Error;

pub use bus::{EventBus, Subscription};

/// Message of a failed event with neither a usable message nor cause
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Message of a canceled event without an explicit message
pub const OPERATION_CANCELED: &str = "Operation canceled";

/// Underlying error attached to a faulted event
pub type Cause = Arc<dyn StdError + Send + Sync>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
	#[error("invalid argument: {0}")]
	InvalidArgument(String),
}

/// What an event means for the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum OperationKind {
	Insert,
	Update,
	Delete,
	/// Edit intent only, nothing persisted yet
	None,
}

impl OperationKind {
	/// Operation a save of a record in this state performs
	pub const fn for_save(row_state: RowState) -> Self {
		match row_state {
			RowState::New => Self::Insert,
			_ => Self::Update,
		}
	}
}

/// Event kind tree shared by every entity
#[derive(
	Debug,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Hash,
	Serialize,
	Deserialize,
	strum::Display,
	strum::EnumIter,
)]
pub enum EventKind {
	Any,

	OperationRequest,
	EditRequest,
	DeleteRequest,

	Success,
	InsertSuccess,
	UpdateSuccess,
	DeleteSuccess,

	Failed,
	SaveFailed,
	InsertFailed,
	InsertInvalid,
	InsertFaulted,
	InsertCanceled,
	UpdateFailed,
	UpdateInvalid,
	UpdateFaulted,
	UpdateCanceled,
	DeleteFailed,
	DeleteInvalid,
	DeleteFaulted,
	DeleteCanceled,
}

impl EventKind {
	pub const fn parent(self) -> Option<Self> {
		match self {
			Self::Any => None,
			Self::OperationRequest | Self::Success | Self::Failed => Some(Self::Any),
			Self::EditRequest | Self::DeleteRequest => Some(Self::OperationRequest),
			Self::InsertSuccess | Self::UpdateSuccess | Self::DeleteSuccess => Some(Self::Success),
			Self::SaveFailed | Self::DeleteFailed => Some(Self::Failed),
			Self::InsertFailed | Self::UpdateFailed => Some(Self::SaveFailed),
			Self::InsertInvalid | Self::InsertFaulted | Self::InsertCanceled => {
				Some(Self::InsertFailed)
			}
			Self::UpdateInvalid | Self::UpdateFaulted | Self::UpdateCanceled => {
				Some(Self::UpdateFailed)
			}
			Self::DeleteInvalid | Self::DeleteFaulted | Self::DeleteCanceled => {
				Some(Self::DeleteFailed)
			}
		}
	}

	/// `self` equals `ancestor` or sits somewhere below it
	pub fn is_a(self, ancestor: Self) -> bool {
		let mut current = Some(self);
		while let Some(kind) = current {
			if kind == ancestor {
				return true;
			}
			current = kind.parent();
		}
		false
	}

	/// Concrete event identity, as opposed to a dispatch anchor
	pub const fn is_leaf(self) -> bool {
		!matches!(
			self,
			Self::Any
				| Self::OperationRequest
				| Self::Success
				| Self::Failed
				| Self::SaveFailed
				| Self::InsertFailed
				| Self::UpdateFailed
				| Self::DeleteFailed
		)
	}

	pub const fn operation(self) -> OperationKind {
		match self {
			Self::InsertSuccess
			| Self::InsertFailed
			| Self::InsertInvalid
			| Self::InsertFaulted
			| Self::InsertCanceled => OperationKind::Insert,
			Self::UpdateSuccess
			| Self::UpdateFailed
			| Self::UpdateInvalid
			| Self::UpdateFaulted
			| Self::UpdateCanceled => OperationKind::Update,
			Self::DeleteRequest
			| Self::DeleteSuccess
			| Self::DeleteFailed
			| Self::DeleteInvalid
			| Self::DeleteFaulted
			| Self::DeleteCanceled => OperationKind::Delete,
			Self::Any
			| Self::OperationRequest
			| Self::EditRequest
			| Self::Success
			| Self::Failed
			| Self::SaveFailed => OperationKind::None,
		}
	}

	pub const fn is_canceled(self) -> bool {
		matches!(
			self,
			Self::InsertCanceled | Self::UpdateCanceled | Self::DeleteCanceled
		)
	}

	pub const fn is_invalid(self) -> bool {
		matches!(
			self,
			Self::InsertInvalid | Self::UpdateInvalid | Self::DeleteInvalid
		)
	}

	pub const fn success(operation: OperationKind) -> Option<Self> {
		match operation {
			OperationKind::Insert => Some(Self::InsertSuccess),
			OperationKind::Update => Some(Self::UpdateSuccess),
			OperationKind::Delete => Some(Self::DeleteSuccess),
			OperationKind::None => None,
		}
	}

	pub const fn invalid(operation: OperationKind) -> Option<Self> {
		match operation {
			OperationKind::Insert => Some(Self::InsertInvalid),
			OperationKind::Update => Some(Self::UpdateInvalid),
			OperationKind::Delete => Some(Self::DeleteInvalid),
			OperationKind::None => None,
		}
	}

	pub const fn faulted(operation: OperationKind) -> Option<Self> {
		match operation {
			OperationKind::Insert => Some(Self::InsertFaulted),
			OperationKind::Update => Some(Self::UpdateFaulted),
			OperationKind::Delete => Some(Self::DeleteFaulted),
			OperationKind::None => None,
		}
	}

	pub const fn canceled(operation: OperationKind) -> Option<Self> {
		match operation {
			OperationKind::Insert => Some(Self::InsertCanceled),
			OperationKind::Update => Some(Self::UpdateCanceled),
			OperationKind::Delete => Some(Self::DeleteCanceled),
			OperationKind::None => None,
		}
	}

	/// Validation failure kind for a save of a record in this state
	pub const fn save_invalid(row_state: RowState) -> Self {
		match row_state {
			RowState::New => Self::InsertInvalid,
			_ => Self::UpdateInvalid,
		}
	}
}

/// Routing metadata carried by every event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
	/// Component that raised the event
	pub source: &'static str,
	/// Model the event is addressed to, if any
	pub target: Option<ModelId>,
}

impl Route {
	pub const fn new(source: &'static str) -> Self {
		Self {
			source,
			target: None,
		}
	}

	pub const fn to(mut self, target: ModelId) -> Self {
		self.target = Some(target);
		self
	}
}

/// The record an event is about, either as a bare snapshot or as the model
/// wrapping it
#[derive(Debug)]
pub enum Payload<R: Entity> {
	Record(Arc<R>),
	Model(ModelRef<R>),
}

impl<R: Entity> Payload<R> {
	/// Current record; `None` only when a model payload is mutably borrowed
	pub fn record(&self) -> Option<Arc<R>> {
		match self {
			Self::Record(record) => Some(Arc::clone(record)),
			Self::Model(model) => model.try_borrow().ok().map(|model| model.record()),
		}
	}

	pub const fn as_record(&self) -> Option<&Arc<R>> {
		match self {
			Self::Record(record) => Some(record),
			Self::Model(_) => None,
		}
	}

	pub const fn as_model(&self) -> Option<&ModelRef<R>> {
		match self {
			Self::Model(model) => Some(model),
			Self::Record(_) => None,
		}
	}

	/// Same payload instance, by pointer
	pub fn ptr_eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Record(left), Self::Record(right)) => Arc::ptr_eq(left, right),
			(Self::Model(left), Self::Model(right)) => std::rc::Rc::ptr_eq(left, right),
			_ => false,
		}
	}
}

impl<R: Entity> Clone for Payload<R> {
	fn clone(&self) -> Self {
		match self {
			Self::Record(record) => Self::Record(Arc::clone(record)),
			Self::Model(model) => Self::Model(std::rc::Rc::clone(model)),
		}
	}
}

/// Failure details of a `Failed` branch event
#[derive(Clone)]
pub struct Failure {
	message: String,
	cause: Option<Cause>,
	canceled: bool,
	violation: Option<Violation>,
}

impl Failure {
	pub fn message(&self) -> &str {
		&self.message
	}

	pub fn cause(&self) -> Option<&Cause> {
		self.cause.as_ref()
	}

	pub const fn is_canceled(&self) -> bool {
		self.canceled
	}

	pub const fn violation(&self) -> Option<&Violation> {
		self.violation.as_ref()
	}
}

impl fmt::Debug for Failure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Failure")
			.field("message", &self.message)
			.field("cause", &self.cause.as_ref().map(ToString::to_string))
			.field("canceled", &self.canceled)
			.field("violation", &self.violation)
			.finish()
	}
}

fn non_blank(text: Option<String>) -> Option<String> {
	text.filter(|text| !text.trim().is_empty())
}

/// An immutable notification about one record of entity `R`
#[derive(Debug, Clone)]
pub struct EntityEvent<R: Entity> {
	kind: EventKind,
	payload: Payload<R>,
	route: Route,
	failure: Option<Failure>,
}

impl<R: Entity> EntityEvent<R> {
	fn check_kind(kind: EventKind, branch: EventKind) -> Result<(), EventError> {
		if !kind.is_a(branch) {
			return Err(EventError::InvalidArgument(format!(
				"{kind} is not a {branch} event kind"
			)));
		}
		if !kind.is_leaf() {
			return Err(EventError::InvalidArgument(format!(
				"{kind} is a base kind and cannot identify a {} event",
				R::KIND
			)));
		}
		Ok(())
	}

	/// Edit or delete request
	pub fn request(kind: EventKind, payload: Payload<R>, route: Route) -> Result<Self, EventError> {
		Self::check_kind(kind, EventKind::OperationRequest)?;
		Ok(Self {
			kind,
			payload,
			route,
			failure: None,
		})
	}

	pub fn edit_request(payload: Payload<R>, route: Route) -> Self {
		Self {
			kind: EventKind::EditRequest,
			payload,
			route,
			failure: None,
		}
	}

	pub fn delete_request(payload: Payload<R>, route: Route) -> Self {
		Self {
			kind: EventKind::DeleteRequest,
			payload,
			route,
			failure: None,
		}
	}

	pub fn success(kind: EventKind, payload: Payload<R>, route: Route) -> Result<Self, EventError> {
		Self::check_kind(kind, EventKind::Success)?;
		Ok(Self {
			kind,
			payload,
			route,
			failure: None,
		})
	}

	/// Failure event. The message resolves to `message` if non-blank, else to
	/// the cause's message if non-blank, else to [`UNKNOWN_ERROR`]; canceled
	/// kinds fall back to [`OPERATION_CANCELED`] and reject a cause.
	pub fn failed(
		kind: EventKind,
		payload: Payload<R>,
		message: Option<String>,
		cause: Option<Cause>,
		route: Route,
	) -> Result<Self, EventError> {
		Self::check_kind(kind, EventKind::Failed)?;

		let canceled = kind.is_canceled();
		if canceled && cause.is_some() {
			return Err(EventError::InvalidArgument(format!(
				"{kind} is a cancellation and cannot carry a cause"
			)));
		}

		let message = non_blank(message)
			.or_else(|| non_blank(cause.as_ref().map(ToString::to_string)))
			.unwrap_or_else(|| {
				if canceled {
					OPERATION_CANCELED.to_string()
				} else {
					UNKNOWN_ERROR.to_string()
				}
			});

		Ok(Self {
			kind,
			payload,
			route,
			failure: Some(Failure {
				message,
				cause,
				canceled,
				violation: None,
			}),
		})
	}

	pub fn canceled(
		kind: EventKind,
		payload: Payload<R>,
		message: Option<String>,
		route: Route,
	) -> Result<Self, EventError> {
		if !kind.is_canceled() {
			return Err(EventError::InvalidArgument(format!(
				"{kind} is not a cancellation kind"
			)));
		}
		Self::failed(kind, payload, message, None, route)
	}

	/// Validation failure carrying the violated rule
	pub fn invalid(
		kind: EventKind,
		payload: Payload<R>,
		violation: Violation,
		route: Route,
	) -> Result<Self, EventError> {
		if !kind.is_invalid() {
			return Err(EventError::InvalidArgument(format!(
				"{kind} is not a validation failure kind"
			)));
		}
		let mut event = Self::failed(kind, payload, Some(violation.message.clone()), None, route)?;
		if let Some(failure) = event.failure.as_mut() {
			failure.violation = Some(violation);
		}
		Ok(event)
	}

	/// Validation failure for a kind the caller already knows is an
	/// `*Invalid` leaf
	pub(crate) fn rejected(
		kind: EventKind,
		payload: Payload<R>,
		violation: Violation,
		route: Route,
	) -> Self {
		debug_assert!(kind.is_invalid(), "{kind} is not a validation failure kind");
		Self {
			kind,
			payload,
			route,
			failure: Some(Failure {
				message: violation.message.clone(),
				cause: None,
				canceled: false,
				violation: Some(violation),
			}),
		}
	}

	/// Failure derived from this event, same payload instance and route
	pub fn to_failed(
		&self,
		kind: EventKind,
		message: Option<String>,
		cause: Option<Cause>,
	) -> Result<Self, EventError> {
		Self::failed(kind, self.payload.clone(), message, cause, self.route)
	}

	/// Cancellation derived from this event, same payload instance and route
	pub fn to_canceled(&self, kind: EventKind) -> Result<Self, EventError> {
		Self::canceled(kind, self.payload.clone(), None, self.route)
	}

	/// Validation failure derived from this event, same payload instance and route
	pub fn to_invalid(&self, kind: EventKind, violation: Violation) -> Result<Self, EventError> {
		Self::invalid(kind, self.payload.clone(), violation, self.route)
	}

	pub const fn kind(&self) -> EventKind {
		self.kind
	}

	pub const fn entity(&self) -> EntityKind {
		R::KIND
	}

	pub const fn operation(&self) -> OperationKind {
		self.kind.operation()
	}

	pub const fn payload(&self) -> &Payload<R> {
		&self.payload
	}

	pub fn record(&self) -> Option<Arc<R>> {
		self.payload.record()
	}

	/// Key of the payload record, if it can be read
	pub fn key(&self) -> Option<i32> {
		self.record().map(|record| record.meta().key)
	}

	pub const fn route(&self) -> Route {
		self.route
	}

	pub const fn failure(&self) -> Option<&Failure> {
		self.failure.as_ref()
	}

	pub fn message(&self) -> Option<&str> {
		self.failure.as_ref().map(Failure::message)
	}

	pub fn is_canceled(&self) -> bool {
		self.failure.as_ref().is_some_and(Failure::is_canceled)
	}

	pub fn violation(&self) -> Option<&Violation> {
		self.failure.as_ref().and_then(Failure::violation)
	}

	pub fn is_success(&self) -> bool {
		self.kind.is_a(EventKind::Success)
	}

	pub fn is_failure(&self) -> bool {
		self.kind.is_a(EventKind::Failed)
	}
}

/// Events of every entity kind, as carried by the [`EventBus`]
#[derive(Debug, Clone)]
pub enum Event {
	Address(EntityEvent<Address>),
	City(EntityEvent<City>),
	Country(EntityEvent<Country>),
	Customer(EntityEvent<Customer>),
	Appointment(EntityEvent<Appointment>),
	User(EntityEvent<User>),
}

macro_rules! with_entity_event {
	($event:expr, $inner:ident => $body:expr) => {
		match $event {
			Event::Address($inner) => $body,
			Event::City($inner) => $body,
			Event::Country($inner) => $body,
			Event::Customer($inner) => $body,
			Event::Appointment($inner) => $body,
			Event::User($inner) => $body,
		}
	};
}

impl Event {
	pub fn entity(&self) -> EntityKind {
		with_entity_event!(self, event => event.entity())
	}

	pub fn kind(&self) -> EventKind {
		with_entity_event!(self, event => event.kind())
	}

	pub fn route(&self) -> Route {
		with_entity_event!(self, event => event.route())
	}

	pub fn key(&self) -> Option<i32> {
		with_entity_event!(self, event => event.key())
	}

	pub fn message(&self) -> Option<&str> {
		with_entity_event!(self, event => event.message())
	}

	/// Typed view of this event, if it is about entity `R`
	pub fn downcast<R: Entity>(&self) -> Option<&EntityEvent<R>> {
		R::from_event(self)
	}
}

impl<R: Entity> From<EntityEvent<R>> for Event {
	fn from(event: EntityEvent<R>) -> Self {
		R::into_event(event)
	}
}

/// Which events a bus subscription receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionFilter {
	/// Restrict to one entity kind
	pub entity: Option<EntityKind>,
	/// Event kind or any of its anchors
	pub kind: EventKind,
	/// Skip events targeted at other models; untargeted events still arrive
	pub scope: Option<ModelId>,
}

impl SubscriptionFilter {
	pub const fn new(kind: EventKind) -> Self {
		Self {
			entity: None,
			kind,
			scope: None,
		}
	}

	pub const fn for_entity(entity: EntityKind, kind: EventKind) -> Self {
		Self {
			entity: Some(entity),
			kind,
			scope: None,
		}
	}

	pub const fn scoped(mut self, scope: ModelId) -> Self {
		self.scope = Some(scope);
		self
	}

	/// Check if this filter matches the given event
	pub fn matches(&self, event: &Event) -> bool {
		if self.entity.is_some_and(|entity| entity != event.entity()) {
			return false;
		}
		if !event.kind().is_a(self.kind) {
			return false;
		}
		match (event.route().target, self.scope) {
			(Some(target), Some(scope)) => target == scope,
			_ => true,
		}
	}
}
