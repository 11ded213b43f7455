//! Action manager - runs record operations and raises their outcome events

use super::error::{ActionError, ActionResult};
use crate::{
	domain::{
		validation::{validate_for_delete, validate_for_save, validate_model, Violation},
		Entity, Model, ModelError, ModelId, ModelRef,
	},
	infra::{
		db::{store::StoreResult, Persist, StoreError},
		event::{Cause, EntityEvent, EventBus, EventError, EventKind, OperationKind, Payload, Route},
		i18n::Messages,
		query::RecordFilter,
	},
};
use sea_orm::DatabaseConnection;
use std::{fmt, rc::Rc, sync::Arc};
use tokio::task::JoinError;
use tracing::{debug, error, info, warn};

/// Route source of every event raised here
pub const SOURCE: &str = "actions";

type WorkerResult<R> = Result<StoreResult<Arc<R>>, JoinError>;

/// Runs saves, deletes and loads for the views of one context
pub struct ActionManager {
	bus: EventBus,
	db: DatabaseConnection,
	messages: Rc<dyn Messages>,
	user: String,
}

impl ActionManager {
	/// `user` is stamped into the audit columns of every write
	pub fn new(
		bus: EventBus,
		db: DatabaseConnection,
		messages: Rc<dyn Messages>,
		user: impl Into<String>,
	) -> Self {
		Self {
			bus,
			db,
			messages,
			user: user.into(),
		}
	}

	pub const fn bus(&self) -> &EventBus {
		&self.bus
	}

	pub fn user(&self) -> &str {
		&self.user
	}

	/// Raises an edit request for the model
	pub fn request_edit<R: Entity>(&self, model: &ModelRef<R>) -> EntityEvent<R> {
		let route = Route::new(SOURCE).to(model.borrow().id());
		let request = EntityEvent::edit_request(Payload::Model(Rc::clone(model)), route);
		self.bus.emit(request.clone());
		request
	}

	/// Raises a delete request for the model
	pub fn request_delete<R: Entity>(&self, model: &ModelRef<R>) -> EntityEvent<R> {
		let route = Route::new(SOURCE).to(model.borrow().id());
		let request = EntityEvent::delete_request(Payload::Model(Rc::clone(model)), route);
		self.bus.emit(request.clone());
		request
	}

	/// Validates and saves the model's record, then refreshes the model from
	/// the stored row. The returned event has also been raised on the bus.
	pub async fn save<R: Persist>(&self, model: &ModelRef<R>) -> ActionResult<EntityEvent<R>> {
		let id = ensure_idle(model)?;
		let route = Route::new(SOURCE).to(id);

		if let Some(invalid) = validate_model(model, &*self.messages, route) {
			warn!(
				"{} save rejected: {}",
				R::KIND,
				invalid.message().unwrap_or_default()
			);
			self.bus.emit(invalid.clone());
			return Ok(invalid);
		}

		let snapshot = {
			let mut model = model.borrow_mut();
			model.set_busy(true);
			model.snapshot()
		};
		let operation = OperationKind::for_save(snapshot.meta().row_state);
		info!("{} {} started for model {}", R::KIND, operation, id);

		let result = self.spawn_save(snapshot).await;
		model.borrow_mut().set_busy(false);

		let event = self.outcome(operation, Payload::Model(Rc::clone(model)), route, result)?;
		if event.is_success() {
			model.borrow_mut().apply_success(&event)?;
		}
		self.bus.emit(event.clone());
		Ok(event)
	}

	/// Validates and saves a bare record snapshot
	pub async fn save_record<R: Persist>(&self, record: Arc<R>) -> ActionResult<EntityEvent<R>> {
		let route = Route::new(SOURCE);

		if let Some(invalid) = validate_for_save(&record, &*self.messages, route) {
			warn!(
				"{} save rejected: {}",
				R::KIND,
				invalid.message().unwrap_or_default()
			);
			self.bus.emit(invalid.clone());
			return Ok(invalid);
		}

		let operation = OperationKind::for_save(record.meta().row_state);
		info!("{} {} started", R::KIND, operation);

		let result = self.spawn_save(Arc::clone(&record)).await;
		let event = self.outcome(operation, Payload::Record(record), route, result)?;
		self.bus.emit(event.clone());
		Ok(event)
	}

	/// Carries out a delete request. Dependent rows make the delete fail with
	/// a `DeleteInvalid` event.
	pub async fn delete<R: Persist>(&self, request: &EntityEvent<R>) -> ActionResult<EntityEvent<R>> {
		if request.kind() != EventKind::DeleteRequest {
			return Err(EventError::InvalidArgument(format!(
				"{} is not a delete request",
				request.kind()
			))
			.into());
		}

		let model = request.payload().as_model().map(Rc::clone);
		let route = match &model {
			Some(model) => request.route().to(ensure_idle(model)?),
			None => request.route(),
		};
		let record = request
			.payload()
			.record()
			.ok_or(ModelError::InUse(R::KIND))?;

		if let Some(violation) = validate_for_delete(&*record, &*self.messages) {
			let invalid = request.to_invalid(EventKind::DeleteInvalid, violation)?;
			warn!(
				"{} delete rejected: {}",
				R::KIND,
				invalid.message().unwrap_or_default()
			);
			self.bus.emit(invalid.clone());
			return Ok(invalid);
		}

		info!("{} delete started for {}", R::KIND, record.meta().key);
		if let Some(model) = &model {
			model.borrow_mut().set_busy(true);
		}
		let db = self.db.clone();
		let result = tokio::spawn(async move { R::delete(&db, record).await }).await;
		if let Some(model) = &model {
			model.borrow_mut().set_busy(false);
		}

		let event = self.outcome(OperationKind::Delete, request.payload().clone(), route, result)?;
		if let (true, Some(model)) = (event.is_success(), &model) {
			model.borrow_mut().apply_success(&event)?;
		}
		self.bus.emit(event.clone());
		Ok(event)
	}

	/// Cancels an edit or delete request the user backed out of
	pub fn cancel<R: Entity>(&self, request: &EntityEvent<R>) -> ActionResult<EntityEvent<R>> {
		let operation = match request.kind() {
			EventKind::DeleteRequest => OperationKind::Delete,
			EventKind::EditRequest => {
				let record = request
					.payload()
					.record()
					.ok_or(ModelError::InUse(R::KIND))?;
				OperationKind::for_save(record.meta().row_state)
			}
			other => {
				return Err(EventError::InvalidArgument(format!(
					"{other} is not an operation request"
				))
				.into())
			}
		};

		let canceled = request.to_canceled(leaf(EventKind::canceled(operation), operation)?)?;
		info!("{} {} canceled", R::KIND, operation);
		self.bus.emit(canceled.clone());
		Ok(canceled)
	}

	/// Loads the records selected by `filter`
	pub async fn load_records<R: Persist>(&self, filter: &RecordFilter<R>) -> ActionResult<Vec<Arc<R>>> {
		let db = self.db.clone();
		let worker_filter = filter.clone();
		let records = tokio::spawn(async move { R::load(&db, &worker_filter).await }).await??;
		debug!("Loaded {} rows for {}", records.len(), filter.description());
		Ok(records)
	}

	/// Loads the records selected by `filter`, each wrapped in a model
	pub async fn load<R: Persist>(&self, filter: &RecordFilter<R>) -> ActionResult<Vec<ModelRef<R>>> {
		self.load_records(filter)
			.await?
			.into_iter()
			.map(|record| Model::wrap(record).map_err(ActionError::from))
			.collect()
	}

	async fn spawn_save<R: Persist>(&self, record: Arc<R>) -> WorkerResult<R> {
		let db = self.db.clone();
		let user = self.user.clone();
		tokio::spawn(async move { R::save(&db, record, &user).await }).await
	}

	/// Event reporting how a worker operation ended. Failures keep `payload`;
	/// a success carries the stored record.
	fn outcome<R: Entity>(
		&self,
		operation: OperationKind,
		payload: Payload<R>,
		route: Route,
		result: WorkerResult<R>,
	) -> ActionResult<EntityEvent<R>> {
		let event = match result {
			Ok(Ok(stored)) => {
				info!("{} {} {} completed", R::KIND, stored.meta().key, operation);
				EntityEvent::success(
					leaf(EventKind::success(operation), operation)?,
					Payload::Record(stored),
					route,
				)?
			}
			Ok(Err(StoreError::Rejected { key, reason, .. })) => {
				warn!("{} {} {} rejected: {}", R::KIND, key, operation, reason);
				let violation = Violation::new(R::KIND, None, self.messages.get_string(reason));
				EntityEvent::invalid(
					leaf(EventKind::invalid(operation), operation)?,
					payload,
					violation,
					route,
				)?
			}
			Ok(Err(e)) => {
				error!("{} {} failed: {}", R::KIND, operation, e);
				faulted(operation, payload, route, Arc::new(e))?
			}
			Err(e) => {
				error!("{} {} worker failed: {}", R::KIND, operation, e);
				faulted(operation, payload, route, Arc::new(e))?
			}
		};
		Ok(event)
	}
}

impl fmt::Debug for ActionManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ActionManager")
			.field("bus", &self.bus)
			.field("user", &self.user)
			.finish_non_exhaustive()
	}
}

/// Fails when the model already has an operation in flight
fn ensure_idle<R: Entity>(model: &ModelRef<R>) -> ActionResult<ModelId> {
	let model = model.try_borrow().map_err(|_| ModelError::InUse(R::KIND))?;
	if model.is_busy() {
		return Err(ActionError::Busy(R::KIND));
	}
	Ok(model.id())
}

fn leaf(kind: Option<EventKind>, operation: OperationKind) -> ActionResult<EventKind> {
	kind.ok_or_else(|| {
		EventError::InvalidArgument(format!("{operation} has no outcome events")).into()
	})
}

fn faulted<R: Entity>(
	operation: OperationKind,
	payload: Payload<R>,
	route: Route,
	cause: Cause,
) -> ActionResult<EntityEvent<R>> {
	Ok(EntityEvent::failed(
		leaf(EventKind::faulted(operation), operation)?,
		payload,
		None,
		Some(cause),
		route,
	)?)
}
