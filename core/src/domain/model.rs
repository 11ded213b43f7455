//! Observable models
//!
//! A [`Model`] wraps exactly one record snapshot for a view. Edits copy the
//! record on write, so a snapshot handed out is never touched, and they are
//! refused while the model or the model owning it is busy. Once a save
//! completes the model refreshes itself in place from the record the store
//! returned, and tells its observers what changed. Edits made on a
//! sub-model are pushed to its owner straight away.

use super::{Entity, EntityKind, Related, RowState};
use crate::infra::event::{EntityEvent, EventBus, EventKind, Subscription};
use std::{
	cell::RefCell,
	fmt,
	rc::{Rc, Weak},
	sync::Arc,
};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Identifies one model instance, used to address events to it
pub type ModelId = Uuid;

/// Shared handle to a model, owned by the views displaying it
pub type ModelRef<R> = Rc<RefCell<Model<R>>>;

/// Pseudo-properties reported to observers next to field names
pub mod property {
	pub const KEY: &str = "key";
	pub const ROW_STATE: &str = "row_state";
	pub const CREATED: &str = "created";
	pub const MODIFIED: &str = "modified";
	pub const BUSY: &str = "busy";
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
	#[error("{0} record has been deleted")]
	Deleted(EntityKind),

	#[error("{entity} model is bound to key {bound} and cannot be rebound to key {offered}")]
	Rebind {
		entity: EntityKind,
		bound: i32,
		offered: i32,
	},

	#[error("{0} is not a success event")]
	NotSuccess(EventKind),

	#[error("success event must carry a record snapshot")]
	RecordPayloadRequired,

	#[error("{0} model is already borrowed")]
	InUse(EntityKind),

	#[error("{0} model is busy")]
	Busy(EntityKind),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// One property of a model changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyChange {
	pub model: ModelId,
	pub property: &'static str,
}

/// Read-only field computed from the record
pub struct Derived<R> {
	pub name: &'static str,
	/// Fields and links whose change triggers a recompute
	pub depends_on: &'static [&'static str],
	pub compute: fn(&R) -> String,
}

impl<R> fmt::Debug for Derived<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Derived")
			.field("name", &self.name)
			.field("depends_on", &self.depends_on)
			.finish()
	}
}

/// Sub-models a model keeps for the related links of its record
pub trait Children<R>: Sized + 'static {
	fn bind(record: &R) -> ModelResult<Self>;

	/// Follows the links of a fresher record, returning the links that changed
	fn refresh(&mut self, source: &R) -> ModelResult<Vec<&'static str>>;

	/// Points the record's links at the sub-models' current records,
	/// returning the links that had to be rewritten
	fn write_back(&mut self, record: &mut Arc<R>) -> Vec<&'static str>;

	/// Marks every sub-model busy along with the owner
	fn set_busy(&mut self, _busy: bool) {}

	/// Hooks the sub-models up so their edits reach `owner`
	fn connect(_owner: &ModelRef<R>)
	where
		R: Entity,
	{
	}
}

/// For entities without related links
#[derive(Debug, Default, Clone, Copy)]
pub struct NoChildren;

impl<R> Children<R> for NoChildren {
	fn bind(_: &R) -> ModelResult<Self> {
		Ok(Self)
	}

	fn refresh(&mut self, _: &R) -> ModelResult<Vec<&'static str>> {
		Ok(Vec::new())
	}

	fn write_back(&mut self, _: &mut Arc<R>) -> Vec<&'static str> {
		Vec::new()
	}
}

/// Called by a sub-model with its record after every change
type Follow<T> = Rc<dyn Fn(&Arc<T>)>;

/// Model of a related parent record, bound to one link of the owning record
pub struct SubModel<T: Entity> {
	link: Option<Related<T>>,
	model: Option<ModelRef<T>>,
	follow: Option<Follow<T>>,
}

impl<T: Entity> SubModel<T> {
	pub fn bind(link: Option<&Related<T>>) -> ModelResult<Self> {
		let model = link
			.map(|link| Model::wrap(Arc::clone(link.record())))
			.transpose()?;
		Ok(Self {
			link: link.cloned(),
			model,
			follow: None,
		})
	}

	fn set_follow(&mut self, follow: Follow<T>) {
		if let Some(model) = &self.model {
			model.borrow_mut().owner = Some(Rc::clone(&follow));
		}
		self.follow = Some(follow);
	}

	pub fn set_busy(&mut self, busy: bool) {
		match self.model.as_ref().map(|model| model.try_borrow_mut()) {
			Some(Ok(mut model)) => model.set_busy(busy),
			Some(Err(_)) => warn!("{} sub-model is in use, busy flag not updated", T::KIND),
			None => {}
		}
	}

	pub const fn model(&self) -> Option<&ModelRef<T>> {
		self.model.as_ref()
	}

	/// Whether the bound link is a display-only reference
	pub fn is_reference(&self) -> bool {
		self.link.as_ref().is_some_and(|link| !link.is_row())
	}

	/// Follows `next`. The sub-model is replaced only when the related record
	/// changed identity and is not the same underlying row; the same row is
	/// refreshed in place instead. Returns whether anything changed.
	pub fn refresh(&mut self, next: Option<&Related<T>>) -> ModelResult<bool> {
		match (self.link.as_ref(), next) {
			(None, None) => Ok(false),
			(Some(current), Some(next)) if current.ptr_eq(next) => Ok(false),
			(Some(current), Some(next)) if current.record().same_row(next.record()) => {
				let changed = match &self.model {
					Some(model) => {
						let mut model = model
							.try_borrow_mut()
							.map_err(|_| ModelError::InUse(T::KIND))?;
						!model.refresh_from(next.record(), true)?.is_empty()
					}
					None => false,
				};
				self.link = Some(next.clone());
				Ok(changed)
			}
			(_, next) => {
				let follow = self.follow.take();
				*self = Self::bind(next)?;
				if let Some(follow) = follow {
					self.set_follow(follow);
				}
				Ok(true)
			}
		}
	}

	/// Link to the sub-model's current record, in the bound link's flavour
	pub fn current(&self) -> Option<Related<T>> {
		match (&self.link, &self.model) {
			(Some(link), Some(model)) => Some(link.with_record(model.borrow().record())),
			(link, _) => link.clone(),
		}
	}

	/// Writes the sub-model's current record into `slot` when it moved on.
	/// Returns whether the slot was rewritten.
	pub fn write_back<R: Entity>(
		&mut self,
		record: &mut Arc<R>,
		slot: fn(&mut R) -> &mut Option<Related<T>>,
		read: fn(&R) -> Option<&Related<T>>,
	) -> bool {
		let current = self.current();
		let unchanged = match (read(record), current.as_ref()) {
			(None, None) => true,
			(Some(left), Some(right)) => left.ptr_eq(right),
			_ => false,
		};
		if unchanged {
			return false;
		}
		*slot(Arc::make_mut(record)) = current.clone();
		self.link = current;
		true
	}
}

impl<T: Entity> fmt::Debug for SubModel<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SubModel")
			.field("entity", &T::KIND)
			.field("key", &self.link.as_ref().map(Related::key))
			.field("reference", &self.is_reference())
			.finish()
	}
}

type Observer = Box<dyn FnMut(&PropertyChange)>;

/// Observable wrapper around one record
pub struct Model<R: Entity> {
	id: ModelId,
	record: Arc<R>,
	derived: Vec<(&'static str, String)>,
	children: R::Children,
	busy: bool,
	observers: Vec<(Uuid, Observer)>,
	/// Set when this is the sub-model of another model
	owner: Option<Follow<R>>,
}

impl<R: Entity> Model<R> {
	/// Wraps a record. Deleted records cannot be wrapped.
	pub fn new(record: R) -> ModelResult<ModelRef<R>> {
		Self::wrap(Arc::new(record))
	}

	/// Wraps a shared record snapshot without copying it
	pub fn wrap(record: Arc<R>) -> ModelResult<ModelRef<R>> {
		if record.meta().is_deleted() {
			return Err(ModelError::Deleted(R::KIND));
		}

		let children = R::Children::bind(&*record)?;
		let derived = R::derived()
			.into_iter()
			.map(|derived| (derived.name, (derived.compute)(&record)))
			.collect();

		let model = Rc::new(RefCell::new(Self {
			id: Uuid::new_v4(),
			record,
			derived,
			children,
			busy: false,
			observers: Vec::new(),
			owner: None,
		}));
		R::Children::connect(&model);
		Ok(model)
	}

	pub const fn id(&self) -> ModelId {
		self.id
	}

	/// Current record snapshot
	pub fn record(&self) -> Arc<R> {
		Arc::clone(&self.record)
	}

	pub fn current(&self) -> &R {
		&self.record
	}

	pub fn key(&self) -> i32 {
		self.record.meta().key
	}

	pub fn row_state(&self) -> RowState {
		self.record.meta().row_state
	}

	pub const fn children(&self) -> &R::Children {
		&self.children
	}

	/// Value of a derived field
	pub fn derived(&self, name: &str) -> Option<&str> {
		self.derived
			.iter()
			.find(|(derived, _)| *derived == name)
			.map(|(_, value)| value.as_str())
	}

	pub const fn is_busy(&self) -> bool {
		self.busy
	}

	/// Sub-models follow the flag, so a running operation also locks the
	/// related records it carries
	pub fn set_busy(&mut self, busy: bool) {
		if self.busy != busy {
			self.busy = busy;
			self.children.set_busy(busy);
			self.notify(&[property::BUSY]);
		}
	}

	/// Registers an observer. It runs while the model is borrowed, so it
	/// must not borrow the model again.
	pub fn observe(&mut self, observer: impl FnMut(&PropertyChange) + 'static) -> Uuid {
		let id = Uuid::new_v4();
		self.observers.push((id, Box::new(observer)));
		id
	}

	pub fn unobserve(&mut self, id: Uuid) {
		self.observers.retain(|(observer, _)| *observer != id);
	}

	/// Edits `field` through `edit`. The record is copied first if a
	/// snapshot of it is shared, and an unmodified row becomes modified.
	pub fn edit(&mut self, field: &'static str, edit: impl FnOnce(&mut R)) -> ModelResult<()> {
		if self.record.meta().is_deleted() {
			return Err(ModelError::Deleted(R::KIND));
		}
		if self.busy {
			return Err(ModelError::Busy(R::KIND));
		}

		let record = Arc::make_mut(&mut self.record);
		let key = record.meta().key;
		edit(record);
		if record.meta().key != key {
			let offered = record.meta().key;
			record.meta_mut().key = key;
			return Err(ModelError::Rebind {
				entity: R::KIND,
				bound: key,
				offered,
			});
		}

		let mut changed = vec![field];
		if record.meta().row_state == RowState::Unmodified {
			record.meta_mut().row_state = RowState::Modified;
			changed.push(property::ROW_STATE);
		}

		let snapshot = Arc::clone(&self.record);
		changed.extend(self.children.refresh(&*snapshot)?);
		changed.extend(self.children.write_back(&mut self.record));
		self.finish(changed);
		Ok(())
	}

	/// Record to validate or persist, with edits made through sub-models
	/// written back into the related links
	pub fn snapshot(&mut self) -> Arc<R> {
		let changed = self.children.write_back(&mut self.record);
		if !changed.is_empty() {
			self.finish(changed);
		}
		Arc::clone(&self.record)
	}

	/// Applies a success event for this model's record: row state and the
	/// last-modified audit always, key and created audit on insert only, then
	/// the entity's own fields and related links.
	pub fn apply_success(&mut self, event: &EntityEvent<R>) -> ModelResult<Vec<&'static str>> {
		if !event.is_success() {
			return Err(ModelError::NotSuccess(event.kind()));
		}
		let source = event
			.payload()
			.as_record()
			.ok_or(ModelError::RecordPayloadRequired)?;

		let (bound, offered) = (self.key(), source.meta().key);
		if bound != 0 && bound != offered {
			return Err(ModelError::Rebind {
				entity: R::KIND,
				bound,
				offered,
			});
		}

		let changed = self.refresh_from(source, event.kind() == EventKind::InsertSuccess)?;
		debug!(
			"{} model {} applied {} ({} properties changed)",
			R::KIND,
			self.id,
			event.kind(),
			changed.len()
		);
		Ok(changed)
	}

	/// Refreshes from a fresher snapshot of the same row
	fn refresh_from(&mut self, source: &Arc<R>, identity: bool) -> ModelResult<Vec<&'static str>> {
		if Arc::ptr_eq(&self.record, source) {
			return Ok(Vec::new());
		}

		let mut changed = Vec::new();
		let record = Arc::make_mut(&mut self.record);
		let (meta, fresh) = (record.meta_mut(), source.meta());
		if meta.row_state != fresh.row_state {
			meta.row_state = fresh.row_state;
			changed.push(property::ROW_STATE);
		}
		if meta.modified != fresh.modified {
			meta.modified = fresh.modified.clone();
			changed.push(property::MODIFIED);
		}
		if identity {
			if meta.key != fresh.key {
				meta.key = fresh.key;
				changed.push(property::KEY);
			}
			if meta.created != fresh.created {
				meta.created = fresh.created.clone();
				changed.push(property::CREATED);
			}
		}
		changed.extend(record.refresh_fields(source));

		changed.extend(self.children.refresh(&**source)?);
		changed.extend(self.children.write_back(&mut self.record));
		Ok(self.finish(changed))
	}

	/// Registers the sub-model behind `link` so that its edits rewrite the
	/// link and recompute the derived fields depending on it
	pub fn connect_child<T: Entity>(
		this: &ModelRef<R>,
		link: &'static str,
		child: fn(&mut R::Children) -> &mut SubModel<T>,
		slot: fn(&mut R) -> &mut Option<Related<T>>,
	) {
		let owner = Rc::downgrade(this);
		let follow: Follow<T> = Rc::new(move |record: &Arc<T>| {
			let Some(owner) = owner.upgrade() else {
				return;
			};
			// Already borrowed means the owner itself is driving the change
			if let Ok(mut owner) = owner.try_borrow_mut() {
				owner.follow_child(link, child, slot, record);
			};
		});

		let mut model = this.borrow_mut();
		child(&mut model.children).set_follow(follow);
	}

	fn follow_child<T: Entity>(
		&mut self,
		link: &'static str,
		child: fn(&mut R::Children) -> &mut SubModel<T>,
		slot: fn(&mut R) -> &mut Option<Related<T>>,
		record: &Arc<T>,
	) {
		let sub = child(&mut self.children);
		let Some(current) = sub.link.as_ref() else {
			return;
		};
		if Arc::ptr_eq(current.record(), record) {
			return;
		}
		let next = current.with_record(Arc::clone(record));
		sub.link = Some(next.clone());
		*slot(Arc::make_mut(&mut self.record)) = Some(next);
		self.finish(vec![link]);
	}

	/// Recomputes derived fields and notifies observers and the owning
	/// model. Returns every property that changed, derived ones included.
	fn finish(&mut self, mut changed: Vec<&'static str>) -> Vec<&'static str> {
		changed.dedup();
		for derived in R::derived() {
			if !derived.depends_on.iter().any(|field| changed.contains(field)) {
				continue;
			}
			let value = (derived.compute)(&self.record);
			match self.derived.iter_mut().find(|(name, _)| *name == derived.name) {
				Some((_, current)) if *current == value => {}
				Some((_, current)) => {
					*current = value;
					changed.push(derived.name);
				}
				None => {
					self.derived.push((derived.name, value));
					changed.push(derived.name);
				}
			}
		}
		self.notify(&changed);
		if let Some(owner) = &self.owner {
			owner(&self.record);
		}
		changed
	}

	fn notify(&mut self, changed: &[&'static str]) {
		let model = self.id;
		for (_, observer) in &mut self.observers {
			for &property in changed {
				observer(&PropertyChange { model, property });
			}
		}
	}

	/// Keeps the model in step with saves of the same row made by other
	/// models. Events addressed to this model are left to its initiator.
	pub fn attach(this: &ModelRef<R>, bus: &EventBus) -> Subscription {
		let weak: Weak<RefCell<Self>> = Rc::downgrade(this);
		let id = this.borrow().id;

		bus.on::<R>(EventKind::Success, move |event| {
			if event.route().target == Some(id) {
				return;
			}
			let (Some(model), Some(source)) = (weak.upgrade(), event.payload().as_record()) else {
				return;
			};
			let Ok(mut model) = model.try_borrow_mut() else {
				warn!("{} model {} is in use, skipping {}", R::KIND, id, event.kind());
				return;
			};
			if !model.record.same_row(source) {
				return;
			}
			if let Err(e) = model.refresh_from(source, false) {
				warn!("{} model {} failed to follow {}: {}", R::KIND, id, event.kind(), e);
			}
		})
	}
}

impl<R: Entity> fmt::Debug for Model<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Model")
			.field("id", &self.id)
			.field("record", &self.record)
			.field("derived", &self.derived)
			.field("busy", &self.busy)
			.field("observers", &self.observers.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		domain::{Address, Audit, City, Country, Customer, RecordMeta},
		infra::event::{Payload, Route},
	};
	use pretty_assertions::assert_eq;

	fn saved<R: Entity>(mut record: R, key: i32) -> R {
		*record.meta_mut() = RecordMeta::persisted(key, Audit::now("tests"), Audit::now("tests"));
		record
	}

	fn success<R: Entity>(kind: EventKind, record: R) -> EntityEvent<R> {
		EntityEvent::success(kind, Payload::Record(Arc::new(record)), Route::new("tests")).unwrap()
	}

	fn recording<R: Entity>(model: &ModelRef<R>) -> Rc<RefCell<Vec<&'static str>>> {
		let log = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&log);
		model
			.borrow_mut()
			.observe(move |change| sink.borrow_mut().push(change.property));
		log
	}

	#[test]
	fn deleted_records_cannot_be_wrapped() {
		let mut country = saved(Country::new("Norway"), 1);
		country.meta.row_state = RowState::Deleted;

		assert_eq!(
			Model::new(country).unwrap_err(),
			ModelError::Deleted(EntityKind::Country)
		);
	}

	#[test]
	fn edits_copy_shared_snapshots() {
		let model = Model::new(saved(Country::new("Norway"), 1)).unwrap();
		let snapshot = model.borrow().record();

		model
			.borrow_mut()
			.edit("name", |country| country.name = "Sweden".into())
			.unwrap();

		assert_eq!(snapshot.name, "Norway");
		assert_eq!(snapshot.meta.row_state, RowState::Unmodified);
		assert_eq!(model.borrow().current().name, "Sweden");
		assert_eq!(model.borrow().row_state(), RowState::Modified);
	}

	#[test]
	fn edits_cannot_change_the_key() {
		let model = Model::new(saved(Country::new("Norway"), 1)).unwrap();

		let result = model.borrow_mut().edit("name", |country| country.meta.key = 2);

		assert!(matches!(result, Err(ModelError::Rebind { bound: 1, offered: 2, .. })));
		assert_eq!(model.borrow().key(), 1);
	}

	#[test]
	fn insert_success_sets_identity_and_update_only_modified_audit() {
		let model = Model::new(Country::new("Norway")).unwrap();
		let log = recording(&model);

		let inserted = saved(Country::new("Norway"), 7);
		let created = inserted.meta.created.clone();
		model
			.borrow_mut()
			.apply_success(&success(EventKind::InsertSuccess, inserted.clone()))
			.unwrap();

		assert_eq!(model.borrow().key(), 7);
		assert_eq!(model.borrow().current().meta.created, created);
		assert_eq!(model.borrow().row_state(), RowState::Unmodified);
		assert!(log.borrow().contains(&property::KEY));

		let mut updated = inserted;
		updated.meta.created = Some(Audit::now("someone else"));
		updated.meta.modified = Some(Audit::now("updater"));
		let modified = updated.meta.modified.clone();
		model
			.borrow_mut()
			.apply_success(&success(EventKind::UpdateSuccess, updated))
			.unwrap();

		assert_eq!(model.borrow().key(), 7);
		assert_eq!(model.borrow().current().meta.created, created);
		assert_eq!(model.borrow().current().meta.modified, modified);
	}

	#[test]
	fn persisted_identity_cannot_be_rebound() {
		let model = Model::new(saved(Country::new("Norway"), 5)).unwrap();

		let result = model
			.borrow_mut()
			.apply_success(&success(EventKind::UpdateSuccess, saved(Country::new("Norway"), 6)));

		assert_eq!(
			result.unwrap_err(),
			ModelError::Rebind {
				entity: EntityKind::Country,
				bound: 5,
				offered: 6
			}
		);
	}

	#[test]
	fn failure_events_are_not_applied() {
		let model = Model::new(Country::new("Norway")).unwrap();
		let failed = EntityEvent::failed(
			EventKind::InsertFaulted,
			Payload::Record(Arc::new(Country::new("Norway"))),
			None,
			None,
			Route::new("tests"),
		)
		.unwrap();

		assert_eq!(
			model.borrow_mut().apply_success(&failed).unwrap_err(),
			ModelError::NotSuccess(EventKind::InsertFaulted)
		);
	}

	#[test]
	fn same_row_sub_model_is_kept() {
		let country = Arc::new(saved(Country::new("Norway"), 5));
		let city = saved(City::new("Oslo", Related::Row(Arc::clone(&country))), 1);
		let model = Model::new(city.clone()).unwrap();
		let before = Rc::clone(model.borrow().children().country.model().unwrap());

		let mut fresher = (*country).clone();
		fresher.name = "Noreg".into();
		let mut updated = city.clone();
		updated.country = Some(Related::Row(Arc::new(fresher)));
		model
			.borrow_mut()
			.apply_success(&success(EventKind::UpdateSuccess, updated))
			.unwrap();

		let after = Rc::clone(model.borrow().children().country.model().unwrap());
		assert!(Rc::ptr_eq(&before, &after));
		assert_eq!(after.borrow().current().name, "Noreg");
		assert_eq!(model.borrow().derived("country_name"), Some("Noreg"));

		let mut moved = city;
		moved.country = Some(Related::Row(Arc::new(saved(Country::new("Sweden"), 6))));
		model
			.borrow_mut()
			.apply_success(&success(EventKind::UpdateSuccess, moved))
			.unwrap();

		let replaced = Rc::clone(model.borrow().children().country.model().unwrap());
		assert!(!Rc::ptr_eq(&before, &replaced));
		assert_eq!(model.borrow().derived("country_name"), Some("Sweden"));
	}

	#[test]
	fn derived_fields_follow_their_dependencies() {
		let country = Related::Reference(Arc::new(saved(Country::new("Norway"), 1)));
		let city = Related::Row(Arc::new(saved(City::new("Oslo", country), 2)));
		let model = Model::new(Address::new("Storgata 1", city)).unwrap();
		let log = recording(&model);

		assert_eq!(model.borrow().derived("address_lines"), Some("Storgata 1"));

		model
			.borrow_mut()
			.edit("address2", |address| address.address2 = "Leil. 3".into())
			.unwrap();
		assert_eq!(model.borrow().derived("address_lines"), Some("Storgata 1\nLeil. 3"));

		model
			.borrow_mut()
			.edit("postal_code", |address| address.postal_code = "0150".into())
			.unwrap();
		assert_eq!(
			model.borrow().derived("city_zip_country"),
			Some("Oslo, 0150, Norway")
		);
		assert_eq!(
			*log.borrow(),
			vec!["address2", "address_lines", "postal_code", "city_zip_country"]
		);
	}

	fn saved_customer() -> ModelRef<Customer> {
		let country = Related::Row(Arc::new(saved(Country::new("Norway"), 1)));
		let city = Related::Row(Arc::new(saved(City::new("Oslo", country), 2)));
		let address = Related::Row(Arc::new(saved(Address::new("Storgata 1", city), 3)));
		Model::new(saved(Customer::new("Kari", address), 4)).unwrap()
	}

	#[test]
	fn sub_model_edits_reach_the_owner_at_once() {
		let model = saved_customer();
		let log = recording(&model);

		let address_model = Rc::clone(model.borrow().children().address.model().unwrap());
		address_model
			.borrow_mut()
			.edit("address1", |address| address.address1 = "Storgata 9".into())
			.unwrap();

		assert_eq!(model.borrow().derived("address_text"), Some("Storgata 9, Oslo"));
		assert_eq!(*log.borrow(), vec!["address", "address_text"]);
		{
			let model = model.borrow();
			let linked = model.current().address.as_ref().unwrap().record();
			assert_eq!(linked.address1, "Storgata 9");
			assert_eq!(linked.meta.row_state, RowState::Modified);
			assert_eq!(model.row_state(), RowState::Unmodified);
		}

		let snapshot = model.borrow_mut().snapshot();
		assert_eq!(snapshot.address.as_ref().unwrap().record().address1, "Storgata 9");
	}

	#[test]
	fn edits_two_links_away_reach_the_owner() {
		let model = saved_customer();
		let address_model = Rc::clone(model.borrow().children().address.model().unwrap());
		let city_model = Rc::clone(address_model.borrow().children().city.model().unwrap());

		city_model
			.borrow_mut()
			.edit("name", |city| city.name = "Bergen".into())
			.unwrap();

		assert_eq!(
			address_model.borrow().derived("city_zip_country"),
			Some("Bergen, Norway")
		);
		assert_eq!(model.borrow().derived("address_text"), Some("Storgata 1, Bergen"));
	}

	#[test]
	fn busy_models_and_their_sub_models_refuse_edits() {
		let model = saved_customer();
		let address_model = Rc::clone(model.borrow().children().address.model().unwrap());

		model.borrow_mut().set_busy(true);
		assert!(address_model.borrow().is_busy());
		assert_eq!(
			model
				.borrow_mut()
				.edit("name", |customer| customer.name = "Kari Olsen".into()),
			Err(ModelError::Busy(EntityKind::Customer))
		);
		assert_eq!(
			address_model
				.borrow_mut()
				.edit("address1", |address| address.address1 = "Storgata 9".into()),
			Err(ModelError::Busy(EntityKind::Address))
		);
		assert_eq!(model.borrow().current().name, "Kari");

		model.borrow_mut().set_busy(false);
		assert!(!address_model.borrow().is_busy());
		model
			.borrow_mut()
			.edit("name", |customer| customer.name = "Kari Olsen".into())
			.unwrap();
	}

	#[test]
	fn attached_models_follow_saves_from_other_models() {
		let bus = EventBus::new();
		let model = Model::new(saved(Country::new("Norway"), 3)).unwrap();
		let _subscription = Model::attach(&model, &bus);

		let mut elsewhere = saved(Country::new("Noreg"), 3);
		elsewhere.meta.modified = Some(Audit::now("other view"));
		bus.emit(success(EventKind::UpdateSuccess, elsewhere.clone()));
		assert_eq!(model.borrow().current().name, "Noreg");

		let own = model.borrow().id();
		elsewhere.name = "Norge".into();
		let addressed = EntityEvent::success(
			EventKind::UpdateSuccess,
			Payload::Record(Arc::new(elsewhere)),
			Route::new("tests").to(own),
		)
		.unwrap();
		bus.emit(addressed);
		assert_eq!(model.borrow().current().name, "Noreg");

		bus.emit(success(EventKind::UpdateSuccess, saved(Country::new("Sverige"), 4)));
		assert_eq!(model.borrow().current().name, "Noreg");
	}

	#[test]
	fn busy_flag_is_observable() {
		let model = Model::new(Country::new("Norway")).unwrap();
		let log = recording(&model);

		model.borrow_mut().set_busy(true);
		model.borrow_mut().set_busy(true);
		model.borrow_mut().set_busy(false);

		assert_eq!(*log.borrow(), vec![property::BUSY, property::BUSY]);
	}
}
