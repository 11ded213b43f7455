//! Record validation
//!
//! A record is checked in a fixed order: already deleted, required fields,
//! maximum lengths, other field constraints, then each related link in cascade
//! order (presence first, then the related row itself). The first failure wins.
//! Related rows are validated recursively; read-only references are trusted.

use super::{is_blank, Entity, EntityKind, ModelRef, Related};
use crate::infra::{
	event::{EntityEvent, EventKind, Payload, Route},
	i18n::{keys, Messages},
};
use serde::Serialize;
use std::{fmt, rc::Rc, sync::Arc};

/// Field accessor used by rules
pub type Field<R> = fn(&R) -> &str;

enum Check<R> {
	Required(Field<R>),
	EitherRequired(Field<R>, Field<R>),
	MaxLength(Field<R>, usize),
	Constraint(fn(&R) -> bool),
}

/// Rule categories, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Category {
	Required,
	Length,
	Constraint,
}

/// One own-field rule of an entity
pub struct Rule<R> {
	field: &'static str,
	message: &'static str,
	check: Check<R>,
}

impl<R> Rule<R> {
	pub fn required(field: &'static str, message: &'static str, value: Field<R>) -> Self {
		Self {
			field,
			message,
			check: Check::Required(value),
		}
	}

	/// At least one of two fields must be non-blank
	pub fn either_required(
		field: &'static str,
		message: &'static str,
		first: Field<R>,
		second: Field<R>,
	) -> Self {
		Self {
			field,
			message,
			check: Check::EitherRequired(first, second),
		}
	}

	/// Length in characters, blank values included
	pub fn max_length(
		field: &'static str,
		message: &'static str,
		value: Field<R>,
		max: usize,
	) -> Self {
		Self {
			field,
			message,
			check: Check::MaxLength(value, max),
		}
	}

	pub fn constraint(field: &'static str, message: &'static str, holds: fn(&R) -> bool) -> Self {
		Self {
			field,
			message,
			check: Check::Constraint(holds),
		}
	}

	pub const fn field(&self) -> &'static str {
		self.field
	}

	pub const fn message_key(&self) -> &'static str {
		self.message
	}

	const fn category(&self) -> Category {
		match &self.check {
			Check::Required(_) | Check::EitherRequired(..) => Category::Required,
			Check::MaxLength(..) => Category::Length,
			Check::Constraint(_) => Category::Constraint,
		}
	}

	fn passes(&self, record: &R) -> bool {
		match &self.check {
			Check::Required(value) => !is_blank(value(record)),
			Check::EitherRequired(first, second) => {
				!is_blank(first(record)) || !is_blank(second(record))
			}
			Check::MaxLength(value, max) => value(record).chars().count() <= *max,
			Check::Constraint(holds) => holds(record),
		}
	}
}

impl<R> fmt::Debug for Rule<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Rule")
			.field("field", &self.field)
			.field("message", &self.message)
			.field("category", &self.category())
			.finish()
	}
}

/// A related record that can be validated in a cascade
pub trait Cascade {
	fn cascade(&self, messages: &dyn Messages) -> Option<Violation>;
}

impl<T: Entity> Cascade for Related<T> {
	fn cascade(&self, messages: &dyn Messages) -> Option<Violation> {
		match self {
			Self::Row(record) => validate_record(record.as_ref(), messages),
			Self::Reference(_) => None,
		}
	}
}

/// A required link from a record to a related parent record
pub struct Link<'a> {
	field: &'static str,
	missing: &'static str,
	target: Option<&'a dyn Cascade>,
}

impl<'a> Link<'a> {
	/// `missing` is the message key reported when the link is absent
	pub fn required<T: Entity>(
		field: &'static str,
		missing: &'static str,
		related: Option<&'a Related<T>>,
	) -> Self {
		Self {
			field,
			missing,
			target: related.map(|related| related as &dyn Cascade),
		}
	}

	pub const fn field(&self) -> &'static str {
		self.field
	}
}

/// The first rule a record broke. A failure inside a related record is
/// reported by the outer record, naming the link and nesting the inner one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
	pub entity: EntityKind,
	pub field: Option<&'static str>,
	pub message: String,
	pub related: Option<Box<Violation>>,
}

impl Violation {
	pub fn new(entity: EntityKind, field: Option<&'static str>, message: impl Into<String>) -> Self {
		Self {
			entity,
			field,
			message: message.into(),
			related: None,
		}
	}

	/// Outer violation for a failure found through link `field`
	pub fn nested(entity: EntityKind, field: &'static str, inner: Violation) -> Self {
		Self {
			entity,
			field: Some(field),
			message: inner.message.clone(),
			related: Some(Box::new(inner)),
		}
	}

	/// Innermost violation of the chain
	pub fn root(&self) -> &Violation {
		let mut current = self;
		while let Some(inner) = current.related.as_deref() {
			current = inner;
		}
		current
	}

	/// Entity kinds from the validated record down to the failing one
	pub fn path(&self) -> Vec<EntityKind> {
		let mut path = vec![self.entity];
		let mut current = self;
		while let Some(inner) = current.related.as_deref() {
			path.push(inner.entity);
			current = inner;
		}
		path
	}
}

impl fmt::Display for Violation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.message)
	}
}

/// Validates a record and its related rows, returning the first violation
pub fn validate_record<R: Entity>(record: &R, messages: &dyn Messages) -> Option<Violation> {
	if record.meta().is_deleted() {
		return Some(Violation::new(
			R::KIND,
			None,
			messages.get_string(R::KIND.already_deleted_key()),
		));
	}

	let mut rules = R::rules();
	rules.sort_by_key(Rule::category);
	if let Some(rule) = rules.iter().find(|rule| !rule.passes(record)) {
		return Some(Violation::new(
			R::KIND,
			Some(rule.field),
			messages.get_string(rule.message),
		));
	}

	for link in record.links() {
		let Some(target) = link.target else {
			return Some(Violation::new(
				R::KIND,
				Some(link.field),
				messages.get_string(link.missing),
			));
		};
		if let Some(inner) = target.cascade(messages) {
			return Some(Violation::nested(R::KIND, link.field, inner));
		}
	}

	None
}

/// Validates a record about to be inserted or updated.
///
/// Returns `None` when the record can be saved, otherwise the
/// `InsertInvalid`/`UpdateInvalid` event describing why not.
pub fn validate_for_save<R: Entity>(
	record: &Arc<R>,
	messages: &dyn Messages,
	route: Route,
) -> Option<EntityEvent<R>> {
	let violation = validate_record(record.as_ref(), messages)?;
	Some(EntityEvent::rejected(
		EventKind::save_invalid(record.meta().row_state),
		Payload::Record(Arc::clone(record)),
		violation,
		route,
	))
}

/// Like [`validate_for_save`], with the model itself as the event payload.
///
/// Related sub-models are written back into the record first, so edits made
/// through them are validated too. The model must not be borrowed.
pub fn validate_model<R: Entity>(
	model: &ModelRef<R>,
	messages: &dyn Messages,
	route: Route,
) -> Option<EntityEvent<R>> {
	let record = model.borrow_mut().snapshot();
	let violation = validate_record(record.as_ref(), messages)?;
	Some(EntityEvent::rejected(
		EventKind::save_invalid(record.meta().row_state),
		Payload::Model(Rc::clone(model)),
		violation,
		route,
	))
}

/// Checks a record can be deleted. Dependent rows are checked later by the
/// store, inside the delete transaction.
pub fn validate_for_delete<R: Entity>(record: &R, messages: &dyn Messages) -> Option<Violation> {
	let meta = record.meta();
	if meta.is_deleted() {
		return Some(Violation::new(
			R::KIND,
			None,
			messages.get_string(R::KIND.already_deleted_key()),
		));
	}
	if meta.is_new() {
		return Some(Violation::new(
			R::KIND,
			None,
			messages.get_string(keys::RECORD_NOT_SAVED),
		));
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		domain::{Address, City, Country, Customer, RowState},
		infra::i18n::ResourceBundle,
	};
	use pretty_assertions::assert_eq;

	fn persisted<R: Entity>(mut record: R, key: i32) -> R {
		let meta = record.meta_mut();
		meta.key = key;
		meta.row_state = RowState::Unmodified;
		record
	}

	fn customer_graph() -> Customer {
		let country = persisted(Country::new("Norway"), 1);
		let city = persisted(City::new("Oslo", Related::Row(Arc::new(country))), 2);
		let mut address = Address::new("Karl Johans gate 1", Related::Row(Arc::new(city)));
		address.postal_code = "0154".into();
		Customer::new("Ola Nordmann", Related::Row(Arc::new(address)))
	}

	#[test]
	fn valid_graph_passes() {
		let messages = ResourceBundle::default();
		assert_eq!(validate_record(&customer_graph(), &messages), None);
	}

	#[test]
	fn required_rules_run_before_length_rules() {
		let messages = ResourceBundle::default();
		let country = Related::Reference(Arc::new(Country::new("Norway")));
		let city = City::new("Oslo", country);
		let mut address = Address::new("", Related::Row(Arc::new(city)));
		address.postal_code = "12345678901".into();

		let violation = validate_record(&address, &messages).unwrap();

		assert_eq!(violation.message, "Street address not defined");
		assert_eq!(violation.field, Some("address1"));
	}

	#[test]
	fn missing_link_is_reported_before_cascade() {
		let messages = ResourceBundle::default();
		let mut city = City::new("Oslo", Related::Row(Arc::new(Country::new(""))));
		city.country = None;

		let violation = validate_record(&city, &messages).unwrap();

		assert_eq!(violation.message, "Country not specified");
		assert!(violation.related.is_none());
	}

	#[test]
	fn nested_failure_keeps_inner_message_and_path() {
		let messages = ResourceBundle::default();
		let city = City::new("Oslo", Related::Row(Arc::new(Country::new("  "))));
		let address = Address::new("Storgata 2", Related::Row(Arc::new(city)));
		let customer = Customer::new("Kari", Related::Row(Arc::new(address)));

		let violation = validate_record(&customer, &messages).unwrap();

		assert_eq!(violation.message, "Country name not defined");
		assert_eq!(violation.field, Some("address"));
		assert_eq!(
			violation.path(),
			vec![
				EntityKind::Customer,
				EntityKind::Address,
				EntityKind::City,
				EntityKind::Country
			]
		);
		assert_eq!(violation.root().entity, EntityKind::Country);
	}

	#[test]
	fn references_are_trusted() {
		let messages = ResourceBundle::default();
		let city = City::new("Oslo", Related::Reference(Arc::new(Country::new(""))));

		assert_eq!(validate_record(&city, &messages), None);
	}

	#[test]
	fn save_failure_kind_follows_row_state() {
		let messages = ResourceBundle::default();
		let mut customer = customer_graph();
		customer.name.clear();

		let new =
			validate_for_save(&Arc::new(customer.clone()), &messages, Route::new("tests")).unwrap();
		assert_eq!(new.kind(), EventKind::InsertInvalid);
		assert_eq!(new.message(), Some("Customer name not defined"));

		let existing = Arc::new(persisted(customer, 9));
		let failed = validate_for_save(&existing, &messages, Route::new("tests")).unwrap();
		assert_eq!(failed.kind(), EventKind::UpdateInvalid);
		assert!(failed
			.payload()
			.as_record()
			.is_some_and(|record| Arc::ptr_eq(record, &existing)));
	}

	#[test]
	fn delete_requires_a_saved_live_record() {
		let messages = ResourceBundle::default();
		let mut country = Country::new("Norway");

		let violation = validate_for_delete(&country, &messages).unwrap();
		assert_eq!(violation.message, "Record has not been saved");

		country.meta.key = 3;
		country.meta.row_state = RowState::Unmodified;
		assert_eq!(validate_for_delete(&country, &messages), None);

		country.meta.row_state = RowState::Deleted;
		let violation = validate_for_delete(&country, &messages).unwrap();
		assert_eq!(violation.message, "Country has already been deleted");
	}
}
