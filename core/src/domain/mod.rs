//! Core domain records - the rows the scheduler manages
//!
//! Every entity kind is a plain record struct implementing [`Entity`]. The trait
//! carries the per-entity configuration (field rules, related links, derived
//! fields, field refresh) that the generic validation, model and event code
//! is parameterized by.

/// Copies the listed fields from `$source` into `$target`, returning the
/// names of those that changed
macro_rules! copy_changed {
	($target:expr, $source:expr, $($field:ident),+ $(,)?) => {{
		let mut changed = Vec::new();
		$(
			if $target.$field != $source.$field {
				$target.$field = $source.$field.clone();
				changed.push(stringify!($field));
			}
		)+
		changed
	}};
}

pub mod address;
pub mod appointment;
pub mod city;
pub mod country;
pub mod customer;
pub mod model;
pub mod user;
pub mod validation;

use crate::infra::event::{EntityEvent, Event};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

// Re-export commonly used types
pub use address::Address;
pub use appointment::Appointment;
pub use city::City;
pub use country::Country;
pub use customer::Customer;
pub use model::{Children, Derived, Model, ModelError, ModelId, ModelRef, NoChildren, SubModel};
pub use user::User;
pub use validation::{Link, Rule, Violation};

/// The six kinds of rows the scheduler persists
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
	strum::AsRefStr,
)]
pub enum EntityKind {
	Address,
	City,
	Country,
	Customer,
	Appointment,
	User,
}

impl EntityKind {
	/// Database table backing this kind
	pub const fn table_name(self) -> &'static str {
		match self {
			Self::Address => "address",
			Self::City => "city",
			Self::Country => "country",
			Self::Customer => "customer",
			Self::Appointment => "appointment",
			Self::User => "users",
		}
	}

	/// Message key for "<Entity> has already been deleted"
	pub const fn already_deleted_key(self) -> &'static str {
		match self {
			Self::Address => "addressAlreadyDeleted",
			Self::City => "cityAlreadyDeleted",
			Self::Country => "countryAlreadyDeleted",
			Self::Customer => "customerAlreadyDeleted",
			Self::Appointment => "appointmentAlreadyDeleted",
			Self::User => "userAlreadyDeleted",
		}
	}
}

/// Row lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum RowState {
	/// Not yet inserted
	New,
	Unmodified,
	Modified,
	/// Terminal
	Deleted,
}

/// Who touched a row and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
	pub by: String,
	pub at: DateTime<Utc>,
}

impl Audit {
	pub fn now(by: impl Into<String>) -> Self {
		Self {
			by: by.into(),
			at: Utc::now(),
		}
	}
}

/// Identity, lifecycle and audit columns shared by every record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
	/// Primary key, `0` until inserted
	pub key: i32,
	pub row_state: RowState,
	pub created: Option<Audit>,
	pub modified: Option<Audit>,
}

impl RecordMeta {
	/// Metadata for a row that has not been inserted yet
	pub const fn new_row() -> Self {
		Self {
			key: 0,
			row_state: RowState::New,
			created: None,
			modified: None,
		}
	}

	/// Metadata for a row read back from the database
	pub fn persisted(key: i32, created: Audit, modified: Audit) -> Self {
		Self {
			key,
			row_state: RowState::Unmodified,
			created: Some(created),
			modified: Some(modified),
		}
	}

	pub const fn is_new(&self) -> bool {
		matches!(self.row_state, RowState::New)
	}

	pub const fn is_deleted(&self) -> bool {
		matches!(self.row_state, RowState::Deleted)
	}
}

impl Default for RecordMeta {
	fn default() -> Self {
		Self::new_row()
	}
}

/// A record's link to a related parent record
#[derive(Debug)]
pub enum Related<R> {
	/// Full row that takes part in validation and cascading saves
	Row(Arc<R>),
	/// Display-only reference, trusted as valid and never written back
	Reference(Arc<R>),
}

impl<R> Related<R> {
	pub const fn record(&self) -> &Arc<R> {
		match self {
			Self::Row(record) | Self::Reference(record) => record,
		}
	}

	pub const fn is_row(&self) -> bool {
		matches!(self, Self::Row(_))
	}

	/// Same link flavour pointing at another record
	pub fn with_record(&self, record: Arc<R>) -> Self {
		match self {
			Self::Row(_) => Self::Row(record),
			Self::Reference(_) => Self::Reference(record),
		}
	}

	/// Both links point at the very same record instance
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(self.record(), other.record())
	}
}

impl<R> Clone for Related<R> {
	fn clone(&self) -> Self {
		match self {
			Self::Row(record) => Self::Row(Arc::clone(record)),
			Self::Reference(record) => Self::Reference(Arc::clone(record)),
		}
	}
}

impl<R: Entity> Related<R> {
	pub fn key(&self) -> i32 {
		self.record().meta().key
	}
}

/// Per-entity configuration consumed by the generic record machinery
pub trait Entity: Clone + fmt::Debug + Send + Sync + 'static {
	const KIND: EntityKind;

	/// Sub-models a [`Model`] of this entity keeps for its related links
	type Children: Children<Self>;

	fn meta(&self) -> &RecordMeta;

	fn meta_mut(&mut self) -> &mut RecordMeta;

	/// Own-field rules, evaluated by category then declaration order
	fn rules() -> Vec<Rule<Self>> {
		Vec::new()
	}

	/// Related records in cascade order
	fn links(&self) -> Vec<Link<'_>> {
		Vec::new()
	}

	/// Read-only fields computed from the record
	fn derived() -> Vec<Derived<Self>> {
		Vec::new()
	}

	/// Copies the entity's own data fields from a fresher snapshot of the
	/// same row, returning the names of the fields that changed. Metadata and
	/// related links are handled by the caller.
	fn refresh_fields(&mut self, source: &Self) -> Vec<&'static str>;

	fn into_event(event: EntityEvent<Self>) -> Event;

	fn from_event(event: &Event) -> Option<&EntityEvent<Self>>;

	/// Same table and same assigned key. Rows without a key are never the
	/// same row as another instance.
	fn same_row(&self, other: &Self) -> bool {
		let (left, right) = (self.meta().key, other.meta().key);
		left != 0 && left == right
	}
}

/// True when the string is empty after trimming
pub(crate) fn is_blank(value: &str) -> bool {
	value.trim().is_empty()
}

/// Joins the non-blank parts with `separator`
pub(crate) fn join_non_blank<'a>(parts: impl IntoIterator<Item = &'a str>, separator: &str) -> String {
	parts
		.into_iter()
		.map(str::trim)
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join(separator)
}

#[cfg(test)]
mod tests {
	use super::*;
	use strum::IntoEnumIterator;

	#[test]
	fn same_row_requires_assigned_key() {
		let mut a = Country::new("Norway");
		let mut b = Country::new("Norway");
		assert!(!a.same_row(&b));

		a.meta.key = 5;
		b.meta.key = 5;
		assert!(a.same_row(&b));

		b.meta.key = 6;
		assert!(!a.same_row(&b));
	}

	#[test]
	fn every_kind_has_a_distinct_table() {
		let mut tables = EntityKind::iter().map(EntityKind::table_name).collect::<Vec<_>>();
		tables.sort_unstable();
		tables.dedup();
		assert_eq!(tables.len(), 6);
	}

	#[test]
	fn join_skips_blank_parts() {
		assert_eq!(join_non_blank(["Oslo", " ", "0150", "Norway"], ", "), "Oslo, 0150, Norway");
		assert_eq!(join_non_blank(["", "  "], ", "), "");
	}
}
