//! Validation cascade and failure event tests
//!
//! Pure in-memory checks: no database, no bus.

mod helpers;

use helpers::{new_appointment, new_customer};
use pretty_assertions::assert_eq;
use sched_core::{
	domain::{
		validation::{validate_for_save, validate_record},
		Address, City, Country, Customer, EntityKind, Related, RowState, User,
	},
	infra::{
		event::{
			Cause, EntityEvent, EventError, EventKind, Payload, Route, OPERATION_CANCELED,
			UNKNOWN_ERROR,
		},
		i18n::ResourceBundle,
	},
};
use std::{io, sync::Arc};

const BASE_FAILURE_KINDS: [EventKind; 6] = [
	EventKind::Any,
	EventKind::Failed,
	EventKind::SaveFailed,
	EventKind::InsertFailed,
	EventKind::UpdateFailed,
	EventKind::DeleteFailed,
];

fn route() -> Route {
	Route::new("tests")
}

/// Every base failure kind is refused for the given record's entity
macro_rules! assert_base_kinds_refused {
	($($record:expr),+ $(,)?) => {
		$(
			for kind in BASE_FAILURE_KINDS {
				let result = EntityEvent::failed(
					kind,
					Payload::Record(Arc::new($record.clone())),
					Some("boom".to_string()),
					None,
					route(),
				);
				assert!(
					matches!(result, Err(EventError::InvalidArgument(_))),
					"{kind} was accepted"
				);
			}
		)+
	};
}

#[test]
fn failed_events_refuse_base_kinds_for_every_entity() {
	let customer = new_customer("Kari Nordmann");
	let address = (**customer.address.as_ref().unwrap().record()).clone();
	let city = (**address.city.as_ref().unwrap().record()).clone();
	let user = User::new("admin", "secret");
	let appointment = new_appointment(
		Related::Reference(Arc::new(customer.clone())),
		Related::Reference(Arc::new(user.clone())),
	);

	assert_base_kinds_refused!(
		Country::new("Norway"),
		city,
		address,
		customer,
		user,
		appointment,
	);
}

#[test]
fn failure_messages_fall_back_in_order() {
	let payload = || Payload::Record(Arc::new(Country::new("Norway")));

	let blank = EntityEvent::failed(
		EventKind::InsertFaulted,
		payload(),
		Some("   ".to_string()),
		None,
		route(),
	)
	.unwrap();
	assert_eq!(blank.message(), Some(UNKNOWN_ERROR));

	let cause: Cause = Arc::new(io::Error::new(io::ErrorKind::Other, "disk full"));
	let from_cause =
		EntityEvent::failed(EventKind::UpdateFaulted, payload(), None, Some(cause), route())
			.unwrap();
	assert_eq!(from_cause.message(), Some("disk full"));

	let canceled = EntityEvent::canceled(EventKind::DeleteCanceled, payload(), None, route()).unwrap();
	assert_eq!(canceled.message(), Some(OPERATION_CANCELED));
	assert!(canceled.failure().unwrap().cause().is_none());
}

#[test]
fn deleted_record_fails_regardless_of_its_fields() {
	let bundle = ResourceBundle::default();

	let mut customer = new_customer("");
	customer.meta.key = 12;
	customer.meta.row_state = RowState::Deleted;

	let event = validate_for_save(&Arc::new(customer), &bundle, route()).unwrap();
	assert_eq!(event.kind(), EventKind::UpdateInvalid);
	assert_eq!(event.message(), Some("Customer has already been deleted"));
}

#[test]
fn valid_graph_passes_and_validation_is_repeatable() {
	let bundle = ResourceBundle::default();

	let valid = new_customer("Kari Nordmann");
	assert_eq!(validate_record(&valid, &bundle), None);
	assert_eq!(validate_record(&valid, &bundle), None);

	let invalid = new_customer("");
	let first = validate_record(&invalid, &bundle);
	assert!(first.is_some());
	assert_eq!(validate_record(&invalid, &bundle), first);
}

#[test]
fn blank_customer_name_kind_follows_row_state() {
	let bundle = ResourceBundle::default();

	let new = Arc::new(new_customer(""));
	let event = validate_for_save(&new, &bundle, route()).unwrap();
	assert_eq!(event.kind(), EventKind::InsertInvalid);
	assert_eq!(event.message(), Some("Customer name not defined"));
	assert!(event.payload().as_record().is_some_and(|record| Arc::ptr_eq(record, &new)));

	let mut stored = new_customer("");
	stored.meta.key = 3;
	stored.meta.row_state = RowState::Modified;
	let event = validate_for_save(&Arc::new(stored), &bundle, route()).unwrap();
	assert_eq!(event.kind(), EventKind::UpdateInvalid);
	assert_eq!(event.message(), Some("Customer name not defined"));
}

#[test]
fn failure_deep_in_the_graph_names_every_link() {
	let bundle = ResourceBundle::default();

	let country = Related::Row(Arc::new(Country::new(" ")));
	let city = Related::Row(Arc::new(City::new("Oslo", country)));
	let customer = Customer::new(
		"Kari Nordmann",
		Related::Row(Arc::new(Address::new("Storgata 1", city))),
	);

	let violation = validate_record(&customer, &bundle).unwrap();
	assert_eq!(violation.message, "Country name not defined");
	assert_eq!(
		violation.path(),
		vec![
			EntityKind::Customer,
			EntityKind::Address,
			EntityKind::City,
			EntityKind::Country,
		]
	);
	assert_eq!(violation.root().field, Some("name"));
}

#[test]
fn read_only_references_are_trusted() {
	let bundle = ResourceBundle::default();

	let country = Related::Row(Arc::new(Country::new("Norway")));
	let city = Related::Row(Arc::new(City::new("Oslo", country)));
	let blank_street = Address::new("", city);
	let customer = Customer::new("Kari Nordmann", Related::Reference(Arc::new(blank_street)));

	assert_eq!(validate_record(&customer, &bundle), None);
}

#[test]
fn missing_link_is_reported_before_cascading() {
	let bundle = ResourceBundle::default();

	let mut customer = new_customer("Kari Nordmann");
	customer.address = None;

	let violation = validate_record(&customer, &bundle).unwrap();
	assert_eq!(violation.message, "Address not specified");
	assert_eq!(violation.field, Some("address"));
	assert_eq!(violation.path(), vec![EntityKind::Customer]);
}
