//! Shared setup for the integration tests
#![allow(dead_code)]

use chrono::{Duration, Utc};
use sched_core::{
	domain::{Address, Appointment, City, Country, Customer, Related, User},
	infra::{
		db::Database,
		event::{Event, EventBus, EventKind, Subscription, SubscriptionFilter},
	},
	AppConfig, CoreContext,
};
use std::{cell::RefCell, rc::Rc, sync::Arc};
use tempfile::TempDir;

/// Core context over a private in-memory database
pub struct TestContext {
	pub core: CoreContext,
	_dir: TempDir,
}

pub async fn context() -> TestContext {
	let dir = tempfile::tempdir().expect("temp dir");
	let config = AppConfig::default_with_dir(dir.path().to_path_buf());
	let db = Database::memory().await.expect("in-memory database");
	let core = CoreContext::with_database(config, db).expect("core context");
	TestContext { core, _dir: dir }
}

/// Customer living at a new address in a new city and country, nothing saved
pub fn new_customer(name: &str) -> Customer {
	let country = Related::Row(Arc::new(Country::new("Norway")));
	let city = Related::Row(Arc::new(City::new("Oslo", country)));
	let mut address = Address::new("Storgata 1", city);
	address.postal_code = "0155".to_string();
	address.phone = "+47 22 00 00 00".to_string();
	Customer::new(name, Related::Row(Arc::new(address)))
}

pub fn new_appointment(customer: Related<Customer>, user: Related<User>) -> Appointment {
	let start = Utc::now();
	Appointment::new(
		"Quarterly review",
		"meeting",
		start,
		start + Duration::hours(1),
		customer,
		user,
	)
}

/// Kinds of every event raised on `bus`, in delivery order
pub fn record_kinds(bus: &EventBus) -> (Rc<RefCell<Vec<EventKind>>>, Subscription) {
	let log = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&log);
	let subscription = bus.subscribe(SubscriptionFilter::new(EventKind::Any), move |event: &Event| {
		sink.borrow_mut().push(event.kind());
	});
	(log, subscription)
}
