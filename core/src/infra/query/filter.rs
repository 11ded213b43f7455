//! Record filters
//!
//! A filter selects rows when records are loaded, and lets an open view decide
//! in memory whether a record saved elsewhere belongs to it.

use crate::{
	domain::{Address, Appointment, City, Customer, Entity, User},
	infra::{
		db::entities::{address, appointment, city, customer, user},
		event::{EventBus, EventKind, Subscription},
	},
};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition};
use std::{fmt, sync::Arc};

type Predicate<R> = Arc<dyn Fn(&R) -> bool + Send + Sync>;

pub struct RecordFilter<R> {
	description: String,
	condition: Condition,
	predicate: Predicate<R>,
}

impl<R: Entity> RecordFilter<R> {
	/// `condition` and `predicate` must select the same records
	pub fn new(
		description: impl Into<String>,
		condition: Condition,
		predicate: impl Fn(&R) -> bool + Send + Sync + 'static,
	) -> Self {
		Self {
			description: description.into(),
			condition,
			predicate: Arc::new(predicate),
		}
	}

	pub fn all() -> Self {
		Self::new(format!("all {}", R::KIND.table_name()), Condition::all(), |_| true)
	}

	/// Whether a record in memory passes this filter. Deleted records never do.
	pub fn matches(&self, record: &R) -> bool {
		!record.meta().is_deleted() && (self.predicate)(record)
	}

	pub fn condition(&self) -> Condition {
		self.condition.clone()
	}

	pub fn description(&self) -> &str {
		&self.description
	}

	/// Hands every record saved on `bus` that passes this filter to
	/// `on_match`, for as long as the subscription is held
	pub fn watch(
		&self,
		bus: &EventBus,
		mut on_match: impl FnMut(&Arc<R>) + 'static,
	) -> Subscription {
		let filter = self.clone();
		bus.on::<R>(EventKind::Success, move |event| {
			if let Some(record) = event.payload().as_record() {
				if filter.matches(record) {
					on_match(record);
				}
			}
		})
	}
}

impl<R> Clone for RecordFilter<R> {
	fn clone(&self) -> Self {
		Self {
			description: self.description.clone(),
			condition: self.condition.clone(),
			predicate: Arc::clone(&self.predicate),
		}
	}
}

impl<R> fmt::Debug for RecordFilter<R> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RecordFilter")
			.field("description", &self.description)
			.finish_non_exhaustive()
	}
}

impl RecordFilter<City> {
	pub fn in_country(country: i32) -> Self {
		Self::new(
			format!("cities in country {country}"),
			Condition::all().add(city::Column::CountryId.eq(country)),
			move |city| city.country.as_ref().is_some_and(|link| link.key() == country),
		)
	}
}

impl RecordFilter<Address> {
	pub fn in_city(city: i32) -> Self {
		Self::new(
			format!("addresses in city {city}"),
			Condition::all().add(address::Column::CityId.eq(city)),
			move |address| address.city.as_ref().is_some_and(|link| link.key() == city),
		)
	}
}

impl RecordFilter<Customer> {
	pub fn active(active: bool) -> Self {
		let description = if active {
			"active customers"
		} else {
			"inactive customers"
		};
		Self::new(
			description,
			Condition::all().add(customer::Column::Active.eq(active)),
			move |customer| customer.active == active,
		)
	}
}

impl RecordFilter<Appointment> {
	pub fn for_customer(customer: i32) -> Self {
		Self::new(
			format!("appointments of customer {customer}"),
			Condition::all().add(appointment::Column::CustomerId.eq(customer)),
			move |appointment| {
				appointment
					.customer
					.as_ref()
					.is_some_and(|link| link.key() == customer)
			},
		)
	}

	pub fn for_user(user: i32) -> Self {
		Self::new(
			format!("appointments of user {user}"),
			Condition::all().add(appointment::Column::UserId.eq(user)),
			move |appointment| appointment.user.as_ref().is_some_and(|link| link.key() == user),
		)
	}

	/// Appointments overlapping `[start, end)`
	pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
		Self::new(
			format!("appointments between {start} and {end}"),
			Condition::all()
				.add(appointment::Column::Start.lt(end))
				.add(appointment::Column::End.gt(start)),
			move |appointment| appointment.start < end && appointment.end > start,
		)
	}
}

impl RecordFilter<User> {
	pub fn named(name: impl Into<String>) -> Self {
		let name = name.into();
		Self::new(
			format!("users named {name}"),
			Condition::all().add(user::Column::UserName.eq(name.clone())),
			move |user| user.user_name == name,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		domain::{Country, Related, RowState},
		infra::event::{EntityEvent, Payload, Route},
	};
	use chrono::Duration;
	use std::{cell::RefCell, rc::Rc};

	fn city_in(country_key: i32) -> City {
		let mut country = Country::new("Norway");
		country.meta.key = country_key;
		City::new("Oslo", Related::Reference(Arc::new(country)))
	}

	#[test]
	fn predicates_follow_link_keys() {
		let filter = RecordFilter::<City>::in_country(4);
		assert!(filter.matches(&city_in(4)));
		assert!(!filter.matches(&city_in(5)));
	}

	#[test]
	fn deleted_records_never_match() {
		let mut city = city_in(4);
		city.meta.row_state = RowState::Deleted;
		assert!(!RecordFilter::<City>::all().matches(&city));
	}

	#[test]
	fn time_range_uses_overlap() {
		let user = Related::Reference(Arc::new(User::new("admin", "secret")));
		let customer = Related::Reference(Arc::new(Customer::new(
			"Kari",
			Related::Reference(Arc::new(Address::new(
				"Storgata 1",
				Related::Reference(Arc::new(city_in(1))),
			))),
		)));
		let start = Utc::now();
		let appointment = Appointment::new(
			"Review",
			"meeting",
			start,
			start + Duration::hours(1),
			customer,
			user,
		);

		let overlapping = RecordFilter::<Appointment>::between(
			start + Duration::minutes(30),
			start + Duration::hours(2),
		);
		let later = RecordFilter::<Appointment>::between(
			start + Duration::hours(1),
			start + Duration::hours(2),
		);

		assert!(overlapping.matches(&appointment));
		assert!(!later.matches(&appointment));
		assert!(later.description().starts_with("appointments between"));
	}

	#[test]
	fn watch_only_reports_saved_records_that_match() {
		let bus = EventBus::new();
		let seen = Rc::new(RefCell::new(Vec::new()));
		let sink = Rc::clone(&seen);
		let subscription = RecordFilter::<Address>::in_city(2).watch(&bus, move |address| {
			sink.borrow_mut().push(address.address1.clone());
		});

		let emit = |kind: EventKind, address1: &str, city_key: i32| {
			let mut city = city_in(1);
			city.meta.key = city_key;
			let mut address = Address::new(address1, Related::Reference(Arc::new(city)));
			address.meta.key = 9;
			if kind == EventKind::DeleteSuccess {
				address.meta.row_state = RowState::Deleted;
			}
			let payload = Payload::Record(Arc::new(address));
			bus.emit(EntityEvent::success(kind, payload, Route::new("tests")).unwrap());
		};

		emit(EventKind::InsertSuccess, "Storgata 1", 2);
		emit(EventKind::UpdateSuccess, "Kirkeveien 5", 3);
		emit(EventKind::DeleteSuccess, "Storgata 2", 2);
		assert_eq!(*seen.borrow(), vec!["Storgata 1".to_string()]);

		drop(subscription);
		emit(EventKind::UpdateSuccess, "Storgata 3", 2);
		assert_eq!(seen.borrow().len(), 1);
	}
}
