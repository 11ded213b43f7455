//! Street addresses

use super::{
	join_non_blank, model::ModelResult, Children, City, Derived, EntityKind, Link, Model, ModelRef,
	RecordMeta, Related, Rule, SubModel,
};
use crate::infra::{
	event::{EntityEvent, Event},
	i18n::keys,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Address {
	pub meta: RecordMeta,
	pub address1: String,
	pub address2: String,
	pub postal_code: String,
	pub phone: String,
	pub city: Option<Related<City>>,
}

impl Address {
	pub fn new(address1: impl Into<String>, city: Related<City>) -> Self {
		Self {
			meta: RecordMeta::new_row(),
			address1: address1.into(),
			address2: String::new(),
			postal_code: String::new(),
			phone: String::new(),
			city: Some(city),
		}
	}

	/// Street lines, one per line
	pub fn address_lines(&self) -> String {
		join_non_blank([self.address1.as_str(), self.address2.as_str()], "\n")
	}

	/// "City, postal code, Country" with blank parts left out
	pub fn city_zip_country(&self) -> String {
		let city = self.city.as_ref().map(Related::record);
		join_non_blank(
			[
				city.map_or("", |city| city.name.as_str()),
				self.postal_code.as_str(),
				city.map_or("", |city| city.country_name()),
			],
			", ",
		)
	}
}

fn address1(address: &Address) -> &str {
	&address.address1
}

fn address2(address: &Address) -> &str {
	&address.address2
}

fn postal_code(address: &Address) -> &str {
	&address.postal_code
}

fn phone(address: &Address) -> &str {
	&address.phone
}

#[derive(Debug)]
pub struct AddressChildren {
	pub city: SubModel<City>,
}

impl Children<Address> for AddressChildren {
	fn bind(record: &Address) -> ModelResult<Self> {
		Ok(Self {
			city: SubModel::bind(record.city.as_ref())?,
		})
	}

	fn refresh(&mut self, source: &Address) -> ModelResult<Vec<&'static str>> {
		let mut changed = Vec::new();
		if self.city.refresh(source.city.as_ref())? {
			changed.push("city");
		}
		Ok(changed)
	}

	fn write_back(&mut self, record: &mut Arc<Address>) -> Vec<&'static str> {
		let mut changed = Vec::new();
		if self.city.write_back(record, |address| &mut address.city, |address| address.city.as_ref()) {
			changed.push("city");
		}
		changed
	}

	fn set_busy(&mut self, busy: bool) {
		self.city.set_busy(busy);
	}

	fn connect(owner: &ModelRef<Address>) {
		Model::connect_child::<City>(
			owner,
			"city",
			|children| &mut children.city,
			|address| &mut address.city,
		);
	}
}

impl super::Entity for Address {
	const KIND: EntityKind = EntityKind::Address;

	type Children = AddressChildren;

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn rules() -> Vec<Rule<Self>> {
		vec![
			Rule::either_required("address1", keys::STREET_ADDRESS_NOT_DEFINED, address1, address2),
			Rule::max_length("address1", keys::ADDRESS_LINE_TOO_LONG, address1, 50),
			Rule::max_length("address2", keys::ADDRESS_LINE_TOO_LONG, address2, 50),
			Rule::max_length("postal_code", keys::POSTAL_CODE_TOO_LONG, postal_code, 10),
			Rule::max_length("phone", keys::PHONE_TOO_LONG, phone, 20),
		]
	}

	fn links(&self) -> Vec<Link<'_>> {
		vec![Link::required("city", keys::CITY_NOT_SPECIFIED, self.city.as_ref())]
	}

	fn derived() -> Vec<Derived<Self>> {
		vec![
			Derived {
				name: "address_lines",
				depends_on: &["address1", "address2"],
				compute: |address: &Self| address.address_lines(),
			},
			Derived {
				name: "city_zip_country",
				depends_on: &["city", "postal_code"],
				compute: |address: &Self| address.city_zip_country(),
			},
		]
	}

	fn refresh_fields(&mut self, source: &Self) -> Vec<&'static str> {
		copy_changed!(self, source, address1, address2, postal_code, phone)
	}

	fn into_event(event: EntityEvent<Self>) -> Event {
		Event::Address(event)
	}

	fn from_event(event: &Event) -> Option<&EntityEvent<Self>> {
		match event {
			Event::Address(event) => Some(event),
			_ => None,
		}
	}
}
