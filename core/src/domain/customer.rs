//! Customers

use super::{
	join_non_blank, model::ModelResult, Address, Children, Derived, EntityKind, Link, Model,
	ModelRef, RecordMeta, Related, Rule, SubModel,
};
use crate::infra::{
	event::{EntityEvent, Event},
	i18n::keys,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Customer {
	pub meta: RecordMeta,
	pub name: String,
	pub active: bool,
	pub address: Option<Related<Address>>,
}

impl Customer {
	pub fn new(name: impl Into<String>, address: Related<Address>) -> Self {
		Self {
			meta: RecordMeta::new_row(),
			name: name.into(),
			active: true,
			address: Some(address),
		}
	}

	/// Street lines and city on one line
	pub fn address_text(&self) -> String {
		let Some(address) = self.address.as_ref().map(Related::record) else {
			return String::new();
		};
		let city = address.city.as_ref().map(Related::record);
		join_non_blank(
			[
				address.address1.as_str(),
				address.address2.as_str(),
				city.map_or("", |city| city.name.as_str()),
			],
			", ",
		)
	}

	pub fn phone(&self) -> &str {
		self.address
			.as_ref()
			.map_or("", |address| address.record().phone.as_str())
	}
}

fn name(customer: &Customer) -> &str {
	&customer.name
}

#[derive(Debug)]
pub struct CustomerChildren {
	pub address: SubModel<Address>,
}

impl Children<Customer> for CustomerChildren {
	fn bind(record: &Customer) -> ModelResult<Self> {
		Ok(Self {
			address: SubModel::bind(record.address.as_ref())?,
		})
	}

	fn refresh(&mut self, source: &Customer) -> ModelResult<Vec<&'static str>> {
		let mut changed = Vec::new();
		if self.address.refresh(source.address.as_ref())? {
			changed.push("address");
		}
		Ok(changed)
	}

	fn write_back(&mut self, record: &mut Arc<Customer>) -> Vec<&'static str> {
		let mut changed = Vec::new();
		if self.address.write_back(
			record,
			|customer| &mut customer.address,
			|customer| customer.address.as_ref(),
		) {
			changed.push("address");
		}
		changed
	}

	fn set_busy(&mut self, busy: bool) {
		self.address.set_busy(busy);
	}

	fn connect(owner: &ModelRef<Customer>) {
		Model::connect_child::<Address>(
			owner,
			"address",
			|children| &mut children.address,
			|customer| &mut customer.address,
		);
	}
}

impl super::Entity for Customer {
	const KIND: EntityKind = EntityKind::Customer;

	type Children = CustomerChildren;

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn rules() -> Vec<Rule<Self>> {
		vec![
			Rule::required("name", keys::CUSTOMER_NAME_NOT_DEFINED, name),
			Rule::max_length("name", keys::CUSTOMER_NAME_TOO_LONG, name, 45),
		]
	}

	fn links(&self) -> Vec<Link<'_>> {
		vec![Link::required(
			"address",
			keys::ADDRESS_NOT_SPECIFIED,
			self.address.as_ref(),
		)]
	}

	fn derived() -> Vec<Derived<Self>> {
		vec![
			Derived {
				name: "address_text",
				depends_on: &["address"],
				compute: |customer: &Self| customer.address_text(),
			},
			Derived {
				name: "phone",
				depends_on: &["address"],
				compute: |customer: &Self| customer.phone().to_string(),
			},
		]
	}

	fn refresh_fields(&mut self, source: &Self) -> Vec<&'static str> {
		copy_changed!(self, source, name, active)
	}

	fn into_event(event: EntityEvent<Self>) -> Event {
		Event::Customer(event)
	}

	fn from_event(event: &Event) -> Option<&EntityEvent<Self>> {
		match event {
			Event::Customer(event) => Some(event),
			_ => None,
		}
	}
}
