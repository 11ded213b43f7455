//! City records

use super::{
	model::ModelResult, Children, Country, Derived, EntityKind, Link, Model, ModelRef, RecordMeta,
	Related, Rule, SubModel,
};
use crate::infra::{
	event::{EntityEvent, Event},
	i18n::keys,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct City {
	pub meta: RecordMeta,
	pub name: String,
	pub country: Option<Related<Country>>,
}

impl City {
	pub fn new(name: impl Into<String>, country: Related<Country>) -> Self {
		Self {
			meta: RecordMeta::new_row(),
			name: name.into(),
			country: Some(country),
		}
	}

	/// Name of the linked country, empty if none
	pub fn country_name(&self) -> &str {
		self.country
			.as_ref()
			.map_or("", |country| country.record().name.as_str())
	}
}

fn name(city: &City) -> &str {
	&city.name
}

#[derive(Debug)]
pub struct CityChildren {
	pub country: SubModel<Country>,
}

impl Children<City> for CityChildren {
	fn bind(record: &City) -> ModelResult<Self> {
		Ok(Self {
			country: SubModel::bind(record.country.as_ref())?,
		})
	}

	fn refresh(&mut self, source: &City) -> ModelResult<Vec<&'static str>> {
		let mut changed = Vec::new();
		if self.country.refresh(source.country.as_ref())? {
			changed.push("country");
		}
		Ok(changed)
	}

	fn write_back(&mut self, record: &mut Arc<City>) -> Vec<&'static str> {
		let mut changed = Vec::new();
		if self.country.write_back(record, |city| &mut city.country, |city| city.country.as_ref()) {
			changed.push("country");
		}
		changed
	}

	fn set_busy(&mut self, busy: bool) {
		self.country.set_busy(busy);
	}

	fn connect(owner: &ModelRef<City>) {
		Model::connect_child::<Country>(
			owner,
			"country",
			|children| &mut children.country,
			|city| &mut city.country,
		);
	}
}

impl super::Entity for City {
	const KIND: EntityKind = EntityKind::City;

	type Children = CityChildren;

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn rules() -> Vec<Rule<Self>> {
		vec![
			Rule::required("name", keys::CITY_NAME_NOT_DEFINED, name),
			Rule::max_length("name", keys::CITY_NAME_TOO_LONG, name, 50),
		]
	}

	fn links(&self) -> Vec<Link<'_>> {
		vec![Link::required(
			"country",
			keys::COUNTRY_NOT_SPECIFIED,
			self.country.as_ref(),
		)]
	}

	fn derived() -> Vec<Derived<Self>> {
		vec![Derived {
			name: "country_name",
			depends_on: &["country"],
			compute: |city: &Self| city.country_name().to_string(),
		}]
	}

	fn refresh_fields(&mut self, source: &Self) -> Vec<&'static str> {
		copy_changed!(self, source, name)
	}

	fn into_event(event: EntityEvent<Self>) -> Event {
		Event::City(event)
	}

	fn from_event(event: &Event) -> Option<&EntityEvent<Self>> {
		match event {
			Event::City(event) => Some(event),
			_ => None,
		}
	}
}
