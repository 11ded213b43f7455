//! Country records

use super::{EntityKind, NoChildren, RecordMeta, Rule};
use crate::infra::{
	event::{EntityEvent, Event},
	i18n::keys,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
	pub meta: RecordMeta,
	pub name: String,
}

impl Country {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			meta: RecordMeta::new_row(),
			name: name.into(),
		}
	}
}

fn name(country: &Country) -> &str {
	&country.name
}

impl super::Entity for Country {
	const KIND: EntityKind = EntityKind::Country;

	type Children = NoChildren;

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn rules() -> Vec<Rule<Self>> {
		vec![
			Rule::required("name", keys::COUNTRY_NAME_NOT_DEFINED, name),
			Rule::max_length("name", keys::COUNTRY_NAME_TOO_LONG, name, 50),
		]
	}

	fn refresh_fields(&mut self, source: &Self) -> Vec<&'static str> {
		copy_changed!(self, source, name)
	}

	fn into_event(event: EntityEvent<Self>) -> Event {
		Event::Country(event)
	}

	fn from_event(event: &Event) -> Option<&EntityEvent<Self>> {
		match event {
			Event::Country(event) => Some(event),
			_ => None,
		}
	}
}
