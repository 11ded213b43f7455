//! Users who own appointments

use super::{EntityKind, NoChildren, RecordMeta, Rule};
use crate::infra::{
	event::{EntityEvent, Event},
	i18n::keys,
};

#[derive(Clone, PartialEq, Eq)]
pub struct User {
	pub meta: RecordMeta,
	pub user_name: String,
	pub password: String,
	pub active: bool,
}

impl User {
	pub fn new(user_name: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			meta: RecordMeta::new_row(),
			user_name: user_name.into(),
			password: password.into(),
			active: true,
		}
	}
}

// Keep passwords out of logs
impl std::fmt::Debug for User {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("User")
			.field("meta", &self.meta)
			.field("user_name", &self.user_name)
			.field("active", &self.active)
			.finish_non_exhaustive()
	}
}

fn user_name(user: &User) -> &str {
	&user.user_name
}

fn password(user: &User) -> &str {
	&user.password
}

impl super::Entity for User {
	const KIND: EntityKind = EntityKind::User;

	type Children = NoChildren;

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn rules() -> Vec<Rule<Self>> {
		vec![
			Rule::required("user_name", keys::USER_NAME_NOT_DEFINED, user_name),
			Rule::required("password", keys::PASSWORD_NOT_DEFINED, password),
			Rule::max_length("user_name", keys::USER_NAME_TOO_LONG, user_name, 50),
			Rule::max_length("password", keys::PASSWORD_TOO_LONG, password, 50),
		]
	}

	fn refresh_fields(&mut self, source: &Self) -> Vec<&'static str> {
		copy_changed!(self, source, user_name, password, active)
	}

	fn into_event(event: EntityEvent<Self>) -> Event {
		Event::User(event)
	}

	fn from_event(event: &Event) -> Option<&EntityEvent<Self>> {
		match event {
			Event::User(event) => Some(event),
			_ => None,
		}
	}
}
