//! Appointments between a customer and a user

use super::{
	model::ModelResult, Children, Customer, Derived, EntityKind, Link, Model, ModelRef, RecordMeta,
	Related, Rule, SubModel, User,
};
use crate::infra::{
	event::{EntityEvent, Event},
	i18n::keys,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Appointment {
	pub meta: RecordMeta,
	pub title: String,
	pub description: String,
	pub location: String,
	pub contact: String,
	pub appointment_type: String,
	pub url: String,
	pub start: DateTime<Utc>,
	pub end: DateTime<Utc>,
	pub customer: Option<Related<Customer>>,
	pub user: Option<Related<User>>,
}

impl Appointment {
	pub fn new(
		title: impl Into<String>,
		appointment_type: impl Into<String>,
		start: DateTime<Utc>,
		end: DateTime<Utc>,
		customer: Related<Customer>,
		user: Related<User>,
	) -> Self {
		Self {
			meta: RecordMeta::new_row(),
			title: title.into(),
			description: String::new(),
			location: String::new(),
			contact: String::new(),
			appointment_type: appointment_type.into(),
			url: String::new(),
			start,
			end,
			customer: Some(customer),
			user: Some(user),
		}
	}

	pub fn customer_name(&self) -> &str {
		self.customer
			.as_ref()
			.map_or("", |customer| customer.record().name.as_str())
	}

	pub fn user_name(&self) -> &str {
		self.user
			.as_ref()
			.map_or("", |user| user.record().user_name.as_str())
	}
}

fn title(appointment: &Appointment) -> &str {
	&appointment.title
}

fn appointment_type(appointment: &Appointment) -> &str {
	&appointment.appointment_type
}

fn url(appointment: &Appointment) -> &str {
	&appointment.url
}

fn starts_before_end(appointment: &Appointment) -> bool {
	appointment.start < appointment.end
}

#[derive(Debug)]
pub struct AppointmentChildren {
	pub customer: SubModel<Customer>,
	pub user: SubModel<User>,
}

impl Children<Appointment> for AppointmentChildren {
	fn bind(record: &Appointment) -> ModelResult<Self> {
		Ok(Self {
			customer: SubModel::bind(record.customer.as_ref())?,
			user: SubModel::bind(record.user.as_ref())?,
		})
	}

	fn refresh(&mut self, source: &Appointment) -> ModelResult<Vec<&'static str>> {
		let mut changed = Vec::new();
		if self.customer.refresh(source.customer.as_ref())? {
			changed.push("customer");
		}
		if self.user.refresh(source.user.as_ref())? {
			changed.push("user");
		}
		Ok(changed)
	}

	fn write_back(&mut self, record: &mut Arc<Appointment>) -> Vec<&'static str> {
		let mut changed = Vec::new();
		if self.customer.write_back(
			record,
			|appointment| &mut appointment.customer,
			|appointment| appointment.customer.as_ref(),
		) {
			changed.push("customer");
		}
		if self.user.write_back(
			record,
			|appointment| &mut appointment.user,
			|appointment| appointment.user.as_ref(),
		) {
			changed.push("user");
		}
		changed
	}

	fn set_busy(&mut self, busy: bool) {
		self.customer.set_busy(busy);
		self.user.set_busy(busy);
	}

	fn connect(owner: &ModelRef<Appointment>) {
		Model::connect_child::<Customer>(
			owner,
			"customer",
			|children| &mut children.customer,
			|appointment| &mut appointment.customer,
		);
		Model::connect_child::<User>(
			owner,
			"user",
			|children| &mut children.user,
			|appointment| &mut appointment.user,
		);
	}
}

impl super::Entity for Appointment {
	const KIND: EntityKind = EntityKind::Appointment;

	type Children = AppointmentChildren;

	fn meta(&self) -> &RecordMeta {
		&self.meta
	}

	fn meta_mut(&mut self) -> &mut RecordMeta {
		&mut self.meta
	}

	fn rules() -> Vec<Rule<Self>> {
		vec![
			Rule::required("title", keys::TITLE_NOT_DEFINED, title),
			Rule::required("appointment_type", keys::TYPE_NOT_DEFINED, appointment_type),
			Rule::max_length("title", keys::TITLE_TOO_LONG, title, 255),
			Rule::max_length("appointment_type", keys::TYPE_TOO_LONG, appointment_type, 50),
			Rule::max_length("url", keys::URL_TOO_LONG, url, 255),
			Rule::constraint("end", keys::END_BEFORE_START, starts_before_end),
		]
	}

	fn links(&self) -> Vec<Link<'_>> {
		vec![
			Link::required("customer", keys::CUSTOMER_NOT_SPECIFIED, self.customer.as_ref()),
			Link::required("user", keys::USER_NOT_SPECIFIED, self.user.as_ref()),
		]
	}

	fn derived() -> Vec<Derived<Self>> {
		vec![
			Derived {
				name: "customer_name",
				depends_on: &["customer"],
				compute: |appointment: &Self| appointment.customer_name().to_string(),
			},
			Derived {
				name: "user_name",
				depends_on: &["user"],
				compute: |appointment: &Self| appointment.user_name().to_string(),
			},
		]
	}

	fn refresh_fields(&mut self, source: &Self) -> Vec<&'static str> {
		copy_changed!(
			self,
			source,
			title,
			description,
			location,
			contact,
			appointment_type,
			url,
			start,
			end
		)
	}

	fn into_event(event: EntityEvent<Self>) -> Event {
		Event::Appointment(event)
	}

	fn from_event(event: &Event) -> Option<&EntityEvent<Self>> {
		match event {
			Event::Appointment(event) => Some(event),
			_ => None,
		}
	}
}
