//! Action tests
//!
//! Saves, deletes and loads against an in-memory database, checking both the
//! returned outcome events and what the bus and the models see.

mod helpers;

use chrono::Duration;
use helpers::{context, new_appointment, new_customer, record_kinds};
use pretty_assertions::assert_eq;
use sched_core::{
	domain::{
		Appointment, Country, Customer, Entity, EntityKind, Model, ModelError, Related, RowState, User,
	},
	infra::{
		action::ActionError,
		event::{EntityEvent, EventKind, Payload, Route, OPERATION_CANCELED},
		query::RecordFilter,
	},
};
use std::{rc::Rc, sync::Arc};
use tracing_test::traced_test;

#[tokio::test]
async fn saving_a_new_customer_inserts_its_new_parents_first() {
	let ctx = context().await;
	let actions = &ctx.core.actions;
	let (log, _subscription) = record_kinds(&ctx.core.events);

	let model = Model::new(new_customer("Kari Nordmann")).unwrap();
	let event = actions.save(&model).await.unwrap();

	assert_eq!(event.kind(), EventKind::InsertSuccess);
	assert_eq!(*log.borrow(), vec![EventKind::InsertSuccess]);

	let model = model.borrow();
	assert!(model.key() > 0);
	assert_eq!(model.row_state(), RowState::Unmodified);
	assert!(!model.is_busy());
	assert_eq!(model.derived("address_text"), Some("Storgata 1, Oslo"));

	let record = model.record();
	let address = record.address.as_ref().unwrap();
	let city = address.record().city.as_ref().unwrap();
	let country = city.record().country.as_ref().unwrap();
	assert!(address.key() > 0);
	assert!(city.key() > 0);
	assert!(country.key() > 0);
	assert_eq!(
		record.meta.created.as_ref().map(|audit| audit.by.as_str()),
		Some("admin")
	);

	let stored = actions
		.load_records(&RecordFilter::<Customer>::all())
		.await
		.unwrap();
	assert_eq!(stored.len(), 1);
	assert_eq!(stored[0].meta.key, model.key());
	assert_eq!(stored[0].address_text(), "Storgata 1, Oslo");
	assert_eq!(stored[0].phone(), "+47 22 00 00 00");
}

#[tokio::test]
async fn invalid_customer_is_reported_without_writing() {
	let ctx = context().await;
	let actions = &ctx.core.actions;
	let (log, _subscription) = record_kinds(&ctx.core.events);

	let model = Model::new(new_customer("  ")).unwrap();
	let event = actions.save(&model).await.unwrap();

	assert_eq!(event.kind(), EventKind::InsertInvalid);
	assert_eq!(event.message(), Some("Customer name not defined"));
	assert!(event
		.payload()
		.as_model()
		.is_some_and(|payload| Rc::ptr_eq(payload, &model)));
	assert_eq!(*log.borrow(), vec![EventKind::InsertInvalid]);
	assert_eq!(model.borrow().row_state(), RowState::New);

	let countries = actions
		.load_records(&RecordFilter::<Country>::all())
		.await
		.unwrap();
	assert!(countries.is_empty());
}

#[tokio::test]
async fn street_address_failure_is_reported_by_the_customer() {
	let ctx = context().await;

	let mut customer = new_customer("Kari Nordmann");
	let link = customer.address.take().unwrap();
	let mut address = (**link.record()).clone();
	address.address1 = String::new();
	customer.address = Some(Related::Row(Arc::new(address)));

	let model = Model::new(customer).unwrap();
	let event = ctx.core.actions.save(&model).await.unwrap();

	assert_eq!(event.kind(), EventKind::InsertInvalid);
	assert_eq!(event.message(), Some("Street address not defined"));

	let violation = event.violation().unwrap();
	assert_eq!(violation.entity, EntityKind::Customer);
	assert_eq!(violation.field, Some("address"));
	assert_eq!(violation.path(), vec![EntityKind::Customer, EntityKind::Address]);
}

#[tokio::test]
async fn update_keeps_identity_and_created_audit() {
	let ctx = context().await;
	let actions = &ctx.core.actions;

	let model = Model::new(new_customer("Kari Nordmann")).unwrap();
	actions.save(&model).await.unwrap();
	let (key, created) = {
		let model = model.borrow();
		(model.key(), model.current().meta.created.clone())
	};

	model
		.borrow_mut()
		.edit("name", |customer| customer.name = "Kari Hansen".to_string())
		.unwrap();
	assert_eq!(model.borrow().row_state(), RowState::Modified);

	let event = actions.save(&model).await.unwrap();
	assert_eq!(event.kind(), EventKind::UpdateSuccess);

	let model = model.borrow();
	assert_eq!(model.key(), key);
	assert_eq!(model.row_state(), RowState::Unmodified);
	assert_eq!(model.current().meta.created, created);
	assert!(model.current().meta.modified.is_some());

	let stored = actions
		.load_records(&RecordFilter::<Customer>::all())
		.await
		.unwrap();
	assert_eq!(stored[0].name, "Kari Hansen");
}

#[tokio::test]
async fn country_in_use_cannot_be_deleted() {
	let ctx = context().await;
	let actions = &ctx.core.actions;

	let customer = Model::new(new_customer("Kari Nordmann")).unwrap();
	actions.save(&customer).await.unwrap();

	let countries = actions.load::<Country>(&RecordFilter::all()).await.unwrap();
	assert_eq!(countries.len(), 1);
	let country = &countries[0];

	let request = actions.request_delete(country);
	let event = actions.delete(&request).await.unwrap();

	assert_eq!(event.kind(), EventKind::DeleteInvalid);
	assert_eq!(
		event.message(),
		Some("Country is still used by one or more cities")
	);
	assert!(event.payload().ptr_eq(request.payload()));
	assert_eq!(country.borrow().row_state(), RowState::Unmodified);
	assert!(!country.borrow().is_busy());
}

#[tokio::test]
async fn deleted_customer_model_is_terminal() {
	let ctx = context().await;
	let actions = &ctx.core.actions;
	let (log, _subscription) = record_kinds(&ctx.core.events);

	let model = Model::new(new_customer("Kari Nordmann")).unwrap();
	actions.save(&model).await.unwrap();

	let request = actions.request_delete(&model);
	let event = actions.delete(&request).await.unwrap();
	assert_eq!(event.kind(), EventKind::DeleteSuccess);
	assert_eq!(model.borrow().row_state(), RowState::Deleted);

	let remaining = actions
		.load_records(&RecordFilter::<Customer>::all())
		.await
		.unwrap();
	assert!(remaining.is_empty());

	let edit = model
		.borrow_mut()
		.edit("name", |customer| customer.name = "Ghost".to_string());
	assert_eq!(edit, Err(ModelError::Deleted(EntityKind::Customer)));

	let again = actions.save(&model).await.unwrap();
	assert_eq!(again.kind(), EventKind::UpdateInvalid);
	assert_eq!(again.message(), Some("Customer has already been deleted"));

	assert_eq!(
		*log.borrow(),
		vec![
			EventKind::InsertSuccess,
			EventKind::DeleteRequest,
			EventKind::DeleteSuccess,
			EventKind::UpdateInvalid,
		]
	);
}

#[tokio::test]
async fn unsaved_record_cannot_be_deleted() {
	let ctx = context().await;

	let model = Model::new(new_customer("Kari Nordmann")).unwrap();
	let request = ctx.core.actions.request_delete(&model);
	let event = ctx.core.actions.delete(&request).await.unwrap();

	assert_eq!(event.kind(), EventKind::DeleteInvalid);
	assert_eq!(event.message(), Some("Record has not been saved"));
}

#[tokio::test]
async fn busy_model_rejects_a_second_operation() {
	let ctx = context().await;

	let model = Model::new(new_customer("Kari Nordmann")).unwrap();
	model.borrow_mut().set_busy(true);

	let result = ctx.core.actions.save(&model).await;
	assert!(matches!(result, Err(ActionError::Busy(EntityKind::Customer))));
	assert_eq!(model.borrow().row_state(), RowState::New);
}

#[tokio::test]
async fn edits_are_refused_while_a_save_is_running() {
	let ctx = context().await;
	let actions = &ctx.core.actions;

	let model = Model::new(new_customer("Kari Nordmann")).unwrap();
	actions.save(&model).await.unwrap();
	model
		.borrow_mut()
		.edit("name", |customer| customer.name = "Kari Hansen".to_string())
		.unwrap();

	let (event, (busy, edit)) = tokio::join!(actions.save(&model), async {
		tokio::task::yield_now().await;
		let busy = model.borrow().is_busy();
		let edit = model
			.borrow_mut()
			.edit("name", |customer| customer.name = "Kari Olsen".to_string());
		(busy, edit)
	});

	assert!(busy);
	assert_eq!(edit, Err(ModelError::Busy(EntityKind::Customer)));
	assert_eq!(event.unwrap().kind(), EventKind::UpdateSuccess);

	let model = model.borrow();
	assert_eq!(model.current().name, "Kari Hansen");
	assert_eq!(model.row_state(), RowState::Unmodified);
	assert!(!model.is_busy());

	let stored = actions
		.load_records(&RecordFilter::<Customer>::all())
		.await
		.unwrap();
	assert_eq!(stored[0].name, "Kari Hansen");
}

#[tokio::test]
async fn delete_requires_a_delete_request() {
	let ctx = context().await;

	let model = Model::new(new_customer("Kari Nordmann")).unwrap();
	let request = ctx.core.actions.request_edit(&model);

	let result = ctx.core.actions.delete(&request).await;
	assert!(matches!(result, Err(ActionError::Event(_))));
}

#[tokio::test]
async fn canceled_edit_keeps_the_request_payload() {
	let ctx = context().await;
	let actions = &ctx.core.actions;
	let (log, _subscription) = record_kinds(&ctx.core.events);

	let model = Model::new(new_customer("Kari Nordmann")).unwrap();
	let request = actions.request_edit(&model);
	let canceled = actions.cancel(&request).unwrap();

	assert_eq!(canceled.kind(), EventKind::InsertCanceled);
	assert_eq!(canceled.message(), Some(OPERATION_CANCELED));
	assert!(canceled.is_canceled());
	assert!(canceled.failure().unwrap().cause().is_none());
	assert!(canceled.payload().ptr_eq(request.payload()));
	assert_eq!(
		*log.borrow(),
		vec![EventKind::EditRequest, EventKind::InsertCanceled]
	);
}

#[tokio::test]
async fn attached_model_follows_saves_of_the_same_row() {
	let ctx = context().await;
	let actions = &ctx.core.actions;

	let editor = Model::new(new_customer("Kari Nordmann")).unwrap();
	actions.save(&editor).await.unwrap();

	let listed = actions.load::<Customer>(&RecordFilter::all()).await.unwrap();
	let viewer = &listed[0];
	let _subscription = Model::attach(viewer, &ctx.core.events);

	editor
		.borrow_mut()
		.edit("name", |customer| customer.name = "Kari Hansen".to_string())
		.unwrap();
	actions.save(&editor).await.unwrap();

	let viewer = viewer.borrow();
	assert_eq!(viewer.current().name, "Kari Hansen");
	assert_eq!(viewer.row_state(), RowState::Unmodified);
	assert_eq!(viewer.key(), editor.borrow().key());
}

#[tokio::test]
async fn appointments_reference_their_customer_and_user() {
	let ctx = context().await;
	let actions = &ctx.core.actions;

	let customer = Model::new(new_customer("Kari Nordmann")).unwrap();
	actions.save(&customer).await.unwrap();
	let customer = customer.borrow().record();

	let user = actions
		.save_record(Arc::new(User::new("admin", "secret")))
		.await
		.unwrap()
		.record()
		.unwrap();

	let appointment = new_appointment(
		Related::Reference(Arc::clone(&customer)),
		Related::Reference(Arc::clone(&user)),
	);
	let start = appointment.start;
	let event = actions.save_record(Arc::new(appointment)).await.unwrap();
	assert_eq!(event.kind(), EventKind::InsertSuccess);

	let listed = actions
		.load_records(&RecordFilter::<Appointment>::for_customer(customer.meta.key))
		.await
		.unwrap();
	assert_eq!(listed.len(), 1);
	assert_eq!(listed[0].customer_name(), "Kari Nordmann");
	assert_eq!(listed[0].user_name(), "admin");
	assert!(listed[0].customer.as_ref().is_some_and(|link| !link.is_row()));

	let later = actions
		.load_records(&RecordFilter::<Appointment>::between(
			start + Duration::hours(2),
			start + Duration::hours(3),
		))
		.await
		.unwrap();
	assert!(later.is_empty());

	let request = EntityEvent::delete_request(Payload::Record(customer), Route::new("tests"));
	let event = actions.delete(&request).await.unwrap();
	assert_eq!(event.kind(), EventKind::DeleteInvalid);
	assert_eq!(event.message(), Some("Customer still has appointments"));

	let request = EntityEvent::delete_request(Payload::Record(user), Route::new("tests"));
	let event = actions.delete(&request).await.unwrap();
	assert_eq!(event.message(), Some("User still has appointments"));
}

#[tokio::test]
#[traced_test]
async fn update_of_a_missing_row_is_faulted() {
	let ctx = context().await;

	let mut country = Country::new("Atlantis");
	country.meta.key = 999;
	country.meta.row_state = RowState::Modified;

	let event = ctx
		.core
		.actions
		.save_record(Arc::new(country))
		.await
		.unwrap();

	assert_eq!(event.kind(), EventKind::UpdateFaulted);
	assert_eq!(event.message(), Some("Country 999 does not exist"));
	assert!(event.failure().unwrap().cause().is_some());
	assert_eq!(event.record().map(|record| record.meta().key), Some(999));
	assert!(logs_contain("failed"));
}
