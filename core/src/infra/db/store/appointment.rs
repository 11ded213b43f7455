use super::{
	delete_by_key, parent_key, required, same_link, save_parent, stored, write_row, Loader,
	Persist, StoreResult, Write,
};
use crate::{
	domain::{Appointment, Audit, Entity},
	infra::{db::entities::appointment, query::RecordFilter},
};
use async_trait::async_trait;
use sea_orm::{
	ActiveValue::Set, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;

#[async_trait]
impl Persist for Appointment {
	async fn save_in(
		txn: &DatabaseTransaction,
		record: Arc<Self>,
		user: &str,
	) -> StoreResult<Arc<Self>> {
		let write = Write::plan(&*record)?;
		let customer =
			save_parent(txn, required::<Self, _>(&record.customer, "customer")?, user).await?;
		let owner = save_parent(txn, required::<Self, _>(&record.user, "user")?, user).await?;

		if write == Write::Unchanged {
			if same_link(&record.customer, &customer) && same_link(&record.user, &owner) {
				return Ok(record);
			}
			let mut relinked = (*record).clone();
			relinked.customer = Some(customer);
			relinked.user = Some(owner);
			return Ok(Arc::new(relinked));
		}

		let stamp = Audit::now(user);
		let row = appointment::ActiveModel {
			id: write.primary_key(record.meta.key),
			customer_id: Set(parent_key(&customer)?),
			user_id: Set(parent_key(&owner)?),
			title: Set(record.title.clone()),
			description: Set(record.description.clone()),
			location: Set(record.location.clone()),
			contact: Set(record.contact.clone()),
			appointment_type: Set(record.appointment_type.clone()),
			url: Set(record.url.clone()),
			start: Set(record.start),
			end: Set(record.end),
			created_at: write.created(stamp.at),
			created_by: write.created(stamp.by.clone()),
			last_update: Set(stamp.at),
			last_update_by: Set(stamp.by.clone()),
		};
		let key = write_row(txn, row, write, Self::KIND, record.meta.key).await?;

		let mut saved = (*record).clone();
		saved.customer = Some(customer);
		saved.user = Some(owner);
		Ok(stored(saved, write, key, stamp))
	}

	/// Nothing references an appointment
	async fn check_dependents(_txn: &DatabaseTransaction, _key: i32) -> StoreResult<()> {
		Ok(())
	}

	async fn delete_row(txn: &DatabaseTransaction, key: i32) -> StoreResult<()> {
		delete_by_key::<appointment::Entity>(txn, Self::KIND, key).await
	}

	async fn find(
		db: &DatabaseConnection,
		filter: &RecordFilter<Self>,
		loader: &mut Loader,
	) -> StoreResult<Vec<Arc<Self>>> {
		let rows = appointment::Entity::find()
			.filter(filter.condition())
			.order_by_asc(appointment::Column::Start)
			.all(db)
			.await?;

		let mut appointments = Vec::with_capacity(rows.len());
		for row in rows {
			appointments.push(loader.appointment_row(db, row).await?);
		}
		Ok(appointments)
	}
}
