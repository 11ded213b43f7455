use super::{
	delete_by_key, parent_key, reject_if_used, required, same_link, save_parent, stored,
	write_row, Loader, Persist, StoreResult, Write,
};
use crate::{
	domain::{Audit, Customer, Entity},
	infra::{
		db::entities::{appointment, customer},
		i18n::keys,
		query::RecordFilter,
	},
};
use async_trait::async_trait;
use sea_orm::{
	ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
	PaginatorTrait, QueryFilter, QueryOrder,
};
use std::sync::Arc;

#[async_trait]
impl Persist for Customer {
	async fn save_in(
		txn: &DatabaseTransaction,
		record: Arc<Self>,
		user: &str,
	) -> StoreResult<Arc<Self>> {
		let write = Write::plan(&*record)?;
		let address = save_parent(txn, required::<Self, _>(&record.address, "address")?, user).await?;

		if write == Write::Unchanged {
			if same_link(&record.address, &address) {
				return Ok(record);
			}
			let mut relinked = (*record).clone();
			relinked.address = Some(address);
			return Ok(Arc::new(relinked));
		}

		let stamp = Audit::now(user);
		let row = customer::ActiveModel {
			id: write.primary_key(record.meta.key),
			name: Set(record.name.clone()),
			address_id: Set(parent_key(&address)?),
			active: Set(record.active),
			created_at: write.created(stamp.at),
			created_by: write.created(stamp.by.clone()),
			last_update: Set(stamp.at),
			last_update_by: Set(stamp.by.clone()),
		};
		let key = write_row(txn, row, write, Self::KIND, record.meta.key).await?;

		let mut saved = (*record).clone();
		saved.address = Some(address);
		Ok(stored(saved, write, key, stamp))
	}

	async fn check_dependents(txn: &DatabaseTransaction, key: i32) -> StoreResult<()> {
		let appointments = appointment::Entity::find()
			.filter(appointment::Column::CustomerId.eq(key))
			.count(txn)
			.await?;
		reject_if_used(appointments, Self::KIND, key, keys::CUSTOMER_HAS_APPOINTMENTS)
	}

	async fn delete_row(txn: &DatabaseTransaction, key: i32) -> StoreResult<()> {
		delete_by_key::<customer::Entity>(txn, Self::KIND, key).await
	}

	async fn find(
		db: &DatabaseConnection,
		filter: &RecordFilter<Self>,
		loader: &mut Loader,
	) -> StoreResult<Vec<Arc<Self>>> {
		let rows = customer::Entity::find()
			.filter(filter.condition())
			.order_by_asc(customer::Column::Name)
			.all(db)
			.await?;

		let mut customers = Vec::with_capacity(rows.len());
		for row in rows {
			customers.push(loader.customer_row(db, row).await?);
		}
		Ok(customers)
	}
}
