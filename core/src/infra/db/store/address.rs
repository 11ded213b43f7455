use super::{
	delete_by_key, parent_key, reject_if_used, required, same_link, save_parent, stored,
	write_row, Loader, Persist, StoreResult, Write,
};
use crate::{
	domain::{Address, Audit, Entity},
	infra::{
		db::entities::{address, customer},
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
impl Persist for Address {
	async fn save_in(
		txn: &DatabaseTransaction,
		record: Arc<Self>,
		user: &str,
	) -> StoreResult<Arc<Self>> {
		let write = Write::plan(&*record)?;
		let city = save_parent(txn, required::<Self, _>(&record.city, "city")?, user).await?;

		if write == Write::Unchanged {
			if same_link(&record.city, &city) {
				return Ok(record);
			}
			let mut relinked = (*record).clone();
			relinked.city = Some(city);
			return Ok(Arc::new(relinked));
		}

		let stamp = Audit::now(user);
		let row = address::ActiveModel {
			id: write.primary_key(record.meta.key),
			address1: Set(record.address1.clone()),
			address2: Set(record.address2.clone()),
			city_id: Set(parent_key(&city)?),
			postal_code: Set(record.postal_code.clone()),
			phone: Set(record.phone.clone()),
			created_at: write.created(stamp.at),
			created_by: write.created(stamp.by.clone()),
			last_update: Set(stamp.at),
			last_update_by: Set(stamp.by.clone()),
		};
		let key = write_row(txn, row, write, Self::KIND, record.meta.key).await?;

		let mut saved = (*record).clone();
		saved.city = Some(city);
		Ok(stored(saved, write, key, stamp))
	}

	async fn check_dependents(txn: &DatabaseTransaction, key: i32) -> StoreResult<()> {
		let customers = customer::Entity::find()
			.filter(customer::Column::AddressId.eq(key))
			.count(txn)
			.await?;
		reject_if_used(customers, Self::KIND, key, keys::ADDRESS_HAS_CUSTOMERS)
	}

	async fn delete_row(txn: &DatabaseTransaction, key: i32) -> StoreResult<()> {
		delete_by_key::<address::Entity>(txn, Self::KIND, key).await
	}

	async fn find(
		db: &DatabaseConnection,
		filter: &RecordFilter<Self>,
		loader: &mut Loader,
	) -> StoreResult<Vec<Arc<Self>>> {
		let rows = address::Entity::find()
			.filter(filter.condition())
			.order_by_asc(address::Column::Id)
			.all(db)
			.await?;

		let mut addresses = Vec::with_capacity(rows.len());
		for row in rows {
			addresses.push(loader.address_row(db, row).await?);
		}
		Ok(addresses)
	}
}
