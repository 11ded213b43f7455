use super::{
	delete_by_key, parent_key, reject_if_used, required, same_link, save_parent, stored,
	write_row, Loader, Persist, StoreResult, Write,
};
use crate::{
	domain::{Audit, City, Entity},
	infra::{
		db::entities::{address, city},
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
impl Persist for City {
	async fn save_in(
		txn: &DatabaseTransaction,
		record: Arc<Self>,
		user: &str,
	) -> StoreResult<Arc<Self>> {
		let write = Write::plan(&*record)?;
		let country = save_parent(txn, required::<Self, _>(&record.country, "country")?, user).await?;

		if write == Write::Unchanged {
			if same_link(&record.country, &country) {
				return Ok(record);
			}
			let mut relinked = (*record).clone();
			relinked.country = Some(country);
			return Ok(Arc::new(relinked));
		}

		let stamp = Audit::now(user);
		let row = city::ActiveModel {
			id: write.primary_key(record.meta.key),
			name: Set(record.name.clone()),
			country_id: Set(parent_key(&country)?),
			created_at: write.created(stamp.at),
			created_by: write.created(stamp.by.clone()),
			last_update: Set(stamp.at),
			last_update_by: Set(stamp.by.clone()),
		};
		let key = write_row(txn, row, write, Self::KIND, record.meta.key).await?;

		let mut saved = (*record).clone();
		saved.country = Some(country);
		Ok(stored(saved, write, key, stamp))
	}

	async fn check_dependents(txn: &DatabaseTransaction, key: i32) -> StoreResult<()> {
		let addresses = address::Entity::find()
			.filter(address::Column::CityId.eq(key))
			.count(txn)
			.await?;
		reject_if_used(addresses, Self::KIND, key, keys::CITY_HAS_ADDRESSES)
	}

	async fn delete_row(txn: &DatabaseTransaction, key: i32) -> StoreResult<()> {
		delete_by_key::<city::Entity>(txn, Self::KIND, key).await
	}

	async fn find(
		db: &DatabaseConnection,
		filter: &RecordFilter<Self>,
		loader: &mut Loader,
	) -> StoreResult<Vec<Arc<Self>>> {
		let rows = city::Entity::find()
			.filter(filter.condition())
			.order_by_asc(city::Column::Name)
			.all(db)
			.await?;

		let mut cities = Vec::with_capacity(rows.len());
		for row in rows {
			cities.push(loader.city_row(db, row).await?);
		}
		Ok(cities)
	}
}
