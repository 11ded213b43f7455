use super::{
	delete_by_key, reject_if_used, stored, write_row, Loader, Persist, StoreResult, Write,
};
use crate::{
	domain::{Audit, Country, Entity},
	infra::{
		db::entities::{city, country},
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
impl Persist for Country {
	async fn save_in(
		txn: &DatabaseTransaction,
		record: Arc<Self>,
		user: &str,
	) -> StoreResult<Arc<Self>> {
		let write = Write::plan(&*record)?;
		if write == Write::Unchanged {
			return Ok(record);
		}

		let stamp = Audit::now(user);
		let row = country::ActiveModel {
			id: write.primary_key(record.meta.key),
			name: Set(record.name.clone()),
			created_at: write.created(stamp.at),
			created_by: write.created(stamp.by.clone()),
			last_update: Set(stamp.at),
			last_update_by: Set(stamp.by.clone()),
		};
		let key = write_row(txn, row, write, Self::KIND, record.meta.key).await?;

		Ok(stored((*record).clone(), write, key, stamp))
	}

	async fn check_dependents(txn: &DatabaseTransaction, key: i32) -> StoreResult<()> {
		let cities = city::Entity::find()
			.filter(city::Column::CountryId.eq(key))
			.count(txn)
			.await?;
		reject_if_used(cities, Self::KIND, key, keys::COUNTRY_HAS_CITIES)
	}

	async fn delete_row(txn: &DatabaseTransaction, key: i32) -> StoreResult<()> {
		delete_by_key::<country::Entity>(txn, Self::KIND, key).await
	}

	async fn find(
		db: &DatabaseConnection,
		filter: &RecordFilter<Self>,
		loader: &mut Loader,
	) -> StoreResult<Vec<Arc<Self>>> {
		let rows = country::Entity::find()
			.filter(filter.condition())
			.order_by_asc(country::Column::Name)
			.all(db)
			.await?;
		Ok(rows.into_iter().map(|row| loader.country_row(row)).collect())
	}
}
