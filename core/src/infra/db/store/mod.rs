//! Record persistence
//!
//! A save runs in one transaction. Live parent rows are saved first, depth
//! first, so a new customer with a new address in a new city is inserted in
//! one go; read-only references are never written. Every write hands back a
//! fresh record carrying the key, row state and audit stamps the database
//! now holds. The records passed in are never modified.

mod address;
mod appointment;
mod city;
mod country;
mod customer;
mod loader;
mod user;

pub use loader::Loader;

use crate::{
	domain::{Audit, Entity, EntityKind, RecordMeta, Related, RowState},
	infra::query::RecordFilter,
};
use async_trait::async_trait;
use sea_orm::{
	ActiveModelTrait, ActiveValue, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
	IntoActiveModel, PrimaryKeyTrait, TransactionTrait,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("Database error: {0}")]
	Database(#[from] DbErr),

	#[error("{entity} {key} does not exist")]
	NotFound { entity: EntityKind, key: i32 },

	/// Delete guard; `reason` is a message key
	#[error("{entity} {key} is still in use ({reason})")]
	Rejected {
		entity: EntityKind,
		key: i32,
		reason: &'static str,
	},

	#[error("{0} record has not been saved")]
	NotPersisted(EntityKind),

	#[error("{0} record has been deleted")]
	Deleted(EntityKind),

	#[error("{entity} record has no {link}")]
	MissingLink {
		entity: EntityKind,
		link: &'static str,
	},
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence of one entity kind
#[async_trait]
pub trait Persist: Entity {
	/// Writes the record, and its live parent rows, within `txn`
	async fn save_in(
		txn: &DatabaseTransaction,
		record: Arc<Self>,
		user: &str,
	) -> StoreResult<Arc<Self>>;

	/// Fails with [`StoreError::Rejected`] while other rows point at `key`
	async fn check_dependents(txn: &DatabaseTransaction, key: i32) -> StoreResult<()>;

	async fn delete_row(txn: &DatabaseTransaction, key: i32) -> StoreResult<()>;

	/// Records selected by `filter`, parents resolved through `loader`
	async fn find(
		db: &DatabaseConnection,
		filter: &RecordFilter<Self>,
		loader: &mut Loader,
	) -> StoreResult<Vec<Arc<Self>>>;

	/// Inserts or updates the record in its own transaction
	async fn save(db: &DatabaseConnection, record: Arc<Self>, user: &str) -> StoreResult<Arc<Self>> {
		let txn = db.begin().await?;
		let saved = Self::save_in(&txn, record, user).await?;
		txn.commit().await?;
		Ok(saved)
	}

	/// Deletes the record once no other row depends on it. Returns the
	/// record in the `Deleted` state.
	async fn delete(db: &DatabaseConnection, record: Arc<Self>) -> StoreResult<Arc<Self>> {
		let key = persisted_key(&*record)?;

		let txn = db.begin().await?;
		Self::check_dependents(&txn, key).await?;
		Self::delete_row(&txn, key).await?;
		txn.commit().await?;

		debug!("Deleted {} {}", Self::KIND, key);
		let mut deleted = (*record).clone();
		deleted.meta_mut().row_state = RowState::Deleted;
		Ok(Arc::new(deleted))
	}

	async fn load(db: &DatabaseConnection, filter: &RecordFilter<Self>) -> StoreResult<Vec<Arc<Self>>> {
		let mut loader = Loader::default();
		Self::find(db, filter, &mut loader).await
	}
}

/// What a save does to the record's own row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Write {
	Insert,
	Update,
	/// Row is current; only parents may need saving
	Unchanged,
}

impl Write {
	fn plan<R: Entity>(record: &R) -> StoreResult<Self> {
		match record.meta().row_state {
			RowState::New => Ok(Self::Insert),
			RowState::Modified => Ok(Self::Update),
			RowState::Unmodified => Ok(Self::Unchanged),
			RowState::Deleted => Err(StoreError::Deleted(R::KIND)),
		}
	}

	fn primary_key(self, key: i32) -> ActiveValue<i32> {
		match self {
			Self::Insert => ActiveValue::NotSet,
			Self::Update | Self::Unchanged => ActiveValue::Unchanged(key),
		}
	}

	/// Created-audit columns are only written by an insert
	fn created<T: Into<sea_orm::Value>>(self, value: T) -> ActiveValue<T> {
		match self {
			Self::Insert => ActiveValue::Set(value),
			Self::Update | Self::Unchanged => ActiveValue::NotSet,
		}
	}
}

/// Key of a saved, live record
fn persisted_key<R: Entity>(record: &R) -> StoreResult<i32> {
	let meta = record.meta();
	if meta.is_deleted() {
		return Err(StoreError::Deleted(R::KIND));
	}
	if meta.key == 0 {
		return Err(StoreError::NotPersisted(R::KIND));
	}
	Ok(meta.key)
}

fn required<'a, R: Entity, T>(
	link: &'a Option<Related<T>>,
	name: &'static str,
) -> StoreResult<&'a Related<T>> {
	link.as_ref().ok_or(StoreError::MissingLink {
		entity: R::KIND,
		link: name,
	})
}

/// Key a foreign key column takes from a saved parent
fn parent_key<T: Entity>(link: &Related<T>) -> StoreResult<i32> {
	persisted_key(&**link.record())
}

/// Saves a live parent row first; references are trusted as stored
async fn save_parent<T: Persist>(
	txn: &DatabaseTransaction,
	link: &Related<T>,
	user: &str,
) -> StoreResult<Related<T>> {
	match link {
		Related::Row(record) => {
			let saved = T::save_in(txn, Arc::clone(record), user).await?;
			Ok(link.with_record(saved))
		}
		Related::Reference(_) => Ok(link.clone()),
	}
}

/// Whether a saved parent is still the very record the link pointed at
fn same_link<T>(current: &Option<Related<T>>, saved: &Related<T>) -> bool {
	current.as_ref().is_some_and(|link| link.ptr_eq(saved))
}

/// Runs the insert or update for one row, returning the row's key
async fn write_row<A>(
	txn: &DatabaseTransaction,
	row: A,
	write: Write,
	entity: EntityKind,
	key: i32,
) -> StoreResult<i32>
where
	A: ActiveModelTrait + Send,
	<A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
	<A::Entity as EntityTrait>::PrimaryKey: PrimaryKeyTrait<ValueType = i32>,
{
	match write {
		Write::Insert => {
			let inserted = <A::Entity as EntityTrait>::insert(row).exec(txn).await?;
			debug!("Inserted {} {}", entity, inserted.last_insert_id);
			Ok(inserted.last_insert_id)
		}
		Write::Update => match <A::Entity as EntityTrait>::update(row).exec(txn).await {
			Ok(_) => {
				debug!("Updated {} {}", entity, key);
				Ok(key)
			}
			Err(DbErr::RecordNotUpdated) => Err(StoreError::NotFound { entity, key }),
			Err(e) => Err(e.into()),
		},
		Write::Unchanged => Ok(key),
	}
}

async fn delete_by_key<E>(txn: &DatabaseTransaction, entity: EntityKind, key: i32) -> StoreResult<()>
where
	E: EntityTrait,
	E::PrimaryKey: PrimaryKeyTrait<ValueType = i32>,
{
	let result = E::delete_by_id(key).exec(txn).await?;
	if result.rows_affected == 0 {
		return Err(StoreError::NotFound { entity, key });
	}
	Ok(())
}

fn reject_if_used(dependents: u64, entity: EntityKind, key: i32, reason: &'static str) -> StoreResult<()> {
	if dependents > 0 {
		debug!("{} {} has {} dependent rows", entity, key, dependents);
		return Err(StoreError::Rejected {
			entity,
			key,
			reason,
		});
	}
	Ok(())
}

/// The record as written: persisted key, created audit kept on update
fn stored<R: Entity>(mut record: R, write: Write, key: i32, stamp: Audit) -> Arc<R> {
	let created = match (write, record.meta().created.clone()) {
		(Write::Update, Some(created)) => created,
		_ => stamp.clone(),
	};
	*record.meta_mut() = RecordMeta::persisted(key, created, stamp);
	Arc::new(record)
}

/// Metadata of a row read from the database
fn loaded_meta(
	key: i32,
	created_at: chrono::DateTime<chrono::Utc>,
	created_by: String,
	last_update: chrono::DateTime<chrono::Utc>,
	last_update_by: String,
) -> RecordMeta {
	RecordMeta::persisted(
		key,
		Audit {
			by: created_by,
			at: created_at,
		},
		Audit {
			by: last_update_by,
			at: last_update,
		},
	)
}
