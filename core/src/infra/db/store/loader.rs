//! Builds records from table rows, resolving parents once per load

use super::{loaded_meta, StoreError, StoreResult};
use crate::{
	domain::{Address, Appointment, City, Country, Customer, EntityKind, Related, User},
	infra::db::entities::{address, appointment, city, country, customer, user},
};
use sea_orm::{DatabaseConnection, EntityTrait};
use std::{collections::HashMap, sync::Arc};

/// Per-load cache of parent records
///
/// Rows sharing a parent share one record instance. City, address and
/// customer parents are loaded as full rows; an appointment only references
/// its customer and user.
#[derive(Debug, Default)]
pub struct Loader {
	countries: HashMap<i32, Arc<Country>>,
	cities: HashMap<i32, Arc<City>>,
	addresses: HashMap<i32, Arc<Address>>,
	customers: HashMap<i32, Arc<Customer>>,
	users: HashMap<i32, Arc<User>>,
}

fn not_found(entity: EntityKind, key: i32) -> StoreError {
	StoreError::NotFound { entity, key }
}

impl Loader {
	pub fn country_row(&mut self, row: country::Model) -> Arc<Country> {
		if let Some(cached) = self.countries.get(&row.id) {
			return Arc::clone(cached);
		}
		let record = Arc::new(Country {
			meta: loaded_meta(
				row.id,
				row.created_at,
				row.created_by,
				row.last_update,
				row.last_update_by,
			),
			name: row.name,
		});
		self.countries.insert(row.id, Arc::clone(&record));
		record
	}

	pub fn user_row(&mut self, row: user::Model) -> Arc<User> {
		if let Some(cached) = self.users.get(&row.id) {
			return Arc::clone(cached);
		}
		let record = Arc::new(User {
			meta: loaded_meta(
				row.id,
				row.created_at,
				row.created_by,
				row.last_update,
				row.last_update_by,
			),
			user_name: row.user_name,
			password: row.password,
			active: row.active,
		});
		self.users.insert(row.id, Arc::clone(&record));
		record
	}

	pub async fn city_row(&mut self, db: &DatabaseConnection, row: city::Model) -> StoreResult<Arc<City>> {
		if let Some(cached) = self.cities.get(&row.id) {
			return Ok(Arc::clone(cached));
		}
		let country = self.country(db, row.country_id).await?;
		let record = Arc::new(City {
			meta: loaded_meta(
				row.id,
				row.created_at,
				row.created_by,
				row.last_update,
				row.last_update_by,
			),
			name: row.name,
			country: Some(Related::Row(country)),
		});
		self.cities.insert(row.id, Arc::clone(&record));
		Ok(record)
	}

	pub async fn address_row(
		&mut self,
		db: &DatabaseConnection,
		row: address::Model,
	) -> StoreResult<Arc<Address>> {
		if let Some(cached) = self.addresses.get(&row.id) {
			return Ok(Arc::clone(cached));
		}
		let city = self.city(db, row.city_id).await?;
		let record = Arc::new(Address {
			meta: loaded_meta(
				row.id,
				row.created_at,
				row.created_by,
				row.last_update,
				row.last_update_by,
			),
			address1: row.address1,
			address2: row.address2,
			postal_code: row.postal_code,
			phone: row.phone,
			city: Some(Related::Row(city)),
		});
		self.addresses.insert(row.id, Arc::clone(&record));
		Ok(record)
	}

	pub async fn customer_row(
		&mut self,
		db: &DatabaseConnection,
		row: customer::Model,
	) -> StoreResult<Arc<Customer>> {
		if let Some(cached) = self.customers.get(&row.id) {
			return Ok(Arc::clone(cached));
		}
		let address = self.address(db, row.address_id).await?;
		let record = Arc::new(Customer {
			meta: loaded_meta(
				row.id,
				row.created_at,
				row.created_by,
				row.last_update,
				row.last_update_by,
			),
			name: row.name,
			active: row.active,
			address: Some(Related::Row(address)),
		});
		self.customers.insert(row.id, Arc::clone(&record));
		Ok(record)
	}

	/// Appointments are never shared between rows, so they are not cached
	pub async fn appointment_row(
		&mut self,
		db: &DatabaseConnection,
		row: appointment::Model,
	) -> StoreResult<Arc<Appointment>> {
		let customer = self.customer(db, row.customer_id).await?;
		let owner = self.user(db, row.user_id).await?;
		Ok(Arc::new(Appointment {
			meta: loaded_meta(
				row.id,
				row.created_at,
				row.created_by,
				row.last_update,
				row.last_update_by,
			),
			title: row.title,
			description: row.description,
			location: row.location,
			contact: row.contact,
			appointment_type: row.appointment_type,
			url: row.url,
			start: row.start,
			end: row.end,
			customer: Some(Related::Reference(customer)),
			user: Some(Related::Reference(owner)),
		}))
	}

	pub async fn country(&mut self, db: &DatabaseConnection, key: i32) -> StoreResult<Arc<Country>> {
		if let Some(cached) = self.countries.get(&key) {
			return Ok(Arc::clone(cached));
		}
		let row = country::Entity::find_by_id(key)
			.one(db)
			.await?
			.ok_or_else(|| not_found(EntityKind::Country, key))?;
		Ok(self.country_row(row))
	}

	pub async fn user(&mut self, db: &DatabaseConnection, key: i32) -> StoreResult<Arc<User>> {
		if let Some(cached) = self.users.get(&key) {
			return Ok(Arc::clone(cached));
		}
		let row = user::Entity::find_by_id(key)
			.one(db)
			.await?
			.ok_or_else(|| not_found(EntityKind::User, key))?;
		Ok(self.user_row(row))
	}

	pub async fn city(&mut self, db: &DatabaseConnection, key: i32) -> StoreResult<Arc<City>> {
		if let Some(cached) = self.cities.get(&key) {
			return Ok(Arc::clone(cached));
		}
		let row = city::Entity::find_by_id(key)
			.one(db)
			.await?
			.ok_or_else(|| not_found(EntityKind::City, key))?;
		self.city_row(db, row).await
	}

	pub async fn address(&mut self, db: &DatabaseConnection, key: i32) -> StoreResult<Arc<Address>> {
		if let Some(cached) = self.addresses.get(&key) {
			return Ok(Arc::clone(cached));
		}
		let row = address::Entity::find_by_id(key)
			.one(db)
			.await?
			.ok_or_else(|| not_found(EntityKind::Address, key))?;
		self.address_row(db, row).await
	}

	pub async fn customer(&mut self, db: &DatabaseConnection, key: i32) -> StoreResult<Arc<Customer>> {
		if let Some(cached) = self.customers.get(&key) {
			return Ok(Arc::clone(cached));
		}
		let row = customer::Entity::find_by_id(key)
			.one(db)
			.await?
			.ok_or_else(|| not_found(EntityKind::Customer, key))?;
		self.customer_row(db, row).await
	}
}
