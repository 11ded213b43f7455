//! Address entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "address")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	pub address1: String,
	pub address2: String,
	pub city_id: i32,
	pub postal_code: String,
	pub phone: String,

	// Audit
	pub created_at: DateTimeUtc,
	pub created_by: String,
	pub last_update: DateTimeUtc,
	pub last_update_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::city::Entity",
		from = "Column::CityId",
		to = "super::city::Column::Id"
	)]
	City,
	#[sea_orm(has_many = "super::customer::Entity")]
	Customers,
}

impl Related<super::city::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::City.def()
	}
}

impl Related<super::customer::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Customers.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
