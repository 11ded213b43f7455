//! City entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "city")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	pub name: String,
	pub country_id: i32,

	// Audit
	pub created_at: DateTimeUtc,
	pub created_by: String,
	pub last_update: DateTimeUtc,
	pub last_update_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::country::Entity",
		from = "Column::CountryId",
		to = "super::country::Column::Id"
	)]
	Country,
	#[sea_orm(has_many = "super::address::Entity")]
	Addresses,
}

impl Related<super::country::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Country.def()
	}
}

impl Related<super::address::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Addresses.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
