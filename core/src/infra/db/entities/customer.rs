//! Customer entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "customer")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	pub name: String,
	pub address_id: i32,
	pub active: bool,

	// Audit
	pub created_at: DateTimeUtc,
	pub created_by: String,
	pub last_update: DateTimeUtc,
	pub last_update_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::address::Entity",
		from = "Column::AddressId",
		to = "super::address::Column::Id"
	)]
	Address,
	#[sea_orm(has_many = "super::appointment::Entity")]
	Appointments,
}

impl Related<super::address::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Address.def()
	}
}

impl Related<super::appointment::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Appointments.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
