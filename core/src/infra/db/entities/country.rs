//! Country entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "country")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	pub name: String,

	// Audit
	pub created_at: DateTimeUtc,
	pub created_by: String,
	pub last_update: DateTimeUtc,
	pub last_update_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::city::Entity")]
	Cities,
}

impl Related<super::city::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Cities.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
