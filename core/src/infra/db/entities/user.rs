//! User entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	#[sea_orm(unique)]
	pub user_name: String,
	pub password: String,
	pub active: bool,

	// Audit
	pub created_at: DateTimeUtc,
	pub created_by: String,
	pub last_update: DateTimeUtc,
	pub last_update_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::appointment::Entity")]
	Appointments,
}

impl Related<super::appointment::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Appointments.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
