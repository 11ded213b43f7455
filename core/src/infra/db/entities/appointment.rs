//! Appointment entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointment")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	pub customer_id: i32,
	pub user_id: i32,
	pub title: String,
	pub description: String,
	pub location: String,
	pub contact: String,
	pub appointment_type: String,
	pub url: String,
	pub start: DateTimeUtc,
	pub end: DateTimeUtc,

	// Audit
	pub created_at: DateTimeUtc,
	pub created_by: String,
	pub last_update: DateTimeUtc,
	pub last_update_by: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::customer::Entity",
		from = "Column::CustomerId",
		to = "super::customer::Column::Id"
	)]
	Customer,
	#[sea_orm(
		belongs_to = "super::user::Entity",
		from = "Column::UserId",
		to = "super::user::Column::Id"
	)]
	User,
}

impl Related<super::customer::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Customer.def()
	}
}

impl Related<super::user::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::User.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
