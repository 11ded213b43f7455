//! Initial schema for the scheduler
//!
//! Creates the six record tables. Foreign keys restrict deletes so a row can
//! never be removed while another row still points at it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Audit columns shared by every table
fn audit_columns(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
	table
		.col(
			ColumnDef::new(Audit::CreatedAt)
				.timestamp_with_time_zone()
				.not_null(),
		)
		.col(ColumnDef::new(Audit::CreatedBy).string_len(50).not_null())
		.col(
			ColumnDef::new(Audit::LastUpdate)
				.timestamp_with_time_zone()
				.not_null(),
		)
		.col(ColumnDef::new(Audit::LastUpdateBy).string_len(50).not_null())
}

fn id_column<T: IntoIden>(column: T) -> ColumnDef {
	ColumnDef::new(column)
		.integer()
		.not_null()
		.auto_increment()
		.primary_key()
		.to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		// Create country table
		manager
			.create_table(
				audit_columns(
					Table::create()
						.table(Country::Table)
						.if_not_exists()
						.col(id_column(Country::Id))
						.col(ColumnDef::new(Country::Name).string_len(50).not_null()),
				)
				.to_owned(),
			)
			.await?;

		// Create city table
		manager
			.create_table(
				audit_columns(
					Table::create()
						.table(City::Table)
						.if_not_exists()
						.col(id_column(City::Id))
						.col(ColumnDef::new(City::Name).string_len(50).not_null())
						.col(ColumnDef::new(City::CountryId).integer().not_null())
						.foreign_key(
							ForeignKey::create()
								.from(City::Table, City::CountryId)
								.to(Country::Table, Country::Id)
								.on_delete(ForeignKeyAction::Restrict),
						),
				)
				.to_owned(),
			)
			.await?;

		// Create address table
		manager
			.create_table(
				audit_columns(
					Table::create()
						.table(Address::Table)
						.if_not_exists()
						.col(id_column(Address::Id))
						.col(ColumnDef::new(Address::Address1).string_len(50).not_null())
						.col(ColumnDef::new(Address::Address2).string_len(50).not_null())
						.col(ColumnDef::new(Address::CityId).integer().not_null())
						.col(ColumnDef::new(Address::PostalCode).string_len(10).not_null())
						.col(ColumnDef::new(Address::Phone).string_len(20).not_null())
						.foreign_key(
							ForeignKey::create()
								.from(Address::Table, Address::CityId)
								.to(City::Table, City::Id)
								.on_delete(ForeignKeyAction::Restrict),
						),
				)
				.to_owned(),
			)
			.await?;

		// Create customer table
		manager
			.create_table(
				audit_columns(
					Table::create()
						.table(Customer::Table)
						.if_not_exists()
						.col(id_column(Customer::Id))
						.col(ColumnDef::new(Customer::Name).string_len(45).not_null())
						.col(ColumnDef::new(Customer::AddressId).integer().not_null())
						.col(
							ColumnDef::new(Customer::Active)
								.boolean()
								.not_null()
								.default(true),
						)
						.foreign_key(
							ForeignKey::create()
								.from(Customer::Table, Customer::AddressId)
								.to(Address::Table, Address::Id)
								.on_delete(ForeignKeyAction::Restrict),
						),
				)
				.to_owned(),
			)
			.await?;

		// Create users table
		manager
			.create_table(
				audit_columns(
					Table::create()
						.table(Users::Table)
						.if_not_exists()
						.col(id_column(Users::Id))
						.col(
							ColumnDef::new(Users::UserName)
								.string_len(50)
								.not_null()
								.unique_key(),
						)
						.col(ColumnDef::new(Users::Password).string_len(50).not_null())
						.col(
							ColumnDef::new(Users::Active)
								.boolean()
								.not_null()
								.default(true),
						),
				)
				.to_owned(),
			)
			.await?;

		// Create appointment table
		manager
			.create_table(
				audit_columns(
					Table::create()
						.table(Appointment::Table)
						.if_not_exists()
						.col(id_column(Appointment::Id))
						.col(ColumnDef::new(Appointment::CustomerId).integer().not_null())
						.col(ColumnDef::new(Appointment::UserId).integer().not_null())
						.col(ColumnDef::new(Appointment::Title).string_len(255).not_null())
						.col(ColumnDef::new(Appointment::Description).text().not_null())
						.col(ColumnDef::new(Appointment::Location).text().not_null())
						.col(ColumnDef::new(Appointment::Contact).text().not_null())
						.col(
							ColumnDef::new(Appointment::AppointmentType)
								.string_len(50)
								.not_null(),
						)
						.col(ColumnDef::new(Appointment::Url).string_len(255).not_null())
						.col(
							ColumnDef::new(Appointment::Start)
								.timestamp_with_time_zone()
								.not_null(),
						)
						.col(
							ColumnDef::new(Appointment::End)
								.timestamp_with_time_zone()
								.not_null(),
						)
						.foreign_key(
							ForeignKey::create()
								.from(Appointment::Table, Appointment::CustomerId)
								.to(Customer::Table, Customer::Id)
								.on_delete(ForeignKeyAction::Restrict),
						)
						.foreign_key(
							ForeignKey::create()
								.from(Appointment::Table, Appointment::UserId)
								.to(Users::Table, Users::Id)
								.on_delete(ForeignKeyAction::Restrict),
						),
				)
				.to_owned(),
			)
			.await?;

		// Lookups used by the record filters
		manager
			.create_index(
				Index::create()
					.name("idx_appointment_start")
					.table(Appointment::Table)
					.col(Appointment::Start)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		// Drop in reverse dependency order
		manager
			.drop_table(Table::drop().table(Appointment::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Users::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Customer::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Address::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(City::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Country::Table).to_owned())
			.await?;
		Ok(())
	}
}

#[derive(DeriveIden)]
enum Audit {
	CreatedAt,
	CreatedBy,
	LastUpdate,
	LastUpdateBy,
}

#[derive(DeriveIden)]
enum Country {
	Table,
	Id,
	Name,
}

#[derive(DeriveIden)]
enum City {
	Table,
	Id,
	Name,
	CountryId,
}

#[derive(DeriveIden)]
enum Address {
	Table,
	Id,
	Address1,
	Address2,
	CityId,
	PostalCode,
	Phone,
}

#[derive(DeriveIden)]
enum Customer {
	Table,
	Id,
	Name,
	AddressId,
	Active,
}

#[derive(DeriveIden)]
enum Users {
	Table,
	Id,
	UserName,
	Password,
	Active,
}

#[derive(DeriveIden)]
enum Appointment {
	Table,
	Id,
	CustomerId,
	UserId,
	Title,
	Description,
	Location,
	Contact,
	AppointmentType,
	Url,
	Start,
	End,
}
