//! SeaORM entities for the scheduler tables

pub mod address;
pub mod appointment;
pub mod city;
pub mod country;
pub mod customer;
pub mod user;

pub use address::Entity as AddressRow;
pub use appointment::Entity as AppointmentRow;
pub use city::Entity as CityRow;
pub use country::Entity as CountryRow;
pub use customer::Entity as CustomerRow;
pub use user::Entity as UserRow;
