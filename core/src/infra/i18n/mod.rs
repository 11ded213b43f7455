//! User-facing messages
//!
//! Validation and delete guards report message keys; a [`Messages`]
//! implementation turns them into display text. [`ResourceBundle`] carries
//! the built-in English text and can be overlaid from a JSON object of
//! `key: text` pairs.

use crate::domain::EntityKind;
use std::{collections::HashMap, fs, io, path::Path};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::{info, warn};

/// Message keys
pub mod keys {
	pub const RECORD_NOT_SAVED: &str = "recordNotSaved";

	pub const COUNTRY_NAME_NOT_DEFINED: &str = "countryNameNotDefined";
	pub const COUNTRY_NAME_TOO_LONG: &str = "countryNameTooLong";

	pub const CITY_NAME_NOT_DEFINED: &str = "cityNameNotDefined";
	pub const CITY_NAME_TOO_LONG: &str = "cityNameTooLong";
	pub const COUNTRY_NOT_SPECIFIED: &str = "countryNotSpecified";

	pub const STREET_ADDRESS_NOT_DEFINED: &str = "streetAddressNotDefined";
	pub const ADDRESS_LINE_TOO_LONG: &str = "addressLineTooLong";
	pub const POSTAL_CODE_TOO_LONG: &str = "postalCodeTooLong";
	pub const PHONE_TOO_LONG: &str = "phoneTooLong";
	pub const CITY_NOT_SPECIFIED: &str = "cityNotSpecified";

	pub const CUSTOMER_NAME_NOT_DEFINED: &str = "customerNameNotDefined";
	pub const CUSTOMER_NAME_TOO_LONG: &str = "customerNameTooLong";
	pub const ADDRESS_NOT_SPECIFIED: &str = "addressNotSpecified";

	pub const TITLE_NOT_DEFINED: &str = "titleNotDefined";
	pub const TITLE_TOO_LONG: &str = "titleTooLong";
	pub const TYPE_NOT_DEFINED: &str = "typeNotDefined";
	pub const TYPE_TOO_LONG: &str = "typeTooLong";
	pub const URL_TOO_LONG: &str = "urlTooLong";
	pub const END_BEFORE_START: &str = "endBeforeStart";
	pub const CUSTOMER_NOT_SPECIFIED: &str = "customerNotSpecified";
	pub const USER_NOT_SPECIFIED: &str = "userNotSpecified";

	pub const USER_NAME_NOT_DEFINED: &str = "userNameNotDefined";
	pub const USER_NAME_TOO_LONG: &str = "userNameTooLong";
	pub const PASSWORD_NOT_DEFINED: &str = "passwordNotDefined";
	pub const PASSWORD_TOO_LONG: &str = "passwordTooLong";

	pub const COUNTRY_HAS_CITIES: &str = "countryHasCities";
	pub const CITY_HAS_ADDRESSES: &str = "cityHasAddresses";
	pub const ADDRESS_HAS_CUSTOMERS: &str = "addressHasCustomers";
	pub const CUSTOMER_HAS_APPOINTMENTS: &str = "customerHasAppointments";
	pub const USER_HAS_APPOINTMENTS: &str = "userHasAppointments";
}

const DEFAULTS: &[(&str, &str)] = &[
	(keys::RECORD_NOT_SAVED, "Record has not been saved"),
	(keys::COUNTRY_NAME_NOT_DEFINED, "Country name not defined"),
	(keys::COUNTRY_NAME_TOO_LONG, "Country name cannot be longer than 50 characters"),
	(keys::CITY_NAME_NOT_DEFINED, "City name not defined"),
	(keys::CITY_NAME_TOO_LONG, "City name cannot be longer than 50 characters"),
	(keys::COUNTRY_NOT_SPECIFIED, "Country not specified"),
	(keys::STREET_ADDRESS_NOT_DEFINED, "Street address not defined"),
	(keys::ADDRESS_LINE_TOO_LONG, "Address line cannot be longer than 50 characters"),
	(keys::POSTAL_CODE_TOO_LONG, "Postal code cannot be longer than 10 characters"),
	(keys::PHONE_TOO_LONG, "Phone number cannot be longer than 20 characters"),
	(keys::CITY_NOT_SPECIFIED, "City not specified"),
	(keys::CUSTOMER_NAME_NOT_DEFINED, "Customer name not defined"),
	(keys::CUSTOMER_NAME_TOO_LONG, "Customer name cannot be longer than 45 characters"),
	(keys::ADDRESS_NOT_SPECIFIED, "Address not specified"),
	(keys::TITLE_NOT_DEFINED, "Title not defined"),
	(keys::TITLE_TOO_LONG, "Title cannot be longer than 255 characters"),
	(keys::TYPE_NOT_DEFINED, "Appointment type not defined"),
	(keys::TYPE_TOO_LONG, "Appointment type cannot be longer than 50 characters"),
	(keys::URL_TOO_LONG, "URL cannot be longer than 255 characters"),
	(keys::END_BEFORE_START, "Appointment end must be after its start"),
	(keys::CUSTOMER_NOT_SPECIFIED, "Customer not specified"),
	(keys::USER_NOT_SPECIFIED, "User not specified"),
	(keys::USER_NAME_NOT_DEFINED, "User name not defined"),
	(keys::USER_NAME_TOO_LONG, "User name cannot be longer than 50 characters"),
	(keys::PASSWORD_NOT_DEFINED, "Password not defined"),
	(keys::PASSWORD_TOO_LONG, "Password cannot be longer than 50 characters"),
	(keys::COUNTRY_HAS_CITIES, "Country is still used by one or more cities"),
	(keys::CITY_HAS_ADDRESSES, "City is still used by one or more addresses"),
	(keys::ADDRESS_HAS_CUSTOMERS, "Address is still used by one or more customers"),
	(keys::CUSTOMER_HAS_APPOINTMENTS, "Customer still has appointments"),
	(keys::USER_HAS_APPOINTMENTS, "User still has appointments"),
];

/// Message lookup
pub trait Messages {
	/// Text for `key`. Unknown keys resolve to the key itself.
	fn get_string(&self, key: &str) -> String;
}

#[derive(Debug, Error)]
pub enum BundleError {
	#[error("failed to read message overlay: {0}")]
	Io(#[from] io::Error),

	#[error("message overlay is not a JSON object of strings: {0}")]
	Format(#[from] serde_json::Error),
}

/// Message table with built-in defaults
#[derive(Debug, Clone)]
pub struct ResourceBundle {
	messages: HashMap<String, String>,
}

impl Default for ResourceBundle {
	fn default() -> Self {
		let mut messages = DEFAULTS
			.iter()
			.map(|(key, text)| (key.to_string(), text.to_string()))
			.collect::<HashMap<_, _>>();

		for kind in EntityKind::iter() {
			messages.insert(
				kind.already_deleted_key().to_string(),
				format!("{kind} has already been deleted"),
			);
		}

		Self { messages }
	}
}

impl ResourceBundle {
	/// Built-in messages overlaid with the JSON object at `path`
	pub fn with_overlay(path: &Path) -> Result<Self, BundleError> {
		let mut bundle = Self::default();
		bundle.load_overlay(path)?;
		Ok(bundle)
	}

	/// Replaces messages with those in the JSON object at `path`
	pub fn load_overlay(&mut self, path: &Path) -> Result<usize, BundleError> {
		let json = fs::read_to_string(path)?;
		let overlay: HashMap<String, String> = serde_json::from_str(&json)?;
		let count = overlay.len();
		self.messages.extend(overlay);
		info!("Loaded {} messages from {:?}", count, path);
		Ok(count)
	}

	pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
		self.messages.insert(key.into(), text.into());
	}

	pub fn contains(&self, key: &str) -> bool {
		self.messages.contains_key(key)
	}
}

impl Messages for ResourceBundle {
	fn get_string(&self, key: &str) -> String {
		match self.messages.get(key) {
			Some(text) => text.clone(),
			None => {
				warn!("Missing message for key {:?}", key);
				key.to_string()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;
	use tracing_test::traced_test;

	#[test]
	fn every_entity_has_an_already_deleted_message() {
		let bundle = ResourceBundle::default();
		assert_eq!(
			bundle.get_string(EntityKind::Customer.already_deleted_key()),
			"Customer has already been deleted"
		);
		for kind in EntityKind::iter() {
			assert!(bundle.contains(kind.already_deleted_key()));
		}
	}

	#[test]
	#[traced_test]
	fn missing_keys_fall_back_to_the_key() {
		let bundle = ResourceBundle::default();
		assert_eq!(bundle.get_string("noSuchKey"), "noSuchKey");
		assert!(logs_contain("Missing message"));
	}

	#[test]
	fn overlay_replaces_and_extends() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("messages.json");
		fs::write(
			&path,
			r#"{"customerNameNotDefined": "Kundenavn mangler", "extra": "Ekstra"}"#,
		)
		.unwrap();

		let bundle = ResourceBundle::with_overlay(&path).unwrap();

		assert_eq!(bundle.get_string(keys::CUSTOMER_NAME_NOT_DEFINED), "Kundenavn mangler");
		assert_eq!(bundle.get_string("extra"), "Ekstra");
		assert_eq!(bundle.get_string(keys::RECORD_NOT_SAVED), "Record has not been saved");
	}

	#[test]
	fn malformed_overlay_is_rejected() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("messages.json");
		fs::write(&path, "[1, 2, 3]").unwrap();

		assert!(matches!(
			ResourceBundle::with_overlay(&path),
			Err(BundleError::Format(_))
		));
	}
}
