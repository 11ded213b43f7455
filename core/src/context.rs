//! Shared context providing access to core application components.

use crate::{
	config::AppConfig,
	infra::{
		action::ActionManager,
		db::Database,
		event::EventBus,
		i18n::{Messages, ResourceBundle},
	},
};
use anyhow::Result;
use std::rc::Rc;
use tracing::info;

/// Everything the views of one application session share. Lives on the UI
/// thread; only the database handle crosses into worker tasks.
#[derive(Debug)]
pub struct CoreContext {
	pub config: AppConfig,
	pub db: Database,
	pub events: EventBus,
	pub messages: Rc<ResourceBundle>,
	pub actions: ActionManager,
}

impl CoreContext {
	/// Opens (or creates) the configured database and brings its schema up
	/// to date
	pub async fn open(config: AppConfig) -> Result<Self> {
		config.ensure_directories()?;

		let db = Database::create(&config.database_path()).await?;
		db.migrate().await?;

		Self::with_database(config, db)
	}

	/// Context over an already migrated database
	pub fn with_database(config: AppConfig, db: Database) -> Result<Self> {
		let messages = match &config.messages_file {
			Some(path) => ResourceBundle::with_overlay(path)?,
			None => ResourceBundle::default(),
		};
		let messages = Rc::new(messages);

		let events = EventBus::new();
		let actions = ActionManager::new(
			events.clone(),
			db.conn().clone(),
			Rc::clone(&messages) as Rc<dyn Messages>,
			config.current_user.clone(),
		);

		info!(
			"Core context ready for {} at {:?}",
			config.current_user, config.data_dir
		);

		Ok(Self {
			config,
			db,
			events,
			messages,
			actions,
		})
	}

	pub async fn close(self) -> Result<()> {
		self.db.close().await?;
		info!("Core context closed");
		Ok(())
	}
}
