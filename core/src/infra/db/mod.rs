//! Database infrastructure using SeaORM

use sea_orm::{ConnectOptions, Database as SeaDatabase, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod entities;
pub mod migration;
pub mod store;

pub use store::{Persist, StoreError};

/// Database wrapper for the scheduler
#[derive(Debug, Clone)]
pub struct Database {
	/// SeaORM database connection
	conn: DatabaseConnection,
}

impl Database {
	/// Create a new database at the specified path, or open it if it exists
	pub async fn create(path: &Path) -> Result<Self, DbErr> {
		// Ensure parent directory exists
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)
				.map_err(|e| DbErr::Custom(format!("Failed to create directory: {}", e)))?;
		}

		let db_url = format!("sqlite://{}?mode=rwc", path.display());
		let conn = SeaDatabase::connect(Self::options(db_url, 5)).await?;

		info!("Created database at {:?}", path);

		Ok(Self { conn })
	}

	/// Open an existing database
	pub async fn open(path: &Path) -> Result<Self, DbErr> {
		if !path.exists() {
			return Err(DbErr::Custom(format!(
				"Database does not exist: {}",
				path.display()
			)));
		}

		let db_url = format!("sqlite://{}", path.display());
		let conn = SeaDatabase::connect(Self::options(db_url, 5)).await?;

		info!("Opened database at {:?}", path);

		Ok(Self { conn })
	}

	/// Private in-memory database, migrated and ready to use
	pub async fn memory() -> Result<Self, DbErr> {
		// A single connection keeps every query on the same in-memory database
		let conn = SeaDatabase::connect(Self::options("sqlite::memory:".to_string(), 1)).await?;
		let db = Self { conn };
		db.migrate().await?;
		Ok(db)
	}

	fn options(db_url: String, max_connections: u32) -> ConnectOptions {
		let mut opt = ConnectOptions::new(db_url);
		opt.max_connections(max_connections)
			.min_connections(1)
			.connect_timeout(Duration::from_secs(8))
			.sqlx_logging(false); // We'll use tracing instead
		opt
	}

	/// Run migrations
	pub async fn migrate(&self) -> Result<(), DbErr> {
		migration::Migrator::up(&self.conn, None).await?;
		info!("Database migrations completed successfully");
		Ok(())
	}

	/// Get the database connection
	pub fn conn(&self) -> &DatabaseConnection {
		&self.conn
	}

	pub async fn close(self) -> Result<(), DbErr> {
		self.conn.close().await
	}
}
