use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use sched_core::{
	config::default_data_dir,
	domain::{Address, Appointment, City, Country, Customer, Entity, Model, ModelRef, Related, User},
	infra::{
		action::ActionManager,
		db::Persist,
		event::EntityEvent,
		query::RecordFilter,
	},
	init_logging, AppConfig, CoreContext,
};
use std::{path::PathBuf, sync::Arc};

#[derive(Parser, Debug)]
#[command(name = "sched", about = "Scheduler records CLI")]
struct Cli {
	/// Path to the scheduler data directory
	#[arg(long, env = "SCHED_DATA_DIR")]
	data_dir: Option<PathBuf>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Create the configuration, database and login user
	Init {
		/// Password of the configured user
		#[arg(long)]
		password: String,
	},
	/// Country operations
	#[command(subcommand)]
	Country(CountryCommands),
	/// Customer operations
	#[command(subcommand)]
	Customer(CustomerCommands),
	/// Appointment operations
	#[command(subcommand)]
	Appointment(AppointmentCommands),
}

#[derive(Subcommand, Debug)]
enum CountryCommands {
	/// Add a country
	Add { name: String },
	/// List countries
	List,
}

#[derive(Subcommand, Debug)]
enum CustomerCommands {
	/// Add a customer, creating its address, city and country as needed
	Add {
		name: String,
		#[arg(long)]
		address: String,
		#[arg(long)]
		city: String,
		#[arg(long)]
		country: String,
		#[arg(long, default_value = "")]
		postal_code: String,
		#[arg(long, default_value = "")]
		phone: String,
	},
	/// List customers
	List {
		/// Only show inactive customers
		#[arg(long, default_value_t = false)]
		inactive: bool,
	},
	/// Rename a customer
	Rename { id: i32, new_name: String },
	/// Delete a customer without appointments
	Delete { id: i32 },
}

#[derive(Subcommand, Debug)]
enum AppointmentCommands {
	/// List appointments
	List {
		#[arg(long)]
		customer: Option<i32>,
		#[arg(long)]
		user: Option<i32>,
	},
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let data_dir = match cli.data_dir {
		Some(dir) => dir,
		None => default_data_dir()?,
	};
	let config = AppConfig::load_or_create(&data_dir)?;
	let _guard = init_logging(&config)?;

	let context = CoreContext::open(config).await?;
	let result = run(&context, cli.command).await;
	context.close().await?;
	result
}

async fn run(context: &CoreContext, command: Commands) -> Result<()> {
	let actions = &context.actions;

	match command {
		Commands::Init { password } => {
			let user_name = context.config.current_user.clone();
			let existing = actions
				.load_records(&RecordFilter::<User>::named(user_name.clone()))
				.await?;
			if existing.is_empty() {
				let event = actions
					.save_record(Arc::new(User::new(user_name.clone(), password)))
					.await?;
				outcome(&event)?;
				println!("Created user '{}'", user_name);
			}
			println!("Scheduler initialized at {}", context.config.data_dir.display());
		}

		Commands::Country(CountryCommands::Add { name }) => {
			let event = actions.save_record(Arc::new(Country::new(name))).await?;
			let country = outcome(&event)?;
			println!("Added country {} '{}'", country.meta.key, country.name);
		}
		Commands::Country(CountryCommands::List) => {
			for country in actions.load_records(&RecordFilter::<Country>::all()).await? {
				println!("{:>5}  {}", country.meta.key, country.name);
			}
		}

		Commands::Customer(CustomerCommands::Add {
			name,
			address,
			city,
			country,
			postal_code,
			phone,
		}) => {
			let country = find_or_new(
				actions,
				RecordFilter::<Country>::all(),
				|c| c.name == country,
				|| Country::new(country.clone()),
			)
			.await?;
			let city = match country.key() {
				0 => Related::Row(Arc::new(City::new(city, country))),
				key => {
					find_or_new(
						actions,
						RecordFilter::<City>::in_country(key),
						|c| c.name == city,
						|| City::new(city.clone(), country.clone()),
					)
					.await?
				}
			};
			let new_address = || {
				let mut new = Address::new(address.clone(), city.clone());
				new.postal_code = postal_code.clone();
				new.phone = phone.clone();
				new
			};
			let address = match city.key() {
				0 => Related::Row(Arc::new(new_address())),
				key => {
					find_or_new(
						actions,
						RecordFilter::<Address>::in_city(key),
						|a| a.address1 == address && a.postal_code == postal_code && a.phone == phone,
						new_address,
					)
					.await?
				}
			};
			let customer = Customer::new(name, address);

			let model = Model::new(customer)?;
			let event = actions.save(&model).await?;
			let customer = outcome(&event)?;
			println!(
				"Added customer {} '{}' at {}",
				customer.meta.key,
				customer.name,
				customer.address_text()
			);
		}
		Commands::Customer(CustomerCommands::List { inactive }) => {
			let filter = RecordFilter::<Customer>::active(!inactive);
			for customer in actions.load_records(&filter).await? {
				println!(
					"{:>5}  {:<30} {:<20} {}",
					customer.meta.key,
					customer.name,
					customer.phone(),
					customer.address_text()
				);
			}
		}
		Commands::Customer(CustomerCommands::Rename { id, new_name }) => {
			let model = customer_model(actions, id).await?;
			model.borrow_mut().edit("name", |customer| customer.name = new_name)?;
			let event = actions.save(&model).await?;
			let customer = outcome(&event)?;
			println!("Renamed customer {} to '{}'", customer.meta.key, customer.name);
		}
		Commands::Customer(CustomerCommands::Delete { id }) => {
			let model = customer_model(actions, id).await?;
			let request = actions.request_delete(&model);
			let event = actions.delete(&request).await?;
			outcome(&event)?;
			println!("Deleted customer {}", id);
		}

		Commands::Appointment(AppointmentCommands::List { customer, user }) => {
			let filter = match (customer, user) {
				(Some(customer), _) => RecordFilter::<Appointment>::for_customer(customer),
				(None, Some(user)) => RecordFilter::<Appointment>::for_user(user),
				(None, None) => RecordFilter::<Appointment>::all(),
			};
			for appointment in actions.load_records(&filter).await? {
				println!(
					"{:>5}  {}  {}  {:<25} {:<20} {}",
					appointment.meta.key,
					appointment.start.format("%Y-%m-%d %H:%M"),
					appointment.end.format("%H:%M"),
					appointment.title,
					appointment.customer_name(),
					appointment.user_name()
				);
			}
		}
	}

	Ok(())
}

/// The stored record of a success event, or the event's message as an error
fn outcome<R: Entity>(event: &EntityEvent<R>) -> Result<Arc<R>> {
	if let Some(message) = event.message() {
		bail!("{} {}: {}", event.entity(), event.kind(), message);
	}
	event
		.record()
		.ok_or_else(|| anyhow!("{} event carries no record", event.entity()))
}

/// A record selected by `filter` and passing `matches`, or a new one to be
/// saved along with the record linking to it
async fn find_or_new<R: Persist>(
	actions: &ActionManager,
	filter: RecordFilter<R>,
	matches: impl Fn(&R) -> bool,
	create: impl FnOnce() -> R,
) -> Result<Related<R>> {
	let stored = actions.load_records(&filter).await?;
	let record = match stored.into_iter().find(|record| matches(&**record)) {
		Some(record) => record,
		None => Arc::new(create()),
	};
	Ok(Related::Row(record))
}

async fn customer_model(
	actions: &ActionManager,
	id: i32,
) -> Result<ModelRef<Customer>> {
	actions
		.load::<Customer>(&RecordFilter::all())
		.await?
		.into_iter()
		.find(|model| model.borrow().key() == id)
		.with_context(|| format!("Customer {} not found", id))
}
