use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::DatabaseSettings;
use core_types::{FlightFilter, NewFlight};
use database::repository::DbRepository;
use database::{connect, ping, run_migrations};
use rust_decimal::Decimal;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the flightdesk application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from a .env file, if one exists.
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = configuration::load_config()?;

    match cli.command {
        Commands::Ping => handle_ping(&config.database).await,
        Commands::Migrate => handle_migrate(&config.database).await,
        Commands::AddFlight(args) => handle_add_flight(args, &config.database).await,
        Commands::ListFlights(args) => handle_list_flights(args, &config.database).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Command-line operations console for the airline flight database.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test the database connection and report the result.
    Ping,
    /// Apply the embedded schema to the configured database.
    Migrate,
    /// Create a flight.
    AddFlight(AddFlightArgs),
    /// List flights, optionally filtered by origin and destination.
    ListFlights(ListFlightsArgs),
}

#[derive(Parser)]
struct AddFlightArgs {
    /// Unique flight code, e.g. "AI101".
    #[arg(long)]
    code: String,

    #[arg(long)]
    origin: String,

    #[arg(long)]
    destination: String,

    /// Departure time in RFC 3339, e.g. "2026-03-14T09:30:00Z".
    #[arg(long)]
    departure: DateTime<Utc>,

    /// Total seat capacity.
    #[arg(long)]
    capacity: i64,

    /// Fare per seat, e.g. "450.00".
    #[arg(long)]
    fare: Decimal,
}

#[derive(Parser)]
struct ListFlightsArgs {
    #[arg(long)]
    origin: Option<String>,

    #[arg(long)]
    destination: Option<String>,
}

// ==============================================================================
// Command Handlers
// ==============================================================================

async fn handle_ping(settings: &DatabaseSettings) -> anyhow::Result<()> {
    let pool = connect(settings).await?;
    if ping(&pool).await {
        println!("Database connection OK ({} driver)", settings.driver);
        Ok(())
    } else {
        anyhow::bail!("database connection test failed")
    }
}

async fn handle_migrate(settings: &DatabaseSettings) -> anyhow::Result<()> {
    let pool = connect(settings).await?;
    run_migrations(&pool).await?;
    println!("Schema is up to date.");
    Ok(())
}

async fn handle_add_flight(args: AddFlightArgs, settings: &DatabaseSettings) -> anyhow::Result<()> {
    let pool = connect(settings).await?;
    run_migrations(&pool).await?;
    let repo = DbRepository::new(pool);

    let id = repo
        .create_flight(&NewFlight {
            code: args.code.clone(),
            origin: args.origin,
            destination: args.destination,
            departure: args.departure,
            capacity: args.capacity,
            fare: args.fare,
        })
        .await?;

    println!("Created flight {} with id {id}", args.code);
    Ok(())
}

async fn handle_list_flights(
    args: ListFlightsArgs,
    settings: &DatabaseSettings,
) -> anyhow::Result<()> {
    let pool = connect(settings).await?;
    run_migrations(&pool).await?;
    let repo = DbRepository::new(pool);

    let flights = repo
        .find_flights(&FlightFilter {
            code: None,
            origin: args.origin,
            destination: args.destination,
        })
        .await?;

    let mut table = Table::new();
    table.set_header(vec![
        "Code",
        "Origin",
        "Destination",
        "Departure",
        "Capacity",
        "Available",
        "Fare",
    ]);
    for flight in &flights {
        table.add_row(vec![
            flight.code.clone(),
            flight.origin.clone(),
            flight.destination.clone(),
            flight.departure.to_rfc3339(),
            flight.capacity.to_string(),
            flight.seats_available.to_string(),
            flight.fare.to_string(),
        ]);
    }
    println!("{table}");
    println!("{} flight(s)", flights.len());
    Ok(())
}
