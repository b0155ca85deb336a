use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, DatabaseSettings};

/// Loads the application configuration.
///
/// Settings are read from an optional `config.toml` file, then overridden by
/// environment variables prefixed with `FLIGHTDESK_` (nested keys use a double
/// underscore, e.g. `FLIGHTDESK_DATABASE__PASSWORD`). Credentials are expected
/// to arrive through the environment; nothing is hardcoded.
pub fn load_config() -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        // Tells the builder to look for a file named `config.toml`, if present.
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::with_prefix("FLIGHTDESK").separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.database.validate()?;

    Ok(config)
}
