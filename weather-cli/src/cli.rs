use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use weather_core::{
    Config, FileCacheStore, PlaceRequest, RetrievalError, TempUnit, WeatherSnapshot,
    place::field_messages, retriever_from_config, time::resolve_time_zone,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Unit {
    Fahrenheit,
    Celsius,
}

impl From<Unit> for TempUnit {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Fahrenheit => TempUnit::Fahrenheit,
            Unit::Celsius => TempUnit::Celsius,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key and display preferences.
    Configure,

    /// Show current weather and a 7-day forecast for a place.
    Show {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,

        #[arg(long)]
        postal_code: String,

        /// ISO 3166-1 alpha-2 country code, e.g. "US".
        #[arg(long)]
        country: String,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long, value_enum, default_value_t = Unit::Fahrenheit)]
        unit: Unit,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { lat, lon, postal_code, country, city, state, unit } => {
                let mut place = PlaceRequest::new(lat, lon, postal_code, country.to_uppercase())
                    .with_temp_unit(unit.into());
                place.city = city;
                place.state = state;
                show(&place).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    cfg.set_api_key(api_key.trim().to_string());

    cfg.time_zone = inquire::Text::new("Display time zone:")
        .with_default(&cfg.time_zone)
        .with_help_message("IANA name, e.g. America/Los_Angeles")
        .prompt()
        .context("Failed to read time zone")?;
    if resolve_time_zone(&cfg.time_zone).is_none() {
        anyhow::bail!("Unknown time zone '{}'", cfg.time_zone);
    }

    cfg.cache_ttl_secs = inquire::CustomType::<u64>::new("Cache TTL (seconds):")
        .with_default(cfg.cache_ttl_secs)
        .with_error_message("Please enter a whole number of seconds")
        .prompt()
        .context("Failed to read cache TTL")?;

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(place: &PlaceRequest) -> anyhow::Result<()> {
    let cfg = Config::load()?;
    let tz = cfg.display_time_zone()?;
    let cache = Arc::new(FileCacheStore::new(Config::cache_file_path()?));
    let retriever = retriever_from_config(&cfg, cache)?;

    match retriever.retrieve(place).await {
        Ok(snapshot) => {
            print!("{}", render(&snapshot, place.temp_unit, &tz));
            Ok(())
        }
        Err(RetrievalError::InvalidInput(errors)) => {
            for line in field_messages(&errors) {
                eprintln!("  {line}");
            }
            anyhow::bail!("Place is invalid")
        }
        Err(e) => Err(anyhow::anyhow!("Weather could not be retrieved from weather service: {e}")),
    }
}

fn render(snapshot: &WeatherSnapshot, unit: TempUnit, tz: &chrono_tz::Tz) -> String {
    let symbol = unit.symbol();
    let source = if snapshot.retrieved_from_cache {
        "cached"
    } else {
        "downloaded"
    };

    let mut out = format!(
        "Now: {}{symbol} ({source} at {})\n",
        snapshot.current_temp(unit),
        snapshot.downloaded_at_local(tz),
    );
    for day in snapshot.days() {
        out.push_str(&format!(
            "{:<7} low {:>4}{symbol}  high {:>4}{symbol}\n",
            day.label_in(tz),
            day.low(unit),
            day.high(unit),
        ));
    }
    out
}
