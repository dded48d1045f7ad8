use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use climatic_core::{
    Config, ConfiguredPosition, Coordinates, Favourites, FileStore, GeocodingResult, Geolocation,
    KeyValueStore, NewFavourite, NewSearch, OpenWeatherClient, PositionSource, QueryClient,
    SearchHistory, Units, WeatherApiError, WeatherQueries,
};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select};
use std::sync::Arc;

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "climatic", version, about = "Weather dashboard for the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the API key, unit system and default location.
    Configure,

    /// Show current weather.
    Now(LocationArgs),

    /// Show the 5-day forecast and the next 24 hours.
    Forecast(LocationArgs),

    /// List places matching a name.
    Search {
        /// City name, at least 3 characters.
        query: String,
    },

    /// Manage favourite cities.
    Favourites {
        #[command(subcommand)]
        action: FavouritesAction,
    },

    /// Show or clear past searches.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

/// Where to look. Without arguments the device location is used.
#[derive(Debug, Clone, Args)]
pub struct LocationArgs {
    /// City name, resolved through geocoding.
    pub city: Option<String>,

    #[arg(long, requires = "lon", allow_hyphen_values = true, conflicts_with = "city")]
    pub lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true, conflicts_with = "city")]
    pub lon: Option<f64>,
}

#[derive(Debug, Subcommand)]
pub enum FavouritesAction {
    List,
    Add(LocationArgs),
    Remove {
        /// Favourite id, as shown by `favourites list`.
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum HistoryAction {
    List,
    Clear,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        match self.command {
            Command::Configure => configure(config),
            Command::Now(location) => {
                let mut session = Session::open(config)?;
                let place = session.resolve(&location).await?;
                let weather = session
                    .queries()?
                    .weather(place.coordinates())
                    .await
                    .map_err(friendly)?;
                let favourites = session.favourites();
                output::print_current(
                    &place,
                    &weather,
                    session.config.units,
                    favourites.is_favourite(place.lat, place.lon),
                );
                Ok(())
            }
            Command::Forecast(location) => {
                let mut session = Session::open(config)?;
                let place = session.resolve(&location).await?;
                let forecast = session
                    .queries()?
                    .forecast(place.coordinates())
                    .await
                    .map_err(friendly)?;
                output::print_forecast(&place, &forecast, session.config.units);
                Ok(())
            }
            Command::Search { query } => {
                let mut session = Session::open(config)?;
                let places = session.queries()?.search_locations(&query).await.map_err(friendly)?;
                output::print_places(&query, &places);
                Ok(())
            }
            Command::Favourites { action } => {
                let mut session = Session::open(config)?;
                match action {
                    FavouritesAction::List => output::print_favourites(&session.favourites().favourites()),
                    FavouritesAction::Add(location) => {
                        let place = session.resolve(&location).await?;
                        let mut favourites = session.favourites();
                        if favourites.is_favourite(place.lat, place.lon) {
                            println!("{} is already a favourite.", place.display_name());
                        } else {
                            let list = favourites.add(NewFavourite::from(place.clone()));
                            println!("Added {} to favourites.", place.display_name());
                            output::print_favourites(&list);
                        }
                    }
                    FavouritesAction::Remove { id } => {
                        let list = session.favourites().remove(&id);
                        println!("Removed {id}.");
                        output::print_favourites(&list);
                    }
                }
                Ok(())
            }
            Command::History { action } => {
                let session = Session::open(config)?;
                let mut history = session.history();
                match action {
                    HistoryAction::List => output::print_history(&history.history()),
                    HistoryAction::Clear => {
                        history.clear();
                        println!("Search history cleared.");
                    }
                }
                Ok(())
            }
        }
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    config.set_api_key(api_key.trim().to_string());

    config.units = Select::new("Unit system:", Units::all().to_vec())
        .prompt()
        .context("Failed to read unit system")?;

    let wants_location = Confirm::new("Set a default location for `now` and `forecast`?")
        .with_default(config.location.is_some())
        .prompt()
        .context("Failed to read answer")?;

    config.location = if wants_location {
        let lat = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number, e.g. 48.8566")
            .prompt()
            .context("Failed to read latitude")?;
        let lon = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number, e.g. 2.3522")
            .prompt()
            .context("Failed to read longitude")?;
        Some(Coordinates::new(lat, lon))
    } else {
        None
    };

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Provider errors carry a friendlier message for the terminal.
fn friendly(err: WeatherApiError) -> anyhow::Error {
    tracing::debug!(error = ?err, "Weather request failed");
    anyhow!(err.user_message())
}

/// Per-invocation wiring: one store and one invalidation bus.
struct Session {
    config: Config,
    store: Arc<dyn KeyValueStore>,
    client: QueryClient,
    queries: Option<WeatherQueries>,
}

impl Session {
    fn open(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.data_dir()?));
        Ok(Self {
            config,
            store,
            client: QueryClient::new(),
            queries: None,
        })
    }

    /// Built on first use, so commands that stay offline need no API key.
    fn queries(&mut self) -> anyhow::Result<&WeatherQueries> {
        let queries = match self.queries.take() {
            Some(queries) => queries,
            None => {
                let api = OpenWeatherClient::new(self.config.api_config()?);
                WeatherQueries::new(Arc::new(api), self.client.clone())
            }
        };

        Ok(self.queries.insert(queries))
    }

    fn favourites(&self) -> Favourites {
        Favourites::new(self.store.clone(), self.client.clone())
    }

    fn history(&self) -> SearchHistory {
        SearchHistory::new(self.store.clone(), self.client.clone())
    }

    fn geolocation(&self) -> Geolocation {
        let source = self
            .config
            .location
            .map(|coord| Arc::new(ConfiguredPosition::new(coord)) as Arc<dyn PositionSource>);
        Geolocation::new(source)
    }

    /// Turn CLI location arguments into a named place.
    ///
    /// A city name goes through forward geocoding and is recorded in the
    /// search history. Coordinates, given or located, are named through
    /// reverse geocoding.
    async fn resolve(&mut self, args: &LocationArgs) -> anyhow::Result<GeocodingResult> {
        if let Some(city) = &args.city {
            let city = city.trim();
            let places = self
                .queries()?
                .search_locations(city)
                .await
                .map_err(friendly)?;
            let place = places
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("No locations found for '{city}'"))?;

            self.history().add(NewSearch::from_result(city, &place));
            return Ok(place);
        }

        let coord = match (args.lat, args.lon) {
            (Some(lat), Some(lon)) => Coordinates::new(lat, lon),
            _ => {
                let state = self.geolocation().locate().await;
                match (state.coordinates, state.error) {
                    (Some(coord), _) => coord,
                    (None, error) => bail!(
                        "{}\nHint: pass a city, use --lat/--lon, or set a location with `climatic configure`.",
                        error.unwrap_or_else(|| "Location unavailable".to_string())
                    ),
                }
            }
        };

        let named = self
            .queries()?
            .reverse_geocode(coord)
            .await
            .map_err(friendly)?
            .into_iter()
            .next();

        Ok(named.unwrap_or_else(|| GeocodingResult {
            name: coord.to_string(),
            lat: coord.lat,
            lon: coord.lon,
            country: String::new(),
            state: None,
        }))
    }
}
