//! Core library for the `climatic` weather dashboard.
//!
//! This crate defines:
//! - The OpenWeather client and its error taxonomy
//! - A read-through query cache with an invalidation bus
//! - Persisted favourites and search history over a key-value store
//! - A one-shot geolocation state machine
//! - Configuration handling
//!
//! It is used by `climatic-cli`, but can also be reused by other frontends.

pub mod config;
pub mod error;
pub mod favourites;
pub mod forecast;
pub mod geolocation;
pub mod history;
pub mod model;
pub mod provider;
pub mod query;
pub mod store;
pub mod weather;

pub use config::{Config, Units};
pub use error::{GeolocationError, StorageError, WeatherApiError};
pub use favourites::Favourites;
pub use geolocation::{ConfiguredPosition, Geolocation, GeolocationState, PositionSource};
pub use history::SearchHistory;
pub use model::{
    Coordinates, FavouriteCity, ForecastSnapshot, GeocodingResult, NewFavourite, NewSearch,
    SearchHistoryEntry, WeatherSnapshot,
};
pub use provider::{ApiConfig, OpenWeatherClient, WeatherApi};
pub use query::{QueryClient, QueryKey};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use weather::WeatherQueries;
