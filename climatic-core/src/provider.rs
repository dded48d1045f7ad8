use crate::{
    config::Units,
    error::WeatherApiError,
    model::{Coordinates, ForecastSnapshot, GeocodingResult, WeatherSnapshot},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherClient;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_GEO_BASE_URL: &str = "http://api.openweathermap.org/geo/1.0";

/// Number of matches requested from forward geocoding.
pub const SEARCH_LIMIT: u32 = 5;

/// Fixed parameters applied to every provider request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub geo_base_url: String,
    pub api_key: String,
    pub units: Units,
}

impl ApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            geo_base_url: DEFAULT_GEO_BASE_URL.to_string(),
            api_key: api_key.into(),
            units: Units::default(),
        }
    }

    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Point both endpoint families at one base URL, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.geo_base_url = base_url.clone();
        self.base_url = base_url;
        self
    }
}

/// Weather provider operations. Responses are returned exactly as the
/// provider shaped them.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn current_weather(&self, coord: Coordinates) -> Result<WeatherSnapshot, WeatherApiError>;

    async fn forecast(&self, coord: Coordinates) -> Result<ForecastSnapshot, WeatherApiError>;

    /// Coordinate to place name.
    async fn reverse_geocode(
        &self,
        coord: Coordinates,
    ) -> Result<Vec<GeocodingResult>, WeatherApiError>;

    /// Place name to coordinates. Matching is done by the provider.
    async fn search_locations(&self, query: &str)
    -> Result<Vec<GeocodingResult>, WeatherApiError>;
}
