//! Cached weather lookups on top of a [`WeatherApi`].

use std::{sync::Arc, time::Duration};

use crate::{
    error::WeatherApiError,
    model::{Coordinates, ForecastSnapshot, GeocodingResult, WeatherSnapshot},
    provider::WeatherApi,
    query::{QueryCache, QueryClient, QueryKey, RetryConfig},
};

/// How long provider responses are served from cache.
pub const STALE_AFTER: Duration = Duration::from_secs(5 * 60);

/// Shorter searches are not sent to the provider.
pub const MIN_SEARCH_LEN: usize = 3;

pub struct WeatherQueries {
    api: Arc<dyn WeatherApi>,
    client: QueryClient,
    weather: QueryCache<WeatherSnapshot>,
    forecast: QueryCache<ForecastSnapshot>,
    locations: QueryCache<Vec<GeocodingResult>>,
}

impl WeatherQueries {
    pub fn new(api: Arc<dyn WeatherApi>, client: QueryClient) -> Self {
        Self::with_retry(api, client, RetryConfig::default())
    }

    pub fn with_retry(api: Arc<dyn WeatherApi>, client: QueryClient, retry: RetryConfig) -> Self {
        Self {
            weather: QueryCache::new(Some(STALE_AFTER)).with_retry(retry).listen(&client),
            forecast: QueryCache::new(Some(STALE_AFTER)).with_retry(retry).listen(&client),
            locations: QueryCache::new(Some(STALE_AFTER)).with_retry(retry).listen(&client),
            api,
            client,
        }
    }

    pub async fn weather(&self, coord: Coordinates) -> Result<WeatherSnapshot, WeatherApiError> {
        self.weather
            .fetch(&QueryKey::weather(coord), || self.api.current_weather(coord))
            .await
    }

    pub async fn forecast(&self, coord: Coordinates) -> Result<ForecastSnapshot, WeatherApiError> {
        self.forecast
            .fetch(&QueryKey::forecast(coord), || self.api.forecast(coord))
            .await
    }

    pub async fn reverse_geocode(
        &self,
        coord: Coordinates,
    ) -> Result<Vec<GeocodingResult>, WeatherApiError> {
        self.locations
            .fetch(&QueryKey::reverse_geocode(coord), || {
                self.api.reverse_geocode(coord)
            })
            .await
    }

    /// Queries shorter than [`MIN_SEARCH_LEN`] characters return no matches.
    pub async fn search_locations(
        &self,
        query: &str,
    ) -> Result<Vec<GeocodingResult>, WeatherApiError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }

        self.locations
            .fetch(&QueryKey::location_search(query), || {
                self.api.search_locations(query)
            })
            .await
    }

    /// Force the next lookups for `coord` to go back to the provider.
    pub fn refresh(&self, coord: Coordinates) {
        self.client.invalidate(&QueryKey::weather(coord));
        self.client.invalidate(&QueryKey::forecast(coord));
        self.client.invalidate(&QueryKey::reverse_geocode(coord));
    }
}
