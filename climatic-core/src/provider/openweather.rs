use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::{
    error::WeatherApiError,
    model::{Coordinates, ForecastSnapshot, GeocodingResult, WeatherSnapshot},
};

use super::{ApiConfig, SEARCH_LIMIT, WeatherApi};

/// OpenWeather REST client. Holds no state besides its configuration.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    config: ApiConfig,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    fn weather_params(&self, coord: Coordinates) -> Vec<(&'static str, String)> {
        vec![
            ("appid", self.config.api_key.clone()),
            ("lat", coord.lat.to_string()),
            ("lon", coord.lon.to_string()),
            ("units", self.config.units.as_str().to_string()),
        ]
    }

    /// GET `url` with `params` and decode the body as `T`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        url: String,
        params: &[(&'static str, String)],
    ) -> Result<T, WeatherApiError> {
        tracing::debug!(%url, "Requesting OpenWeather");

        let res = self.http.get(&url).query(params).send().await?;

        let status = res.status();
        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .map(str::to_owned)
                .unwrap_or_else(|| status.as_u16().to_string());

            tracing::debug!(%url, %status, "OpenWeather returned an error status");
            return Err(WeatherApiError::api(status_text));
        }

        let body = res.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current_weather(&self, coord: Coordinates) -> Result<WeatherSnapshot, WeatherApiError> {
        let url = format!("{}/weather", self.config.base_url);
        self.fetch(url, &self.weather_params(coord)).await
    }

    async fn forecast(&self, coord: Coordinates) -> Result<ForecastSnapshot, WeatherApiError> {
        let url = format!("{}/forecast", self.config.base_url);
        self.fetch(url, &self.weather_params(coord)).await
    }

    async fn reverse_geocode(
        &self,
        coord: Coordinates,
    ) -> Result<Vec<GeocodingResult>, WeatherApiError> {
        let url = format!("{}/reverse", self.config.geo_base_url);
        let params = [
            ("appid", self.config.api_key.clone()),
            ("lat", coord.lat.to_string()),
            ("lon", coord.lon.to_string()),
        ];
        self.fetch(url, &params).await
    }

    async fn search_locations(
        &self,
        query: &str,
    ) -> Result<Vec<GeocodingResult>, WeatherApiError> {
        let url = format!("{}/direct", self.config.geo_base_url);
        let params = [
            ("appid", self.config.api_key.clone()),
            ("q", query.to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];
        self.fetch(url, &params).await
    }
}
