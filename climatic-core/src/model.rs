use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A geographic point. Used as the natural key for weather lookups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainMeasurements {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    #[serde(default)]
    pub deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunInfo {
    pub sunrise: i64,
    pub sunset: i64,
    /// Absent for points with no country, such as open ocean.
    #[serde(default)]
    pub country: String,
}

/// Current conditions as returned by the provider's `/weather` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub coord: Coordinates,
    pub weather: Vec<WeatherCondition>,
    pub main: MainMeasurements,
    pub wind: Wind,
    pub sys: SunInfo,
    #[serde(default)]
    pub name: String,
    pub dt: i64,
}

impl WeatherSnapshot {
    /// First reported condition, if the provider sent any.
    pub fn condition(&self) -> Option<&WeatherCondition> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: MainMeasurements,
    pub weather: Vec<WeatherCondition>,
    pub wind: Wind,
    pub dt_txt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub sunrise: i64,
    pub sunset: i64,
}

/// Three-hourly forecast as returned by the provider's `/forecast` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub list: Vec<ForecastEntry>,
    pub city: ForecastCity,
}

/// A forward or reverse geocoding match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingResult {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl GeocodingResult {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// "Name, State, CC" with the state omitted when absent.
    pub fn display_name(&self) -> String {
        match &self.state {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

/// A user-pinned city. `id` is derived from the coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteCity {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
}

/// Input to [`crate::favourites::Favourites::add`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewFavourite {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    pub state: Option<String>,
}

impl NewFavourite {
    /// De-duplication key: `"{lat}-{lon}"`.
    pub fn id(&self) -> String {
        favourite_id(self.lat, self.lon)
    }
}

impl From<GeocodingResult> for NewFavourite {
    fn from(place: GeocodingResult) -> Self {
        Self {
            name: place.name,
            lat: place.lat,
            lon: place.lon,
            country: place.country,
            state: place.state,
        }
    }
}

pub fn favourite_id(lat: f64, lon: f64) -> String {
    // Adding zero folds -0.0 into 0.0 so both render as "0".
    format!("{}-{}", lat + 0.0, lon + 0.0)
}

/// Current time at the millisecond precision records are persisted with.
pub(crate) fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryEntry {
    pub query: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub searched_at: DateTime<Utc>,
}

/// Input to [`crate::history::SearchHistory::add`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewSearch {
    pub query: String,
    pub name: String,
    pub state: Option<String>,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl NewSearch {
    /// `query` is recorded trimmed, the way it was sent to the provider.
    pub fn from_result(query: &str, place: &GeocodingResult) -> Self {
        Self {
            query: query.trim().to_string(),
            name: place.name.clone(),
            state: place.state.clone(),
            country: place.country.clone(),
            lat: place.lat,
            lon: place.lon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn favourite_id_uses_shortest_float_rendering() {
        assert_eq!(favourite_id(48.8566, 2.3522), "48.8566-2.3522");
        assert_eq!(favourite_id(10.0, 20.0), "10-20");
        assert_eq!(favourite_id(51.5072, -0.1276), "51.5072--0.1276");
    }

    #[test]
    fn favourite_id_treats_negative_zero_as_zero() {
        assert_eq!(favourite_id(-0.0, 0.0), "0-0");
        assert_eq!(favourite_id(51.4779, -0.0), favourite_id(51.4779, 0.0));
    }

    #[test]
    fn now_millis_survives_persistence_unchanged() {
        let now = now_millis();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
        assert_eq!(DateTime::from_timestamp_millis(now.timestamp_millis()), Some(now));
    }

    #[test]
    fn favourite_city_uses_camel_case_and_millis() {
        let json = r#"{"id":"1-2","name":"X","lat":1,"lon":2,"country":"FR","addedAt":1700000000000}"#;
        let city: FavouriteCity = serde_json::from_str(json).expect("valid favourite json");

        assert_eq!(city.added_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(city.state, None);

        let back = serde_json::to_string(&city).expect("serializable");
        assert!(back.contains("\"addedAt\":1700000000000"));
        assert!(!back.contains("state"));
    }

    #[test]
    fn weather_snapshot_parses_provider_shape() {
        let json = serde_json::json!({
            "coord": { "lat": 12.34, "lon": 56.78 },
            "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
            "main": {
                "temp": 25.0, "feels_like": 25.5, "temp_min": 20.0, "temp_max": 30.0,
                "pressure": 1012, "humidity": 50
            },
            "wind": { "speed": 5.0, "deg": 180 },
            "sys": { "sunrise": 123456, "sunset": 123999, "country": "IN" },
            "name": "Test City",
            "dt": 123456789,
            "visibility": 10000
        });

        let snapshot: WeatherSnapshot = serde_json::from_value(json).expect("provider json");
        assert_eq!(snapshot.name, "Test City");
        assert_eq!(snapshot.condition().map(|c| c.main.as_str()), Some("Clear"));
        assert_eq!(snapshot.coord, Coordinates::new(12.34, 56.78));
    }

    #[test]
    fn weather_snapshot_tolerates_missing_optional_fields() {
        // Open ocean payloads omit the country and the place name.
        let json = serde_json::json!({
            "coord": { "lat": 0, "lon": 0 },
            "weather": [{ "id": 804, "main": "Clouds", "description": "overcast clouds", "icon": "04d" }],
            "main": {
                "temp": 27.1, "feels_like": 29.4, "temp_min": 27.1, "temp_max": 27.1,
                "pressure": 1011, "humidity": 76
            },
            "wind": { "speed": 0.0 },
            "sys": { "sunrise": 1700000000, "sunset": 1700043000 },
            "dt": 1700020000
        });

        let snapshot: WeatherSnapshot = serde_json::from_value(json).expect("ocean payload");
        assert_eq!(snapshot.sys.country, "");
        assert_eq!(snapshot.name, "");
        assert_eq!(snapshot.wind.deg, 0.0);
    }

    #[test]
    fn forecast_city_tolerates_missing_country() {
        let json = serde_json::json!({
            "list": [],
            "city": { "name": "", "sunrise": 1700000000, "sunset": 1700043000 }
        });

        let forecast: ForecastSnapshot = serde_json::from_value(json).expect("ocean forecast");
        assert_eq!(forecast.city.country, "");
    }

    #[test]
    fn new_search_records_trimmed_query() {
        let place = GeocodingResult {
            name: "London".into(),
            lat: 51.5072,
            lon: -0.1276,
            country: "GB".into(),
            state: Some("England".into()),
        };

        let search = NewSearch::from_result("  lon ", &place);

        assert_eq!(search.query, "lon");
        assert_eq!(search.state.as_deref(), Some("England"));
    }

    #[test]
    fn geocoding_display_name_skips_missing_state() {
        let place = GeocodingResult {
            name: "Paris".into(),
            lat: 48.8566,
            lon: 2.3522,
            country: "FR".into(),
            state: None,
        };
        assert_eq!(place.display_name(), "Paris, FR");

        let place = GeocodingResult { state: Some("Ile-de-France".into()), ..place };
        assert_eq!(place.display_name(), "Paris, Ile-de-France, FR");
    }
}
