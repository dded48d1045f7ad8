//! Integration tests for OpenWeatherClient using wiremock.
//!
//! These tests verify request shaping and error mapping against a mock HTTP server.

use climatic_core::{
    ApiConfig, Coordinates, OpenWeatherClient, Units, WeatherApi, WeatherApiError,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn client_for(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::new(ApiConfig::new(API_KEY).with_base_url(server.uri()))
}

fn test_weather() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lat": 12.34, "lon": 56.78 },
        "weather": [{ "id": 1, "main": "Clear", "description": "clear sky", "icon": "01d" }],
        "main": {
            "temp": 25, "feels_like": 25, "temp_min": 20, "temp_max": 30,
            "pressure": 1012, "humidity": 50
        },
        "wind": { "speed": 5, "deg": 180 },
        "sys": { "sunrise": 123456, "sunset": 123999, "country": "IN" },
        "name": "Test City",
        "dt": 123456789
    })
}

#[tokio::test]
async fn test_current_weather_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("appid", API_KEY))
        .and(query_param("lat", "12.34"))
        .and(query_param("lon", "56.78"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(test_weather()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let weather = client
        .current_weather(Coordinates::new(12.34, 56.78))
        .await
        .unwrap();

    assert_eq!(weather.name, "Test City");
    assert_eq!(weather.sys.country, "IN");
    assert_eq!(weather.main.humidity, 50.0);
    assert_eq!(weather.weather[0].description, "clear sky");
}

#[tokio::test]
async fn test_units_come_from_config() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(test_weather()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ApiConfig::new(API_KEY)
        .with_base_url(mock_server.uri())
        .with_units(Units::Imperial);
    let client = OpenWeatherClient::new(config);

    client
        .current_weather(Coordinates::new(12.34, 56.78))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_forecast_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("lat", "12.34"))
        .and(query_param("lon", "56.78"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [{
                "dt": 1672488000,
                "main": {
                    "temp": 15, "feels_like": 14, "temp_min": 10, "temp_max": 20,
                    "pressure": 1012, "humidity": 60
                },
                "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
                "wind": { "speed": 3.5, "deg": 90 },
                "dt_txt": "2022-12-31 12:00:00"
            }],
            "city": { "name": "Test City", "country": "IN", "sunrise": 123, "sunset": 456 }
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let forecast = client.forecast(Coordinates::new(12.34, 56.78)).await.unwrap();

    assert_eq!(forecast.city.name, "Test City");
    assert_eq!(forecast.list.len(), 1);
    assert_eq!(forecast.list[0].dt_txt, "2022-12-31 12:00:00");
}

#[tokio::test]
async fn test_reverse_geocode() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .and(query_param("appid", API_KEY))
        .and(query_param("lat", "12.34"))
        .and(query_param("lon", "56.78"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Test City", "lat": 12.34, "lon": 56.78, "country": "IN" }
        ])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let places = client
        .reverse_geocode(Coordinates::new(12.34, 56.78))
        .await
        .unwrap();

    assert_eq!(places.len(), 1);
    assert_eq!(places[0].name, "Test City");
    assert_eq!(places[0].state, None);
}

#[tokio::test]
async fn test_search_locations_sends_query_and_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/direct"))
        .and(query_param("appid", API_KEY))
        .and(query_param("q", "Another City"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "name": "Another City", "lat": 11.11, "lon": 22.22, "country": "US", "state": "Ohio" }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let places = client.search_locations("Another City").await.unwrap();

    assert_eq!(places[0].lat, 11.11);
    assert_eq!(places[0].state.as_deref(), Some("Ohio"));
}

#[tokio::test]
async fn test_not_found_maps_to_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .current_weather(Coordinates::new(12.34, 56.78))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherApiError::Api { .. }));
    assert_eq!(err.to_string(), "Weather API Error: Not Found");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_unauthorized_maps_to_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/direct"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "cod": 401, "message": "Invalid API key"
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.search_locations("London").await.unwrap_err();

    assert_eq!(err.to_string(), "Weather API Error: Unauthorized");
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .current_weather(Coordinates::new(1.0, 2.0))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherApiError::Decode(_)));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind and drop a listener so the port is very likely closed.
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let client = OpenWeatherClient::new(ApiConfig::new(API_KEY).with_base_url(uri));
    let err = client
        .current_weather(Coordinates::new(1.0, 2.0))
        .await
        .unwrap_err();

    assert!(matches!(err, WeatherApiError::Transport(_)));
    assert!(err.is_retryable());
}
