use chrono::{DateTime, Local, Utc};
use climatic_core::{
    FavouriteCity, ForecastSnapshot, GeocodingResult, SearchHistoryEntry, Units, WeatherSnapshot,
    forecast::{daily_summaries, hourly_temperatures},
};

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Eight-point compass direction for a wind bearing in degrees.
pub fn wind_direction(deg: f64) -> &'static str {
    let index = ((deg.rem_euclid(360.0) + 22.5) / 45.0).floor() as usize % COMPASS.len();
    COMPASS[index]
}

/// Compass point followed by the bearing, e.g. `SE (135°)`.
pub fn wind_label(deg: f64) -> String {
    format!("{} ({deg:.0}°)", wind_direction(deg))
}

fn local_time(ts: i64, format: &str) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|t| t.with_timezone(&Local).format(format).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn place_label(place: &GeocodingResult) -> String {
    if place.country.is_empty() {
        place.name.clone()
    } else {
        place.display_name()
    }
}

pub fn print_current(place: &GeocodingResult, weather: &WeatherSnapshot, units: Units, favourite: bool) {
    let t = units.temperature_symbol();
    let star = if favourite { " ★" } else { "" };

    println!("{}{star}", place_label(place));
    if let Some(condition) = weather.condition() {
        println!("  {}", condition.description);
    }
    println!(
        "  Temperature  {:.0}{t} (feels like {:.0}{t})",
        weather.main.temp, weather.main.feels_like
    );
    println!("  Min / Max    {:.0}{t} / {:.0}{t}", weather.main.temp_min, weather.main.temp_max);
    println!("  Humidity     {:.0}%", weather.main.humidity);
    println!("  Pressure     {:.0} hPa", weather.main.pressure);
    println!(
        "  Wind         {:.1} {} {}",
        weather.wind.speed,
        units.speed_symbol(),
        wind_label(weather.wind.deg)
    );
    println!("  Sunrise      {}", local_time(weather.sys.sunrise, "%H:%M"));
    println!("  Sunset       {}", local_time(weather.sys.sunset, "%H:%M"));
    println!("  Observed     {}", local_time(weather.dt, "%Y-%m-%d %H:%M"));
}

pub fn print_forecast(place: &GeocodingResult, forecast: &ForecastSnapshot, units: Units) {
    let t = units.temperature_symbol();

    println!("{}", place_label(place));
    println!("Next 24 hours:");
    for hour in hourly_temperatures(forecast) {
        println!(
            "  {}  {:>5.1}{t}  (feels like {:.1}{t})",
            hour.time.with_timezone(&Local).format("%a %H:%M"),
            hour.temp,
            hour.feels_like
        );
    }

    println!("5-Day Forecast:");
    for day in daily_summaries(forecast) {
        let description = day
            .condition
            .as_ref()
            .map(|c| c.description.as_str())
            .unwrap_or("");
        println!(
            "  {}  {:>4.0}{t} / {:<4.0}{t}  {:>3.0}%  {:.1} {}  {description}",
            day.date.format("%a, %b %-d"),
            day.temp_min,
            day.temp_max,
            day.humidity,
            day.wind_speed,
            units.speed_symbol(),
        );
    }
}

pub fn print_places(query: &str, places: &[GeocodingResult]) {
    if places.is_empty() {
        println!("No locations found for '{query}'.");
        return;
    }

    for place in places {
        println!("{:<40} {:>9.4} {:>9.4}", place.display_name(), place.lat, place.lon);
    }
}

pub fn print_favourites(favourites: &[FavouriteCity]) {
    if favourites.is_empty() {
        println!("No favourites yet. Add one with `climatic favourites add <city>`.");
        return;
    }

    for city in favourites {
        let name = match &city.state {
            Some(state) => format!("{}, {}, {}", city.name, state, city.country),
            None => format!("{}, {}", city.name, city.country),
        };
        println!("{:<24} {name}", city.id);
    }
}

pub fn print_history(history: &[SearchHistoryEntry]) {
    if history.is_empty() {
        println!("No recent searches.");
        return;
    }

    for entry in history {
        println!(
            "{}  {:<16} {}, {}",
            entry.searched_at.with_timezone(&Local).format("%b %-d %H:%M"),
            entry.query,
            entry.name,
            entry.country
        );
    }
}
