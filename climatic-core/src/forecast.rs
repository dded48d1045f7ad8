//! Display-oriented views over a [`ForecastSnapshot`].

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{ForecastEntry, ForecastSnapshot, WeatherCondition};

/// Days shown in the daily outlook.
pub const FORECAST_DAYS: usize = 5;

/// Three-hour steps shown in the hourly series (24 hours).
pub const HOURLY_STEPS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub condition: Option<WeatherCondition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyTemperature {
    pub time: DateTime<Utc>,
    pub temp: f64,
    pub feels_like: f64,
}

fn entry_time(entry: &ForecastEntry) -> DateTime<Utc> {
    DateTime::from_timestamp(entry.dt, 0).unwrap_or_default()
}

/// Group entries by UTC date. The first entry of a day supplies its
/// condition, humidity and wind; min/max span the whole day.
pub fn daily_summaries(forecast: &ForecastSnapshot) -> Vec<DailyForecast> {
    let mut days: Vec<DailyForecast> = Vec::new();

    for entry in &forecast.list {
        let date = entry_time(entry).date_naive();

        match days.iter_mut().find(|day| day.date == date) {
            Some(day) => {
                day.temp_min = day.temp_min.min(entry.main.temp_min);
                day.temp_max = day.temp_max.max(entry.main.temp_max);
            }
            None => days.push(DailyForecast {
                date,
                temp_min: entry.main.temp_min,
                temp_max: entry.main.temp_max,
                humidity: entry.main.humidity,
                wind_speed: entry.wind.speed,
                condition: entry.weather.first().cloned(),
            }),
        }
    }

    days.sort_by_key(|day| day.date);
    days.truncate(FORECAST_DAYS);
    days
}

pub fn hourly_temperatures(forecast: &ForecastSnapshot) -> Vec<HourlyTemperature> {
    forecast
        .list
        .iter()
        .take(HOURLY_STEPS)
        .map(|entry| HourlyTemperature {
            time: entry_time(entry),
            temp: entry.main.temp,
            feels_like: entry.main.feels_like,
        })
        .collect()
}
