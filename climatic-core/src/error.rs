//! Error types shared across the core.

use thiserror::Error;

/// Failure of a weather provider call.
#[derive(Error, Debug)]
pub enum WeatherApiError {
    /// Non-success HTTP status. Carries the provider's status text.
    #[error("Weather API Error: {status_text}")]
    Api { status_text: String },

    /// DNS, connect, TLS or timeout failure before a status was received.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Success status, but the body did not match the expected shape.
    #[error("Failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl WeatherApiError {
    pub fn api<S: Into<String>>(status_text: S) -> Self {
        Self::Api {
            status_text: status_text.into(),
        }
    }

    /// Only transport failures are worth repeating.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// User-friendly error message for terminal display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { .. } => self.to_string(),
            Self::Transport(_) => "Network error. Check your connection.".to_string(),
            Self::Decode(_) => "The weather provider sent an unexpected response.".to_string(),
        }
    }
}

/// Persistence failure inside the key-value store. Never escapes `store`.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Why a position request did not produce coordinates.
///
/// The `Display` text is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Geolocation is not supported by your browser")]
    Unsupported,

    #[error("Location permission denied. Please enable location access")]
    PermissionDenied,

    #[error("Location information is unavailable")]
    PositionUnavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("An unknown error occurred")]
    Unknown,
}
