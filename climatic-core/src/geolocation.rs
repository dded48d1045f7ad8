//! One-shot device location requests.
//!
//! The platform capability is a [`PositionSource`]. [`Geolocation`] turns one
//! request into a small observable state: loading, then either coordinates or
//! a user-facing error message.

use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use thiserror::Error;
use tokio::sync::watch;

use crate::{error::GeolocationError, model::Coordinates};

/// Platform error codes, numbered as browsers number them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Unknown(u16),
}

impl PositionErrorCode {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            other => Self::Unknown(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::PermissionDenied => 1,
            Self::PositionUnavailable => 2,
            Self::Timeout => 3,
            Self::Unknown(code) => *code,
        }
    }
}

/// Failure reported by a [`PositionSource`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {})", .code.code())]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code: PositionErrorCode::from_code(code),
            message: message.into(),
        }
    }
}

impl From<&PositionError> for GeolocationError {
    fn from(err: &PositionError) -> Self {
        match err.code {
            PositionErrorCode::PermissionDenied => Self::PermissionDenied,
            PositionErrorCode::PositionUnavailable => Self::PositionUnavailable,
            PositionErrorCode::Timeout => Self::Timeout,
            PositionErrorCode::Unknown(_) => Self::Unknown,
        }
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync + Debug {
    async fn current_position(&self) -> Result<Coordinates, PositionError>;
}

/// Reports a fixed position, e.g. the `[location]` table of the config file.
#[derive(Debug, Clone, Copy)]
pub struct ConfiguredPosition {
    coordinates: Coordinates,
}

impl ConfiguredPosition {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl PositionSource for ConfiguredPosition {
    async fn current_position(&self) -> Result<Coordinates, PositionError> {
        Ok(self.coordinates)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeolocationState {
    pub coordinates: Option<Coordinates>,
    pub error: Option<String>,
    pub is_loading: bool,
}

impl GeolocationState {
    fn loading() -> Self {
        Self {
            coordinates: None,
            error: None,
            is_loading: true,
        }
    }
}

pub struct Geolocation {
    source: Option<Arc<dyn PositionSource>>,
    state: watch::Sender<GeolocationState>,
}

impl Geolocation {
    /// `None` means the platform has no location capability.
    pub fn new(source: Option<Arc<dyn PositionSource>>) -> Self {
        let (state, _) = watch::channel(GeolocationState::default());
        Self { source, state }
    }

    pub fn state(&self) -> GeolocationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GeolocationState> {
        self.state.subscribe()
    }

    /// Request the position once and return the settled state.
    pub async fn locate(&self) -> GeolocationState {
        self.state.send_replace(GeolocationState::loading());

        let result = match &self.source {
            Some(source) => source
                .current_position()
                .await
                .map_err(|e| GeolocationError::from(&e)),
            None => Err(GeolocationError::Unsupported),
        };

        let settled = match result {
            Ok(coordinates) => {
                tracing::debug!(%coordinates, "Located device");
                GeolocationState {
                    coordinates: Some(coordinates),
                    error: None,
                    is_loading: false,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Location request failed");
                GeolocationState {
                    coordinates: None,
                    error: Some(e.to_string()),
                    is_loading: false,
                }
            }
        };

        self.state.send_replace(settled.clone());
        settled
    }
}
