use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// Classification shared by every domain error so boundaries can report a stable kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    CapacityExceeded,
    MaintenanceConflict,
    LockedPayment,
    MissingInventoryItem,
    InsufficientInventory,
    Unavailable,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::CapacityExceeded => "capacity_exceeded",
            ErrorKind::MaintenanceConflict => "maintenance_conflict",
            ErrorKind::LockedPayment => "locked_payment",
            ErrorKind::MissingInventoryItem => "missing_inventory_item",
            ErrorKind::InsufficientInventory => "insufficient_inventory",
            ErrorKind::Unavailable => "unavailable",
        }
    }

    pub const fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::CapacityExceeded
            | ErrorKind::MaintenanceConflict
            | ErrorKind::LockedPayment
            | ErrorKind::MissingInventoryItem
            | ErrorKind::InsufficientInventory => StatusCode::CONFLICT,
            ErrorKind::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Renders a domain failure as `{ "error", "kind", "items"? }`.
pub(crate) fn error_response(kind: ErrorKind, message: String, items: Option<Value>) -> Response {
    let mut payload = json!({
        "error": message,
        "kind": kind.label(),
    });
    if let Some(items) = items {
        payload["items"] = items;
    }
    (kind.status_code(), Json(payload)).into_response()
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "kind": ErrorKind::Unavailable.label(),
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}
