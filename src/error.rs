use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur while resolving an area or generating a tile set
#[derive(Error, Debug)]
pub enum TilesError {
    /// Invalid or missing parameters, inverted bounds, unknown region or source
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required place could not be resolved to coordinates
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// Network-related errors while talking to a remote collaborator
    #[error("Network error: {0}")]
    Network(#[from] HttpError),

    /// Coordinates outside the domain of the tiling projection
    #[error("Coordinate error: {0}")]
    Coordinate(#[from] CoordError),

    /// Filesystem errors while persisting tiles or metadata
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors parsing a remote response or serializing metadata
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Domain errors of the tile coordinate conversion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude must lie strictly within (-90, 90)
    #[error("Latitude {0} is outside (-90, 90)")]
    InvalidLatitude(f64),

    /// Longitude must lie within [-180, 180]
    #[error("Longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),

    /// Zoom above the supported maximum
    #[error("Zoom level {0} is not supported")]
    InvalidZoom(u8),
}

pub type Result<T> = std::result::Result<T, TilesError>;
