// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod config;
pub mod controller;
pub mod geo;
pub mod geocode;
pub mod popup;
pub mod store;
pub mod surface;

use std::path::PathBuf;
use thiserror::Error;

pub use controller::{ClickOutcome, InteractionController, LookupResolution, LookupTicket};
pub use geo::{Coordinate, Pixel, Viewport};
pub use geocode::{Address, LocationInfo, NominatimClient, ReverseGeocoder};
pub use store::{LocationRecord, MarkerStore};
pub use surface::{MapSurface, MarkerFeature};

#[derive(Error, Debug)]
pub enum GeopinError {
    #[error("Invalid geocoder endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("Invalid settings file: {0}")]
    Settings(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Directory holding `settings.json` and the GUI log file.
///
/// Falls back to `./.geopin` when the platform has no home directory.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("com", "startux", "geopin")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".geopin"))
}
