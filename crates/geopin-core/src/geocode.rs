use crate::config::GeocoderConfig;
use crate::geo::Coordinate;
use crate::GeopinError;
use log::{debug, error, info};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Placeholder for address parts the geocoder did not return.
pub const NOT_AVAILABLE: &str = "Not Available";

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("geocoder answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("geocoder error: {0}")]
    Service(String),
    #[error("response has no address")]
    MissingAddress,
}

/// Address breakdown as Nominatim sends it. Every part is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAddress {
    pub road: Option<String>,
    pub village: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReverseResponse {
    pub address: Option<RawAddress>,
    pub display_name: Option<String>,
    pub error: Option<String>,
}

/// Normalized address: absent parts hold [`NOT_AVAILABLE`].
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub street: String,
    pub village: String,
    pub district: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl From<RawAddress> for Address {
    fn from(raw: RawAddress) -> Self {
        let or_na = |v: Option<String>| {
            v.filter(|s| !s.is_empty())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        Self {
            street: or_na(raw.road),
            village: or_na(raw.village),
            district: or_na(raw.suburb),
            city: or_na(raw.city.filter(|s| !s.is_empty()).or(raw.town)),
            state: or_na(raw.state),
            country: or_na(raw.country),
        }
    }
}

/// A successful lookup: the coordinate as sent and what came back for it.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationInfo {
    pub coordinate: Coordinate,
    pub address: Address,
    pub display_name: Option<String>,
}

impl LocationInfo {
    /// The read-only block shown in the input popup and stored with each record.
    pub fn summary(&self) -> String {
        format!(
            "Coordinates: {}\nStreet: {}\nVillage: {}\nDistrict: {}\nCity: {}\nState: {}\nCountry: {}",
            self.coordinate,
            self.address.street,
            self.address.village,
            self.address.district,
            self.address.city,
            self.address.state,
            self.address.country
        )
    }
}

/// Anything that can turn a coordinate into an address.
///
/// Failures are reported as `None`; implementations log the cause themselves.
pub trait ReverseGeocoder: Send + Sync {
    fn lookup(&self, coordinate: Coordinate) -> Option<LocationInfo>;
}

/// Parses a reverse-geocode body into a [`LocationInfo`] for `coordinate`.
pub fn parse_response(coordinate: Coordinate, body: &str) -> Result<LocationInfo, GeocodeError> {
    let response: ReverseResponse = serde_json::from_str(body)?;
    if let Some(message) = response.error {
        return Err(GeocodeError::Service(message));
    }
    let raw = response.address.ok_or(GeocodeError::MissingAddress)?;
    Ok(LocationInfo {
        coordinate,
        address: Address::from(raw),
        display_name: response.display_name,
    })
}

pub struct NominatimClient {
    client: reqwest::blocking::Client,
    endpoint: Url,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeopinError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| GeopinError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;

        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn request_url(&self, coordinate: Coordinate) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &format!("{:.6}", coordinate.lat))
            .append_pair("lon", &format!("{:.6}", coordinate.lon))
            .append_pair("addressdetails", "1");
        url
    }

    /// One request, no retry.
    pub fn try_lookup(&self, coordinate: Coordinate) -> Result<LocationInfo, GeocodeError> {
        let coordinate = coordinate.rounded();
        let url = self.request_url(coordinate);
        info!("Reverse geocoding — coordinate={} url={}", coordinate, url);

        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status));
        }
        let body = response.text()?;
        debug!("Geocoder responded — bytes={}", body.len());

        parse_response(coordinate, &body)
    }
}

impl ReverseGeocoder for NominatimClient {
    fn lookup(&self, coordinate: Coordinate) -> Option<LocationInfo> {
        match self.try_lookup(coordinate) {
            Ok(info) => Some(info),
            Err(e) => {
                error!("Error fetching location data — coordinate={} error={}", coordinate, e);
                None
            }
        }
    }
}
