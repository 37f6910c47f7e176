use crate::geo::Coordinate;
use serde::Serialize;

/// A saved location. Never changes once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRecord {
    /// 1-based display position, equal to save order
    pub index: usize,
    pub coordinate: Coordinate,
    pub description: String,
    pub address: String,
}

impl LocationRecord {
    pub fn list_entry(&self) -> String {
        format!(
            "Location {}:\nLongitude: {}, Latitude: {}\nDescription: {}\nAddress: {}",
            self.index, self.coordinate.lon, self.coordinate.lat, self.description, self.address
        )
    }
}

/// Session-only, append-only list of saved locations.
#[derive(Debug, Default)]
pub struct MarkerStore {
    records: Vec<LocationRecord>,
}

impl MarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns its 1-based index.
    pub fn append(&mut self, coordinate: Coordinate, description: String, address: String) -> usize {
        let index = self.records.len() + 1;
        self.records.push(LocationRecord {
            index,
            coordinate,
            description,
            address,
        });
        index
    }

    pub fn all(&self) -> &[LocationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
