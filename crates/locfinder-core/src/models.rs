//! Data model for the live location map

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OpenError;

/// Default map center (San Francisco) used before any user interaction
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    latitude: 37.779325,
    longitude: -122.426856,
};

/// Default zoom level of the map surface
pub const DEFAULT_ZOOM: u8 = 15;

/// Location category streamed when no other type is configured
pub const DEFAULT_LOCATION_TYPE: &str = "FoodTruck";

/// Bounds accepted by the `/location` endpoint for `numberOfLocations`
pub const NUMBER_OF_LOCATIONS_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

/// Bounds accepted by the `/location` endpoint for `radius` (miles)
pub const RADIUS_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// A geographic coordinate in decimal degrees
///
/// Used both as the viewport center and as a marker position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and within the WGS84 ranges
    ///
    /// Stricter than the `/location` endpoint, which accepts any latitude
    /// in [-180, 180].
    pub fn validate(&self) -> Result<(), OpenError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(OpenError::InvalidViewport(format!(
                "coordinate must be finite, got {}",
                self
            )));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(OpenError::InvalidViewport(format!(
                "latitude {} not in [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(OpenError::InvalidViewport(format!(
                "longitude {} not in [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        DEFAULT_CENTER
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Category filter and search criteria sent along with the viewport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFilter {
    /// Location category, e.g. "FoodTruck"
    pub location_type: String,
    /// Maximum number of locations the server should push
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_locations: Option<u32>,
    /// Search radius around the center, in miles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<u32>,
}

impl StreamFilter {
    pub fn new(location_type: impl Into<String>) -> Self {
        Self {
            location_type: location_type.into(),
            number_of_locations: None,
            radius: None,
        }
    }

    pub fn with_number_of_locations(mut self, count: u32) -> Self {
        self.number_of_locations = Some(count);
        self
    }

    pub fn with_radius(mut self, miles: u32) -> Self {
        self.radius = Some(miles);
        self
    }

    pub fn validate(&self) -> Result<(), OpenError> {
        if self.location_type.trim().is_empty() {
            return Err(OpenError::InvalidFilter(
                "location type must not be blank".into(),
            ));
        }
        if let Some(count) = self.number_of_locations {
            if !NUMBER_OF_LOCATIONS_RANGE.contains(&count) {
                return Err(OpenError::InvalidFilter(format!(
                    "numberOfLocations {} not in [{}, {}]",
                    count,
                    NUMBER_OF_LOCATIONS_RANGE.start(),
                    NUMBER_OF_LOCATIONS_RANGE.end()
                )));
            }
        }
        if let Some(radius) = self.radius {
            if !RADIUS_RANGE.contains(&radius) {
                return Err(OpenError::InvalidFilter(format!(
                    "radius {} not in [{}, {}]",
                    radius,
                    RADIUS_RANGE.start(),
                    RADIUS_RANGE.end()
                )));
            }
        }
        Ok(())
    }
}

impl Default for StreamFilter {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATION_TYPE)
    }
}

/// The region that is currently "live": viewport center plus filter
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewportState {
    pub center: Coordinate,
    pub filter: StreamFilter,
}

impl ViewportState {
    pub fn new(center: Coordinate, filter: StreamFilter) -> Self {
        Self { center, filter }
    }
}

/// One location pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEvent {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationEvent {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A point annotation placed on the map surface
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Coordinate,
    pub title: String,
    /// Session-wide sequential label
    pub label: u64,
}

/// Options used to initialize a map surface
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub center: Coordinate,
    pub zoom: u8,
    /// Access credential for the tile provider
    pub credentials: String,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            credentials: String::new(),
        }
    }
}
