//! TOML configuration for the viewer
//!
//! Every field has a default, so an empty file (or no file at all) gives a
//! viewer centered on San Francisco streaming food trucks from
//! `http://localhost:8080`.
//!
//! ```toml
//! [server]
//! url = "http://localhost:8080"
//! connect_timeout_secs = 10
//!
//! [map]
//! latitude = 37.779325
//! longitude = -122.426856
//! zoom = 15
//! credentials = ""
//!
//! [stream]
//! type = "FoodTruck"
//! number_of_locations = 5
//! radius = 5
//! ```

use std::time::Duration;

use locfinder_core::{
    Coordinate, MapOptions, StreamFilter, ViewportState, DEFAULT_CENTER, DEFAULT_LOCATION_TYPE,
    DEFAULT_ZOOM,
};
use serde::Deserialize;

/// Location server connection settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub url: String,
    pub connect_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Initial map surface settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    /// Tile provider access credential
    pub credentials: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_CENTER.latitude,
            longitude: DEFAULT_CENTER.longitude,
            zoom: DEFAULT_ZOOM,
            credentials: String::new(),
        }
    }
}

/// What to stream for the visible viewport
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    #[serde(rename = "type")]
    pub location_type: String,
    pub number_of_locations: Option<u32>,
    pub radius: Option<u32>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            location_type: DEFAULT_LOCATION_TYPE.to_string(),
            number_of_locations: None,
            radius: None,
        }
    }
}

/// Top-level viewer configuration
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub server: ServerConfig,
    pub map: MapConfig,
    pub stream: StreamConfig,
}

impl ViewerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;
        Self::parse(&content).map_err(|e| format!("Failed to parse config file '{}': {}", path, e))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Reject settings the stream endpoint would refuse
    pub fn validate(&self) -> Result<(), String> {
        self.center().validate().map_err(|e| e.to_string())?;
        self.filter().validate().map_err(|e| e.to_string())?;
        if self.server.url.trim().is_empty() {
            return Err("server.url must not be empty".to_string());
        }
        Ok(())
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.map.latitude, self.map.longitude)
    }

    pub fn filter(&self) -> StreamFilter {
        StreamFilter {
            location_type: self.stream.location_type.clone(),
            number_of_locations: self.stream.number_of_locations,
            radius: self.stream.radius,
        }
    }

    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            center: self.center(),
            zoom: self.map.zoom,
            credentials: self.map.credentials.clone(),
        }
    }

    pub fn viewport_state(&self) -> ViewportState {
        ViewportState::new(self.center(), self.filter())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.server.connect_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ViewerConfig::parse("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.center(), DEFAULT_CENTER);
        assert_eq!(config.filter(), StreamFilter::new("FoodTruck"));
        assert_eq!(config.map_options().zoom, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
url = "http://10.0.0.5:9000"

[map]
latitude = 37.80
longitude = -122.40
credentials = "secret"

[stream]
type = "Restaurant"
number_of_locations = 10
"#
        )
        .unwrap();

        let config = ViewerConfig::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.server.url, "http://10.0.0.5:9000");
        assert_eq!(config.server.connect_timeout_secs, 10);
        assert_eq!(config.center(), Coordinate::new(37.80, -122.40));
        assert_eq!(config.map.zoom, 15);
        assert_eq!(
            config.filter(),
            StreamFilter::new("Restaurant").with_number_of_locations(10)
        );
        assert_eq!(config.map_options().credentials, "secret");
    }

    #[test]
    fn test_load_missing_file() {
        let err = ViewerConfig::load("/nonexistent/viewer.toml").unwrap_err();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = ViewerConfig::default();
        config.stream.location_type = " ".into();
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.map.latitude = 123.0;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.stream.radius = Some(50);
        assert!(config.validate().is_err());
    }
}
