//! Geographic values produced while climbing the area hierarchy

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Latitude/longitude pair kept as the decimal strings the site renders.
///
/// An empty coordinate means "not found". It serializes as a JSON array with
/// either zero or two elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Coordinate {
    pair: Option<(String, String)>,
}

impl Coordinate {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Self {
            pair: Some((latitude.into(), longitude.into())),
        }
    }

    pub const fn empty() -> Self {
        Self { pair: None }
    }

    pub const fn is_empty(&self) -> bool {
        self.pair.is_none()
    }

    pub fn latitude(&self) -> Option<&str> {
        self.pair.as_ref().map(|(lat, _)| lat.as_str())
    }

    pub fn longitude(&self) -> Option<&str> {
        self.pair.as_ref().map(|(_, long)| long.as_str())
    }
}

impl TryFrom<Vec<String>> for Coordinate {
    type Error = String;

    fn try_from(parts: Vec<String>) -> Result<Self, Self::Error> {
        let mut parts = parts.into_iter();
        match (parts.next(), parts.next(), parts.next()) {
            (None, _, _) => Ok(Self::empty()),
            (Some(lat), Some(long), None) => Ok(Self::new(lat, long)),
            _ => Err("coordinate must have zero or two components".to_string()),
        }
    }
}

impl From<Coordinate> for Vec<String> {
    fn from(coordinate: Coordinate) -> Self {
        coordinate
            .pair
            .map(|(lat, long)| vec![lat, long])
            .unwrap_or_default()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pair {
            Some((lat, long)) => write!(f, "{lat}, {long}"),
            None => f.write_str("<none>"),
        }
    }
}

/// Absolute URL of a parent area page, resolved from a "go up" link
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AreaLink(Url);

impl AreaLink {
    pub const fn new(url: Url) -> Self {
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub const fn url(&self) -> &Url {
        &self.0
    }
}

impl AsRef<str> for AreaLink {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AreaLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_coordinate_serializes_as_empty_array() {
        let json = serde_json::to_string(&Coordinate::empty()).unwrap();
        assert_eq!(json, "[]");
    }

    #[test]
    fn coordinate_serializes_as_ordered_pair() {
        let coordinate = Coordinate::new("40.1234", "-105.5678");
        let json = serde_json::to_string(&coordinate).unwrap();
        assert_eq!(json, r#"["40.1234","-105.5678"]"#);

        let back: Coordinate = serde_json::from_str(&json).unwrap();
        assert_eq!(back.latitude(), Some("40.1234"));
        assert_eq!(back.longitude(), Some("-105.5678"));
    }

    #[test]
    fn coordinate_rejects_odd_component_count() {
        assert!(serde_json::from_str::<Coordinate>(r#"["40.1"]"#).is_err());
        assert!(serde_json::from_str::<Coordinate>(r#"["1","2","3"]"#).is_err());
    }

    #[test]
    fn area_link_displays_absolute_url() {
        let link = AreaLink::new(Url::parse("https://www.mountainproject.com/area/1").unwrap());
        assert_eq!(link.to_string(), "https://www.mountainproject.com/area/1");
    }
}
