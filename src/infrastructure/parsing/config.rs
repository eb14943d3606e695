//! Markup contract used by the site extractor

use serde::{Deserialize, Serialize};

use crate::domain::constants::{markup, site};

/// Labels, markers and icon URL the extractor matches against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Root used to resolve relative parent-area links
    pub root_url: String,

    /// Label cell preceding the first-ascent value
    pub first_ascent_label: String,

    /// Label cell preceding the coordinate value
    pub location_label: String,

    /// Text that terminates the coordinate pair in the location value
    pub map_link_marker: String,

    /// `src` of the "go up" icon inside the parent-area anchor
    pub parent_icon_src: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            root_url: site::ROOT_URL.to_string(),
            first_ascent_label: markup::FIRST_ASCENT_LABEL.to_string(),
            location_label: markup::LOCATION_LABEL.to_string(),
            map_link_marker: markup::MAP_LINK_MARKER.to_string(),
            parent_icon_src: markup::PARENT_AREA_ICON_SRC.to_string(),
        }
    }
}

impl ExtractorConfig {
    /// Default markup contract against a different site root
    pub fn with_root_url(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            ..Self::default()
        }
    }
}
