//! Zone resolution
//!
//! Maps a location to the first zone in catalog order whose boundary
//! contains it. Falling outside every zone is an ordinary outcome.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geometry::{bounding_box_contains, polygon_contains};
use crate::models::{Point, Zone};

/// Containment test applied to zone boundaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Containment {
    /// Point-in-polygon over every boundary vertex
    #[default]
    Polygon,
    /// Box spanned by the first and third boundary vertices
    BoundingBox,
}

impl FromStr for Containment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "polygon" => Ok(Containment::Polygon),
            "bounding_box" | "bbox" => Ok(Containment::BoundingBox),
            other => Err(format!(
                "Unknown zone containment mode: {}. Valid modes: polygon, bounding_box",
                other
            )),
        }
    }
}

impl fmt::Display for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Containment::Polygon => f.write_str("polygon"),
            Containment::BoundingBox => f.write_str("bounding_box"),
        }
    }
}

impl Zone {
    pub fn contains(&self, location: &Point, mode: Containment) -> bool {
        match mode {
            Containment::Polygon => polygon_contains(&self.boundary, location),
            Containment::BoundingBox => bounding_box_contains(&self.boundary, location),
        }
    }
}

/// Find the zone containing `location`; catalog order breaks overlaps
pub fn zone_for<'a>(location: &Point, zones: &'a [Zone], mode: Containment) -> Option<&'a Zone> {
    zones.iter().find(|zone| zone.contains(location, mode))
}
