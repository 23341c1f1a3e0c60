//! Resolved spatial reference systems and their axis order.

use serde::Serialize;
use std::fmt;

use ows_common::AxisOrder;

use crate::wkt::{WktError, WktNode};

/// Where a [`SpatialReference`] definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    FromCache,
    /// Bundled EPSG definition table.
    FromLocalLibrary,
    FromRemoteRegistry,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::FromCache => "from_cache",
            Origin::FromLocalLibrary => "from_local_gdal",
            Origin::FromRemoteRegistry => "from_remote_registry",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrsKind {
    Geographic,
    Projected,
    /// Vertical, compound, engineering and other CRS types.
    Other,
    /// No definition could be found.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisDirection {
    North,
    South,
    East,
    West,
    Up,
    Down,
    Other(String),
}

impl AxisDirection {
    pub fn parse(direction: &str) -> Self {
        match direction.to_ascii_lowercase().as_str() {
            "north" => AxisDirection::North,
            "south" => AxisDirection::South,
            "east" => AxisDirection::East,
            "west" => AxisDirection::West,
            "up" => AxisDirection::Up,
            "down" => AxisDirection::Down,
            _ => AxisDirection::Other(direction.to_string()),
        }
    }

    pub fn is_north_south(&self) -> bool {
        matches!(self, AxisDirection::North | AxisDirection::South)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Axis {
    pub name: String,
    pub direction: AxisDirection,
}

/// A CRS definition reduced to what axis handling needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpatialReference {
    pub srid: u32,
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wkt: Option<String>,
    pub kind: CrsKind,
    pub axes: Vec<Axis>,
}

impl SpatialReference {
    /// Build from a WKT definition.
    pub fn from_wkt(srid: u32, wkt: &str, origin: Origin) -> Result<Self, WktError> {
        let root = WktNode::parse(wkt)?;
        Ok(Self {
            srid,
            origin,
            wkt: Some(wkt.to_string()),
            kind: crs_kind(&root.keyword),
            axes: axes(&root),
        })
    }

    /// A reference for an SRID nobody could resolve.
    pub fn unknown(srid: u32, origin: Origin) -> Self {
        Self {
            srid,
            origin,
            wkt: None,
            kind: CrsKind::Unknown,
            axes: Vec::new(),
        }
    }

    /// True when the first axis is latitude or northing.
    ///
    /// Geographic definitions without explicit axes are treated as lat/long,
    /// which is the EPSG order for geographic CRSs. Projected definitions
    /// without axes are easting/northing. `None` for other CRS kinds.
    pub fn is_yx_order(&self) -> Option<bool> {
        let first = self.axes.first().map(|axis| axis.direction.is_north_south());
        match self.kind {
            CrsKind::Geographic => Some(first.unwrap_or(true)),
            CrsKind::Projected => Some(first.unwrap_or(false)),
            CrsKind::Other | CrsKind::Unknown => None,
        }
    }

    pub fn axis_order(&self) -> Option<AxisOrder> {
        self.is_yx_order()
            .map(|yx| if yx { AxisOrder::YX } else { AxisOrder::XY })
    }
}

fn crs_kind(keyword: &str) -> CrsKind {
    match keyword.to_ascii_uppercase().as_str() {
        "GEOGCS" | "GEOGCRS" | "GEODCRS" | "GEOGRAPHICCRS" | "GEODETICCRS" => CrsKind::Geographic,
        "PROJCS" | "PROJCRS" | "PROJECTEDCRS" => CrsKind::Projected,
        _ => CrsKind::Other,
    }
}

fn axes(root: &WktNode) -> Vec<Axis> {
    root.children("AXIS")
        .map(|axis| Axis {
            name: axis.name().unwrap_or_default().to_string(),
            direction: axis
                .first_bare()
                .map(AxisDirection::parse)
                .unwrap_or_else(|| AxisDirection::Other(String::new())),
        })
        .collect()
}
