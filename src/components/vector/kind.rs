use geo::Geometry;
use geo_traits::{GeometryTrait, GeometryType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simple features geometry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    /// Only used in asserted kinds, rings are read as `LineString`.
    LinearRing,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    /// Lines map to `LineString`, rects and triangles to `Polygon`.
    pub fn of<G: GeometryTrait>(geometry: &G) -> Self {
        match geometry.as_type() {
            GeometryType::Point(_) => GeometryKind::Point,
            GeometryType::Line(_) | GeometryType::LineString(_) => GeometryKind::LineString,
            GeometryType::Polygon(_) | GeometryType::Rect(_) | GeometryType::Triangle(_) => {
                GeometryKind::Polygon
            }
            GeometryType::MultiPoint(_) => GeometryKind::MultiPoint,
            GeometryType::MultiLineString(_) => GeometryKind::MultiLineString,
            GeometryType::MultiPolygon(_) => GeometryKind::MultiPolygon,
            GeometryType::GeometryCollection(_) => GeometryKind::GeometryCollection,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Point" => GeometryKind::Point,
            "LineString" => GeometryKind::LineString,
            "LinearRing" => GeometryKind::LinearRing,
            "Polygon" => GeometryKind::Polygon,
            "MultiPoint" => GeometryKind::MultiPoint,
            "MultiLineString" => GeometryKind::MultiLineString,
            "MultiPolygon" => GeometryKind::MultiPolygon,
            "GeometryCollection" => GeometryKind::GeometryCollection,
            _ => return None,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::LinearRing => "LinearRing",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeometryCollection => "GeometryCollection",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of the concrete geometry variant, keeping `Rect`, `Line` and `Triangle` apart.
pub(crate) fn variant_name(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
