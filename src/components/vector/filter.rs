use geo::{Geometry, MultiPolygon, Polygon};

use crate::{
    components::vector::{kind::variant_name, GeoTable},
    crs_geo::{rect_from_bounds, Crs, CrsGeometry, WGS84},
    errors::{HydrioError, Result},
};

/// Polygon area rows are filtered against.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    geometry: Geometry,
    crs: Option<Crs>,
}

impl Mask {
    /// Without `crs` the geometry is taken to be in EPSG:4326.
    pub fn new(geometry: impl Into<Geometry>, crs: Option<Crs>) -> Self {
        Self {
            geometry: geometry.into(),
            crs,
        }
    }

    /// Union of all polygons of `table` in its crs.
    pub fn from_table(table: &GeoTable) -> Result<Self> {
        let mut polygons: Vec<Polygon> = Vec::new();
        for geometry in table.geometry() {
            match geometry {
                Geometry::Polygon(polygon) => polygons.push(polygon.clone()),
                Geometry::MultiPolygon(multi) => polygons.extend(multi.iter().cloned()),
                other => return Err(HydrioError::UnknownMaskType(variant_name(other).into())),
            }
        }
        let geometry = match polygons.len() {
            1 => Geometry::Polygon(polygons.remove(0)),
            _ => Geometry::MultiPolygon(MultiPolygon::new(polygons)),
        };
        Ok(Self::new(geometry, table.crs().cloned()))
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        match &self.geometry {
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => Ok(()),
            other => Err(HydrioError::UnknownMaskType(variant_name(other).into())),
        }
    }
}

/// Area to select rows with, a bounding box or a [Mask].
#[derive(Debug, Clone, PartialEq)]
pub enum SpatialFilter {
    /// `[xmin, ymin, xmax, ymax]`
    Bbox { bounds: [f64; 4], crs: Option<Crs> },
    Mask(Mask),
}

impl SpatialFilter {
    /// Filter geometry reprojected to `crs`.
    pub(crate) fn geometry_in(&self, crs: &Crs) -> Result<Geometry> {
        let (geometry, source) = match self {
            SpatialFilter::Bbox { bounds, crs } => (
                Geometry::Polygon(rect_from_bounds(*bounds).to_polygon()),
                crs.as_ref(),
            ),
            SpatialFilter::Mask(mask) => (mask.geometry.clone(), mask.crs.as_ref()),
        };
        let source = source.cloned().unwrap_or(WGS84);
        CrsGeometry::new(source, geometry).projected_geometry(crs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon, BoundingRect, Rect};

    fn square() -> Polygon {
        polygon![
            (x: 0., y: 0.),
            (x: 2., y: 0.),
            (x: 2., y: 2.),
            (x: 0., y: 2.),
        ]
    }

    #[test]
    fn mask_types() {
        assert!(Mask::new(square(), None).validate().is_ok());
        let err = Mask::new(Rect::new((0., 0.), (1., 1.)), None)
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown geometry mask type Rect");
    }

    #[test]
    fn mask_from_table() {
        let table = GeoTable::new(vec![square().into(), square().into()], Some(WGS84));
        let mask = Mask::from_table(&table).unwrap();
        assert!(matches!(mask.geometry(), Geometry::MultiPolygon(multi) if multi.0.len() == 2));
        assert_eq!(mask.crs(), Some(&WGS84));

        let points = GeoTable::new(vec![point!(x: 0., y: 0.).into()], Some(WGS84));
        assert!(Mask::from_table(&points).is_err());
    }

    #[test]
    fn bbox_stays_in_same_crs() {
        let filter = SpatialFilter::Bbox {
            bounds: [0., 0., 2., 2.],
            crs: None,
        };
        let geometry = filter.geometry_in(&WGS84).unwrap();
        assert_eq!(geometry.bounding_rect(), Some(Rect::new((0., 0.), (2., 2.))));
    }
}
