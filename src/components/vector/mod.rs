pub mod filter;
pub mod kind;
pub(crate) mod ogr;
pub mod reader;
pub(crate) mod table;
pub mod value;
pub mod writer;

use geo::{BoundingRect, Geometry, Rect};
use log::debug;
use proj::Transform;
use std::{collections::BTreeSet, path::Path};

use crate::{
    crs_geo::Crs,
    errors::{HydrioError, Result},
    predicate::Predicate,
};
use filter::SpatialFilter;
use kind::GeometryKind;
use value::Value;

/// Rows of a geometry with attributes, an index and a [Crs].
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTable {
    index_name: Option<String>,
    index: Vec<Value>,
    columns: Vec<(String, Vec<Value>)>,
    geometry: Vec<Geometry>,
    crs: Option<Crs>,
}

impl GeoTable {
    /// Table without attributes, indexed `0..n`.
    pub fn new(geometry: Vec<Geometry>, crs: Option<Crs>) -> Self {
        Self {
            index_name: None,
            index: (0..geometry.len() as i64).map(Value::Int).collect(),
            columns: Vec::new(),
            geometry,
            crs,
        }
    }

    fn check_length(&self, name: &str, found: usize) -> Result<()> {
        if found == self.len() {
            Ok(())
        } else {
            Err(HydrioError::ColumnLength {
                name: name.to_string(),
                expected: self.len(),
                found,
            })
        }
    }

    pub fn with_index(mut self, name: Option<&str>, index: Vec<Value>) -> Result<Self> {
        self.check_length(name.unwrap_or("index"), index.len())?;
        self.index_name = name.map(String::from);
        self.index = index;
        Ok(self)
    }

    /// Adds a column, replacing one with the same name.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Value>) -> Result<Self> {
        let name = name.into();
        self.check_length(&name, values.len())?;
        match self.columns.iter_mut().find(|(column, _)| *column == name) {
            Some((_, column)) => *column = values,
            None => self.columns.push((name, values)),
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.geometry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    pub fn index(&self) -> &[Value] {
        &self.index
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn geometry(&self) -> &[Geometry] {
        &self.geometry
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    /// Assigns `crs` without touching coordinates.
    pub fn set_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Reprojects all geometries to `crs`.
    pub fn to_crs(mut self, crs: &Crs) -> Result<Self> {
        let source = self.crs.as_ref().ok_or(HydrioError::MissingCrs)?;
        if let Some(proj) = source.transformer(crs)? {
            for geometry in self.geometry.iter_mut() {
                geometry.transform(&proj)?;
            }
            debug!("reprojected {} geometries from {source} to {crs}", self.len());
        }
        self.crs = Some(crs.clone());
        Ok(self)
    }

    /// Rows at `rows`, in that order.
    pub fn take(&self, rows: &[usize]) -> Self {
        let pick = |values: &[Value]| -> Vec<Value> {
            rows.iter().map(|row| values[*row].clone()).collect()
        };
        Self {
            index_name: self.index_name.clone(),
            index: pick(&self.index),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), pick(values)))
                .collect(),
            geometry: rows.iter().map(|row| self.geometry[*row].clone()).collect(),
            crs: self.crs.clone(),
        }
    }

    /// Keeps only the named attribute columns.
    pub fn select_columns(&self, names: &[&str]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .filter(|(name, _)| names.contains(&name.as_str()))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// Rows whose geometry satisfies `predicate` with the filter area.
    pub fn filter(&self, filter: &SpatialFilter, predicate: Predicate) -> Result<Self> {
        let crs = self.crs.as_ref().ok_or(HydrioError::MissingCrs)?;
        let area = filter.geometry_in(crs)?;
        let rows: Vec<usize> = self
            .geometry
            .iter()
            .enumerate()
            .filter(|(_, geometry)| predicate.evaluate(geometry, &area))
            .map(|(row, _)| row)
            .collect();
        debug!("{predicate:?} filter kept {} of {} rows", rows.len(), self.len());
        Ok(self.take(&rows))
    }

    /// `[xmin, ymin, xmax, ymax]` of all geometries.
    pub fn total_bounds(&self) -> Option<[f64; 4]> {
        let rect = self
            .geometry
            .iter()
            .filter_map(|geometry| geometry.bounding_rect())
            .reduce(|lhs, rhs| {
                Rect::new(
                    (lhs.min().x.min(rhs.min().x), lhs.min().y.min(rhs.min().y)),
                    (lhs.max().x.max(rhs.max().x), lhs.max().y.max(rhs.max().y)),
                )
            })?;
        Some([rect.min().x, rect.min().y, rect.max().x, rect.max().y])
    }

    pub fn geometry_kinds(&self) -> BTreeSet<GeometryKind> {
        self.geometry.iter().map(GeometryKind::of).collect()
    }

    /// Fails when a geometry is of a kind outside `expected`.
    pub fn assert_geometry_kinds(&self, expected: &[GeometryKind], path: &Path) -> Result<()> {
        if self.geometry_kinds().iter().all(|kind| expected.contains(kind)) {
            Ok(())
        } else {
            Err(HydrioError::GeometryTypeMismatch {
                path: path.to_path_buf(),
                expected: expected.iter().map(|kind| kind.name().to_string()).collect(),
            })
        }
    }

    /// The index as integers, if every label is one.
    pub(crate) fn integer_index(&self) -> Option<Vec<i64>> {
        self.index.iter().map(Value::as_i64).collect()
    }
}

/// Parses geometry kind names, failing on all unknown names at once.
pub fn parse_kinds(names: &[String]) -> Result<Vec<GeometryKind>> {
    let unknown: Vec<String> = names
        .iter()
        .filter(|name| GeometryKind::from_name(name).is_none())
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(HydrioError::UnknownGeometryType(unknown));
    }
    Ok(names.iter().filter_map(|name| GeometryKind::from_name(name)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs_geo::WGS84;
    use approx::assert_relative_eq;
    use geo::{point, polygon};

    fn cities() -> GeoTable {
        GeoTable::new(
            vec![
                point!(x: -58.66, y: -34.58).into(),
                point!(x: -70.66, y: -33.45).into(),
                point!(x: -74.08, y: 4.60).into(),
            ],
            Some(WGS84),
        )
        .with_index(Some("city_id"), vec![10.into(), 11.into(), 12.into()])
        .unwrap()
        .with_column("city", vec!["Buenos Aires".into(), "Santiago".into(), "Bogota".into()])
        .unwrap()
    }

    #[test]
    fn columns() {
        let table = cities();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names(), vec!["city"]);
        assert_eq!(table.column("city").unwrap()[1], Value::from("Santiago"));
        assert_eq!(table.integer_index(), Some(vec![10, 11, 12]));
        assert!(matches!(
            table.clone().with_column("short", vec![1.into()]),
            Err(HydrioError::ColumnLength { expected: 3, found: 1, .. })
        ));
        assert!(table.select_columns(&[]).column_names().is_empty());
    }

    #[test]
    fn bounds_and_take() {
        let table = cities();
        assert_eq!(table.total_bounds(), Some([-74.08, -34.58, -58.66, 4.60]));
        let taken = table.take(&[2, 0]);
        assert_eq!(taken.index(), &[Value::Int(12), Value::Int(10)]);
        assert_eq!(taken.column("city").unwrap()[0], Value::from("Bogota"));
    }

    #[test]
    fn filter_by_polygon() {
        let chile = polygon![
            (x: -75., y: -56.),
            (x: -66., y: -56.),
            (x: -66., y: -17.),
            (x: -75., y: -17.),
        ];
        let filter = SpatialFilter::Mask(filter::Mask::new(chile, None));
        let within = cities().filter(&filter, Predicate::Intersects).unwrap();
        assert_eq!(within.column("city").unwrap(), &[Value::from("Santiago")]);
        let outside = cities().filter(&filter, Predicate::Disjoint).unwrap();
        assert_eq!(outside.len(), 2);
    }

    #[test]
    fn reprojection() {
        let table = cities().to_crs(&Crs::Epsg(3857)).unwrap();
        assert_eq!(table.crs(), Some(&Crs::Epsg(3857)));
        let back = table.to_crs(&WGS84).unwrap();
        let Geometry::Point(point) = &back.geometry()[0] else {
            panic!("expected a point")
        };
        assert_relative_eq!(point.x(), -58.66, epsilon = 1e-6);
        assert!(GeoTable::new(vec![], None).to_crs(&WGS84).is_err());
    }

    #[test]
    fn geometry_kinds() {
        let table = cities();
        let path = Path::new("cities.csv");
        assert!(table.assert_geometry_kinds(&[GeometryKind::Point], path).is_ok());
        let err = table
            .assert_geometry_kinds(&[GeometryKind::Polygon], path)
            .unwrap_err();
        assert!(err.to_string().contains("contains other geometries than"));
        let err = parse_kinds(&["Point".into(), "Circle".into()]).unwrap_err();
        assert!(matches!(err, HydrioError::UnknownGeometryType(names) if names == vec!["Circle"]));
    }
}
