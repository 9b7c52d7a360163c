use calamine::{open_workbook_auto, Data, Reader};
use geo::{Geometry, Point};
use log::debug;
use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{
    components::{
        drivers::TableDriver,
        vector::{reader::VectorOptions, value::Value, GeoTable},
    },
    errors::{HydrioError, Result},
};

pub(crate) const X_DIMS: [&str; 4] = ["x", "longitude", "lon", "long"];
pub(crate) const Y_DIMS: [&str; 3] = ["y", "latitude", "lat"];

/// Attribute columns of a table before coordinates are picked.
struct Frame {
    index_name: Option<String>,
    index: Vec<Value>,
    columns: Vec<(String, Vec<Value>)>,
}

impl Frame {
    fn from_rows(header: Vec<String>, rows: Vec<Vec<Value>>, index_col: Option<usize>) -> Self {
        let mut columns: Vec<(String, Vec<Value>)> = header
            .into_iter()
            .map(|name| (name, Vec::with_capacity(rows.len())))
            .collect();
        for row in rows {
            let mut cells = row.into_iter();
            for (_, values) in columns.iter_mut() {
                values.push(cells.next().unwrap_or_default());
            }
        }
        match index_col.filter(|col| *col < columns.len()) {
            Some(col) => {
                let (name, index) = columns.remove(col);
                Self {
                    index_name: Some(name).filter(|name| !name.is_empty()),
                    index,
                    columns,
                }
            }
            None => {
                let rows = columns.first().map_or(0, |(_, values)| values.len());
                Self {
                    index_name: None,
                    index: (0..rows as i64).map(Value::Int).collect(),
                    columns,
                }
            }
        }
    }

    fn names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    fn find_column(&self, axis: char, explicit: Option<&str>, candidates: &[&str]) -> Result<usize> {
        let found = match explicit {
            Some(name) => self.columns.iter().position(|(column, _)| column == name),
            None => candidates.iter().find_map(|candidate| {
                self.columns
                    .iter()
                    .position(|(column, _)| column.eq_ignore_ascii_case(candidate))
            }),
        };
        found.ok_or_else(|| HydrioError::MissingCoordinateColumn {
            axis,
            name: explicit.unwrap_or(candidates[0]).to_string(),
            columns: self.names(),
        })
    }

    /// Moves the coordinate columns into point geometries.
    fn into_points(mut self, path: &Path, x_dim: Option<&str>, y_dim: Option<&str>) -> Result<GeoTable> {
        let x_col = self.find_column('x', x_dim, &X_DIMS)?;
        let y_col = self.find_column('y', y_dim, &Y_DIMS)?;
        if x_col == y_col {
            return Err(HydrioError::SharedCoordinateColumn(self.columns[x_col].0.clone()));
        }
        let coordinate = |value: &Value| {
            value.as_f64().ok_or_else(|| HydrioError::Unparsable {
                path: path.to_path_buf(),
                value: value.to_string(),
            })
        };
        let points = self.columns[x_col]
            .1
            .iter()
            .zip(&self.columns[y_col].1)
            .map(|(x, y)| Ok(Geometry::Point(Point::new(coordinate(x)?, coordinate(y)?))))
            .collect::<Result<Vec<_>>>()?;
        let (first, second) = if x_col > y_col { (x_col, y_col) } else { (y_col, x_col) };
        self.columns.remove(first);
        self.columns.remove(second);

        let mut table = GeoTable::new(points, None).with_index(self.index_name.as_deref(), self.index)?;
        for (name, values) in self.columns {
            table = table.with_column(name, values)?;
        }
        Ok(table)
    }
}

fn read_csv(path: &Path, index_col: Option<usize>) -> Result<Frame> {
    let mut reader = csv::Reader::from_path(path)?;
    let header = reader.headers()?.iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|record| record.map(|record| record.iter().map(Value::parse).collect()))
        .collect::<std::result::Result<Vec<Vec<Value>>, csv::Error>>()?;
    Ok(Frame::from_rows(header, rows, index_col))
}

fn excel_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(value) => Value::Int(*value),
        Data::Float(value) => Value::Float(*value).normalized(),
        Data::Bool(value) => Value::Bool(*value),
        Data::String(value) => Value::Text(value.clone()),
        other => Value::Text(other.to_string()),
    }
}

fn read_excel(path: &Path, index_col: Option<usize>) -> Result<Frame> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| HydrioError::Unparsable {
            path: path.to_path_buf(),
            value: "workbook without sheets".into(),
        })??;
    let mut rows = range.rows();
    let header = rows
        .next()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|row| row.iter().map(excel_value).collect())
        .collect();
    Ok(Frame::from_rows(header, rows, index_col))
}

/// Whitespace or comma separated coordinate pairs without header.
fn read_xy(path: &Path, x_name: &str, y_name: &str) -> Result<Frame> {
    let content = fs::read_to_string(path)?;
    let (mut xs, mut ys) = (Vec::new(), Vec::new());
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|field| !field.is_empty());
        for values in [&mut xs, &mut ys] {
            let field = fields.next().unwrap_or_default();
            let value = field.parse::<f64>().map_err(|_| HydrioError::Unparsable {
                path: path.to_path_buf(),
                value: line.to_string(),
            })?;
            values.push(Value::Float(value));
        }
    }
    let rows = xs.len();
    Ok(Frame {
        index_name: None,
        index: (0..rows as i64).map(Value::Int).collect(),
        columns: vec![(x_name.to_string(), xs), (y_name.to_string(), ys)],
    })
}

pub(crate) fn read(path: &Path, driver: TableDriver, options: &VectorOptions) -> Result<GeoTable> {
    let (x_dim, y_dim) = (options.x_dim.as_deref(), options.y_dim.as_deref());
    let frame = match driver {
        TableDriver::Csv => read_csv(path, options.index_col)?,
        TableDriver::Excel => read_excel(path, options.index_col)?,
        TableDriver::Xy => read_xy(path, x_dim.unwrap_or(X_DIMS[0]), y_dim.unwrap_or(Y_DIMS[0]))?,
    };
    let table = frame.into_points(path, x_dim, y_dim)?;
    debug!("read {} point(s) from {}", table.len(), path.display());
    Ok(table)
}

pub(crate) fn point_coords(table: &GeoTable) -> Result<Vec<(f64, f64)>> {
    table
        .geometry()
        .iter()
        .enumerate()
        .map(|(row, geometry)| match geometry {
            Geometry::Point(point) => Ok((point.x(), point.y())),
            _ => Err(HydrioError::NotAPoint(row)),
        })
        .collect()
}

/// Point tables as index, attributes, `x` and `y` columns.
pub(crate) fn write_csv(table: &GeoTable, path: &Path) -> Result<()> {
    let coords = point_coords(table)?;
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec![table.index_name().unwrap_or_default().to_string()];
    header.extend(table.column_names().into_iter().map(String::from));
    header.extend([X_DIMS[0].to_string(), Y_DIMS[0].to_string()]);
    writer.write_record(&header)?;
    for (row, (x, y)) in coords.into_iter().enumerate() {
        let mut record = vec![table.index()[row].to_string()];
        record.extend(table.columns().map(|(_, values)| values[row].to_string()));
        record.extend([x.to_string(), y.to_string()]);
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// One `x y` line per point.
pub(crate) fn write_xy(table: &GeoTable, path: &Path) -> Result<()> {
    let mut file = BufWriter::new(fs::File::create(path)?);
    for (x, y) in point_coords(table)? {
        writeln!(file, "{x} {y}")?;
    }
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn coordinate_aliases() {
        let file = csv_file("id,name,lon,LAT\n1,a,1.5,2.5\n2,b,3,4\n");
        let table = read(file.path(), TableDriver::Csv, &VectorOptions::default()).unwrap();
        assert_eq!(table.column_names(), vec!["name"]);
        assert_eq!(table.index_name(), Some("id"));
        assert_eq!(table.geometry()[0], Geometry::Point(Point::new(1.5, 2.5)));
    }

    #[test]
    fn missing_coordinate_column() {
        let file = csv_file("id,name,lon,lat\n1,a,1.5,2.5\n");
        let options = VectorOptions {
            x_dim: Some("x".into()),
            ..Default::default()
        };
        let err = read(file.path(), TableDriver::Csv, &options).unwrap_err();
        assert!(err.to_string().starts_with("x dimension \"x\" not found in columns"));
    }

    #[test]
    fn one_column_for_both_axes() {
        let file = csv_file("id,a,b\n1,2,3\n");
        let options = VectorOptions {
            x_dim: Some("a".into()),
            y_dim: Some("a".into()),
            ..Default::default()
        };
        let err = read(file.path(), TableDriver::Csv, &options).unwrap_err();
        assert!(matches!(err, HydrioError::SharedCoordinateColumn(name) if name == "a"));
    }

    #[test]
    fn bad_coordinate() {
        let file = csv_file("id,x,y\n1,a,2.5\n");
        let err = read(file.path(), TableDriver::Csv, &VectorOptions::default()).unwrap_err();
        assert!(matches!(err, HydrioError::Unparsable { value, .. } if value == "a"));
    }

    #[test]
    fn frame_without_index() {
        let frame = Frame::from_rows(
            vec!["x".into(), "y".into()],
            vec![vec![1.into(), 2.into()], vec![3.into()]],
            None,
        );
        assert_eq!(frame.index, vec![Value::Int(0), Value::Int(1)]);
        assert_eq!(frame.columns[1].1, vec![Value::Int(2), Value::Null]);
    }
}
