use chrono::{DateTime, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use log::info;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{HydrioError, Result};

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%m/%d/%Y", "%Y/%m/%d"];
const CSV_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Options of [open_timeseries_from_table].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeseriesOptions {
    /// Defaults to the file stem.
    pub name: Option<String>,
    pub index_dim: String,
}

impl Default for TimeseriesOptions {
    fn default() -> Self {
        Self {
            name: None,
            index_dim: "index".into(),
        }
    }
}

/// Values of one variable per time step (rows) and entity id (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    index_dim: String,
    time: Vec<NaiveDateTime>,
    ids: Vec<i64>,
    values: Array2<f64>,
}

impl TimeSeries {
    pub fn new(
        name: impl Into<String>,
        index_dim: impl Into<String>,
        time: Vec<NaiveDateTime>,
        ids: Vec<i64>,
        values: Array2<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if values.dim() != (time.len(), ids.len()) {
            return Err(HydrioError::ColumnLength {
                name,
                expected: time.len() * ids.len(),
                found: values.len(),
            });
        }
        Ok(Self {
            name,
            index_dim: index_dim.into(),
            time,
            ids,
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index_dim(&self) -> &str {
        &self.index_dim
    }

    pub fn time(&self) -> &[NaiveDateTime] {
        &self.time
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// (time, id)
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn series(&self, id: i64) -> Option<Vec<f64>> {
        let col = self.ids.iter().position(|other| *other == id)?;
        Some(self.values.column(col).to_vec())
    }

    /// Columns ordered as `ids`, `NaN` for ids without data.
    pub fn reindex(&self, ids: &[i64]) -> TimeSeries {
        let mut values = Array2::from_elem((self.time.len(), ids.len()), f64::NAN);
        for (col, id) in ids.iter().enumerate() {
            if let Some(source) = self.ids.iter().position(|other| other == id) {
                values.column_mut(col).assign(&self.values.column(source));
            }
        }
        TimeSeries {
            ids: ids.to_vec(),
            values,
            ..self.clone()
        }
    }

    /// Writes time in rows and one column per id.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path.as_ref())?;
        let mut header = vec!["time".to_string()];
        header.extend(self.ids.iter().map(i64::to_string));
        writer.write_record(&header)?;
        for (time, row) in self.time.iter().zip(self.values.rows()) {
            let mut record = vec![time.format(CSV_DATETIME_FORMAT).to_string()];
            record.extend(row.iter().map(|value| {
                if value.is_nan() {
                    String::new()
                } else {
                    value.to_string()
                }
            }));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

pub(crate) fn parse_datetime(label: &str) -> Option<NaiveDateTime> {
    let label = label.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(label, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(label, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(label)
                .ok()
                .map(|datetime| datetime.naive_utc())
        })
}

fn parse_dates(labels: &[String]) -> Option<Vec<NaiveDateTime>> {
    if labels.is_empty() {
        return None;
    }
    labels.iter().map(|label| parse_datetime(label)).collect()
}

/// Ids are the integer after the last `_` of each label, e.g. `station_12`.
fn parse_ids(labels: &[String]) -> Option<Vec<i64>> {
    let ids: Vec<i64> = labels
        .iter()
        .map(|label| label.rsplit('_').next().and_then(|id| id.trim().parse().ok()))
        .collect::<Option<_>>()?;
    ids.iter().all_unique().then_some(ids)
}

fn parse_value(cell: &str, path: &Path) -> Result<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    cell.parse().map_err(|_| HydrioError::Unparsable {
        path: path.to_path_buf(),
        value: cell.to_string(),
    })
}

/// Reads a csv with time either in rows or in columns.
pub fn open_timeseries_from_table<P: AsRef<Path>>(
    path: P,
    options: &TimeseriesOptions,
) -> Result<TimeSeries> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(HydrioError::FileNotFound(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let col_labels: Vec<String> = reader.headers()?.iter().skip(1).map(String::from).collect();
    let mut row_labels = Vec::new();
    let mut cells = Vec::new();
    for record in reader.records() {
        let record = record?;
        row_labels.push(record.get(0).unwrap_or_default().to_string());
        for col in 0..col_labels.len() {
            cells.push(parse_value(record.get(col + 1).unwrap_or_default(), path)?);
        }
    }
    let values = Array2::from_shape_vec((row_labels.len(), col_labels.len()), cells)?;

    let (time, id_labels, values) = if let Some(time) = parse_dates(&row_labels) {
        (time, col_labels, values)
    } else if let Some(time) = parse_dates(&col_labels) {
        (time, row_labels, values.reversed_axes().as_standard_layout().to_owned())
    } else {
        return Err(HydrioError::NoTimeIndex(path.to_path_buf()));
    };
    let ids = parse_ids(&id_labels).ok_or_else(|| HydrioError::NoNumericIndex(path.to_path_buf()))?;
    let name = options.name.clone().unwrap_or_else(|| {
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string()
    });
    let timeseries = TimeSeries::new(name, options.index_dim.clone(), time, ids, values)?;
    info!(
        "opened timeseries {} with {} step(s) for {} id(s) from {}",
        timeseries.name(),
        timeseries.time().len(),
        timeseries.ids().len(),
        path.display()
    );
    Ok(timeseries)
}
