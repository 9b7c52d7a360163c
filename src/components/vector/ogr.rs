use gdal::{
    vector::{
        Feature, FieldValue, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType, ToGdal,
    },
    Dataset, DatasetOptions, DriverManager,
};
use geo::{Geometry, GeometryCollection};
use log::debug;
use std::path::Path;

use crate::{
    components::vector::{table::point_coords, value::Value, GeoTable},
    crs_geo::Crs,
    errors::Result,
};

/// How rows are stored in an OGR layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    Geometry,
    /// Attribute only layer with `x` and `y` fields, for spreadsheets.
    Coordinates,
}

fn field_to_value(value: Option<FieldValue>) -> Value {
    match value {
        None => Value::Null,
        Some(FieldValue::IntegerValue(value)) => Value::Int(value.into()),
        Some(FieldValue::Integer64Value(value)) => Value::Int(value),
        Some(FieldValue::RealValue(value)) => Value::Float(value),
        Some(FieldValue::StringValue(value)) => Value::Text(value),
        Some(other) => Value::Text(format!("{other:?}")),
    }
}

pub(crate) fn read(path: &Path, driver: Option<&str>) -> Result<GeoTable> {
    let dataset = match driver {
        Some(name) => Dataset::open_ex(
            path,
            DatasetOptions {
                allowed_drivers: Some(&[name]),
                ..Default::default()
            },
        )?,
        None => Dataset::open(path)?,
    };
    let mut layer = dataset.layer(0)?;
    let crs = match layer.spatial_ref() {
        Some(srs) => Crs::from_spatial_ref(&srs)?,
        None => None,
    };
    let names: Vec<String> = layer.defn().fields().map(|field| field.name()).collect();
    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); names.len()];
    let mut geometry = Vec::new();
    for feature in layer.features() {
        geometry.push(match feature.geometry() {
            Some(shape) => shape.to_geo()?,
            None => Geometry::GeometryCollection(GeometryCollection(Vec::new())),
        });
        for (values, (_, value)) in columns.iter_mut().zip(feature.fields()) {
            values.push(field_to_value(value));
        }
    }
    let mut table = GeoTable::new(geometry, crs);
    for (name, values) in names.into_iter().zip(columns) {
        table = table.with_column(name, values)?;
    }
    debug!("read {} feature(s) from {}", table.len(), path.display());
    Ok(table)
}

fn field_type(values: &[Value]) -> OGRFieldType::Type {
    let mut values = values.iter().filter(|value| !value.is_null()).peekable();
    if values.peek().is_none() {
        return OGRFieldType::OFTString;
    }
    let (mut ints, mut numbers, mut bools) = (true, true, true);
    for value in values {
        ints &= matches!(value, Value::Int(_));
        numbers &= matches!(value, Value::Int(_) | Value::Float(_));
        bools &= matches!(value, Value::Bool(_));
    }
    if ints {
        OGRFieldType::OFTInteger64
    } else if numbers {
        OGRFieldType::OFTReal
    } else if bools {
        OGRFieldType::OFTInteger
    } else {
        OGRFieldType::OFTString
    }
}

fn field_value(value: &Value, field_type: OGRFieldType::Type) -> Option<FieldValue> {
    match (value, field_type) {
        (Value::Null, _) => None,
        (Value::Bool(value), OGRFieldType::OFTInteger) => {
            Some(FieldValue::IntegerValue(*value as i32))
        }
        (value, OGRFieldType::OFTInteger64) => value.as_i64().map(FieldValue::Integer64Value),
        (value, OGRFieldType::OFTReal) => value.as_f64().map(FieldValue::RealValue),
        (value, _) => Some(FieldValue::StringValue(value.to_string())),
    }
}

pub(crate) fn write(table: &GeoTable, path: &Path, driver: &str, layout: Layout) -> Result<()> {
    let mut fields: Vec<(String, Vec<Value>)> = Vec::new();
    if layout == Layout::Coordinates || table.index_name().is_some() {
        let name = table.index_name().unwrap_or("index");
        fields.push((name.to_string(), table.index().to_vec()));
    }
    fields.extend(
        table
            .columns()
            .map(|(name, values)| (name.to_string(), values.to_vec())),
    );
    if layout == Layout::Coordinates {
        let (xs, ys): (Vec<Value>, Vec<Value>) = point_coords(table)?
            .into_iter()
            .map(|(x, y)| (Value::Float(x), Value::Float(y)))
            .unzip();
        fields.push(("x".into(), xs));
        fields.push(("y".into(), ys));
    }
    let types: Vec<OGRFieldType::Type> = fields
        .iter()
        .map(|(_, values)| field_type(values))
        .collect();

    let mut dataset = DriverManager::get_driver_by_name(driver)?.create_vector_only(path)?;
    let srs = match (layout, table.crs()) {
        (Layout::Geometry, Some(crs)) => Some(crs.to_spatial_ref()?),
        _ => None,
    };
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("layer");
    let layer = dataset.create_layer(LayerOptions {
        name,
        srs: srs.as_ref(),
        ty: match layout {
            Layout::Geometry => OGRwkbGeometryType::wkbUnknown,
            Layout::Coordinates => OGRwkbGeometryType::wkbNone,
        },
        options: None,
    })?;
    let definitions: Vec<(&str, OGRFieldType::Type)> = fields
        .iter()
        .zip(&types)
        .map(|((name, _), field_type)| (name.as_str(), *field_type))
        .collect();
    layer.create_defn_fields(&definitions)?;

    let defn = layer.defn();
    for row in 0..table.len() {
        let mut feature = Feature::new(defn)?;
        for (index, ((_, values), field_type)) in fields.iter().zip(&types).enumerate() {
            if let Some(value) = field_value(&values[row], *field_type) {
                feature.set_field(index, &value)?;
            }
        }
        if layout == Layout::Geometry {
            feature.set_geometry(table.geometry()[row].to_gdal()?)?;
        }
        feature.create(&layer)?;
    }
    debug!("wrote {} feature(s) to {} with {driver}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_types() {
        assert_eq!(field_type(&[Value::Int(1), Value::Null]), OGRFieldType::OFTInteger64);
        assert_eq!(field_type(&[Value::Int(1), Value::Float(0.5)]), OGRFieldType::OFTReal);
        assert_eq!(field_type(&[Value::Bool(true)]), OGRFieldType::OFTInteger);
        assert_eq!(field_type(&[Value::Int(1), "a".into()]), OGRFieldType::OFTString);
        assert_eq!(field_type(&[Value::Null]), OGRFieldType::OFTString);
    }

    #[test]
    fn values_follow_field_type() {
        assert!(matches!(
            field_value(&Value::Float(2.), OGRFieldType::OFTInteger64),
            Some(FieldValue::Integer64Value(2))
        ));
        assert!(field_value(&Value::Null, OGRFieldType::OFTReal).is_none());
        assert!(matches!(
            field_value(&Value::Int(3), OGRFieldType::OFTString),
            Some(FieldValue::StringValue(text)) if text == "3"
        ));
    }
}
