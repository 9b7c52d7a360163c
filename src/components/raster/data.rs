use std::{fmt::Debug, str::FromStr};

use gdal::raster::{GdalDataType, GdalType};
use ndarray::{Array2, Array3, Axis};
use num::traits::AsPrimitive;
use serde::{Deserialize, Serialize};

use crate::errors::{HydrioError, Result};

/// Cell types a [RasterData] can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl DType {
    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    /// Band types without a matching variant are read as `Float64`.
    pub fn from_gdal(data_type: GdalDataType) -> Self {
        match data_type {
            GdalDataType::UInt8 => DType::UInt8,
            GdalDataType::Int16 => DType::Int16,
            GdalDataType::UInt16 => DType::UInt16,
            GdalDataType::Int32 => DType::Int32,
            GdalDataType::UInt32 => DType::UInt32,
            GdalDataType::Float32 => DType::Float32,
            _ => DType::Float64,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::UInt8 => "uint8",
            DType::Int16 => "int16",
            DType::UInt16 => "uint16",
            DType::Int32 => "int32",
            DType::UInt32 => "uint32",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }

    /// Whether every value of `other` is representable in `self`.
    fn holds(self, other: DType) -> bool {
        use DType::*;
        self == other
            || matches!(
                (self, other),
                (Float64, _)
                    | (Float32 | Int32, UInt8 | Int16 | UInt16)
                    | (UInt32, UInt8 | UInt16)
                    | (Int16 | UInt16, UInt8)
            )
    }

    /// Smallest type both sides can be cast to without losing values.
    pub fn promote(self, other: DType) -> DType {
        [self, other, DType::Int32, DType::Float32]
            .into_iter()
            .find(|candidate| candidate.holds(self) && candidate.holds(other))
            .unwrap_or(DType::Float64)
    }
}

impl FromStr for DType {
    type Err = HydrioError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "uint8" | "byte" | "u8" => DType::UInt8,
            "int16" | "i16" => DType::Int16,
            "uint16" | "u16" => DType::UInt16,
            "int32" | "i32" => DType::Int32,
            "uint32" | "u32" => DType::UInt32,
            "float32" | "f32" => DType::Float32,
            "float64" | "f64" => DType::Float64,
            _ => {
                return Err(HydrioError::Unparsable {
                    path: "dtype".into(),
                    value: s.to_string(),
                })
            }
        })
    }
}

pub trait DataType: GdalType + Copy + Debug + PartialEq + Send + Sync + 'static {
    const DTYPE: DType;
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
    fn wrap(array: Array3<Self>) -> RasterData;
    fn unwrap_ref(data: &RasterData) -> Option<&Array3<Self>>;
}

/// Raster cells `(band, row, col)` of any [DType].
#[derive(Debug, Clone, PartialEq)]
pub enum RasterData {
    UInt8(Array3<u8>),
    Int16(Array3<i16>),
    UInt16(Array3<u16>),
    Int32(Array3<i32>),
    UInt32(Array3<u32>),
    Float32(Array3<f32>),
    Float64(Array3<f64>),
}

macro_rules! impl_data_type {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl DataType for $t {
                const DTYPE: DType = DType::$variant;
                fn to_f64(self) -> f64 {
                    self.as_()
                }
                fn from_f64(value: f64) -> Self {
                    value.as_()
                }
                fn wrap(array: Array3<Self>) -> RasterData {
                    RasterData::$variant(array)
                }
                fn unwrap_ref(data: &RasterData) -> Option<&Array3<Self>> {
                    match data {
                        RasterData::$variant(array) => Some(array),
                        _ => None,
                    }
                }
            }

            impl From<Array3<$t>> for RasterData {
                fn from(value: Array3<$t>) -> Self {
                    RasterData::$variant(value)
                }
            }

            impl From<Array2<$t>> for RasterData {
                fn from(value: Array2<$t>) -> Self {
                    RasterData::$variant(value.insert_axis(Axis(0)))
                }
            }
        )*
    };
}

impl_data_type!(
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    f32 => Float32,
    f64 => Float64,
);

/// Runs `$body` with `$array` bound to the typed array inside a [RasterData].
macro_rules! dispatch {
    ($data:expr, $array:ident => $body:expr) => {
        match $data {
            RasterData::UInt8($array) => $body,
            RasterData::Int16($array) => $body,
            RasterData::UInt16($array) => $body,
            RasterData::Int32($array) => $body,
            RasterData::UInt32($array) => $body,
            RasterData::Float32($array) => $body,
            RasterData::Float64($array) => $body,
        }
    };
}

/// Runs `$body` with the type alias `$t` set to the Rust type of a [DType].
macro_rules! with_dtype {
    ($dtype:expr, $t:ident => $body:expr) => {
        match $dtype {
            DType::UInt8 => {
                type $t = u8;
                $body
            }
            DType::Int16 => {
                type $t = i16;
                $body
            }
            DType::UInt16 => {
                type $t = u16;
                $body
            }
            DType::Int32 => {
                type $t = i32;
                $body
            }
            DType::UInt32 => {
                type $t = u32;
                $body
            }
            DType::Float32 => {
                type $t = f32;
                $body
            }
            DType::Float64 => {
                type $t = f64;
                $body
            }
        }
    };
}

pub(crate) use dispatch;
pub(crate) use with_dtype;

pub(crate) fn is_nodata(value: f64, nodata: f64) -> bool {
    if nodata.is_nan() {
        value.is_nan()
    } else {
        value == nodata
    }
}

fn cast_array<S: DataType, D: DataType>(array: &Array3<S>) -> Array3<D> {
    array.mapv(|value| D::from_f64(value.to_f64()))
}

fn replace_values<T: DataType>(array: &mut Array3<T>, from: f64, to: f64) {
    let to = T::from_f64(to);
    array.mapv_inplace(|value| if is_nodata(value.to_f64(), from) { to } else { value });
}

fn select_as<T: DataType>(array: &Array3<T>, indexes: &[usize]) -> RasterData {
    T::wrap(array.select(Axis(0), indexes))
}

fn mask_as<T: DataType>(array: &mut Array3<T>, keep: &Array2<bool>, fill: f64) {
    let fill = T::from_f64(fill);
    for mut band in array.outer_iter_mut() {
        band.zip_mut_with(keep, |cell, keep| {
            if !*keep {
                *cell = fill;
            }
        });
    }
}

fn concat_as<T: DataType>(parts: &[RasterData]) -> Result<RasterData> {
    let views: Vec<_> = parts
        .iter()
        .filter_map(T::unwrap_ref)
        .map(|array| array.view())
        .collect();
    Ok(T::wrap(ndarray::concatenate(Axis(0), &views)?))
}

impl RasterData {
    pub fn zeros(dtype: DType, shape: (usize, usize, usize)) -> Self {
        with_dtype!(dtype, T => T::wrap(Array3::from_elem(shape, T::from_f64(0.))))
    }

    pub fn full(dtype: DType, shape: (usize, usize, usize), value: f64) -> Self {
        with_dtype!(dtype, T => T::wrap(Array3::from_elem(shape, T::from_f64(value))))
    }

    pub fn dtype(&self) -> DType {
        match self {
            RasterData::UInt8(_) => DType::UInt8,
            RasterData::Int16(_) => DType::Int16,
            RasterData::UInt16(_) => DType::UInt16,
            RasterData::Int32(_) => DType::Int32,
            RasterData::UInt32(_) => DType::UInt32,
            RasterData::Float32(_) => DType::Float32,
            RasterData::Float64(_) => DType::Float64,
        }
    }

    /// (bands, rows, cols)
    pub fn shape(&self) -> (usize, usize, usize) {
        dispatch!(self, array => array.dim())
    }

    pub fn band_count(&self) -> usize {
        self.shape().0
    }

    pub fn cast(&self, dtype: DType) -> RasterData {
        if dtype == self.dtype() {
            return self.clone();
        }
        dispatch!(self, array => with_dtype!(dtype, T => T::wrap(cast_array::<_, T>(array))))
    }

    pub fn to_f64(&self) -> Array3<f64> {
        dispatch!(self, array => cast_array(array))
    }

    /// Converts `nodata` cells to `NaN`. `Float32` stays `Float32`, anything else becomes `Float64`.
    pub fn mask_nodata(&self, nodata: f64) -> RasterData {
        let mut masked = match self {
            RasterData::Float32(array) => RasterData::Float32(array.clone()),
            _ => RasterData::Float64(self.to_f64()),
        };
        masked.replace(nodata, f64::NAN);
        masked
    }

    /// Replaces every cell equal to `from` (or `NaN` when `from` is `NaN`) with `to`.
    pub fn replace(&mut self, from: f64, to: f64) {
        dispatch!(self, array => replace_values(array, from, to))
    }

    pub fn count_equal(&self, value: f64) -> usize {
        dispatch!(self, array => array.iter().filter(|cell| is_nodata(cell.to_f64(), value)).count())
    }

    pub fn select_bands(&self, indexes: &[usize]) -> RasterData {
        dispatch!(self, array => select_as(array, indexes))
    }

    /// Sets cells where `keep` is false to `fill` in every band.
    pub fn apply_mask(&mut self, keep: &Array2<bool>, fill: f64) {
        dispatch!(self, array => mask_as(array, keep, fill))
    }

    /// Stacks along the band axis, promoting to a common [DType].
    pub fn concatenate(parts: &[RasterData]) -> Result<RasterData> {
        let dtype = parts
            .iter()
            .map(RasterData::dtype)
            .reduce(DType::promote)
            .unwrap_or(DType::Float64);
        let parts: Vec<RasterData> = parts.iter().map(|part| part.cast(dtype)).collect();
        with_dtype!(dtype, T => concat_as::<T>(&parts))
    }
}
