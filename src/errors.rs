use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, HydrioError>;

/// Coarse classification of [HydrioError]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An input file or pattern resolved to nothing.
    NotFound,
    /// Arguments or file contents do not satisfy a reader/writer contract.
    Validation,
    /// Unknown driver, extension or unparsable file content.
    Format,
    /// Grids that should be combined do not line up.
    Merge,
    /// Failure inside one of the underlying libraries.
    Backend,
}

#[derive(thiserror::Error, Debug)]
pub enum HydrioError {
    #[error(transparent)]
    ProjError(#[from] proj::ProjError),
    #[error(transparent)]
    ProjCreateError(#[from] proj::ProjCreateError),
    #[error(transparent)]
    GdalError(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
    #[error(transparent)]
    CsvError(#[from] csv::Error),
    #[error(transparent)]
    ExcelError(#[from] calamine::Error),
    #[error(transparent)]
    GlobError(#[from] glob::PatternError),
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("No such file: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("GeoDataset point location file not found: {}", .0.display())]
    LocationFileNotFound(PathBuf),
    #[error("GeoDataset data file not found: {}", .0.display())]
    DataFileNotFound(PathBuf),
    #[error("no files to open: {0}")]
    NoFilesToOpen(String),

    #[error("Driver {0} unknown")]
    UnknownDriver(String),
    #[error("Extension unknown for driver: {0}")]
    UnknownExtension(String),
    #[error("Could not parse {value:?} in {}", path.display())]
    Unparsable { path: PathBuf, value: String },

    #[error("geometry type(s) {0:?} unknown")]
    UnknownGeometryType(Vec<String>),
    #[error("{} contains other geometries than {expected:?}", path.display())]
    GeometryTypeMismatch { path: PathBuf, expected: Vec<String> },
    #[error("The geometry table has no CRS. Set one using the crs option.")]
    MissingCrs,
    #[error("Unknown geometry mask type {0}")]
    UnknownMaskType(String),
    #[error("{axis} dimension \"{name}\" not found in columns: {columns:?}")]
    MissingCoordinateColumn {
        axis: char,
        name: String,
        columns: Vec<String>,
    },
    #[error("x and y dimensions both point to column \"{0}\"")]
    SharedCoordinateColumn(String),
    #[error("Table columns must have {expected} rows, {name} has {found}")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Only Point geometries can be written as coordinates, row {0} is not a Point")]
    NotAPoint(usize),

    #[error("No time index found in file: {}", .0.display())]
    NoTimeIndex(PathBuf),
    #[error("No numeric index found in file: {}", .0.display())]
    NoNumericIndex(PathBuf),
    #[error("Data variable {name} has ids {missing:?} without a matching geometry")]
    IndexNotSubset { name: String, missing: Vec<i64> },

    #[error("Band count {count} given, but it will be set based on the array shape ({bands})")]
    BandCount { count: usize, bands: usize },
    #[error("Band index {index} out of range for {count} band(s)")]
    BandIndex { index: usize, count: usize },
    #[error("Nodata value required to write a {0} PCRaster map")]
    MissingNodata(String),
    #[error("Unknown PCRaster value scale {0}")]
    UnknownValueScale(String),
    #[error("Concatenation needs single band rasters, {} has {bands}", path.display())]
    MultiBandConcat { path: PathBuf, bands: usize },

    #[error("Geotransform and/or shape do not match: {0}")]
    GridMismatch(String),
}

impl HydrioError {
    pub fn kind(&self) -> ErrorKind {
        use HydrioError::*;
        match self {
            FileNotFound(_) | LocationFileNotFound(_) | DataFileNotFound(_) | NoFilesToOpen(_) => {
                ErrorKind::NotFound
            }
            IoError(err) if err.kind() == std::io::ErrorKind::NotFound => ErrorKind::NotFound,
            UnknownDriver(_) | UnknownExtension(_) | Unparsable { .. } | ExcelError(_)
            | CsvError(_) => ErrorKind::Format,
            UnknownGeometryType(_)
            | GeometryTypeMismatch { .. }
            | MissingCrs
            | UnknownMaskType(_)
            | MissingCoordinateColumn { .. }
            | SharedCoordinateColumn(_)
            | ColumnLength { .. }
            | NotAPoint(_)
            | NoTimeIndex(_)
            | NoNumericIndex(_)
            | IndexNotSubset { .. }
            | BandCount { .. }
            | BandIndex { .. }
            | MissingNodata(_)
            | UnknownValueScale(_)
            | MultiBandConcat { .. } => ErrorKind::Validation,
            GridMismatch(_) => ErrorKind::Merge,
            ProjError(_) | ProjCreateError(_) | GdalError(_) | NdarrayError(_) | GlobError(_)
            | IoError(_) => ErrorKind::Backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = HydrioError::NoFilesToOpen("test*.tiffff".into());
        assert_eq!(err.to_string(), "no files to open: test*.tiffff");
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = HydrioError::MissingCoordinateColumn {
            axis: 'x',
            name: "x".into(),
            columns: vec!["country".into()],
        };
        assert_eq!(
            err.to_string(),
            "x dimension \"x\" not found in columns: [\"country\"]"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = HydrioError::GridMismatch("test1.tif".into());
        assert!(err.to_string().starts_with("Geotransform and/or shape do not match"));
        assert_eq!(err.kind(), ErrorKind::Merge);
    }

    #[test]
    fn io_not_found_is_not_found() {
        let err = HydrioError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
