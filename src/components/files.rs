use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    components::raster::{
        data::RasterData,
        dataset::{check_grid, RasterDataset},
        open_raster, OpenRasterOptions, RasterArray,
    },
    errors::{HydrioError, Result},
};

/// Files to combine, a glob pattern or explicit paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterSources {
    Pattern(String),
    Paths(Vec<PathBuf>),
}

impl From<&str> for RasterSources {
    fn from(value: &str) -> Self {
        RasterSources::Pattern(value.to_string())
    }
}

impl From<String> for RasterSources {
    fn from(value: String) -> Self {
        RasterSources::Pattern(value)
    }
}

impl From<Vec<PathBuf>> for RasterSources {
    fn from(value: Vec<PathBuf>) -> Self {
        RasterSources::Paths(value)
    }
}

impl From<&[PathBuf]> for RasterSources {
    fn from(value: &[PathBuf]) -> Self {
        RasterSources::Paths(value.to_vec())
    }
}

impl RasterSources {
    /// Sorted matches of a pattern, or the paths as given.
    fn resolve(&self) -> Result<Vec<PathBuf>> {
        match self {
            RasterSources::Pattern(pattern) => {
                let mut paths = Vec::new();
                for entry in glob::glob(pattern)? {
                    match entry {
                        Ok(path) => paths.push(path),
                        Err(err) => warn!("skipping unreadable match: {err}"),
                    }
                }
                paths.sort();
                Ok(paths)
            }
            RasterSources::Paths(paths) => Ok(paths.clone()),
        }
    }

    /// Fixed file name part before the first wildcard of a pattern.
    fn pattern_prefix(&self) -> Option<String> {
        match self {
            RasterSources::Pattern(pattern) => Path::new(pattern)
                .file_name()
                .and_then(|name| name.to_str())
                .filter(|name| name.contains('*'))
                .and_then(|name| name.split('*').next())
                .filter(|prefix| !prefix.is_empty())
                .map(String::from),
            RasterSources::Paths(_) => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            RasterSources::Pattern(pattern) => pattern.clone(),
            RasterSources::Paths(paths) => paths.iter().map(|path| path.display()).join(", "),
        }
    }
}

/// Options of [open_mfraster].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MfRasterOptions {
    /// Stack all files into one variable along `concat_dim`.
    pub concat: bool,
    pub concat_dim: String,
    /// Removed from file stems when naming variables or finding indexes.
    /// Defaults to the text before the first `*` of a pattern.
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub mask_nodata: bool,
    pub nodata: Option<f64>,
}

impl Default for MfRasterOptions {
    fn default() -> Self {
        Self {
            concat: false,
            concat_dim: "dim0".into(),
            prefix: None,
            suffix: None,
            mask_nodata: false,
            nodata: None,
        }
    }
}

fn parse_digits(s: &str) -> Option<i64> {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

fn split_file_name(path: &Path) -> (String, Option<String>) {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let mut parts = file_name.split('.');
    let stem = parts.next().unwrap_or_default().to_string();
    (stem, parts.next().map(String::from))
}

/// Position of a file along the concat dimension: the number after the last `_`,
/// a numeric extension, the stem without prefix, or the file order.
fn concat_index(path: &Path, position: usize, prefix: Option<&str>) -> i64 {
    let (stem, extension) = split_file_name(path);
    stem.rsplit_once('_')
        .and_then(|(_, last)| parse_digits(last))
        .or_else(|| extension.as_deref().and_then(parse_digits))
        .or_else(|| {
            prefix
                .and_then(|prefix| stem.strip_prefix(prefix))
                .and_then(parse_digits)
        })
        .unwrap_or(position as i64)
}

fn variable_name(path: &Path, prefix: Option<&str>, suffix: Option<&str>) -> String {
    let (stem, _) = split_file_name(path);
    let stem = prefix
        .and_then(|prefix| stem.strip_prefix(prefix))
        .unwrap_or(&stem);
    suffix
        .and_then(|suffix| stem.strip_suffix(suffix))
        .unwrap_or(stem)
        .to_string()
}

fn concat_name(path: &Path, suffix: Option<&str>) -> String {
    let (stem, _) = split_file_name(path);
    let stem = suffix
        .and_then(|suffix| stem.strip_suffix(suffix))
        .unwrap_or(&stem);
    match stem.rsplit_once('_') {
        Some((head, last)) if parse_digits(last).is_some() => head.to_string(),
        _ => stem.to_string(),
    }
}

/// Opens several rasters on the same grid as one [RasterDataset].
pub fn open_mfraster(
    sources: impl Into<RasterSources>,
    options: &MfRasterOptions,
) -> Result<RasterDataset> {
    let sources = sources.into();
    let paths = sources.resolve()?;
    if paths.is_empty() {
        return Err(HydrioError::NoFilesToOpen(sources.describe()));
    }
    let open_options = OpenRasterOptions {
        mask_nodata: options.mask_nodata,
        nodata: options.nodata,
        ..Default::default()
    };
    let pattern_prefix = sources.pattern_prefix();
    let prefix = options.prefix.as_deref().or(pattern_prefix.as_deref());
    let suffix = options.suffix.as_deref();

    let mut layers: Vec<(i64, RasterArray)> = Vec::with_capacity(paths.len());
    for (position, path) in paths.iter().enumerate() {
        let raster = open_raster(path, &open_options)?;
        if let Some((_, reference)) = layers.first() {
            check_grid(reference, &raster, &path.display().to_string())?;
        }
        if options.concat {
            if raster.band_count() != 1 {
                return Err(HydrioError::MultiBandConcat {
                    path: path.clone(),
                    bands: raster.band_count(),
                });
            }
            layers.push((concat_index(path, position, prefix), raster));
        } else {
            let name = variable_name(path, prefix, suffix);
            layers.push((position as i64, raster.with_name(name)));
        }
    }

    let dataset = if options.concat {
        layers.sort_by_key(|(index, _)| *index);
        let name = concat_name(&paths[0], suffix);
        let coords = layers.iter().map(|(index, _)| *index).collect();
        let parts: Vec<RasterData> = layers.iter().map(|(_, raster)| raster.data().clone()).collect();
        let (_, reference) = &layers[0];
        let stacked = RasterArray::init(
            Some(name),
            RasterData::concatenate(&parts)?,
            *reference.transform(),
            reference.crs().cloned(),
            reference.nodata(),
            reference.tags().clone(),
        )
        .with_band_dim(options.concat_dim.clone(), coords)?;
        RasterDataset::from_arrays([stacked])?
    } else {
        RasterDataset::from_arrays(layers.into_iter().map(|(_, raster)| raster))?
    };
    info!(
        "opened {} file(s) from {} as {:?}",
        paths.len(),
        sources.describe(),
        dataset.vars()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("test_3.tif", 7, None, 3)]
    #[case("a_b_3.tif", 7, None, 3)]
    #[case("test.002", 7, None, 2)]
    #[case("test12.tif", 7, Some("test"), 12)]
    #[case("test.tif", 7, None, 7)]
    fn index_along_concat_dim(
        #[case] path: &str,
        #[case] position: usize,
        #[case] prefix: Option<&str>,
        #[case] expected: i64,
    ) {
        assert_eq!(concat_index(Path::new(path), position, prefix), expected);
    }

    #[test]
    fn names() {
        let path = Path::new("dir/pre_elevation_post.tif");
        assert_eq!(variable_name(path, Some("pre_"), Some("_post")), "elevation");
        assert_eq!(variable_name(path, None, None), "pre_elevation_post");
        assert_eq!(concat_name(Path::new("test_1.tif"), None), "test");
        assert_eq!(concat_name(Path::new("flow_dir_12.tif"), None), "flow_dir");
        assert_eq!(concat_name(Path::new("precip00.001"), None), "precip00");
    }

    #[rstest]
    #[case(RasterSources::from("data/_test_*.tif"), Some("_test_"))]
    #[case(RasterSources::from("data/*.tif"), None)]
    #[case(RasterSources::from("data/elevation.tif"), None)]
    #[case(RasterSources::from(vec![PathBuf::from("data/_test_a.tif")]), None)]
    fn prefix_from_pattern(#[case] sources: RasterSources, #[case] expected: Option<&str>) {
        assert_eq!(sources.pattern_prefix().as_deref(), expected);
    }

    #[test]
    fn no_files() {
        let err = open_mfraster("missing_pattern*.tiffff", &MfRasterOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "no files to open: missing_pattern*.tiffff");
    }
}
