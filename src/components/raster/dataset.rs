use log::{info, warn};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::{
    components::{
        drivers::RasterDriver,
        pcraster::ValueScale,
        raster::{data::DType, RasterArray, RasterWriteOptions},
        Metadata,
    },
    errors::{HydrioError, Result},
};

/// Options of [RasterDataset::to_mapstack].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapstackOptions {
    pub driver: String,
    pub prefix: String,
    pub postfix: String,
    /// Apply the dataset mask before writing.
    pub mask: bool,
    pub dtype: Option<DType>,
    pub nodata: Option<f64>,
    pub tags: Metadata,
    /// PCRaster value scale per variable, scalar when missing.
    pub pcr_vs_map: BTreeMap<String, ValueScale>,
}

impl Default for MapstackOptions {
    fn default() -> Self {
        Self {
            driver: "GTiff".into(),
            prefix: String::new(),
            postfix: String::new(),
            mask: false,
            dtype: None,
            nodata: None,
            tags: Metadata::new(),
            pcr_vs_map: BTreeMap::new(),
        }
    }
}

/// Named [RasterArray]s on one grid.
#[derive(Debug, Clone, Default)]
pub struct RasterDataset {
    vars: BTreeMap<String, RasterArray>,
    mask: Option<Array2<bool>>,
}

pub(crate) fn check_grid(reference: &RasterArray, other: &RasterArray, source: &str) -> Result<()> {
    if reference.identical_grid(other) {
        Ok(())
    } else {
        Err(HydrioError::GridMismatch(source.to_string()))
    }
}

impl RasterDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables are named after the arrays, `var{i}` when unnamed.
    pub fn from_arrays(arrays: impl IntoIterator<Item = RasterArray>) -> Result<Self> {
        let mut dataset = Self::new();
        for (i, array) in arrays.into_iter().enumerate() {
            let name = array.name().map_or_else(|| format!("var{i}"), String::from);
            dataset.insert(name, array)?;
        }
        Ok(dataset)
    }

    pub fn insert(&mut self, name: impl Into<String>, mut array: RasterArray) -> Result<()> {
        let name = name.into();
        if let Some(reference) = self.vars.values().next() {
            check_grid(reference, &array, &name)?;
        }
        if let Some(mask) = &self.mask {
            check_mask(mask, &array)?;
        }
        if self.vars.contains_key(&name) {
            warn!("replacing variable {name}");
        }
        array.set_name(name.clone());
        self.vars.insert(name, array);
        Ok(())
    }

    pub fn with_mask(mut self, mask: Array2<bool>) -> Result<Self> {
        if let Some(reference) = self.vars.values().next() {
            check_mask(&mask, reference)?;
        }
        self.mask = Some(mask);
        Ok(self)
    }

    pub fn mask(&self) -> Option<&Array2<bool>> {
        self.mask.as_ref()
    }

    pub fn vars(&self) -> Vec<&str> {
        self.vars.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&RasterArray> {
        self.vars.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<RasterArray> {
        self.vars.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RasterArray)> {
        self.vars.iter().map(|(name, array)| (name.as_str(), array))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Target file of variable `name`; a `/` in the name maps to subfolders.
    fn mapstack_path(root: &Path, name: &str, extension: &str, options: &MapstackOptions) -> PathBuf {
        let (folder, stem) = match name.rsplit_once('/') {
            Some((folder, stem)) => (root.join(folder), stem),
            None => (root.to_path_buf(), name),
        };
        folder.join(format!(
            "{}{stem}{}.{extension}",
            options.prefix, options.postfix
        ))
    }

    /// Writes every variable to its own file under `root`.
    pub fn to_mapstack<P: AsRef<Path>>(&self, root: P, options: &MapstackOptions) -> Result<()> {
        let root = root.as_ref();
        let driver = RasterDriver::from_name(&options.driver);
        let extension = driver.extension()?;
        for (name, array) in &self.vars {
            let path = Self::mapstack_path(root, name, extension, options);
            if let Some(folder) = path.parent() {
                fs::create_dir_all(folder)?;
            }
            let mut array = array.clone();
            if let (true, Some(mask)) = (options.mask, &self.mask) {
                array.apply_mask(mask);
            }
            let pcr_vs = match driver {
                RasterDriver::PCRaster => Some(
                    options
                        .pcr_vs_map
                        .get(name)
                        .copied()
                        .unwrap_or(ValueScale::Scalar),
                ),
                _ => None,
            };
            let write_options = RasterWriteOptions {
                driver: Some(driver.gdal_name().to_string()),
                dtype: options.dtype,
                nodata: options.nodata,
                tags: options.tags.clone(),
                pcr_vs,
                ..Default::default()
            };
            array.to_raster(&path, &write_options)?;
        }
        info!("wrote {} variable(s) to {}", self.vars.len(), root.display());
        Ok(())
    }
}

fn check_mask(mask: &Array2<bool>, array: &RasterArray) -> Result<()> {
    if mask.dim() == array.shape() {
        Ok(())
    } else {
        Err(HydrioError::GridMismatch(format!(
            "mask of shape {:?} on grid of shape {:?}",
            mask.dim(),
            array.shape()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::transforms::GeoTransform;
    use ndarray::array;

    fn transform() -> GeoTransform {
        GeoTransform::from([0.5, 0.0, 3.0, 0.0, -0.5, -9.0])
    }

    #[test]
    fn insert_checks_grid() {
        let mut dataset = RasterDataset::new();
        dataset
            .insert("test", RasterArray::new(array![[1u8, 2]], transform()))
            .unwrap();
        let shifted = GeoTransform::from([0.5, 0.0, 4.0, 0.0, -0.5, -9.0]);
        let err = dataset
            .insert("other", RasterArray::new(array![[1u8, 2]], shifted))
            .unwrap_err();
        assert!(matches!(err, HydrioError::GridMismatch(_)));
        assert_eq!(dataset.vars(), vec!["test"]);
        assert_eq!(dataset.get("test").unwrap().name(), Some("test"));
    }

    #[test]
    fn mask_shape() {
        let dataset = RasterDataset::from_arrays([
            RasterArray::new(array![[1u8, 2]], transform()).with_name("a"),
            RasterArray::new(array![[1f32, 2.]], transform()),
        ])
        .unwrap();
        assert_eq!(dataset.vars(), vec!["a", "var1"]);
        assert!(dataset.clone().with_mask(array![[true, false]]).is_ok());
        assert!(dataset.with_mask(array![[true], [false]]).is_err());
    }

    #[test]
    fn mapstack_paths() {
        let options = MapstackOptions {
            prefix: "pre_".into(),
            postfix: "_post".into(),
            ..Default::default()
        };
        let path = RasterDataset::mapstack_path(Path::new("root"), "test/test", "map", &options);
        assert_eq!(path, Path::new("root/test/pre_test_post.map"));
    }

    #[test]
    fn unknown_driver_extension() {
        let options = MapstackOptions {
            driver: "FANTASY".into(),
            ..Default::default()
        };
        let err = RasterDataset::new().to_mapstack("root", &options).unwrap_err();
        assert!(matches!(err, HydrioError::UnknownExtension(_)));
    }
}
