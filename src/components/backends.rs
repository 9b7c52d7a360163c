use std::path::Path;

use crate::{
    components::{
        drivers::RasterDriver,
        raster::{
            data::{dispatch, with_dtype, DType, DataType, RasterData},
            OpenRasterOptions, RasterArray, RasterWriteOptions,
        },
        transforms::GeoTransform,
        Metadata,
    },
    crs_geo::Crs,
    errors::{HydrioError, Result},
};

/// Implementations for gdal
pub mod gdal_backend {
    use super::*;
    use gdal::{
        cpl::CslStringList,
        raster::{Buffer, RasterBand},
        Dataset as GdalDataset, Driver, DriverManager, Metadata as GdalMetadata,
        MetadataEntry as GdalMetadataEntry,
    };
    use log::{debug, warn};
    use ndarray::{s, Array2, Array3, ArrayView2};

    pub(crate) fn filter_metadata_gdal(metadata: &impl GdalMetadata) -> Metadata {
        GdalMetadata::metadata(metadata)
            .filter_map(|GdalMetadataEntry { domain, key, value }| {
                if domain.eq("") {
                    Some((key, value))
                } else {
                    None
                }
            })
            .collect()
    }

    fn is_virtual(path: &Path) -> bool {
        path.to_str().is_some_and(|path| path.starts_with("/vsi"))
    }

    pub(crate) fn open_dataset(path: &Path) -> Result<GdalDataset> {
        if !is_virtual(path) && !path.exists() {
            return Err(HydrioError::FileNotFound(path.to_path_buf()));
        }
        Ok(GdalDataset::open(path)?)
    }

    /// Transform and crs of a dataset, GDAL's default grid when it has no transform.
    pub(crate) fn grid_of(dataset: &GdalDataset) -> (GeoTransform, Option<Crs>) {
        let transform = dataset
            .geo_transform()
            .map(GeoTransform::from_gdal)
            .unwrap_or_else(|_| GeoTransform::from_gdal([0., 1., 0., 0., 0., 1.]));
        (transform, Crs::from_wkt(&dataset.projection()))
    }

    fn read_bands<T: DataType>(dataset: &GdalDataset, band_indexes: &[usize]) -> Result<Array3<T>> {
        let (cols, rows) = dataset.raster_size();
        let mut array = Array3::from_elem((band_indexes.len(), rows, cols), T::from_f64(0.));
        for (layer, band_index) in band_indexes.iter().enumerate() {
            let buffer = dataset.rasterband(band_index + 1)?.read_as::<T>(
                (0, 0),
                (cols, rows),
                (cols, rows),
                None,
            )?;
            array
                .slice_mut(s![layer, .., ..])
                .assign(&Array2::from_shape_vec((rows, cols), buffer.data().to_vec())?);
        }
        Ok(array)
    }

    pub fn read_raster(path: &Path, options: &OpenRasterOptions) -> Result<RasterArray> {
        let dataset = open_dataset(path)?;
        let band_indexes = options.bands.indexes_from(dataset.raster_count())?;
        let first = *band_indexes.first().ok_or(HydrioError::BandIndex {
            index: 0,
            count: dataset.raster_count(),
        })?;
        let band = dataset.rasterband(first + 1)?;
        let dtype = DType::from_gdal(band.band_type());
        let nodata = band.no_data_value().or(options.nodata);
        let data = with_dtype!(dtype, T => T::wrap(read_bands::<T>(&dataset, &band_indexes)?));
        let (transform, crs) = grid_of(&dataset);
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(String::from);
        let raster = RasterArray::init(
            name,
            data,
            transform,
            crs,
            nodata,
            filter_metadata_gdal(&dataset),
        );
        debug!("read {raster:?} from {}", path.display());
        Ok(raster)
    }

    fn supports_create(driver: &Driver) -> bool {
        driver.metadata_item("DCAP_CREATE", "").is_some()
    }

    fn creation_options(driver: &RasterDriver, options: &RasterWriteOptions) -> Result<CslStringList> {
        let mut list = CslStringList::new();
        if *driver == RasterDriver::GTiff {
            if options.tiled {
                list.set_name_value("TILED", "YES")?;
            }
            if let Some(compress) = &options.compress {
                list.set_name_value("COMPRESS", compress)?;
            }
        }
        for (name, value) in &options.creation_options {
            list.set_name_value(name, value)?;
        }
        Ok(list)
    }

    fn write_window<T: DataType>(
        band: &mut RasterBand,
        window: ArrayView2<T>,
        offset: (usize, usize),
    ) -> Result<()> {
        let (rows, cols) = window.dim();
        let mut buffer = Buffer::new((cols, rows), window.iter().copied().collect());
        band.write(
            (offset.0 as isize, offset.1 as isize),
            (cols, rows),
            &mut buffer,
        )?;
        Ok(())
    }

    fn write_blocks<T: DataType>(band: &mut RasterBand, array: ArrayView2<T>) -> Result<()> {
        let (rows, cols) = array.dim();
        let (block_cols, block_rows) = band.block_size();
        for row in (0..rows).step_by(block_rows.max(1)) {
            for col in (0..cols).step_by(block_cols.max(1)) {
                let window = array.slice(s![
                    row..(row + block_rows).min(rows),
                    col..(col + block_cols).min(cols)
                ]);
                write_window(band, window, (col, row))?;
            }
        }
        Ok(())
    }

    fn fill_dataset<T: DataType>(
        dataset: &mut GdalDataset,
        array: &Array3<T>,
        raster: &RasterArray,
        windowed: bool,
    ) -> Result<()> {
        dataset.set_geo_transform(&raster.transform().to_gdal())?;
        if let Some(crs) = raster.crs() {
            dataset.set_spatial_ref(&crs.to_spatial_ref()?)?;
        }
        for (key, value) in raster.tags() {
            dataset.set_metadata_item(key, value, "")?;
        }
        for (layer, values) in array.outer_iter().enumerate() {
            let mut band = dataset.rasterband(layer + 1)?;
            if let Some(nodata) = raster.nodata() {
                band.set_no_data_value(Some(nodata))?;
            }
            if windowed {
                write_blocks(&mut band, values)?;
            } else {
                write_window(&mut band, values, (0, 0))?;
            }
        }
        Ok(())
    }

    fn write_array<T: DataType>(
        array: &Array3<T>,
        raster: &RasterArray,
        path: &Path,
        driver: &Driver,
        creation_options: &CslStringList,
        windowed: bool,
    ) -> Result<()> {
        let (bands, rows, cols) = array.dim();
        if supports_create(driver) {
            let mut dataset = driver.create_with_band_type_with_options::<T, _>(
                path,
                cols,
                rows,
                bands,
                creation_options,
            )?;
            fill_dataset(&mut dataset, array, raster, windowed)?;
        } else {
            let memory = DriverManager::get_driver_by_name("MEM")?;
            let mut dataset = memory.create_with_band_type::<T, _>("", cols, rows, bands)?;
            fill_dataset(&mut dataset, array, raster, windowed)?;
            let mut copy = dataset.create_copy(driver, path, creation_options)?;
            if let Some(crs) = raster.crs() {
                // formats without crs support keep it in an auxiliary file
                if let Err(err) = copy.set_spatial_ref(&crs.to_spatial_ref()?) {
                    warn!("crs not stored in {}: {err}", path.display());
                }
            }
        }
        Ok(())
    }

    pub fn write_raster(
        raster: &RasterArray,
        path: &Path,
        driver: &RasterDriver,
        options: &RasterWriteOptions,
    ) -> Result<()> {
        let gdal_driver = DriverManager::get_driver_by_name(driver.gdal_name())?;
        let creation_options = creation_options(driver, options)?;
        dispatch!(raster.data(), array => write_array(
            array,
            raster,
            path,
            &gdal_driver,
            &creation_options,
            options.windowed,
        ))
    }
}
