use geo::{AffineTransform, Coord, Rect};
use shrinkwraprs::Shrinkwrap;

/// Pixel (col, row) to geospace transform of a raster grid.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(AffineTransform);

impl GeoTransform {
    pub fn new(a: f64, b: f64, xoff: f64, d: f64, e: f64, yoff: f64) -> Self {
        Self(AffineTransform::new(a, b, xoff, d, e, yoff))
    }

    /// From the GDAL ordering `[xoff, a, b, yoff, d, e]`.
    pub fn from_gdal(gdal_transform: [f64; 6]) -> Self {
        Self::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        )
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.xoff(),
            self.a(),
            self.b(),
            self.yoff(),
            self.d(),
            self.e(),
        ]
    }

    /// Coefficients in affine order `[a, b, xoff, d, e, yoff]`.
    pub fn coefficients(&self) -> [f64; 6] {
        [
            self.a(),
            self.b(),
            self.xoff(),
            self.d(),
            self.e(),
            self.yoff(),
        ]
    }

    /// Pixel size (x, y); y is negative for north-up grids.
    pub fn resolution(&self) -> (f64, f64) {
        (self.a(), self.e())
    }

    pub fn origin(&self) -> Coord {
        Coord {
            x: self.xoff(),
            y: self.yoff(),
        }
    }

    /// Outer bounds of a grid with `shape` (rows, cols).
    pub fn bounds(&self, shape: (usize, usize)) -> Rect {
        let (rows, cols) = shape;
        let corners = [(0., 0.), (cols as f64, 0.), (0., rows as f64), (cols as f64, rows as f64)]
            .map(|(x, y)| self.0.apply(Coord { x, y }));
        let (mut min, mut max) = (corners[0], corners[0]);
        for corner in &corners[1..] {
            min = Coord {
                x: min.x.min(corner.x),
                y: min.y.min(corner.y),
            };
            max = Coord {
                x: max.x.max(corner.x),
                y: max.y.max(corner.y),
            };
        }
        Rect::new(min, max)
    }

    pub fn almost_eq(&self, other: &GeoTransform, atol: f64) -> bool {
        self.coefficients()
            .iter()
            .zip(other.coefficients())
            .all(|(lhs, rhs)| (lhs - rhs).abs() <= atol)
    }
}

impl From<[f64; 6]> for GeoTransform {
    fn from(value: [f64; 6]) -> Self {
        let [a, b, xoff, d, e, yoff] = value;
        Self::new(a, b, xoff, d, e, yoff)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(1., 0., 0., 0., -1., 0.)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gdal_order() {
        let transform = GeoTransform::from([0.5, 0.0, 3.0, 0.0, -0.5, -9.0]);
        assert_eq!(transform.to_gdal(), [3.0, 0.5, 0.0, -9.0, 0.0, -0.5]);
        assert_eq!(GeoTransform::from_gdal(transform.to_gdal()), transform);
        assert_eq!(transform.resolution(), (0.5, -0.5));
    }

    #[test]
    fn grid_bounds() {
        let transform = GeoTransform::from([0.5, 0.0, 3.0, 0.0, -0.5, -9.0]);
        let bounds = transform.bounds((4, 6));
        assert_eq!(bounds.min(), Coord { x: 3.0, y: -11.0 });
        assert_eq!(bounds.max(), Coord { x: 6.0, y: -9.0 });
    }

    #[test]
    fn tolerance() {
        let lhs = GeoTransform::from([0.5, 0.0, 3.0, 0.0, -0.5, -9.0]);
        let rhs = GeoTransform::from([0.5, 0.0, 3.0 + 1e-9, 0.0, -0.5, -9.0]);
        assert!(lhs.almost_eq(&rhs, 1e-6));
        assert!(!lhs.almost_eq(&GeoTransform::from([0.2, 0.0, 3.0, 0.0, 0.25, -11.0]), 1e-6));
    }
}
