use crate::error::{CarveError, Result};
use std::ops::{Index, IndexMut};

/// Defines the basic map: An addressable two-dimensional field
/// containing an object that represents one of several possible
/// objects during processing: an f64 for the energy map, a bool for
/// the marked-pixel map, a u8 for a single channel of the source
/// image, or an energy + parent address for the seam digraph.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoDimensionalMap<P: Default + Copy> {
    width: usize,
    height: usize,
    data: Vec<P>,
}

impl<P: Default + Copy> TwoDimensionalMap<P> {
    /// Define a new map.  The content type must implement the Default
    /// trait, which is what every cell starts out as.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, P::default())
    }

    /// A new map with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: P) -> Self {
        TwoDimensionalMap {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Wrap an existing row-major vector.  The length must agree with
    /// the dimensions.
    pub fn from_vec(width: usize, height: usize, data: Vec<P>) -> Result<Self> {
        if data.len() != width * height {
            return Err(CarveError::InvalidDimensions {
                width,
                height,
                channels: 1,
            });
        }
        Ok(TwoDimensionalMap {
            width,
            height,
            data,
        })
    }

    // Absolutely, the number one name of this game is keep the index
    // math in a singular location and never, ever mess with it.  This
    // particular variant is the same one used in image.rs.
    #[inline]
    fn get_index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// (width, height), as always.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// A single row as a contiguous slice.
    pub fn row(&self, y: usize) -> &[P] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [P] {
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    pub fn as_slice(&self) -> &[P] {
        &self.data
    }

    pub fn fill(&mut self, value: P) {
        self.data.iter_mut().for_each(|cell| *cell = value);
    }

    /// Keep the left `width` columns of every row, discarding the rest.
    pub(crate) fn truncate_columns(&mut self, width: usize) {
        if width >= self.width {
            return;
        }
        let old_width = self.width;
        for y in 0..self.height {
            let (src, dst) = (y * old_width, y * width);
            self.data.copy_within(src..src + width, dst);
        }
        self.data.truncate(width * self.height);
        self.width = width;
    }
}

impl<P: Default + Copy> Index<(usize, usize)> for TwoDimensionalMap<P> {
    type Output = P;

    /// A convenience addressing mode for getting values.
    fn index(&self, (x, y): (usize, usize)) -> &P {
        let index = self.get_index(x, y);
        &self.data[index]
    }
}

impl<P: Default + Copy> IndexMut<(usize, usize)> for TwoDimensionalMap<P> {
    /// A convenience addressing mode for setting values.
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut P {
        let index = self.get_index(x, y);
        &mut self.data[index]
    }
}

/// Per-pixel energy.  `f64::INFINITY` marks a cell as excluded.
pub type EnergyMap = TwoDimensionalMap<f64>;

/// Pixels no seam may pass through for the rest of a carve.
pub type MarkMap = TwoDimensionalMap<bool>;

/// One channel of an image.
pub type Plane = TwoDimensionalMap<u8>;

/// A cell of the seam digraph: the cheapest cumulative energy of any
/// path from the top row to here, and the column in the row above that
/// path came through.  `parent` is `None` for the top row and for
/// unreachable cells.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct EnergyAndBackPointer<P: Default + Copy> {
    pub energy: P,
    pub parent: Option<usize>,
}
