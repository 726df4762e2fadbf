// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the energy of an image
//!
//! The energy of an interior pixel is the sum, over every channel, of
//! the squared horizontal and vertical central differences:
//!
//! ```text
//!        |Δx|² = Σc (I(x+1,y) − I(x−1,y))²
//!        |Δy|² = Σc (I(x,y+1) − I(x,y−1))²
//!       e(x,y) = |Δx|² + |Δy|²
//! ```
//!
//! Pixels on the border get the margin energy instead.  With the
//! `square_root` feature the interior energy is `sqrt(e(x,y))`.
//!
//! The image is first split into channel planes.  Each row is then
//! swept twice, once over the odd columns and once over the even ones,
//! carrying the right-hand neighbour of one pixel over as the
//! left-hand neighbour of the next.  Images taller than they are wide
//! are swept by column instead.  The two sweeps share nothing, so with
//! the `threaded` feature they run on separate threads.

use crate::error::{CarveError, Result};
use crate::pixelbuffer::PixelBuffer;
use crate::twodmap::{EnergyMap, Plane};
use std::iter::repeat;
use tracing::trace;

/// The energy given to border pixels unless told otherwise.
pub const DEFAULT_MARGIN_ENERGY: f64 = 390_150.0;

/// The type signature of a replacement energy calculator.  It must
/// return a map with the same dimensions as the image.
pub type EnergyFn = dyn Fn(&PixelBuffer) -> EnergyMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl ImageDimensions {
    pub fn of(image: &PixelBuffer) -> Self {
        ImageDimensions {
            width: image.width(),
            height: image.height(),
            channels: image.channels(),
        }
    }
}

impl From<ImageDimensions> for CarveError {
    fn from(d: ImageDimensions) -> Self {
        CarveError::InvalidDimensions {
            width: d.width,
            height: d.height,
            channels: d.channels,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Parity {
    Even,
    Odd,
}

impl Parity {
    fn first(self) -> usize {
        match self {
            Parity::Even => 0,
            Parity::Odd => 1,
        }
    }

    // How many of 0..n have this parity.
    fn count(self, n: usize) -> usize {
        (n + 1 - self.first()) / 2
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Traversal {
    Rows,
    Columns,
}

#[cfg(not(feature = "square_root"))]
#[inline]
fn finish(sum: i32) -> f64 {
    f64::from(sum)
}

#[cfg(feature = "square_root")]
#[inline]
fn finish(sum: i32) -> f64 {
    f64::from(sum).sqrt()
}

// Energies of every pixel in column-parity `parity`, row by row.
fn sweep_rows(planes: &[Plane], parity: Parity, margin: f64) -> Vec<f64> {
    let (width, height) = planes[0].dimensions();
    let per_row = parity.count(width);
    let mut out = Vec::with_capacity(per_row * height);
    let mut left = [0i32; 3];

    for y in 0..height {
        if y == 0 || y == height - 1 {
            out.extend(repeat(margin).take(per_row));
            continue;
        }
        let mut x = parity.first();
        if x == 0 {
            out.push(margin);
            x = 2;
        }
        if x < width {
            for (cache, plane) in left.iter_mut().zip(planes) {
                *cache = i32::from(plane.row(y)[x - 1]);
            }
        }
        while x < width {
            if x == width - 1 {
                out.push(margin);
                break;
            }
            let (mut dx2, mut dy2) = (0, 0);
            for (cache, plane) in left.iter_mut().zip(planes) {
                let right = i32::from(plane.row(y)[x + 1]);
                let dx = right - *cache;
                let dy = i32::from(plane.row(y + 1)[x]) - i32::from(plane.row(y - 1)[x]);
                dx2 += dx * dx;
                dy2 += dy * dy;
                *cache = right;
            }
            out.push(finish(dx2 + dy2));
            x += 2;
        }
    }
    out
}

// Energies of every pixel in row-parity `parity`, column by column.
fn sweep_columns(planes: &[Plane], parity: Parity, margin: f64) -> Vec<f64> {
    let (width, height) = planes[0].dimensions();
    let per_column = parity.count(height);
    let mut out = Vec::with_capacity(per_column * width);
    let mut above = [0i32; 3];

    for x in 0..width {
        if x == 0 || x == width - 1 {
            out.extend(repeat(margin).take(per_column));
            continue;
        }
        let mut y = parity.first();
        if y == 0 {
            out.push(margin);
            y = 2;
        }
        if y < height {
            for (cache, plane) in above.iter_mut().zip(planes) {
                *cache = i32::from(plane[(x, y - 1)]);
            }
        }
        while y < height {
            if y == height - 1 {
                out.push(margin);
                break;
            }
            let (mut dx2, mut dy2) = (0, 0);
            for (cache, plane) in above.iter_mut().zip(planes) {
                let below = i32::from(plane[(x, y + 1)]);
                let dy = below - *cache;
                let here = plane.row(y);
                let dx = i32::from(here[x + 1]) - i32::from(here[x - 1]);
                dx2 += dx * dx;
                dy2 += dy * dy;
                *cache = below;
            }
            out.push(finish(dx2 + dy2));
            y += 2;
        }
    }
    out
}

#[cfg(feature = "threaded")]
fn run_sweeps<F>(sweep: F) -> (Vec<f64>, Vec<f64>)
where
    F: Fn(Parity) -> Vec<f64> + Sync,
{
    if num_cpus::get() < 2 {
        return (sweep(Parity::Odd), sweep(Parity::Even));
    }
    let sweep = &sweep;
    crossbeam::scope(|s| {
        let odd = s.spawn(move |_| sweep(Parity::Odd));
        let even = sweep(Parity::Even);
        let odd = odd
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        (odd, even)
    })
    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}

#[cfg(not(feature = "threaded"))]
fn run_sweeps<F>(sweep: F) -> (Vec<f64>, Vec<f64>)
where
    F: Fn(Parity) -> Vec<f64>,
{
    (sweep(Parity::Odd), sweep(Parity::Even))
}

/// Computes energy maps for images of one particular size.
#[derive(Debug, Clone)]
pub struct PixelEnergy2D {
    margin_energy: f64,
    dimensions: Option<ImageDimensions>,
}

impl Default for PixelEnergy2D {
    fn default() -> Self {
        PixelEnergy2D::new(DEFAULT_MARGIN_ENERGY)
    }
}

impl PixelEnergy2D {
    /// A calculator that will accept the first image of any size.
    pub fn new(margin_energy: f64) -> Self {
        PixelEnergy2D {
            margin_energy,
            dimensions: None,
        }
    }

    /// A calculator that only accepts images of the given size.
    pub fn with_dimensions(dimensions: ImageDimensions, margin_energy: f64) -> Self {
        PixelEnergy2D {
            margin_energy,
            dimensions: Some(dimensions),
        }
    }

    /// A calculator configured for images shaped like `image`.
    pub fn from_image(image: &PixelBuffer, margin_energy: f64) -> Self {
        Self::with_dimensions(ImageDimensions::of(image), margin_energy)
    }

    pub fn margin_energy(&self) -> f64 {
        self.margin_energy
    }

    pub fn set_margin_energy(&mut self, margin_energy: f64) {
        self.margin_energy = margin_energy;
    }

    /// The configured dimensions.  An error if none were ever set.
    pub fn dimensions(&self) -> Result<ImageDimensions> {
        self.dimensions.ok_or(CarveError::InvalidDimensions {
            width: 0,
            height: 0,
            channels: 0,
        })
    }

    pub fn set_dimensions(&mut self, dimensions: ImageDimensions) {
        self.dimensions = Some(dimensions);
    }

    /// Compute the energy of every pixel in `image`.
    pub fn calculate(&self, image: &PixelBuffer) -> Result<EnergyMap> {
        let traversal = if image.width() >= image.height() {
            Traversal::Rows
        } else {
            Traversal::Columns
        };
        self.calculate_with(image, traversal)
    }

    pub(crate) fn calculate_with(
        &self,
        image: &PixelBuffer,
        traversal: Traversal,
    ) -> Result<EnergyMap> {
        let found = ImageDimensions::of(image);
        let expected = self.dimensions.unwrap_or(found);
        if expected != found || !(found.channels == 1 || found.channels == 3) {
            return Err(found.into());
        }

        let (width, height) = image.dimensions();
        let planes = image.split_channels();
        let margin = self.margin_energy;
        let mut energy = EnergyMap::new(width, height);
        trace!(width, height, ?traversal, "computing pixel energy");

        match traversal {
            Traversal::Rows => {
                let (odd, even) = run_sweeps(|parity| sweep_rows(&planes, parity, margin));
                for (parity, values) in [(Parity::Odd, odd), (Parity::Even, even)] {
                    let per_row = parity.count(width);
                    for (i, e) in values.into_iter().enumerate() {
                        let (y, k) = (i / per_row, i % per_row);
                        energy[(parity.first() + 2 * k, y)] = e;
                    }
                }
            }
            Traversal::Columns => {
                let (odd, even) = run_sweeps(|parity| sweep_columns(&planes, parity, margin));
                for (parity, values) in [(Parity::Odd, odd), (Parity::Even, even)] {
                    let per_column = parity.count(height);
                    for (i, e) in values.into_iter().enumerate() {
                        let (x, k) = (i / per_column, i % per_column);
                        energy[(x, parity.first() + 2 * k)] = e;
                    }
                }
            }
        }
        Ok(energy)
    }
}

/// A convenience wrapper: the energy of `image` with the default
/// margin.
pub fn calculate_energy(image: &PixelBuffer) -> Result<EnergyMap> {
    PixelEnergy2D::default().calculate(image)
}
