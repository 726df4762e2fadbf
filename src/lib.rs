// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Content-aware image narrowing.
//!
//! Rather than scaling or cropping, `keepcarve` removes the vertical
//! paths of pixels ("seams") that carry the least visual energy.  Many
//! seams are found against one energy map and then removed together,
//! and an optional keepout rectangle protects part of the image from
//! every seam.
//!
//! ```
//! use keepcarve::{PixelBuffer, SeamCarver};
//!
//! let image = PixelBuffer::new(16, 8, 3).unwrap();
//! let mut carver = SeamCarver::new();
//! carver.set_keepout_region(2, 4, 6, 4);
//! let narrower = carver.carve_vertical_seams(5, &image, None).unwrap();
//! assert_eq!(narrower.dimensions(), (11, 8));
//! ```

pub mod dump;
pub mod energy;
pub mod error;
pub mod keepout;
pub mod logger;
pub mod minheap;
pub mod pixelbuffer;
pub mod remover;
pub mod seamcarver;
pub mod seamfinder;
pub mod twodmap;

pub use energy::{calculate_energy, EnergyFn, ImageDimensions, PixelEnergy2D, DEFAULT_MARGIN_ENERGY};
pub use error::{CarveError, Result};
pub use keepout::KeepoutRegion;
pub use minheap::FixedMinHeap;
pub use pixelbuffer::PixelBuffer;
pub use seamcarver::{seamcarve, SeamCarver, SeamCarverConfig};
pub use seamfinder::{Seam, SeamFinder};
pub use twodmap::{EnergyMap, MarkMap, TwoDimensionalMap};
