// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Render the carver's intermediate products as images
//!
//! Nothing here affects carving; these exist so a human can look at an
//! energy map, a mark map, or the seams about to be removed.

use crate::pixelbuffer::PixelBuffer;
use crate::seamfinder::Seam;
use crate::twodmap::{EnergyMap, MarkMap};
use image::{GrayImage, Luma, Rgb, RgbImage};
use itertools::iproduct;
use num_traits::{clamp, NumCast};

/// Scale an energy map into 0..=255, relative to its largest finite
/// energy.  Infinite (excluded) cells come out white.
pub fn energy_to_image(energy: &EnergyMap) -> GrayImage {
    let (width, height) = energy.dimensions();
    let factor = energy
        .as_slice()
        .iter()
        .copied()
        .filter(|e| e.is_finite())
        .fold(0.0f64, f64::max);
    let mut out = GrayImage::new(width as u32, height as u32);
    for (y, x) in iproduct!(0..height, 0..width) {
        let e = energy[(x, y)];
        let scaled = if !e.is_finite() {
            255.0
        } else if factor > 0.0 {
            clamp(e * 255.0 / factor, 0.0, 255.0)
        } else {
            0.0
        };
        let c: u8 = NumCast::from(scaled.round()).unwrap_or(255);
        out.put_pixel(x as u32, y as u32, Luma([c]));
    }
    out
}

/// White where a pixel is marked, black elsewhere.
pub fn mask_to_image(marked: &MarkMap) -> GrayImage {
    let (width, height) = marked.dimensions();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        if marked[(x as usize, y as usize)] {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// The source image with every seam pixel painted red.
pub fn seams_to_image(image: &PixelBuffer, seams: &[Seam]) -> RgbImage {
    let (width, height) = image.dimensions();
    let channels = image.channels();
    let mut out = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        if channels == 1 {
            let v = image.get(x, y, 0);
            Rgb([v, v, v])
        } else {
            Rgb([image.get(x, y, 0), image.get(x, y, 1), image.get(x, y, 2)])
        }
    });
    for seam in seams {
        for (y, &x) in seam.iter().enumerate().take(height) {
            if x < width {
                out.put_pixel(x as u32, y as u32, Rgb([255, 0, 0]));
            }
        }
    }
    out
}
