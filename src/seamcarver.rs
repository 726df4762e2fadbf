// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seamcarve - The main entry point
//!
//! `SeamCarver` holds what survives from one carve to the next: the
//! configuration and an optional keepout region.  Each carve computes
//! the energy map, discovers every seam against it, and then removes
//! them all in a single pass over the image.

use crate::energy::{EnergyFn, PixelEnergy2D, DEFAULT_MARGIN_ENERGY};
use crate::error::{CarveError, Result};
use crate::keepout::KeepoutRegion;
use crate::minheap::FixedMinHeap;
use crate::pixelbuffer::PixelBuffer;
use crate::remover::remove_vertical_seams;
use crate::seamfinder::{Seam, SeamFinder};
use crate::twodmap::{EnergyMap, MarkMap};
use tracing::{debug, instrument};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SeamCarverConfig {
    /// Energy of every border pixel, and the starting energy of every
    /// path through the top row.
    pub margin_energy: f64,
}

impl Default for SeamCarverConfig {
    fn default() -> Self {
        SeamCarverConfig {
            margin_energy: DEFAULT_MARGIN_ENERGY,
        }
    }
}

/// The carving engine.  Carving takes `&mut self`, so one engine can
/// only ever run one carve at a time.
#[derive(Debug, Clone)]
pub struct SeamCarver {
    config: SeamCarverConfig,
    keepout: Option<KeepoutRegion>,
    marked: MarkMap,
    finder: SeamFinder,
}

impl Default for SeamCarver {
    fn default() -> Self {
        SeamCarver::with_config(SeamCarverConfig::default())
    }
}

impl SeamCarver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SeamCarverConfig) -> Self {
        SeamCarver {
            config,
            keepout: None,
            marked: MarkMap::new(0, 0),
            finder: SeamFinder::new(config.margin_energy),
        }
    }

    pub fn config(&self) -> &SeamCarverConfig {
        &self.config
    }

    /// Protect a rectangle from every subsequent carve.  The region is
    /// checked against each image as it is carved.
    pub fn set_keepout_region(&mut self, row: usize, col: usize, width: usize, height: usize) {
        self.keepout = Some(KeepoutRegion::new(row, col, width, height));
    }

    pub fn delete_keepout_region(&mut self) {
        // Forget the last carve's marks along with the region.
        if self.keepout.take().is_some() {
            self.marked.fill(false);
        }
    }

    pub fn keepout_region(&self) -> Option<KeepoutRegion> {
        self.keepout
    }

    /// Every pixel excluded during the last carve: the keepout region
    /// plus the pixels of every seam found.
    pub fn marked(&self) -> &MarkMap {
        &self.marked
    }

    // Everything that can fail for reasons other than a bug is checked
    // here, before the mark map is touched.
    fn prepare(
        &mut self,
        num_seams: usize,
        image: &PixelBuffer,
        energy_fn: Option<&EnergyFn>,
    ) -> Result<EnergyMap> {
        let (width, height) = image.dimensions();
        if num_seams >= width {
            return Err(CarveError::TooManySeamsRequested {
                requested: num_seams,
                width,
            });
        }
        if let Some(region) = &self.keepout {
            region.validate(width, height)?;
        }

        let energy = match energy_fn {
            Some(calculate) => {
                let energy = calculate(image);
                if energy.is_empty() {
                    return Err(CarveError::EmptyInput);
                }
                if energy.dimensions() != (width, height) {
                    let (width, height) = energy.dimensions();
                    return Err(CarveError::InvalidDimensions {
                        width,
                        height,
                        channels: 1,
                    });
                }
                energy
            }
            None => PixelEnergy2D::from_image(image, self.config.margin_energy).calculate(image)?,
        };

        if self.marked.dimensions() == (width, height) {
            self.marked.fill(false);
        } else {
            self.marked = MarkMap::new(width, height);
        }
        if let Some(region) = &self.keepout {
            region.mark(&mut self.marked)?;
        }
        Ok(energy)
    }

    fn discover(
        &mut self,
        num_seams: usize,
        image: &PixelBuffer,
        energy_fn: Option<&EnergyFn>,
    ) -> Result<(Vec<Seam>, Vec<FixedMinHeap<usize>>)> {
        let energy = self.prepare(num_seams, image, energy_fn)?;
        if num_seams == 0 {
            return Ok((Vec::new(), Vec::new()));
        }
        let mut queues = (0..image.height())
            .map(|_| FixedMinHeap::with_capacity(num_seams))
            .collect::<Result<Vec<_>>>()?;
        let seams =
            self.finder
                .find_vertical_seams(num_seams, &energy, &mut self.marked, &mut queues)?;
        Ok((seams, queues))
    }

    /// Find the `num_seams` seams a carve would remove, without
    /// removing them.
    pub fn find_vertical_seams(
        &mut self,
        num_seams: usize,
        image: &PixelBuffer,
        energy_fn: Option<&EnergyFn>,
    ) -> Result<Vec<Seam>> {
        self.discover(num_seams, image, energy_fn)
            .map(|(seams, _)| seams)
    }

    /// Narrow `image` by `num_seams` columns.  `energy_fn`, if given,
    /// replaces the built-in gradient energy.  The input is never
    /// modified; on success a new, narrower image is returned.
    #[instrument(level = "debug", skip(self, image, energy_fn))]
    pub fn carve_vertical_seams(
        &mut self,
        num_seams: usize,
        image: &PixelBuffer,
        energy_fn: Option<&EnergyFn>,
    ) -> Result<PixelBuffer> {
        let (_, mut queues) = self.discover(num_seams, image, energy_fn)?;
        if num_seams == 0 {
            return Ok(image.clone());
        }
        let carved = remove_vertical_seams(image.split_channels(), &mut queues, num_seams)?;
        debug!(
            from = image.width(),
            to = carved.width(),
            height = carved.height(),
            "carved"
        );
        Ok(carved)
    }
}

/// A convenience wrapper: carve `num_seams` columns out of `image` with
/// the default configuration and no keepout region.
pub fn seamcarve(image: &PixelBuffer, num_seams: usize) -> Result<PixelBuffer> {
    SeamCarver::new().carve_vertical_seams(num_seams, image, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn striped(width: usize, height: usize, stripe: &[usize]) -> PixelBuffer {
        let mut data = vec![0u8; width * height];
        for y in 0..height {
            for &x in stripe {
                data[y * width + x] = 255;
            }
        }
        PixelBuffer::from_raw(width, height, 1, data).unwrap()
    }

    fn noise(width: usize, height: usize, channels: usize, seed: u32) -> PixelBuffer {
        let mut state = seed;
        let data = (0..width * height * channels)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (state >> 16) as u8
            })
            .collect();
        PixelBuffer::from_raw(width, height, channels, data).unwrap()
    }

    #[test]
    fn uniform_image_seam_dips_into_the_interior() {
        let image = PixelBuffer::from_raw(5, 5, 1, vec![0; 25]).unwrap();
        let mut carver = SeamCarver::new();
        // The interior costs nothing and the border costs the margin, so
        // the seam enters the interior after the top row and leaves it
        // for the lowest-numbered cheapest endpoint.
        let seams = carver.find_vertical_seams(1, &image, None).unwrap();
        assert_eq!(seams, vec![vec![0, 1, 1, 1, 0]]);
        let out = carver.carve_vertical_seams(1, &image, None).unwrap();
        assert_eq!(out.dimensions(), (4, 5));
    }

    #[test]
    fn carved_pixels_match_the_expected_output() {
        #[rustfmt::skip]
        let data = vec![
             1,  2,  3,  4,  5,
            20, 21, 22, 23, 24,
             7, 12, 13,  4,  9,
        ];
        let image = PixelBuffer::from_raw(5, 3, 1, data).unwrap();
        let mut carver = SeamCarver::new();
        // Interior energies of the middle row are 104, 104 and 4.
        let seams = carver.find_vertical_seams(1, &image, None).unwrap();
        assert_eq!(seams, vec![vec![2, 3, 2]]);
        let out = carver.carve_vertical_seams(1, &image, None).unwrap();
        assert_eq!(out.dimensions(), (4, 3));
        #[rustfmt::skip]
        let expected = [
             1,  2,  4,  5,
            20, 21, 22, 24,
             7, 12,  4,  9,
        ];
        assert_eq!(out.as_raw(), &expected[..]);
    }

    #[test]
    fn output_is_narrower_by_the_seam_count() {
        let image = noise(17, 9, 3, 5);
        let mut carver = SeamCarver::new();
        for k in [0, 1, 4, 8] {
            let out = carver.carve_vertical_seams(k, &image, None).unwrap();
            assert_eq!(out.dimensions(), (17 - k, 9));
            assert_eq!(out.channels(), 3);
        }
    }

    #[test]
    fn zero_seams_returns_a_copy() {
        let image = noise(6, 4, 1, 11);
        assert_eq!(seamcarve(&image, 0).unwrap(), image);
    }

    #[test]
    fn too_many_seams_are_refused() {
        let image = noise(6, 4, 1, 11);
        for k in [6, 7, 100] {
            assert_eq!(
                seamcarve(&image, k),
                Err(CarveError::TooManySeamsRequested {
                    requested: k,
                    width: 6
                })
            );
        }
    }

    #[test]
    fn high_contrast_stripe_survives() {
        let image = striped(10, 6, &[5, 6]);
        let out = seamcarve(&image, 3).unwrap();
        assert_eq!(out.dimensions(), (7, 6));
        for y in 0..6 {
            let bright: Vec<usize> = (0..7).filter(|&x| out.get(x, y, 0) == 255).collect();
            assert_eq!(bright.len(), 2, "row {}", y);
            assert_eq!(bright[1], bright[0] + 1, "row {}", y);
        }
    }

    #[test]
    fn seams_never_enter_the_keepout_region() {
        let image = noise(20, 12, 3, 42);
        let mut carver = SeamCarver::new();
        carver.set_keepout_region(2, 3, 6, 8);
        let region = carver.keepout_region().unwrap();
        let seams = carver.find_vertical_seams(8, &image, None).unwrap();
        assert_eq!(seams.len(), 8);
        let mut seen = HashSet::new();
        for seam in &seams {
            for (y, &x) in seam.iter().enumerate() {
                assert!(!region.contains(x, y), "seam hit ({}, {})", x, y);
                assert!(seen.insert((x, y)));
            }
        }
    }

    #[test]
    fn keepout_pixels_are_preserved() {
        // A flat image, so the keepout region is the only thing that
        // steers the seams.
        let mut data = vec![0u8; 8 * 4];
        for y in 1..3 {
            data[y * 8] = 100 + y as u8;
            data[y * 8 + 1] = 110 + y as u8;
        }
        let image = PixelBuffer::from_raw(8, 4, 1, data).unwrap();
        let mut carver = SeamCarver::new();
        carver.set_keepout_region(0, 0, 2, 4);
        let out = carver.carve_vertical_seams(2, &image, None).unwrap();
        for y in 0..4 {
            assert_eq!(out.get(0, y, 0), image.get(0, y, 0));
            assert_eq!(out.get(1, y, 0), image.get(1, y, 0));
        }
    }

    #[test]
    fn keepout_persists_until_deleted() {
        let mut carver = SeamCarver::new();
        carver.set_keepout_region(0, 0, 3, 3);
        let small = noise(8, 3, 1, 1);
        let larger = noise(12, 5, 1, 2);
        for image in [&small, &larger] {
            carver.carve_vertical_seams(2, image, None).unwrap();
            assert!(carver.marked()[(2, 2)]);
        }
        carver.delete_keepout_region();
        assert_eq!(carver.keepout_region(), None);
        assert!(carver.marked().as_slice().iter().all(|m| !m));
    }

    #[test]
    fn keepout_outside_the_image_is_refused() {
        let image = noise(8, 6, 1, 3);
        let mut carver = SeamCarver::new();
        carver.set_keepout_region(4, 4, 2, 3);
        let before = image.clone();
        assert!(matches!(
            carver.carve_vertical_seams(1, &image, None),
            Err(CarveError::KeepoutOutOfBounds { .. })
        ));
        assert_eq!(image, before);
    }

    #[test]
    fn oversized_keepout_is_refused_not_wrapped() {
        let image = noise(5, 5, 1, 8);
        let mut carver = SeamCarver::new();
        carver.set_keepout_region(1, 1, usize::MAX, 1);
        assert!(matches!(
            carver.carve_vertical_seams(1, &image, None),
            Err(CarveError::KeepoutOutOfBounds { .. })
        ));
    }

    #[test]
    fn blocking_keepout_reports_missing_seams() {
        let image = noise(8, 6, 1, 3);
        let mut carver = SeamCarver::new();
        carver.set_keepout_region(2, 0, 8, 1);
        assert_eq!(
            carver.carve_vertical_seams(1, &image, None),
            Err(CarveError::NoSeamAvailable {
                found: 0,
                requested: 1
            })
        );
    }

    #[test]
    fn custom_energy_function_steers_the_seam() {
        let image = noise(7, 5, 3, 9);
        let cheap_column: &EnergyFn = &|img: &PixelBuffer| {
            let (w, h) = img.dimensions();
            let mut energy = EnergyMap::filled(w, h, 100.0);
            for y in 0..h {
                energy[(3, y)] = 0.0;
            }
            energy
        };
        let mut carver = SeamCarver::new();
        let seams = carver
            .find_vertical_seams(1, &image, Some(cheap_column))
            .unwrap();
        assert!(seams[0][1..].iter().all(|&x| x == 3), "{:?}", seams);

        let out = carver
            .carve_vertical_seams(1, &image, Some(cheap_column))
            .unwrap();
        for y in 1..5 {
            for x in 0..6 {
                let src = if x < 3 { x } else { x + 1 };
                for c in 0..3 {
                    assert_eq!(out.get(x, y, c), image.get(src, y, c));
                }
            }
        }
    }

    #[test]
    fn custom_energy_function_must_match_the_image() {
        let image = noise(7, 5, 1, 9);
        let mut carver = SeamCarver::new();
        let wrong: &EnergyFn = &|_: &PixelBuffer| EnergyMap::new(3, 3);
        assert_eq!(
            carver.carve_vertical_seams(1, &image, Some(wrong)),
            Err(CarveError::InvalidDimensions {
                width: 3,
                height: 3,
                channels: 1
            })
        );
        let empty: &EnergyFn = &|_: &PixelBuffer| EnergyMap::new(0, 0);
        assert_eq!(
            carver.carve_vertical_seams(1, &image, Some(empty)),
            Err(CarveError::EmptyInput)
        );
    }

    #[test]
    fn margin_energy_is_configurable() {
        let carver = SeamCarver::with_config(SeamCarverConfig {
            margin_energy: 17.0,
        });
        assert_eq!(carver.config().margin_energy, 17.0);
        assert_eq!(SeamCarver::new().config().margin_energy, 390150.0);
    }
}
