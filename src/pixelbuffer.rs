// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The pixel container the carver reads from and writes to.
//!
//! Samples are stored interleaved, row-major, one byte per channel.
//! Greyscale (one channel) and RGB (three channels) are the only
//! layouts the energy calculator understands, so those are the only
//! ones that can be constructed.

use crate::error::{CarveError, Result};
use crate::twodmap::Plane;
use image::{DynamicImage, GrayImage, RgbImage};

#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

fn check_dimensions(width: usize, height: usize, channels: usize) -> Result<()> {
    if width == 0 || height == 0 || !(channels == 1 || channels == 3) {
        return Err(CarveError::InvalidDimensions {
            width,
            height,
            channels,
        });
    }
    Ok(())
}

impl PixelBuffer {
    /// A black image.
    pub fn new(width: usize, height: usize, channels: usize) -> Result<Self> {
        check_dimensions(width, height, channels)?;
        Ok(PixelBuffer {
            width,
            height,
            channels,
            data: vec![0; width * height * channels],
        })
    }

    /// Take ownership of interleaved samples.
    pub fn from_raw(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height, channels)?;
        if data.len() != width * height * channels {
            return Err(CarveError::InvalidDimensions {
                width,
                height,
                channels,
            });
        }
        Ok(PixelBuffer {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// (width, height)
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn get(&self, x: usize, y: usize, channel: usize) -> u8 {
        self.data[(y * self.width + x) * self.channels + channel]
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// De-interleave into one plane per channel.
    pub fn split_channels(&self) -> Vec<Plane> {
        let mut planes = vec![Plane::new(self.width, self.height); self.channels];
        for (i, pixel) in self.data.chunks_exact(self.channels).enumerate() {
            let (x, y) = (i % self.width, i / self.width);
            for (plane, &sample) in planes.iter_mut().zip(pixel) {
                plane[(x, y)] = sample;
            }
        }
        planes
    }

    /// Re-interleave planes produced by `split_channels` (or narrowed
    /// since).  Every plane must have the same dimensions.
    pub fn from_planes(planes: &[Plane]) -> Result<Self> {
        let channels = planes.len();
        let (width, height) = planes.first().map(Plane::dimensions).unwrap_or((0, 0));
        check_dimensions(width, height, channels)?;
        if planes.iter().any(|p| p.dimensions() != (width, height)) {
            return Err(CarveError::InvalidDimensions {
                width,
                height,
                channels,
            });
        }
        let mut data = Vec::with_capacity(width * height * channels);
        for i in 0..width * height {
            data.extend(planes.iter().map(|p| p.as_slice()[i]));
        }
        Ok(PixelBuffer {
            width,
            height,
            channels,
            data,
        })
    }

    /// Convert back into something the `image` crate can encode.
    pub fn to_dynamic(&self) -> Result<DynamicImage> {
        let (w, h) = (self.width as u32, self.height as u32);
        let err = || CarveError::InvalidDimensions {
            width: self.width,
            height: self.height,
            channels: self.channels,
        };
        match self.channels {
            1 => GrayImage::from_raw(w, h, self.data.clone())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(err),
            _ => RgbImage::from_raw(w, h, self.data.clone())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(err),
        }
    }
}

impl TryFrom<&GrayImage> for PixelBuffer {
    type Error = CarveError;

    fn try_from(image: &GrayImage) -> Result<Self> {
        PixelBuffer::from_raw(
            image.width() as usize,
            image.height() as usize,
            1,
            image.as_raw().clone(),
        )
    }
}

impl TryFrom<&RgbImage> for PixelBuffer {
    type Error = CarveError;

    fn try_from(image: &RgbImage) -> Result<Self> {
        PixelBuffer::from_raw(
            image.width() as usize,
            image.height() as usize,
            3,
            image.as_raw().clone(),
        )
    }
}

impl TryFrom<&DynamicImage> for PixelBuffer {
    type Error = CarveError;

    /// Greyscale stays greyscale; anything else becomes 8-bit RGB.
    fn try_from(image: &DynamicImage) -> Result<Self> {
        match image {
            DynamicImage::ImageLuma8(gray) => PixelBuffer::try_from(gray),
            other => PixelBuffer::try_from(&other.to_rgb8()),
        }
    }
}
