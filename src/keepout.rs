// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Keepout regions
//!
//! A rectangle of pixels that no seam may pass through.  It is applied
//! by marking every pixel inside it before seam discovery starts, after
//! which the finder treats it exactly like an earlier seam.

use crate::error::{CarveError, Result};
use crate::twodmap::MarkMap;
use itertools::iproduct;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct KeepoutRegion {
    pub row: usize,
    pub col: usize,
    pub width: usize,
    pub height: usize,
}

impl KeepoutRegion {
    pub fn new(row: usize, col: usize, width: usize, height: usize) -> Self {
        KeepoutRegion {
            row,
            col,
            width,
            height,
        }
    }

    /// The region must start inside the image and end no further out
    /// than its last row and column.
    pub fn validate(&self, image_width: usize, image_height: usize) -> Result<()> {
        let ends_inside = |start: usize, len: usize, limit: usize| {
            start < limit && start.checked_add(len).map_or(false, |end| end <= limit)
        };
        let fits = ends_inside(self.row, self.height, image_height)
            && ends_inside(self.col, self.width, image_width);
        if fits {
            Ok(())
        } else {
            Err(CarveError::KeepoutOutOfBounds {
                row: self.row,
                col: self.col,
                width: self.width,
                height: self.height,
                image_width,
                image_height,
            })
        }
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.col..self.col + self.width).contains(&x)
            && (self.row..self.row + self.height).contains(&y)
    }

    /// Mark every pixel inside the region.
    pub fn mark(&self, marked: &mut MarkMap) -> Result<()> {
        self.validate(marked.width(), marked.height())?;
        let rows = self.row..self.row + self.height;
        let cols = self.col..self.col + self.width;
        for (y, x) in iproduct!(rows, cols) {
            marked[(x, y)] = true;
        }
        Ok(())
    }
}
