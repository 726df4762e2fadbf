// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can go wrong while carving.
//!
//! Dimension and bounds problems are detected before any state is
//! touched.  The queue variants indicate a bug in the caller (or in
//! this crate) and are never part of a normal carve.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CarveError {
    #[error("Invalid image dimensions: width={width}, height={height}, channels={channels}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        channels: usize,
    },

    #[error("Cannot remove {requested} seams from an image {width} pixels wide")]
    TooManySeamsRequested { requested: usize, width: usize },

    #[error(
        "Keepout region (row={row}, col={col}, width={width}, height={height}) \
         extends beyond a {image_width}x{image_height} image"
    )]
    KeepoutOutOfBounds {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
        image_width: usize,
        image_height: usize,
    },

    #[error("Queue capacity of {capacity} exceeded")]
    QueueCapacityExceeded { capacity: usize },

    #[error("Row queue holds {found} columns but {expected} seams are being removed")]
    QueueLengthMismatch { expected: usize, found: usize },

    #[error("Pop from an empty queue")]
    QueueEmpty,

    #[error("Queue storage already allocated with capacity {capacity}")]
    QueueAlreadyAllocated { capacity: usize },

    #[error("Queue capacity must be non-zero")]
    ZeroCapacity,

    #[error("Energy matrix is empty")]
    EmptyInput,

    #[error("Only {found} of {requested} seams could be routed around marked pixels")]
    NoSeamAvailable { found: usize, requested: usize },
}

pub type Result<T> = std::result::Result<T, CarveError>;
