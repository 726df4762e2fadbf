// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Remove every discovered seam in one pass
//!
//! Each row's queue yields the doomed columns in ascending order.  The
//! run of pixels between one doomed column and the next slides left by
//! the number of columns dropped so far, so every pixel moves at most
//! once no matter how many seams cross the row.

use crate::error::{CarveError, Result};
use crate::minheap::FixedMinHeap;
use crate::pixelbuffer::PixelBuffer;
use crate::twodmap::Plane;

// Compact one row of every plane.
fn compact_row(planes: &mut [Plane], y: usize, queue: &mut FixedMinHeap<usize>) -> Result<()> {
    let width = planes[0].width();
    let mut removed = 0;
    while !queue.is_empty() {
        let col = queue.pop_min()?;
        removed += 1;
        let next = queue.peek_min().unwrap_or(width);
        if col + 1 < next {
            for plane in planes.iter_mut() {
                plane.row_mut(y).copy_within(col + 1..next, col + 1 - removed);
            }
        }
    }
    Ok(())
}

/// Drop the queued columns from every row and re-interleave what's
/// left.  Every queue must hold exactly `num_seams` distinct columns.
pub fn remove_vertical_seams(
    mut planes: Vec<Plane>,
    queues: &mut [FixedMinHeap<usize>],
    num_seams: usize,
) -> Result<PixelBuffer> {
    let (width, height) = planes.first().map(Plane::dimensions).unwrap_or((0, 0));
    if queues.len() != height || planes.iter().any(|p| p.dimensions() != (width, height)) {
        return Err(CarveError::InvalidDimensions {
            width,
            height,
            channels: planes.len(),
        });
    }
    if num_seams >= width {
        return Err(CarveError::TooManySeamsRequested {
            requested: num_seams,
            width,
        });
    }

    for (y, queue) in queues.iter_mut().enumerate() {
        if queue.len() != num_seams {
            return Err(CarveError::QueueLengthMismatch {
                expected: num_seams,
                found: queue.len(),
            });
        }
        compact_row(&mut planes, y, queue)?;
    }

    for plane in planes.iter_mut() {
        plane.truncate_columns(width - num_seams);
    }
    PixelBuffer::from_planes(&planes)
}
