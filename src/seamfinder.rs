// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Find many vertical seams at once
//!
//! The cumulative table is built once and reused for as many seams as
//! it can still vouch for.  Each accepted seam marks its pixels, which
//! the table doesn't know about, so a later candidate may run into one
//! of them.  When that happens the candidate's endpoint is poisoned and
//! the next cheapest endpoint is tried.  Only when every endpoint in
//! the bottom row has been used up is the table rebuilt around the
//! marks.

use crate::error::{CarveError, Result};
use crate::minheap::FixedMinHeap;
use crate::twodmap::{EnergyAndBackPointer, EnergyMap, MarkMap, TwoDimensionalMap};
use tracing::{debug, trace};

/// One column index per row, top to bottom.
pub type Seam = Vec<usize>;

type PathTable = TwoDimensionalMap<EnergyAndBackPointer<f64>>;

const UNREACHABLE: EnergyAndBackPointer<f64> = EnergyAndBackPointer {
    energy: f64::INFINITY,
    parent: None,
};

#[derive(Debug)]
enum SearchState {
    Seeking,
    Backtracking(usize),
    Committed(Seam),
    PoisonAndRetry(usize),
    FullRecalc,
}

#[derive(Debug, Clone)]
pub struct SeamFinder {
    margin_energy: f64,
    table: PathTable,
}

impl SeamFinder {
    pub fn new(margin_energy: f64) -> Self {
        SeamFinder {
            margin_energy,
            table: PathTable::new(0, 0),
        }
    }

    /// The cumulative energy to the pixel at (x, y) from the last
    /// calculation, including any poisoning since.
    pub fn path_energy(&self, x: usize, y: usize) -> f64 {
        self.table[(x, y)].energy
    }

    /// The column in row `y - 1` the cheapest path to (x, y) passes
    /// through.
    pub fn parent(&self, x: usize, y: usize) -> Option<usize> {
        self.table[(x, y)].parent
    }

    /// Rebuild the cumulative table.  Marked pixels are unreachable,
    /// and so is any pixel whose three upper neighbours all are.
    pub fn calculate_vertical_path_energy(
        &mut self,
        energy: &EnergyMap,
        marked: &MarkMap,
    ) -> Result<()> {
        if energy.is_empty() {
            return Err(CarveError::EmptyInput);
        }
        let (width, height) = energy.dimensions();
        if marked.dimensions() != (width, height) {
            return Err(CarveError::InvalidDimensions {
                width: marked.width(),
                height: marked.height(),
                channels: 1,
            });
        }
        if self.table.dimensions() != (width, height) {
            self.table = PathTable::new(width, height);
        }

        for x in 0..width {
            self.table[(x, 0)] = if marked[(x, 0)] {
                UNREACHABLE
            } else {
                EnergyAndBackPointer {
                    energy: self.margin_energy,
                    parent: None,
                }
            };
        }

        let above = |table: &PathTable, x: usize, y: usize| {
            if x < width {
                table[(x, y - 1)].energy
            } else {
                f64::INFINITY
            }
        };

        for y in 1..height {
            // The three cells above the current one, shifted right one
            // column per step so each is read once.
            let mut left = f64::INFINITY;
            let mut up = above(&self.table, 0, y);
            let mut right = above(&self.table, 1, y);

            for x in 0..width {
                let cell = if marked[(x, y)] {
                    UNREACHABLE
                } else {
                    let mut best = UNREACHABLE;
                    if left < best.energy {
                        best = EnergyAndBackPointer {
                            energy: left,
                            parent: Some(x - 1),
                        };
                    }
                    if up < best.energy {
                        best = EnergyAndBackPointer {
                            energy: up,
                            parent: Some(x),
                        };
                    }
                    if right < best.energy {
                        best = EnergyAndBackPointer {
                            energy: right,
                            parent: Some(x + 1),
                        };
                    }
                    if best.parent.is_some() {
                        best.energy += energy[(x, y)];
                    }
                    best
                };
                self.table[(x, y)] = cell;

                left = up;
                up = right;
                right = above(&self.table, x + 2, y);
            }
        }
        Ok(())
    }

    // The cheapest unmarked, reachable pixel of the bottom row.  Ties
    // go to the lowest column.
    fn min_endpoint(&self, marked: &MarkMap) -> Option<usize> {
        let bottom = self.table.height() - 1;
        let mut best: Option<usize> = None;
        let mut best_energy = f64::INFINITY;
        for x in 0..self.table.width() {
            let e = self.table[(x, bottom)].energy;
            if !marked[(x, bottom)] && e < best_energy {
                best_energy = e;
                best = Some(x);
            }
        }
        best
    }

    // Follow the back pointers up from `col`.  None if the path
    // touches a marked pixel.
    fn backtrack(&self, col: usize, marked: &MarkMap) -> Option<Seam> {
        let height = self.table.height();
        let mut seam = vec![0; height];
        let mut x = col;
        for y in (0..height).rev() {
            if marked[(x, y)] {
                return None;
            }
            seam[y] = x;
            if y > 0 {
                x = self.table[(x, y)].parent?;
            }
        }
        Some(seam)
    }

    /// Find `num_seams` non-overlapping vertical seams.  Every pixel of
    /// every seam is marked and its column pushed onto that row's
    /// queue.  The seams are returned in the order they were found.
    pub fn find_vertical_seams(
        &mut self,
        num_seams: usize,
        energy: &EnergyMap,
        marked: &mut MarkMap,
        queues: &mut [FixedMinHeap<usize>],
    ) -> Result<Vec<Seam>> {
        if energy.is_empty() {
            return Err(CarveError::EmptyInput);
        }
        let (width, height) = energy.dimensions();
        if num_seams >= width {
            return Err(CarveError::TooManySeamsRequested {
                requested: num_seams,
                width,
            });
        }
        if queues.len() != height {
            return Err(CarveError::InvalidDimensions {
                width,
                height: queues.len(),
                channels: 1,
            });
        }

        let mut seams: Vec<Seam> = Vec::with_capacity(num_seams);
        let (mut poisoned, mut recalculated) = (0usize, 0usize);
        if num_seams == 0 {
            return Ok(seams);
        }

        self.calculate_vertical_path_energy(energy, marked)?;
        // The table knows about every mark.
        let mut fresh = true;
        let mut state = SearchState::Seeking;

        while seams.len() < num_seams {
            state = match state {
                SearchState::Seeking => match self.min_endpoint(marked) {
                    Some(col) => SearchState::Backtracking(col),
                    None if fresh => {
                        return Err(CarveError::NoSeamAvailable {
                            found: seams.len(),
                            requested: num_seams,
                        })
                    }
                    None => SearchState::FullRecalc,
                },

                SearchState::Backtracking(col) => match self.backtrack(col, marked) {
                    Some(seam) => SearchState::Committed(seam),
                    None => SearchState::PoisonAndRetry(col),
                },

                SearchState::PoisonAndRetry(col) => {
                    trace!(col, "seam collided with a marked pixel");
                    self.table[(col, height - 1)] = UNREACHABLE;
                    poisoned += 1;
                    SearchState::Seeking
                }

                SearchState::FullRecalc => {
                    self.calculate_vertical_path_energy(energy, marked)?;
                    fresh = true;
                    recalculated += 1;
                    SearchState::Seeking
                }

                SearchState::Committed(seam) => {
                    for (y, &x) in seam.iter().enumerate() {
                        marked[(x, y)] = true;
                        queues[y].push(x)?;
                    }
                    fresh = false;
                    seams.push(seam);
                    SearchState::Seeking
                }
            };
        }

        debug!(
            seams = seams.len(),
            poisoned, recalculated, "vertical seam discovery finished"
        );
        Ok(seams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const M: f64 = 1000.0;
    const ENERGY_DATA: [f64; 20] = [
        9.0, 9.0, 0.0, 9.0, 9.0, 9.0, 1.0, 9.0, 8.0, 9.0, 9.0, 9.0, 9.0, 9.0, 0.0, 9.0, 9.0, 9.0,
        0.0, 9.0,
    ];

    fn queues(height: usize, capacity: usize) -> Vec<FixedMinHeap<usize>> {
        (0..height)
            .map(|_| FixedMinHeap::with_capacity(capacity).unwrap())
            .collect()
    }

    fn find(
        energy: &EnergyMap,
        marked: &mut MarkMap,
        num_seams: usize,
    ) -> Result<Vec<Seam>> {
        let mut q = queues(energy.height(), num_seams.max(1));
        SeamFinder::new(M).find_vertical_seams(num_seams, energy, marked, &mut q)
    }

    fn noise(width: usize, height: usize, seed: u32) -> EnergyMap {
        let mut state = seed;
        let data = (0..width * height)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                f64::from((state >> 16) % 500)
            })
            .collect();
        EnergyMap::from_vec(width, height, data).unwrap()
    }

    #[test]
    fn path_energy_uses_lowest_upper_neighbour() {
        let energy = EnergyMap::from_vec(5, 4, ENERGY_DATA.to_vec()).unwrap();
        let marked = MarkMap::new(5, 4);
        let mut finder = SeamFinder::new(M);
        finder
            .calculate_vertical_path_energy(&energy, &marked)
            .unwrap();
        assert!((0..5).all(|x| finder.path_energy(x, 0) == M));
        assert_eq!(finder.path_energy(1, 1), M + 1.0);
        assert_eq!(finder.path_energy(4, 2), M + 8.0);
        assert_eq!(finder.parent(4, 2), Some(3));
        assert_eq!(finder.path_energy(3, 3), M + 8.0);
        assert_eq!(finder.parent(3, 3), Some(4));
        assert_eq!(finder.parent(0, 0), None);
    }

    #[test]
    fn energy_grid_to_vertical_seam() {
        let energy = EnergyMap::from_vec(5, 4, ENERGY_DATA.to_vec()).unwrap();
        let mut marked = MarkMap::new(5, 4);
        let seams = find(&energy, &mut marked, 1).unwrap();
        assert_eq!(seams, vec![vec![2, 3, 4, 3]]);
    }

    #[test]
    fn collision_poisons_the_endpoint() {
        let energy = EnergyMap::from_vec(5, 4, ENERGY_DATA.to_vec()).unwrap();
        let mut marked = MarkMap::new(5, 4);
        let seams = find(&energy, &mut marked, 2).unwrap();
        assert_eq!(seams, vec![vec![2, 3, 4, 3], vec![0, 1, 0, 0]]);
        let count = marked.as_slice().iter().filter(|m| **m).count();
        assert_eq!(count, 8);
    }

    #[test]
    fn exhausted_table_is_recalculated() {
        // After the first seam every remaining endpoint leads back into
        // it, so the second seam needs a rebuilt table.
        let energy = EnergyMap::filled(3, 3, M);
        let mut marked = MarkMap::new(3, 3);
        let seams = find(&energy, &mut marked, 2).unwrap();
        assert_eq!(seams, vec![vec![0, 0, 0], vec![1, 1, 1]]);
    }

    #[test]
    fn seams_fill_the_queues_in_ascending_order() {
        let energy = EnergyMap::filled(6, 4, M);
        let mut marked = MarkMap::new(6, 4);
        let mut q = queues(4, 3);
        let seams = SeamFinder::new(M)
            .find_vertical_seams(3, &energy, &mut marked, &mut q)
            .unwrap();
        for (y, row) in q.iter_mut().enumerate() {
            assert_eq!(row.len(), 3);
            let mut expected: Vec<usize> = seams.iter().map(|seam| seam[y]).collect();
            expected.sort_unstable();
            let popped: Vec<usize> = (0..3).map(|_| row.pop_min().unwrap()).collect();
            assert_eq!(popped, expected);
        }
    }

    #[test]
    fn seams_are_connected_and_disjoint() {
        for &(w, h, k) in &[(12, 9, 5), (9, 12, 4), (30, 20, 10), (5, 5, 2)] {
            let energy = noise(w, h, (w * h) as u32);
            let mut marked = MarkMap::new(w, h);
            let seams = find(&energy, &mut marked, k).unwrap();
            assert_eq!(seams.len(), k);
            let mut seen = HashSet::new();
            for seam in &seams {
                assert_eq!(seam.len(), h);
                for (y, &x) in seam.iter().enumerate() {
                    assert!(x < w);
                    assert!(seen.insert((x, y)), "pixel ({}, {}) used twice", x, y);
                }
                for pair in seam.windows(2) {
                    assert!((pair[0] as isize - pair[1] as isize).abs() <= 1);
                }
            }
        }
    }

    #[test]
    fn pre_marked_pixels_are_avoided() {
        let energy = EnergyMap::filled(6, 6, M);
        let mut marked = MarkMap::new(6, 6);
        for y in 1..4 {
            for x in 0..3 {
                marked[(x, y)] = true;
            }
        }
        let seams = find(&energy, &mut marked, 2).unwrap();
        for seam in &seams {
            for (y, &x) in seam.iter().enumerate() {
                assert!(!((1..4).contains(&y) && x < 3));
            }
        }
    }

    #[test]
    fn fully_blocked_image_has_no_seam() {
        let energy = EnergyMap::filled(3, 3, M);
        let mut marked = MarkMap::new(3, 3);
        for x in 0..3 {
            marked[(x, 1)] = true;
        }
        assert_eq!(
            find(&energy, &mut marked, 1),
            Err(CarveError::NoSeamAvailable {
                found: 0,
                requested: 1
            })
        );
    }

    #[test]
    fn rejects_bad_requests() {
        let energy = EnergyMap::filled(3, 3, M);
        let mut marked = MarkMap::new(3, 3);
        assert_eq!(
            find(&energy, &mut marked, 3),
            Err(CarveError::TooManySeamsRequested {
                requested: 3,
                width: 3
            })
        );
        let empty = EnergyMap::new(0, 0);
        let mut marked = MarkMap::new(0, 0);
        assert_eq!(find(&empty, &mut marked, 1), Err(CarveError::EmptyInput));
    }

    #[test]
    fn undersized_queues_are_reported() {
        let energy = EnergyMap::filled(5, 2, M);
        let mut marked = MarkMap::new(5, 2);
        let mut q = queues(2, 1);
        assert_eq!(
            SeamFinder::new(M).find_vertical_seams(2, &energy, &mut marked, &mut q),
            Err(CarveError::QueueCapacityExceeded { capacity: 1 })
        );
    }
}
