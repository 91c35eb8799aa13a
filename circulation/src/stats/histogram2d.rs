// circulation - statistics of velocity circulation in periodic 2D slices

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Joint 2D histogram of two quantities (e.g. circulation at two loop
//! sizes, or circulation against a conditioning variable), per loop size.

use crate::error::{CirculationError, Result};

/// Joint histogram of `(x, y)` pairs against two independent edge sets,
/// kept separately for each loop size.
#[derive(Clone)]
pub struct Histogram2D {
    edges_x: Vec<f64>,
    edges_y: Vec<f64>,
    n_r: usize,
    counts: Vec<u64>,
    nsamples: Vec<u64>,
    finalised: bool,
}

impl Histogram2D {
    pub fn new(edges_x: Vec<f64>, edges_y: Vec<f64>, n_r: usize) -> Self {
        assert!(edges_x.len() >= 2 && edges_y.len() >= 2, "need at least one bin per axis");
        assert!(edges_x.windows(2).all(|w| w[0] < w[1]));
        assert!(edges_y.windows(2).all(|w| w[0] < w[1]));
        let n_bins_x = edges_x.len() - 1;
        let n_bins_y = edges_y.len() - 1;
        Histogram2D {
            edges_x,
            edges_y,
            n_r,
            counts: vec![0; n_bins_x * n_bins_y * n_r],
            nsamples: vec![0; n_r],
            finalised: false,
        }
    }

    pub fn n_bins_x(&self) -> usize {
        self.edges_x.len() - 1
    }

    pub fn n_bins_y(&self) -> usize {
        self.edges_y.len() - 1
    }

    pub fn n_r(&self) -> usize {
        self.n_r
    }

    fn bin_of(edges: &[f64], value: f64) -> Option<usize> {
        let first = edges[0];
        let last = *edges.last().unwrap();
        if value < first || value >= last {
            return None;
        }
        match edges.binary_search_by(|e| e.partial_cmp(&value).unwrap()) {
            Ok(i) => Some(i),
            Err(i) => Some(i - 1),
        }
    }

    fn flat_index(&self, bin_x: usize, bin_y: usize, r_idx: usize) -> usize {
        (bin_y * self.n_bins_x() + bin_x) * self.n_r + r_idx
    }

    pub fn update_one(&mut self, x: f64, y: f64, r_idx: usize) {
        assert!(r_idx < self.n_r, "loop-size index {r_idx} out of range ({})", self.n_r);
        self.nsamples[r_idx] += 1;
        if let (Some(bx), Some(by)) = (Self::bin_of(&self.edges_x, x), Self::bin_of(&self.edges_y, y)) {
            let idx = self.flat_index(bx, by, r_idx);
            self.counts[idx] += 1;
        }
    }

    pub fn update(&mut self, pairs: &[(f64, f64)], r_idx: usize) -> Result<()> {
        if self.finalised {
            return Err(CirculationError::UseAfterFinalise);
        }
        for &(x, y) in pairs {
            self.update_one(x, y, r_idx);
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.counts.fill(0);
        self.nsamples.fill(0);
        self.finalised = false;
    }

    pub fn reduce_from(&mut self, other: &Histogram2D) {
        assert_eq!(self.edges_x, other.edges_x);
        assert_eq!(self.edges_y, other.edges_y);
        assert_eq!(self.n_r, other.n_r);
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
        for (a, b) in self.nsamples.iter_mut().zip(other.nsamples.iter()) {
            *a += b;
        }
    }

    pub fn finalise(&mut self) -> Result<()> {
        if self.finalised {
            return Err(CirculationError::UseAfterFinalise);
        }
        self.finalised = true;
        Ok(())
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn count_at(&self, bin_x: usize, bin_y: usize, r_idx: usize) -> u64 {
        self.counts[self.flat_index(bin_x, bin_y, r_idx)]
    }

    pub fn nsamples(&self) -> &[u64] {
        &self.nsamples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_pair_lands_in_expected_cell() {
        let mut h = Histogram2D::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0], 1);
        h.update_one(0.5, 1.5, 0);
        assert_eq!(h.count_at(0, 1, 0), 1);
        assert_eq!(h.counts().iter().sum::<u64>(), 1);
    }

    #[test]
    fn out_of_range_in_either_axis_is_dropped_from_cells() {
        let mut h = Histogram2D::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0], 1);
        h.update_one(2.0, 0.5, 0);
        assert_eq!(h.counts().iter().sum::<u64>(), 0);
        assert_eq!(h.nsamples()[0], 1);
    }

    #[test]
    fn reduction_matches_single_shard() {
        let pairs: Vec<(f64, f64)> = (0..1000)
            .map(|i| {
                let t = i as f64 * 0.002;
                (t.sin(), t.cos())
            })
            .collect();
        let edges = vec![-1.0, -0.5, 0.0, 0.5, 1.0];

        let mut single = Histogram2D::new(edges.clone(), edges.clone(), 1);
        single.update(&pairs, 0).unwrap();

        let mut shards: Vec<Histogram2D> = (0..4).map(|_| Histogram2D::new(edges.clone(), edges.clone(), 1)).collect();
        let chunk = pairs.len() / 4;
        for (s, part) in shards.iter_mut().zip(pairs.chunks(chunk)) {
            s.update(part, 0).unwrap();
        }
        let mut master = Histogram2D::new(edges.clone(), edges.clone(), 1);
        for s in &shards {
            master.reduce_from(s);
        }

        assert_eq!(single.counts(), master.counts());
        assert_eq!(single.nsamples(), master.nsamples());
    }
}
