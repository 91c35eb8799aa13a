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

//! 1D histogram of circulation values, per loop size.

use crate::error::{CirculationError, Result};

/// Histogram of a single quantity against `N_bins` edges, kept
/// separately for each loop size.
#[derive(Clone)]
pub struct Histogram1D {
    edges: Vec<f64>,
    n_r: usize,
    counts: Vec<u64>,
    vmin: Vec<f64>,
    vmax: Vec<f64>,
    nsamples: Vec<u64>,
    finalised: bool,
}

impl Histogram1D {
    /// `edges` must be sorted ascending and have at least two entries.
    pub fn new(edges: Vec<f64>, n_r: usize) -> Self {
        assert!(edges.len() >= 2, "need at least one bin");
        assert!(edges.windows(2).all(|w| w[0] < w[1]), "edges must be strictly increasing");
        let n_bins = edges.len() - 1;
        Histogram1D {
            edges,
            n_r,
            counts: vec![0; n_bins * n_r],
            vmin: vec![f64::INFINITY; n_r],
            vmax: vec![f64::NEG_INFINITY; n_r],
            nsamples: vec![0; n_r],
            finalised: false,
        }
    }

    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn n_r(&self) -> usize {
        self.n_r
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Locate the bin containing `value`. Left edge inclusive, right
    /// edge of the whole range exclusive; values outside `[edges[0],
    /// edges[last])` are outliers (`None`).
    fn bin_of(&self, value: f64) -> Option<usize> {
        let first = self.edges[0];
        let last = *self.edges.last().unwrap();
        if value < first || value >= last {
            return None;
        }
        match self.edges.binary_search_by(|e| e.partial_cmp(&value).unwrap()) {
            Ok(i) => Some(i),
            Err(i) => Some(i - 1),
        }
    }

    pub fn update_one(&mut self, value: f64, r_idx: usize) {
        assert!(r_idx < self.n_r, "loop-size index {r_idx} out of range ({})", self.n_r);
        if value < self.vmin[r_idx] {
            self.vmin[r_idx] = value;
        }
        if value > self.vmax[r_idx] {
            self.vmax[r_idx] = value;
        }
        self.nsamples[r_idx] += 1;
        if let Some(bin) = self.bin_of(value) {
            self.counts[bin * self.n_r + r_idx] += 1;
        }
    }

    pub fn update(&mut self, values: &[f64], r_idx: usize) -> Result<()> {
        if self.finalised {
            return Err(CirculationError::UseAfterFinalise);
        }
        for &v in values {
            self.update_one(v, r_idx);
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.counts.fill(0);
        self.vmin.fill(f64::INFINITY);
        self.vmax.fill(f64::NEG_INFINITY);
        self.nsamples.fill(0);
        self.finalised = false;
    }

    pub fn reduce_from(&mut self, other: &Histogram1D) {
        assert_eq!(self.edges, other.edges);
        assert_eq!(self.n_r, other.n_r);
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
        for (a, b) in self.nsamples.iter_mut().zip(other.nsamples.iter()) {
            *a += b;
        }
        for r in 0..self.n_r {
            self.vmin[r] = self.vmin[r].min(other.vmin[r]);
            self.vmax[r] = self.vmax[r].max(other.vmax[r]);
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

    pub fn vmin(&self) -> &[f64] {
        &self.vmin
    }

    pub fn vmax(&self) -> &[f64] {
        &self.vmax
    }

    pub fn nsamples(&self) -> &[u64] {
        &self.nsamples
    }

    pub fn total(&self, r_idx: usize) -> u64 {
        self.nsamples[r_idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges() -> Vec<f64> {
        vec![0.0, 1.0, 2.0, 3.0]
    }

    #[test]
    fn left_edge_falls_in_left_bin() {
        let mut h = Histogram1D::new(edges(), 1);
        h.update_one(0.0, 0);
        assert_eq!(h.counts()[0], 1);
    }

    #[test]
    fn right_edge_is_an_outlier() {
        let mut h = Histogram1D::new(edges(), 1);
        h.update_one(3.0, 0);
        assert_eq!(h.counts().iter().sum::<u64>(), 0);
        assert_eq!(h.total(0), 1);
        assert_eq!(h.vmax()[0], 3.0);
    }

    #[test]
    fn reduction_matches_single_shard() {
        let data: Vec<f64> = (0..1000).map(|i| (i as f64) * 0.003 - 1.5).collect();
        let mut single = Histogram1D::new(vec![-1.0, -0.5, 0.0, 0.5, 1.0], 1);
        single.update(&data, 0).unwrap();

        let mut shards: Vec<Histogram1D> = (0..4).map(|_| Histogram1D::new(vec![-1.0, -0.5, 0.0, 0.5, 1.0], 1)).collect();
        let chunk = data.len() / 4;
        for (s, part) in shards.iter_mut().zip(data.chunks(chunk)) {
            s.update(part, 0).unwrap();
        }
        let mut master = Histogram1D::new(vec![-1.0, -0.5, 0.0, 0.5, 1.0], 1);
        for s in &shards {
            master.reduce_from(s);
        }

        assert_eq!(single.counts(), master.counts());
        assert_eq!(single.vmin(), master.vmin());
        assert_eq!(single.vmax(), master.vmax());
        assert_eq!(single.nsamples(), master.nsamples());
    }
}
