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

//! Running moment sums `<Gamma^p>` per loop size.

use crate::error::{CirculationError, Result};

/// Running moment sums of circulation for every loop size, orders
/// `1..=p_max`.
#[derive(Clone)]
pub struct Moments {
    n_r: usize,
    p_max: usize,
    sums: Vec<f64>,
    counts: Vec<u64>,
    finalised: bool,
}

impl Moments {
    pub fn new(n_r: usize, p_max: usize) -> Self {
        Moments {
            n_r,
            p_max,
            sums: vec![0.0; n_r * p_max],
            counts: vec![0; n_r],
            finalised: false,
        }
    }

    pub fn n_r(&self) -> usize {
        self.n_r
    }

    pub fn p_max(&self) -> usize {
        self.p_max
    }

    pub fn is_finalised(&self) -> bool {
        self.finalised
    }

    fn index(&self, p: usize, r_idx: usize) -> usize {
        debug_assert!(p >= 1 && p <= self.p_max);
        debug_assert!(r_idx < self.n_r);
        (p - 1) * self.n_r + r_idx
    }

    /// Accumulate a single sample at loop size `r_idx`. Never fails
    /// (shards are never finalised); `r_idx` out of range is a
    /// programmer error and panics.
    pub fn update_one(&mut self, gamma: f64, r_idx: usize) {
        assert!(r_idx < self.n_r, "loop-size index {r_idx} out of range ({})", self.n_r);
        let mut gp = 1.0;
        for p in 1..=self.p_max {
            gp *= gamma;
            let idx = self.index(p, r_idx);
            self.sums[idx] += gp;
        }
        self.counts[r_idx] += 1;
    }

    /// Accumulate a batch of samples, all at loop size `r_idx`.
    pub fn update(&mut self, gamma: &[f64], r_idx: usize) -> Result<()> {
        if self.finalised {
            return Err(CirculationError::UseAfterFinalise);
        }
        for &g in gamma {
            self.update_one(g, r_idx);
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        self.sums.fill(0.0);
        self.counts.fill(0);
        self.finalised = false;
    }

    /// Fold another shard's sums and counts into this accumulator.
    pub fn reduce_from(&mut self, other: &Moments) {
        assert_eq!(self.n_r, other.n_r);
        assert_eq!(self.p_max, other.p_max);
        for (a, b) in self.sums.iter_mut().zip(other.sums.iter()) {
            *a += b;
        }
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
    }

    /// Divide sums by sample counts to obtain `<Gamma^p>`. Idempotent
    /// guard: calling twice returns `UseAfterFinalise`.
    pub fn finalise(&mut self) -> Result<()> {
        if self.finalised {
            return Err(CirculationError::UseAfterFinalise);
        }
        for r_idx in 0..self.n_r {
            let n = self.counts[r_idx] as f64;
            if n == 0.0 {
                continue;
            }
            for p in 1..=self.p_max {
                let idx = self.index(p, r_idx);
                self.sums[idx] /= n;
            }
        }
        self.finalised = true;
        Ok(())
    }

    /// `<Gamma^p>` for loop size `r_idx`. Only valid after [`Self::finalise`].
    pub fn moment(&self, p: usize, r_idx: usize) -> Result<f64> {
        if !self.finalised {
            return Err(CirculationError::InvalidConfig(
                "moments accumulator not finalised".into(),
            ));
        }
        Ok(self.sums[self.index(p, r_idx)])
    }

    /// Raw (possibly un-normalised) sum, usable before finalisation.
    pub fn raw_sum(&self, p: usize, r_idx: usize) -> f64 {
        self.sums[self.index(p, r_idx)]
    }

    pub fn sample_count(&self, r_idx: usize) -> u64 {
        self.counts[r_idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_moments_on_finalise() {
        let mut m = Moments::new(1, 3);
        m.update(&[1.0, 2.0, 3.0, 4.0, 5.0], 0).unwrap();
        m.finalise().unwrap();
        assert!((m.moment(1, 0).unwrap() - 3.0).abs() < 1e-12);
        assert!((m.moment(2, 0).unwrap() - 11.0).abs() < 1e-12);
        assert!((m.moment(3, 0).unwrap() - 45.0).abs() < 1e-12);
    }

    #[test]
    fn moment_before_finalise_is_an_error() {
        let m = Moments::new(1, 1);
        assert!(m.moment(1, 0).is_err());
    }

    #[test]
    fn update_after_finalise_fails() {
        let mut m = Moments::new(1, 1);
        m.finalise().unwrap();
        assert!(matches!(m.update(&[1.0], 0), Err(CirculationError::UseAfterFinalise)));
    }

    #[test]
    fn reduction_matches_single_shard() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let mut single = Moments::new(1, 2);
        single.update(&data, 0).unwrap();

        let mut shard_a = Moments::new(1, 2);
        let mut shard_b = Moments::new(1, 2);
        shard_a.update(&data[..4], 0).unwrap();
        shard_b.update(&data[4..], 0).unwrap();
        let mut master = Moments::new(1, 2);
        master.reduce_from(&shard_a);
        master.reduce_from(&shard_b);

        single.finalise().unwrap();
        master.finalise().unwrap();
        assert!((single.moment(1, 0).unwrap() - master.moment(1, 0).unwrap()).abs() < 1e-12);
        assert!((single.moment(2, 0).unwrap() - master.moment(2, 0).unwrap()).abs() < 1e-12);
    }
}
