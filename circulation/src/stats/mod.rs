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

//! Statistics engine: moments, histograms, per-thread sharding and
//! dissipation-conditioned accumulation, keyed by quantity tag.

pub mod histogram1d;
pub mod histogram2d;
pub mod moments;

pub use histogram1d::Histogram1D;
pub use histogram2d::Histogram2D;
pub use moments::Moments;

use std::collections::HashMap;

use crate::error::Result;
use crate::threads::ceil_div;

/// A field derived from the wave function, used as the key into a
/// [`StatsDict`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuantityTag {
    Velocity,
    RegVelocity,
    Momentum,
}

/// Per-quantity, per-thread accumulator bundle: moments and/or a
/// histogram, all sharing the same loop-size axis.
///
/// [`Histogram2D`] is not a field here: nothing in the pipeline produces
/// a second, paired sample value to condition against, so a 2D histogram
/// attached to this accumulator would always serialise as all-zero
/// counts. It remains a standalone, independently tested primitive for
/// callers that do have a paired sample stream (see `ConditionedStats`
/// in this module, and `DESIGN.md`).
pub struct StatsAccumulator {
    moments: Option<Moments>,
    histogram: Option<Histogram1D>,
}

impl StatsAccumulator {
    pub fn new(moments: Option<Moments>, histogram: Option<Histogram1D>) -> Self {
        StatsAccumulator { moments, histogram }
    }

    pub fn moments(&self) -> Option<&Moments> {
        self.moments.as_ref()
    }

    pub fn histogram(&self) -> Option<&Histogram1D> {
        self.histogram.as_ref()
    }

    /// Accumulate a batch of Gamma samples, all at loop size `r_idx`,
    /// into every active block.
    pub fn update(&mut self, gamma: &[f64], r_idx: usize) -> Result<()> {
        if let Some(m) = &mut self.moments {
            m.update(gamma, r_idx)?;
        }
        if let Some(h) = &mut self.histogram {
            h.update(gamma, r_idx)?;
        }
        Ok(())
    }

    pub fn reduce_from(&mut self, other: &StatsAccumulator) {
        if let (Some(a), Some(b)) = (&mut self.moments, &other.moments) {
            a.reduce_from(b);
        }
        if let (Some(a), Some(b)) = (&mut self.histogram, &other.histogram) {
            a.reduce_from(b);
        }
    }

    pub fn finalise(&mut self) -> Result<()> {
        if let Some(m) = &mut self.moments {
            m.finalise()?;
        }
        if let Some(h) = &mut self.histogram {
            h.finalise()?;
        }
        Ok(())
    }

    /// Split `gamma` into `num_shards` contiguous ranges of roughly
    /// equal size and update `shards[t]` with range `t`. Each shard
    /// owns disjoint samples, so this can be driven from separate
    /// worker threads without locking.
    pub fn threaded_update(shards: &mut [StatsAccumulator], gamma: &[f64], r_idx: usize) -> Result<()> {
        let num_shards = shards.len();
        assert!(num_shards > 0);
        let chunk = ceil_div(gamma.len().max(1), num_shards);
        for (shard, part) in shards.iter_mut().zip(gamma.chunks(chunk.max(1))) {
            shard.update(part, r_idx)?;
        }
        Ok(())
    }
}

/// A mapping from quantity tag to one [`StatsAccumulator`].
pub struct StatsDict {
    accumulators: HashMap<QuantityTag, StatsAccumulator>,
}

impl StatsDict {
    pub fn new() -> Self {
        StatsDict { accumulators: HashMap::new() }
    }

    pub fn insert(&mut self, tag: QuantityTag, acc: StatsAccumulator) {
        self.accumulators.insert(tag, acc);
    }

    pub fn get(&self, tag: QuantityTag) -> Option<&StatsAccumulator> {
        self.accumulators.get(&tag)
    }

    pub fn get_mut(&mut self, tag: QuantityTag) -> Option<&mut StatsAccumulator> {
        self.accumulators.get_mut(&tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = &QuantityTag> {
        self.accumulators.keys()
    }

    pub fn finalise_all(&mut self) -> Result<()> {
        for acc in self.accumulators.values_mut() {
            acc.finalise()?;
        }
        Ok(())
    }
}

impl Default for StatsDict {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes circulation samples into per-bucket accumulators keyed by a
/// dissipation-field value, on top of (or instead of) a single
/// unconditioned accumulator. Reuses [`Histogram1D`]'s bin-search logic
/// to locate the bucket for each point's dissipation value.
pub struct ConditionedStats {
    edges: Vec<f64>,
    buckets: Vec<StatsAccumulator>,
    unconditioned: Option<StatsAccumulator>,
}

impl ConditionedStats {
    pub fn new(edges: Vec<f64>, buckets: Vec<StatsAccumulator>, unconditioned: Option<StatsAccumulator>) -> Self {
        assert_eq!(buckets.len(), edges.len().saturating_sub(1));
        ConditionedStats { edges, buckets, unconditioned }
    }

    fn bucket_of(&self, dissipation: f64) -> Option<usize> {
        let first = self.edges[0];
        let last = *self.edges.last().unwrap();
        if dissipation < first || dissipation >= last {
            return None;
        }
        match self.edges.binary_search_by(|e| e.partial_cmp(&dissipation).unwrap()) {
            Ok(i) => Some(i),
            Err(i) => Some(i - 1),
        }
    }

    /// Route each `(gamma, dissipation)` pair to its bucket accumulator
    /// (points whose dissipation falls outside the configured edges are
    /// dropped from the conditioned buckets, but still reach the
    /// unconditioned accumulator when present) at loop size `r_idx`.
    pub fn update(&mut self, gamma: &[f64], dissipation: &[f64], r_idx: usize) -> Result<()> {
        assert_eq!(gamma.len(), dissipation.len());
        if let Some(u) = &mut self.unconditioned {
            u.update(gamma, r_idx)?;
        }
        for (&g, &d) in gamma.iter().zip(dissipation.iter()) {
            if let Some(b) = self.bucket_of(d) {
                self.buckets[b].update(&[g], r_idx)?;
            }
        }
        Ok(())
    }

    pub fn bucket(&self, idx: usize) -> &StatsAccumulator {
        &self.buckets[idx]
    }

    pub fn unconditioned(&self) -> Option<&StatsAccumulator> {
        self.unconditioned.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulator(n_r: usize, p_max: usize) -> StatsAccumulator {
        StatsAccumulator::new(Some(Moments::new(n_r, p_max)), None)
    }

    #[test]
    fn threaded_update_matches_single_shard() {
        let data: Vec<f64> = (1..=100).map(|i| i as f64).collect();
        let mut single = accumulator(1, 2);
        single.update(&data, 0).unwrap();

        let mut shards: Vec<StatsAccumulator> = (0..4).map(|_| accumulator(1, 2)).collect();
        StatsAccumulator::threaded_update(&mut shards, &data, 0).unwrap();
        let mut master = accumulator(1, 2);
        for s in &shards {
            master.reduce_from(s);
        }

        single.finalise().unwrap();
        master.finalise().unwrap();
        let a = single.moments().unwrap().moment(1, 0).unwrap();
        let b = master.moments().unwrap().moment(1, 0).unwrap();
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn stats_dict_holds_one_accumulator_per_tag() {
        let mut dict = StatsDict::new();
        dict.insert(QuantityTag::Velocity, accumulator(2, 1));
        dict.insert(QuantityTag::Momentum, accumulator(2, 1));
        assert!(dict.get(QuantityTag::Velocity).is_some());
        assert!(dict.get(QuantityTag::RegVelocity).is_none());
        assert_eq!(dict.tags().count(), 2);
    }

    #[test]
    fn conditioned_stats_routes_by_dissipation_bucket() {
        let edges = vec![0.0, 1.0, 2.0];
        let buckets = vec![accumulator(1, 1), accumulator(1, 1)];
        let mut cond = ConditionedStats::new(edges, buckets, Some(accumulator(1, 1)));
        cond.update(&[10.0, 20.0, 30.0], &[0.5, 1.5, 5.0], 0).unwrap();

        assert_eq!(cond.bucket(0).moments().unwrap().sample_count(0), 1);
        assert_eq!(cond.bucket(1).moments().unwrap().sample_count(0), 1);
        // the out-of-range dissipation value (5.0) is dropped from the buckets...
        assert_eq!(cond.bucket(0).moments().unwrap().raw_sum(1, 0), 10.0);
        assert_eq!(cond.bucket(1).moments().unwrap().raw_sum(1, 0), 20.0);
        // ...but every sample still reaches the unconditioned accumulator.
        assert_eq!(cond.unconditioned().unwrap().moments().unwrap().sample_count(0), 3);
    }
}
