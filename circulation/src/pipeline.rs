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

//! Drives the slice loop: resample, derive, compute circulation per
//! quantity and loop size, update statistics, and finally reduce and
//! finalise.

use std::collections::HashMap;

use log::debug;
use num_complex::Complex64;

use crate::config::{Config, LoopShapeConfig};
use crate::convolution::ConvolutionCirculation;
use crate::error::Result;
use crate::fft::Fft2D;
use crate::fields::{self, FieldDeriver};
use crate::integral_field::IntegralField;
use crate::params::DomainParams;
use crate::resample;
use crate::stats::{Histogram1D, Moments, QuantityTag, StatsAccumulator, StatsDict};
use crate::threads::{self, ceil_div, WorkerPool};

/// One 2D plane extracted from the (possibly higher-dimensional)
/// simulation domain, already assembled into row-major layout, at the
/// resolution it was written to disk at.
pub struct Slice {
    pub orientation: &'static str,
    pub index: usize,
    pub psi: Vec<Complex64>,
}

/// Per-quantity shard sets: one independent `Vec<StatsAccumulator>` per
/// configured tag, so velocity/regularised-velocity/momentum samples
/// never mix in the same accumulator.
pub type ShardDict = HashMap<QuantityTag, Vec<StatsAccumulator>>;

/// Drives one full analysis run: for every slice, optionally resample
/// to a higher working resolution, derive each configured quantity's
/// own vector field, evaluate circulation for every configured loop
/// size via the loop shape's matching path, and update that quantity's
/// own per-thread statistics shards.
pub struct Pipeline {
    input_nx: usize,
    input_ny: usize,
    resample_factor: usize,
    input_fft: Fft2D,
    working_fft: Fft2D,
    working_params: DomainParams,
    deriver: FieldDeriver,
    conv: ConvolutionCirculation,
    pool: WorkerPool,
    num_shards: usize,
}

impl Pipeline {
    /// `input_params` describes the resolution of the on-disk field.
    /// The working resolution that derivation and circulation actually
    /// run at is `input resolution * resample_factor` (1 leaves it
    /// unchanged). `num_threads` sizes both the statistics shard count
    /// and the worker pool used for the parallel circulation sweep.
    pub fn new(input_params: DomainParams, resample_factor: usize, num_threads: usize) -> Self {
        let resample_factor = resample_factor.max(1);
        let working_nx = input_params.nx() * resample_factor;
        let working_ny = input_params.ny() * resample_factor;
        let working_params = DomainParams::new(
            working_nx,
            working_ny,
            input_params.lx(),
            input_params.ly(),
            input_params.c(),
            input_params.xi(),
        );
        let input_fft = Fft2D::new(input_params.nx(), input_params.ny());
        let working_fft = Fft2D::new(working_nx, working_ny);
        let deriver = FieldDeriver::new(
            working_nx,
            working_ny,
            working_params.lx(),
            working_params.ly(),
            working_params.c(),
            working_params.xi(),
        );
        let conv = ConvolutionCirculation::new(working_nx, working_ny, working_params.lx(), working_params.ly());
        let num_threads = num_threads.max(1);
        Pipeline {
            input_nx: input_params.nx(),
            input_ny: input_params.ny(),
            resample_factor,
            input_fft,
            working_fft,
            working_params,
            deriver,
            conv,
            pool: threads::new_pool(num_threads),
            num_shards: num_threads,
        }
    }

    pub fn num_shards(&self) -> usize {
        self.num_shards
    }

    /// Domain parameters of the working (post-resample) grid: what
    /// derivation and circulation actually ran on, and what gets
    /// written to the output container.
    pub fn params(&self) -> DomainParams {
        self.working_params
    }

    /// Forward-FFT `psi` at input resolution, zero-pad into the working
    /// resolution, inverse-FFT (normalised) back to real space. A no-op
    /// copy when `resample_factor == 1`.
    fn resample_to_working_grid(&mut self, psi: &[Complex64]) -> Result<Vec<Complex64>> {
        let n_in = self.input_nx * self.input_ny;
        assert_eq!(psi.len(), n_in, "psi length does not match input resolution");
        if self.resample_factor == 1 {
            return Ok(psi.to_vec());
        }

        let mut spectrum = psi.to_vec();
        let mut scratch = vec![Complex64::new(0.0, 0.0); self.input_fft.scratch_len()];
        let mut tbuf = vec![Complex64::new(0.0, 0.0); n_in];
        self.input_fft.forward_2d(&mut spectrum, &mut scratch, &mut tbuf);

        let mut working = resample::resample(
            &spectrum,
            self.input_nx,
            self.input_ny,
            self.working_params.nx(),
            self.working_params.ny(),
        )?;

        let n_out = self.working_params.nx() * self.working_params.ny();
        let mut scratch = vec![Complex64::new(0.0, 0.0); self.working_fft.scratch_len()];
        let mut tbuf = vec![Complex64::new(0.0, 0.0); n_out];
        self.working_fft.inverse_2d(&mut working, &mut scratch, &mut tbuf);
        Ok(working)
    }

    /// Derive the vector field a given quantity tag is defined by, from
    /// the shared momentum/density fields.
    fn quantity_field(&self, tag: QuantityTag, px: &[f64], py: &[f64], rho: &[f64], eps: f64) -> Result<(Vec<f64>, Vec<f64>)> {
        let mut vx = vec![0.0; px.len()];
        let mut vy = vec![0.0; py.len()];
        match tag {
            QuantityTag::Velocity => {
                fields::velocity(px, rho, eps, &mut vx)?;
                fields::velocity(py, rho, eps, &mut vy)?;
            }
            QuantityTag::RegVelocity => {
                fields::regularised_velocity(px, rho, &mut vx);
                fields::regularised_velocity(py, rho, &mut vy);
            }
            QuantityTag::Momentum => {
                vx.copy_from_slice(px);
                vy.copy_from_slice(py);
            }
        }
        Ok((vx, vy))
    }

    /// Derive density/momentum once, then for every configured quantity
    /// derive its own vector field and accumulate its own circulation
    /// samples into its own shard set. The loop-shape dispatch follows
    /// the configured [`LoopShapeConfig`]: rectangles go through the
    /// O(1) integral field (component E), ellipses go through the
    /// spectral convolution kernel (component F), the only path able to
    /// evaluate a non-rectangular loop.
    pub fn process_slice(&mut self, slice: &Slice, config: &Config, shards: &mut ShardDict) -> Result<()> {
        debug!("processing slice {} index {}", slice.orientation, slice.index);
        let psi = self.resample_to_working_grid(&slice.psi)?;

        let nx = self.working_params.nx();
        let ny = self.working_params.ny();
        let n = nx * ny;
        let mut rho = vec![0.0; n];
        let mut px = vec![0.0; n];
        let mut py = vec![0.0; n];
        self.deriver.density(&psi, &mut rho);
        self.deriver.momentum(&psi, &mut px, &mut py);
        debug!("derived rho/p for slice {} index {}", slice.orientation, slice.index);

        let grid_dx = self.working_params.dx();
        let grid_dy = self.working_params.dy();
        let mut gamma = vec![0.0; n];

        for quantity in &config.quantities {
            let tag: QuantityTag = quantity.into();
            let (vx, vy) = self.quantity_field(tag, &px, &py, &rho, config.domain.eps)?;
            let Some(quantity_shards) = shards.get_mut(&tag) else {
                continue;
            };

            let integral_field = match config.loop_shape {
                LoopShapeConfig::Rectangle => {
                    Some(IntegralField::build(&vx, &vy, nx, ny, self.working_params.lx(), self.working_params.ly()))
                }
                LoopShapeConfig::Ellipse => None,
            };

            for (r_idx, &r) in config.loop_sizes.iter().enumerate() {
                match &integral_field {
                    Some(field) => field.circulation_field_parallel(r as i64, r as i64, &mut gamma, &mut self.pool),
                    None => {
                        let shape = config.loop_shape_for(r, grid_dx, grid_dy);
                        self.conv.circulation_field(&vx, &vy, shape, &mut gamma);
                    }
                }
                debug!("circulation field computed for tag={tag:?} r_idx={r_idx}, r={r}");
                StatsAccumulator::threaded_update(quantity_shards, &gamma, r_idx)?;
                debug!("stats shards updated for tag={tag:?} r_idx={r_idx}");
            }
        }
        Ok(())
    }
}

/// Evenly-spaced bin edges from the configured histogram range, used for
/// every quantity's [`Histogram1D`].
fn histogram_from_config(config: &Config, n_r: usize) -> Histogram1D {
    let n_bins = config.histogram_bins.max(1);
    let edges: Vec<f64> = (0..=n_bins)
        .map(|i| {
            let t = i as f64 / n_bins as f64;
            config.histogram_min + t * (config.histogram_max - config.histogram_min)
        })
        .collect();
    Histogram1D::new(edges, n_r)
}

/// One shard set per configured quantity tag, each shard carrying its
/// own moments accumulator and a histogram built from the configured
/// bins and range.
pub fn new_shard_dict(config: &Config, num_shards: usize, n_r: usize) -> ShardDict {
    let mut dict = ShardDict::new();
    for quantity in &config.quantities {
        let tag: QuantityTag = quantity.into();
        let shards = (0..num_shards)
            .map(|_| {
                let moments = Some(Moments::new(n_r, config.moment_orders));
                let histogram = Some(histogram_from_config(config, n_r));
                StatsAccumulator::new(moments, histogram)
            })
            .collect();
        dict.insert(tag, shards);
    }
    dict
}

/// Reduce a vector of per-thread shards into a single master
/// accumulator and finalise it.
pub fn reduce_and_finalise(mut master: StatsAccumulator, shards: &[StatsAccumulator]) -> Result<StatsAccumulator> {
    for shard in shards {
        master.reduce_from(shard);
    }
    master.finalise()?;
    Ok(master)
}

/// Split `n` grid rows into `num_threads` contiguous bands. Used by
/// tests exercising the same banding scheme as
/// [`crate::integral_field::IntegralField::circulation_field_parallel`]'s
/// own internal partitioning.
pub fn row_bands(n: usize, num_threads: usize) -> Vec<(usize, usize)> {
    if num_threads == 0 {
        return vec![(0, n)];
    }
    let chunk = ceil_div(n.max(1), num_threads);
    let mut bands = Vec::new();
    let mut start = 0;
    while start < n {
        let end = (start + chunk).min(n);
        bands.push((start, end));
        start = end;
    }
    bands
}

/// One [`StatsAccumulator`] per configured quantity tag, with moments
/// and a histogram built from the configured bins/range, ready to
/// receive the reduced totals of that quantity's shards.
pub fn build_stats_dict(config: &Config, n_r: usize) -> StatsDict {
    let mut dict = StatsDict::new();
    for quantity in &config.quantities {
        let tag: QuantityTag = quantity.into();
        let moments = Some(Moments::new(n_r, config.moment_orders));
        let histogram = Some(histogram_from_config(config, n_r));
        dict.insert(tag, StatsAccumulator::new(moments, histogram));
    }
    dict
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_bands_cover_every_row_exactly_once() {
        let bands = row_bands(10, 3);
        let mut covered = vec![false; 10];
        for (start, end) in bands {
            for i in start..end {
                assert!(!covered[i], "row {i} covered twice");
                covered[i] = true;
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn row_bands_with_zero_threads_is_one_band() {
        let bands = row_bands(5, 0);
        assert_eq!(bands, vec![(0, 5)]);
    }

    fn test_config(quantities: Vec<crate::config::QuantityName>) -> Config {
        use crate::config::{AnalysisKind, DomainConfig, LoopShapeConfig};
        Config {
            input_dir: String::new(),
            timestep_start: 0,
            timestep_end: 0,
            domain: DomainConfig {
                dims: 2,
                n: vec![8, 8],
                l: vec![std::f64::consts::TAU, std::f64::consts::TAU],
                c: 1.0,
                xi: 1.0,
                eps: 1e-3,
            },
            analysis: AnalysisKind::Circulation,
            quantities,
            loop_sizes: vec![1],
            loop_shape: LoopShapeConfig::Rectangle,
            histogram_bins: 4,
            histogram_min: -1.0,
            histogram_max: 1.0,
            moment_orders: 2,
            resample_factor: 1,
            threads: Some(1),
            output_path: String::new(),
        }
    }

    /// A non-uniform density field so Velocity (`p/(rho+eps)`) and
    /// Momentum (`p`, undivided) are guaranteed to disagree.
    fn modulated_psi(nx: usize, ny: usize) -> Vec<Complex64> {
        let dx = std::f64::consts::TAU / nx as f64;
        (0..nx * ny)
            .map(|idx| {
                let ix = idx % nx;
                let x = ix as f64 * dx;
                let amplitude = 1.0 + 0.5 * x.sin();
                Complex64::new(amplitude * x.cos(), amplitude * x.sin())
            })
            .collect()
    }

    #[test]
    fn each_quantity_accumulates_its_own_circulation_not_a_shared_one() {
        use crate::config::QuantityName;

        let config = test_config(vec![QuantityName::Velocity, QuantityName::Momentum]);
        let input_params = DomainParams::new(8, 8, config.domain.l[0], config.domain.l[1], config.domain.c, config.domain.xi);
        let mut pipeline = Pipeline::new(input_params, config.resample_factor, 1);
        let mut shards = new_shard_dict(&config, pipeline.num_shards(), config.loop_sizes.len());

        let slice = Slice { orientation: "Z", index: 0, psi: modulated_psi(8, 8) };
        pipeline.process_slice(&slice, &config, &mut shards).unwrap();

        let velocity_shards = shards.remove(&QuantityTag::Velocity).unwrap();
        let momentum_shards = shards.remove(&QuantityTag::Momentum).unwrap();
        let velocity = reduce_and_finalise(StatsAccumulator::new(Some(Moments::new(1, 2)), None), &velocity_shards).unwrap();
        let momentum = reduce_and_finalise(StatsAccumulator::new(Some(Moments::new(1, 2)), None), &momentum_shards).unwrap();

        let velocity_mean = velocity.moments().unwrap().moment(1, 0).unwrap();
        let momentum_mean = momentum.moments().unwrap().moment(1, 0).unwrap();
        assert!(
            (velocity_mean - momentum_mean).abs() > 1e-6,
            "velocity and momentum statistics must not collapse onto the same samples: {velocity_mean} vs {momentum_mean}"
        );
    }

    #[test]
    fn ellipse_loop_shape_is_actually_dispatched_to_the_convolution_path() {
        use crate::config::{LoopShapeConfig, QuantityName};

        let mut config = test_config(vec![QuantityName::Velocity]);
        config.loop_shape = LoopShapeConfig::Ellipse;
        let input_params = DomainParams::new(8, 8, config.domain.l[0], config.domain.l[1], config.domain.c, config.domain.xi);
        let mut pipeline = Pipeline::new(input_params, config.resample_factor, 1);
        let mut shards = new_shard_dict(&config, pipeline.num_shards(), config.loop_sizes.len());

        let slice = Slice { orientation: "Z", index: 0, psi: modulated_psi(8, 8) };
        // A rectangle-only path would simply ignore the configured ellipse
        // shape instead of erroring or panicking; this only checks that
        // dispatch runs to completion without relying on the rectangle
        // fast path (exercised separately above).
        pipeline.process_slice(&slice, &config, &mut shards).unwrap();
        let velocity_shards = &shards[&QuantityTag::Velocity];
        let total_samples: u64 = velocity_shards.iter().filter_map(|s| s.moments()).map(|m| m.sample_count(0)).sum();
        assert_eq!(total_samples, 64);
    }

    #[test]
    fn resample_factor_upsamples_the_working_grid() {
        use crate::config::QuantityName;

        let mut config = test_config(vec![QuantityName::Velocity]);
        config.resample_factor = 2;
        let input_params = DomainParams::new(8, 8, config.domain.l[0], config.domain.l[1], config.domain.c, config.domain.xi);
        let pipeline = Pipeline::new(input_params, config.resample_factor, 1);
        assert_eq!(pipeline.params().nx(), 16);
        assert_eq!(pipeline.params().ny(), 16);
        // physical extent is preserved, only the resolution changes
        assert_eq!(pipeline.params().lx(), config.domain.l[0]);
    }
}
