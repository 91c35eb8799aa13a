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

//! HDF5 container writer for a finished analysis: simulation parameters
//! plus, per quantity tag, the finalised moments/histogram blocks.

use std::path::Path;

use hdf5::File as H5File;

use crate::error::Result;
use crate::params::DomainParams;
use crate::stats::{Histogram1D, Moments, QuantityTag, StatsDict};

fn quantity_group_name(tag: QuantityTag) -> &'static str {
    match tag {
        QuantityTag::Velocity => "Velocity",
        QuantityTag::RegVelocity => "RegVelocity",
        QuantityTag::Momentum => "Momentum",
    }
}

/// Write the `SimParams` group: domain size, lengths and the two
/// physical scalars plus the derived quantum of circulation.
fn write_sim_params(file: &H5File, loop_sizes: &[usize], params: &DomainParams) -> Result<()> {
    let group = file.create_group("SimParams")?;
    group.new_dataset::<usize>().create("N")?.write(&[params.nx(), params.ny()])?;
    group.new_dataset::<f64>().create("L")?.write(&[params.lx(), params.ly()])?;
    group.new_dataset::<f64>().create("c")?.write_scalar(&params.c())?;
    group.new_dataset::<f64>().create("xi")?.write_scalar(&params.xi())?;
    group.new_dataset::<f64>().create("kappa")?.write_scalar(&params.kappa())?;
    group
        .new_dataset::<u64>()
        .shape(loop_sizes.len())
        .create("loop_sizes")?
        .write(&loop_sizes.iter().map(|&r| r as u64).collect::<Vec<_>>())?;
    Ok(())
}

fn write_moments(parent: &hdf5::Group, moments: &Moments) -> Result<()> {
    let group = parent.create_group("Moments")?;
    let n_r = moments.n_r();
    let p_max = moments.p_max();
    for p in 1..=p_max {
        let values: Vec<f64> = (0..n_r).map(|r| moments.moment(p, r).unwrap_or(f64::NAN)).collect();
        group
            .new_dataset::<f64>()
            .shape(n_r)
            .create(format!("order_{p}").as_str())?
            .write(&values)?;
    }
    Ok(())
}

fn write_histogram1d(parent: &hdf5::Group, name: &str, hist: &Histogram1D) -> Result<()> {
    let group = parent.create_group(name)?;
    group
        .new_dataset::<f64>()
        .shape(hist.edges().len())
        .create("bin_edges")?
        .write(hist.edges())?;
    group
        .new_dataset::<u64>()
        .shape(hist.counts().len())
        .create("counts")?
        .write(hist.counts())?;
    group.new_dataset::<f64>().shape(hist.vmin().len()).create("vmin")?.write(hist.vmin())?;
    group.new_dataset::<f64>().shape(hist.vmax().len()).create("vmax")?.write(hist.vmax())?;
    group
        .new_dataset::<u64>()
        .shape(hist.nsamples().len())
        .create("Nsamples")?
        .write(hist.nsamples())?;
    let total: u64 = hist.nsamples().iter().sum();
    group.new_dataset::<u64>().create("total")?.write_scalar(&total)?;
    Ok(())
}

/// Write a finished [`StatsDict`] to `path` under an analysis group
/// named `analysis_name` (`"Circulation"`, `"Increments"`, or a
/// user-configured name), alongside the run's `SimParams`.
pub fn write_container(
    path: &Path,
    analysis_name: &str,
    loop_sizes: &[usize],
    params: &DomainParams,
    stats: &StatsDict,
) -> Result<()> {
    let file = H5File::create(path)?;
    write_sim_params(&file, loop_sizes, params)?;
    let analysis_group = file.create_group(analysis_name)?;
    for tag in stats.tags() {
        let tag = *tag;
        let acc = stats.get(tag).expect("tag came from StatsDict::tags");
        let quantity_group = analysis_group.create_group(quantity_group_name(tag))?;
        if let Some(m) = acc.moments() {
            write_moments(&quantity_group, m)?;
        }
        if let Some(h) = acc.histogram() {
            write_histogram1d(&quantity_group, "Histogram", h)?;
        }
    }
    Ok(())
}
