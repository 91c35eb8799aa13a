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

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};

use circulation::config::Config;
use circulation::io::MmapByteSource;
use circulation::params::DomainParams;
use circulation::pipeline::{build_stats_dict, new_shard_dict, reduce_and_finalise, Pipeline, Slice};
use circulation::{CirculationError, Result};

/// Compute statistics of velocity circulation around closed loops in
/// 2D slices of a Gross-Pitaevskii wave-function field.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    config_path: PathBuf,

    /// Increase log verbosity; repeatable.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn field_path(input_dir: &str, basename: &str, timestep: usize) -> PathBuf {
    Path::new(input_dir).join(format!("{basename}.{timestep:03}.dat"))
}

fn run(config: &Config) -> Result<()> {
    let nx = config.domain.n[0];
    let ny = config.domain.n[1];
    let lx = config.domain.l[0];
    let ly = config.domain.l[1];
    let input_params = DomainParams::new(nx, ny, lx, ly, config.domain.c, config.domain.xi);

    let num_threads = config.thread_count();
    let n_r = config.loop_sizes.len();
    let mut pipeline = Pipeline::new(input_params, config.resample_factor, num_threads);
    let mut shards = new_shard_dict(config, pipeline.num_shards(), n_r);
    let mut stats = build_stats_dict(config, n_r);

    let n_steps = (config.timestep_end - config.timestep_start + 1) as u64;
    let progress = ProgressBar::new(n_steps);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} slices ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for timestep in config.timestep_start..=config.timestep_end {
        info!("loading timestep {timestep}");
        let real_path = field_path(&config.input_dir, "ReaPsi", timestep);
        let imag_path = field_path(&config.input_dir, "ImaPsi", timestep);
        let real = MmapByteSource::open(&real_path)?;
        let imag = MmapByteSource::open(&imag_path)?;
        let psi = circulation::io::assemble_psi_slice(&real, &imag, nx, ny)?;
        let slice = Slice { orientation: "Z", index: timestep, psi };
        pipeline.process_slice(&slice, config, &mut shards)?;
        progress.inc(1);
    }
    progress.finish_and_clear();

    for tag in stats.tags().copied().collect::<Vec<_>>() {
        let acc = stats.get_mut(tag).expect("tag came from StatsDict::tags");
        let master = std::mem::replace(acc, circulation::stats::StatsAccumulator::new(None, None));
        let tag_shards = shards.get(&tag).expect("shard dict built for every configured quantity");
        *acc = reduce_and_finalise(master, tag_shards)?;
    }

    let working_params = pipeline.params();
    info!("writing output container to {}", config.output_path);
    circulation::output::write_container(
        Path::new(&config.output_path),
        "Circulation",
        &config.loop_sizes,
        &working_params,
        &stats,
    )?;
    Ok(())
}

fn exit_code_for(err: &CirculationError) -> u8 {
    match err {
        CirculationError::InvalidConfig(_) => 2,
        CirculationError::DimensionMismatch(_) => 3,
        CirculationError::InvalidShape(_) => 4,
        CirculationError::Io(_) => 5,
        CirculationError::NumericDomain(_) => 6,
        CirculationError::UseAfterFinalise => 7,
        CirculationError::Hdf5(_) => 8,
        CirculationError::Toml(_) => 9,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match Config::load(&cli.config_path) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to load configuration: {e}");
            eprintln!("error: {e}");
            return ExitCode::from(exit_code_for(&e));
        }
    };

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("pipeline failed: {e}");
            eprintln!("error: {e}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}
