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

//! Spectral resampler: zero-pad a Fourier-space field into a larger
//! grid while preserving Nyquist/negative-frequency layout.
//!
//! Only integer power-of-two upscaling ratios are supported, matching
//! the original source this was ported from (see `SPEC_FULL.md` §9).
//! Downscaling always fails with [`CirculationError::InvalidShape`].

use num_complex::Complex64;

use crate::error::{CirculationError, Result};

/// Per-axis destination index for every source index: positions below
/// the Nyquist bin keep their index, the Nyquist bin and every negative
/// frequency shift right by `n_out - n_in` to make room for the new
/// positive frequencies in the middle of the spectrum.
fn axis_map(n_in: usize, n_out: usize) -> Vec<usize> {
    let half = n_in / 2;
    let shift = n_out - n_in;
    (0..n_in).map(|i| if i < half { i } else { i + shift }).collect()
}

fn check_ratio(n_in: usize, n_out: usize) -> Result<()> {
    if n_in % 2 != 0 || n_out % 2 != 0 {
        return Err(CirculationError::InvalidShape(format!(
            "axis lengths must be even, got n_in={n_in}, n_out={n_out}"
        )));
    }
    if n_out < n_in {
        return Err(CirculationError::InvalidShape(format!(
            "resampler only upscales, got n_in={n_in} > n_out={n_out}"
        )));
    }
    if n_out == n_in {
        return Ok(());
    }
    if n_out % n_in != 0 || !(n_out / n_in).is_power_of_two() {
        return Err(CirculationError::InvalidShape(format!(
            "resampling ratio must be a power of two, got {n_in} -> {n_out}"
        )));
    }
    Ok(())
}

/// Resample a spectral-space field of shape `(nx_in, ny_in)` (row-major
/// `(ny_in, nx_in)`) to `(nx_out, ny_out)`. Returns an unchanged copy
/// when `(nx_out, ny_out) == (nx_in, ny_in)`.
pub fn resample(
    src: &[Complex64],
    nx_in: usize,
    ny_in: usize,
    nx_out: usize,
    ny_out: usize,
) -> Result<Vec<Complex64>> {
    if src.len() != nx_in * ny_in {
        return Err(CirculationError::DimensionMismatch(format!(
            "source buffer length {} does not match {}x{}",
            src.len(),
            nx_in,
            ny_in
        )));
    }
    check_ratio(nx_in, nx_out)?;
    check_ratio(ny_in, ny_out)?;

    if nx_in == nx_out && ny_in == ny_out {
        return Ok(src.to_vec());
    }

    let scale = (nx_out * ny_out) as f64 / (nx_in * ny_in) as f64;
    let mx = axis_map(nx_in, nx_out);
    let my = axis_map(ny_in, ny_out);

    let mut dst = vec![Complex64::new(0.0, 0.0); nx_out * ny_out];
    for iy in 0..ny_in {
        let dy = my[iy];
        for ix in 0..nx_in {
            let dx = mx[ix];
            dst[dy * nx_out + dx] = src[iy * nx_in + ix] * scale;
        }
    }
    Ok(dst)
}
