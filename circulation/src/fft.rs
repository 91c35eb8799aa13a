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

//! Cached FFT plan pairs for a fixed 2D slice shape.
//!
//! Buffers (data, scratch, transpose space) are always owned by the
//! caller; a [`Fft2D`] only carries the read-shared `rustfft` plans, so
//! the same instance can be handed to multiple worker threads as long as
//! each operates on its own buffers (see the concurrency notes in the
//! crate root).

use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

/// Which axis of a row-major `(ny, nx)` buffer to transform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis2 {
    /// The fast (contiguous-row) axis.
    X,
    /// The slow axis; requires a transpose round trip.
    Y,
}

/// Transpose a `rows x cols` row-major buffer into a `cols x rows`
/// row-major buffer.
pub fn transpose(src: &[Complex64], rows: usize, cols: usize, dst: &mut [Complex64]) {
    assert_eq!(src.len(), rows * cols);
    assert_eq!(dst.len(), rows * cols);
    for iy in 0..rows {
        for ix in 0..cols {
            dst[ix * rows + iy] = src[iy * cols + ix];
        }
    }
}

/// Forward and inverse FFT plans for both axes of an `nx * ny` slice.
pub struct Fft2D {
    nx: usize,
    ny: usize,
    fft_x: Arc<dyn Fft<f64>>,
    ifft_x: Arc<dyn Fft<f64>>,
    fft_y: Arc<dyn Fft<f64>>,
    ifft_y: Arc<dyn Fft<f64>>,
}

impl Fft2D {
    /// Build (and plan once) the FFT pairs for a slice of shape `(nx, ny)`.
    pub fn new(nx: usize, ny: usize) -> Self {
        let mut planner = FftPlanner::new();
        Fft2D {
            nx,
            ny,
            fft_x: planner.plan_fft_forward(nx),
            ifft_x: planner.plan_fft_inverse(nx),
            fft_y: planner.plan_fft_forward(ny),
            ifft_y: planner.plan_fft_inverse(ny),
        }
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Minimum scratch length required by either axis plan.
    pub fn scratch_len(&self) -> usize {
        self.fft_x
            .get_inplace_scratch_len()
            .max(self.ifft_x.get_inplace_scratch_len())
            .max(self.fft_y.get_inplace_scratch_len())
            .max(self.ifft_y.get_inplace_scratch_len())
    }

    /// Forward transform along one axis of a row-major `(ny, nx)` buffer.
    /// Unnormalised, as is `rustfft` convention throughout this crate.
    pub fn forward_axis(
        &self,
        data: &mut [Complex64],
        axis: Axis2,
        scratch: &mut [Complex64],
        transpose_buf: &mut [Complex64],
    ) {
        self.axis_pass(data, axis, &self.fft_x.clone(), &self.fft_y.clone(), scratch, transpose_buf);
    }

    /// Inverse transform along one axis (also unnormalised).
    pub fn inverse_axis(
        &self,
        data: &mut [Complex64],
        axis: Axis2,
        scratch: &mut [Complex64],
        transpose_buf: &mut [Complex64],
    ) {
        self.axis_pass(data, axis, &self.ifft_x.clone(), &self.ifft_y.clone(), scratch, transpose_buf);
    }

    fn axis_pass(
        &self,
        data: &mut [Complex64],
        axis: Axis2,
        plan_x: &Arc<dyn Fft<f64>>,
        plan_y: &Arc<dyn Fft<f64>>,
        scratch: &mut [Complex64],
        transpose_buf: &mut [Complex64],
    ) {
        match axis {
            Axis2::X => {
                for row in data.chunks_mut(self.nx) {
                    plan_x.process_with_scratch(row, scratch);
                }
            }
            Axis2::Y => {
                transpose(data, self.ny, self.nx, transpose_buf);
                for row in transpose_buf.chunks_mut(self.ny) {
                    plan_y.process_with_scratch(row, scratch);
                }
                transpose(transpose_buf, self.nx, self.ny, data);
            }
        }
    }

    /// Full 2D forward transform (row pass, transpose, column pass,
    /// transpose back). Unnormalised.
    pub fn forward_2d(&self, data: &mut [Complex64], scratch: &mut [Complex64], transpose_buf: &mut [Complex64]) {
        for row in data.chunks_mut(self.nx) {
            self.fft_x.process_with_scratch(row, scratch);
        }
        transpose(data, self.ny, self.nx, transpose_buf);
        for row in transpose_buf.chunks_mut(self.ny) {
            self.fft_y.process_with_scratch(row, scratch);
        }
        transpose(transpose_buf, self.nx, self.ny, data);
    }

    /// Full 2D inverse transform, normalised by `1/(nx*ny)`.
    pub fn inverse_2d(&self, data: &mut [Complex64], scratch: &mut [Complex64], transpose_buf: &mut [Complex64]) {
        for row in data.chunks_mut(self.nx) {
            self.ifft_x.process_with_scratch(row, scratch);
        }
        transpose(data, self.ny, self.nx, transpose_buf);
        for row in transpose_buf.chunks_mut(self.ny) {
            self.ifft_y.process_with_scratch(row, scratch);
        }
        transpose(transpose_buf, self.nx, self.ny, data);
        let norm = 1.0 / (self.nx * self.ny) as f64;
        for v in data.iter_mut() {
            *v *= norm;
        }
    }
}
