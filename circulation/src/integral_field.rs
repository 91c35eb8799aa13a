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

//! Precomputed cumulative line integrals for O(1) rectangular-loop
//! circulation on a periodic 2D vector field.

use crate::grid::PeriodicAxis;
use crate::threads::ceil_div;

/// Cumulative line-integral field `I(U, w)` built once per `(slice, vector
/// field)` pair, used to evaluate the circulation of any axis-aligned
/// rectangle in O(1).
pub struct IntegralField {
    nx: usize,
    ny: usize,
    axis_x: PeriodicAxis,
    axis_y: PeriodicAxis,
    /// Row mean of `u` at each `y`, length `ny`.
    u1: Vec<f64>,
    /// Column mean of `v` at each `x`, length `nx`.
    u2: Vec<f64>,
    /// Cumulative deviation of `u` along `x`, row-major `(ny, nx)`.
    w1: Vec<f64>,
    /// Cumulative deviation of `v` along `y`, row-major `(ny, nx)`.
    w2: Vec<f64>,
}

impl IntegralField {
    /// Build the integral field for vector field `(u, v)` of shape
    /// `(ny, nx)` (row-major) on a periodic `nx * ny` grid over lengths
    /// `(lx, ly)`.
    pub fn build(u: &[f64], v: &[f64], nx: usize, ny: usize, lx: f64, ly: f64) -> Self {
        assert_eq!(u.len(), nx * ny);
        assert_eq!(v.len(), nx * ny);
        let axis_x = PeriodicAxis::new(nx, lx);
        let axis_y = PeriodicAxis::new(ny, ly);
        let hx = axis_x.dx();
        let hy = axis_y.dx();

        let mut u1 = vec![0.0; ny];
        for iy in 0..ny {
            let row = &u[iy * nx..(iy + 1) * nx];
            u1[iy] = row.iter().sum::<f64>() / nx as f64;
        }
        let mut u2 = vec![0.0; nx];
        for ix in 0..nx {
            let mut s = 0.0;
            for iy in 0..ny {
                s += v[iy * nx + ix];
            }
            u2[ix] = s / ny as f64;
        }

        let mut w1 = vec![0.0; nx * ny];
        for iy in 0..ny {
            let mean = u1[iy];
            let mut acc = 0.0;
            for ix in 1..nx {
                let f_prev = u[iy * nx + ix - 1] - mean;
                let f_curr = u[iy * nx + ix] - mean;
                acc += hx * 0.5 * (f_prev + f_curr);
                w1[iy * nx + ix] = acc;
            }
        }

        let mut w2 = vec![0.0; nx * ny];
        for ix in 0..nx {
            let mean = u2[ix];
            let mut acc = 0.0;
            for iy in 1..ny {
                let f_prev = v[(iy - 1) * nx + ix] - mean;
                let f_curr = v[iy * nx + ix] - mean;
                acc += hy * 0.5 * (f_prev + f_curr);
                w2[iy * nx + ix] = acc;
            }
        }

        IntegralField { nx, ny, axis_x, axis_y, u1, u2, w1, w2 }
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Circulation of a rectangle rooted at grid index `(i, j)` with
    /// integer size `(rx, ry)` (both may exceed the grid, encoding a
    /// loop that wraps the torus one or more times).
    pub fn circulation_at(&self, i: i64, j: i64, rx: i64, ry: i64) -> f64 {
        let nx = self.nx;
        let (ia, xa) = self.axis_x.wrap(i);
        let (ib, xb) = self.axis_x.wrap(i + rx);
        let (ja, ya) = self.axis_y.wrap(j);
        let (jb, yb) = self.axis_y.wrap(j + ry);

        let ix_ya = self.u1[ja] * (xb - xa) + self.w1[ja * nx + ib] - self.w1[ja * nx + ia];
        let ix_yb = self.u1[jb] * (xb - xa) + self.w1[jb * nx + ib] - self.w1[jb * nx + ia];
        let iy_xa = self.u2[ia] * (yb - ya) + self.w2[jb * nx + ia] - self.w2[ja * nx + ia];
        let iy_xb = self.u2[ib] * (yb - ya) + self.w2[jb * nx + ib] - self.w2[ja * nx + ib];

        ix_ya + iy_xb - ix_yb - iy_xa
    }

    /// Evaluate the circulation field for every grid point as loop
    /// origin, single-threaded.
    pub fn circulation_field(&self, rx: i64, ry: i64, out: &mut [f64]) {
        assert_eq!(out.len(), self.nx * self.ny);
        for j in 0..self.ny {
            for i in 0..self.nx {
                out[j * self.nx + i] = self.circulation_at(i as i64, j as i64, rx, ry);
            }
        }
    }

    /// Same as [`Self::circulation_field`], partitioned by row band
    /// across `pool`'s worker threads.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn circulation_field_parallel(
        &self,
        rx: i64,
        ry: i64,
        out: &mut [f64],
        pool: &mut scoped_threadpool::Pool,
    ) {
        assert_eq!(out.len(), self.nx * self.ny);
        let num_threads = pool.thread_count() as usize;
        if num_threads < 2 {
            return self.circulation_field(rx, ry, out);
        }
        let nx = self.nx;
        let ny = self.ny;
        let chunk_rows = ceil_div(ny, num_threads);
        let chunk_size = chunk_rows * nx;
        let this = &*self;
        pool.scoped(|s| {
            for (t, out_chunk) in out.chunks_mut(chunk_size).enumerate() {
                s.execute(move || {
                    let row_start = t * chunk_rows;
                    for (local_j, row) in out_chunk.chunks_mut(nx).enumerate() {
                        let j = row_start + local_j;
                        for i in 0..nx {
                            row[i] = this.circulation_at(i as i64, j as i64, rx, ry);
                        }
                    }
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn constant_flow_has_zero_circulation() {
        let nx = 8;
        let ny = 8;
        let lx = 2.0 * PI;
        let ly = 2.0 * PI;
        let u = vec![1.0; nx * ny];
        let v = vec![0.0; nx * ny];
        let field = IntegralField::build(&u, &v, nx, ny, lx, ly);
        for rx in 0..nx as i64 {
            for ry in 0..ny as i64 {
                let gamma = field.circulation_at(2, 3, rx, ry);
                assert!(gamma.abs() < 1e-10, "rx={rx} ry={ry} gamma={gamma}");
            }
        }
    }

    #[test]
    fn solid_body_rotation_has_uniform_circulation() {
        let n = 32;
        let l = 2.0 * PI;
        let dx = l / n as f64;
        let mut u = vec![0.0; n * n];
        let mut v = vec![0.0; n * n];
        for iy in 0..n {
            for ix in 0..n {
                let x = ix as f64 * dx;
                let y = iy as f64 * dx;
                u[iy * n + ix] = -(y - PI);
                v[iy * n + ix] = x - PI;
            }
        }
        let field = IntegralField::build(&u, &v, n, n, l, l);
        let r = 5i64;
        let expected = 2.0 * (r as f64 * dx) * (r as f64 * dx);
        for j in 0..n {
            for i in 0..n {
                let gamma = field.circulation_at(i as i64, j as i64, r, r);
                assert!((gamma - expected).abs() < 1e-8, "gamma={gamma} expected={expected}");
            }
        }
    }

    #[test]
    fn full_period_loop_is_zero_for_zero_mean_field() {
        let n = 16;
        let l = 2.0 * PI;
        let mut u = vec![0.0; n * n];
        for iy in 0..n {
            for ix in 0..n {
                u[iy * n + ix] = ((ix as f64) - (n as f64) / 2.0).sin();
            }
        }
        let v = vec![0.0; n * n];
        let field = IntegralField::build(&u, &v, n, n, l, l);
        for j in 0..n {
            let gamma = field.circulation_at(0, j as i64, n as i64, 1);
            assert!(gamma.abs() < 1e-8, "gamma={gamma}");
        }
    }

    #[test]
    fn sum_of_full_period_band_loops_is_zero() {
        let n = 10;
        let l = 10.0;
        let mut u = vec![0.0; n * n];
        let mut v = vec![0.0; n * n];
        for iy in 0..n {
            for ix in 0..n {
                u[iy * n + ix] = (ix as f64 * 0.7 + iy as f64 * 1.3).sin();
                v[iy * n + ix] = (ix as f64 * 0.3 - iy as f64 * 0.9).cos();
            }
        }
        let field = IntegralField::build(&u, &v, n, n, l, l);
        let ry = 3i64;
        let mut total = 0.0;
        for j in 0..n {
            total += field.circulation_at(0, j as i64, n as i64, ry);
        }
        assert!(total.abs() < 1e-8, "total={total}");
    }
}
