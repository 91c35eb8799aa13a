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

//! Spectral loop kernels: the Fourier-space matrix `g_hat` such that
//! convolving a vorticity field with the physical-space loop indicator
//! is equivalent to pointwise multiplication by `g_hat`.

use crate::grid::{fft_modes, sinc};

/// Shape and size of a circulation loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoopShape {
    /// Axis-aligned rectangle of size `(rx, ry)`.
    Rectangle { rx: f64, ry: f64 },
    /// Ellipse (disk for `dx == dy`) of diameters `(dx, dy)`.
    Ellipse { dx: f64, dy: f64 },
}

/// `J1norm(x) = 2*J1(pi*x)/(pi*x)`, `J1norm(0) = 1` exactly.
pub fn j1_norm(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let arg = std::f64::consts::PI * x;
        2.0 * bessel_j1(arg) / arg
    }
}

/// First-order Bessel function of the first kind.
///
/// Abramowitz & Stegun rational-polynomial approximation.
fn bessel_j1(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 8.0 {
        let y = x * x;
        let r1 = x
            * (72362614232.0
                + y * (-7895059235.0
                    + y * (242396853.1 + y * (-2972611.439 + y * (15704.48260 + y * (-30.16036606))))));
        let r2 = 144725228442.0
            + y * (2300535178.0 + y * (18583304.74 + y * (99447.43394 + y * (376.9991397 + y))));
        r1 / r2
    } else {
        let z = 8.0 / ax;
        let y = z * z;
        const FRAC_3PI_4: f64 = 3.0 * std::f64::consts::FRAC_PI_4;
        let xx = ax - FRAC_3PI_4;
        let p0 = 1.0
            + y * (0.183105e-2 + y * (-0.3516396496e-4 + y * (0.2457520174e-5 + y * (-0.240337019e-6))));
        let q0 = 0.04687499995
            + y * (-0.2002690873e-3 + y * (0.8449199096e-5 + y * (-0.88228987e-6 + y * (0.105787412e-6))));
        let ans = (std::f64::consts::FRAC_2_PI / ax).sqrt() * (xx.cos() * p0 - z * xx.sin() * q0);
        if x < 0.0 {
            -ans
        } else {
            ans
        }
    }
}

/// Materialise `g_hat` for `shape` on an `nx * ny` slice (row-major
/// `(ny, nx)` layout matching [`crate::fft::Fft2D`]'s spectral output),
/// over physical lengths `(lx, ly)`.
pub fn materialise(shape: LoopShape, nx: usize, ny: usize, lx: f64, ly: f64) -> Vec<f64> {
    let modes_x = fft_modes(nx);
    let modes_y = fft_modes(ny);
    let mut g = vec![0.0; nx * ny];
    match shape {
        LoopShape::Rectangle { rx, ry } => {
            let a = rx * ry;
            for (iy, &my) in modes_y.iter().enumerate() {
                let sy = sinc(my as f64 * ry / ly);
                for (ix, &mx) in modes_x.iter().enumerate() {
                    let sx = sinc(mx as f64 * rx / lx);
                    g[iy * nx + ix] = a * sx * sy;
                }
            }
        }
        LoopShape::Ellipse { dx, dy } => {
            let a = std::f64::consts::PI * dx * dy / 4.0;
            for (iy, &my) in modes_y.iter().enumerate() {
                for (ix, &mx) in modes_x.iter().enumerate() {
                    let kx = mx as f64 * dx / lx;
                    let ky = my as f64 * dy / ly;
                    let k = (kx * kx + ky * ky).sqrt();
                    g[iy * nx + ix] = a * j1_norm(k);
                }
            }
        }
    }
    g
}
