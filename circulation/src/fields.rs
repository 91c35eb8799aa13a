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

//! Derivation of density, momentum, regularised velocity and velocity
//! from a complex wave function on a 2D periodic slice.

use itertools::izip;
use num_complex::Complex64;

use crate::error::{CirculationError, Result};
use crate::fft::{Axis2, Fft2D};
use crate::grid::wavenumbers_complex;

/// Owns the FFT plans and scratch buffers needed to differentiate a
/// wave function slice along either axis. Constructed once per slice
/// shape and reused across every slice of a pipeline run.
pub struct FieldDeriver {
    fft: Fft2D,
    kx: Vec<f64>,
    ky: Vec<f64>,
    alpha: f64,
    buf: Vec<Complex64>,
    scratch: Vec<Complex64>,
    tbuf: Vec<Complex64>,
}

impl FieldDeriver {
    /// `c` is the sound speed, `xi` the healing length; `alpha = c * xi * sqrt(2)`
    /// is the prefactor in `p_n = alpha * Im(conj(psi) * d(psi)/dx_n)`.
    pub fn new(nx: usize, ny: usize, lx: f64, ly: f64, c: f64, xi: f64) -> Self {
        let fft = Fft2D::new(nx, ny);
        let kx = wavenumbers_complex(nx, lx);
        let ky = wavenumbers_complex(ny, ly);
        let scratch = vec![Complex64::new(0.0, 0.0); fft.scratch_len()];
        let tbuf = vec![Complex64::new(0.0, 0.0); nx * ny];
        let buf = vec![Complex64::new(0.0, 0.0); nx * ny];
        FieldDeriver {
            fft,
            kx,
            ky,
            alpha: c * xi * std::f64::consts::SQRT_2,
            buf,
            scratch,
            tbuf,
        }
    }

    pub fn nx(&self) -> usize {
        self.fft.nx()
    }

    pub fn ny(&self) -> usize {
        self.fft.ny()
    }

    /// `rho[i] = |psi[i]|^2`.
    pub fn density(&self, psi: &[Complex64], rho_out: &mut [f64]) {
        for (r, p) in rho_out.iter_mut().zip(psi.iter()) {
            *r = p.norm_sqr();
        }
    }

    /// Single momentum component along `axis` via Fourier differentiation.
    pub fn momentum_component(&mut self, psi: &[Complex64], axis: Axis2, p_out: &mut [f64]) {
        let nx = self.fft.nx();
        let ny = self.fft.ny();
        self.buf.copy_from_slice(psi);
        self.fft.forward_axis(&mut self.buf, axis, &mut self.scratch, &mut self.tbuf);
        let i = Complex64::new(0.0, 1.0);
        match axis {
            Axis2::X => {
                for iy in 0..ny {
                    for ix in 0..nx {
                        self.buf[iy * nx + ix] *= i * self.kx[ix];
                    }
                }
            }
            Axis2::Y => {
                for iy in 0..ny {
                    for ix in 0..nx {
                        self.buf[iy * nx + ix] *= i * self.ky[iy];
                    }
                }
            }
        }
        self.fft.inverse_axis(&mut self.buf, axis, &mut self.scratch, &mut self.tbuf);
        let n_axis = match axis {
            Axis2::X => nx,
            Axis2::Y => ny,
        };
        let norm = 1.0 / n_axis as f64;
        for (p, psi_i, buf_i) in izip!(p_out.iter_mut(), psi.iter(), self.buf.iter()) {
            *p = self.alpha * (psi_i.conj() * buf_i * norm).im;
        }
    }

    /// Both momentum components at once.
    pub fn momentum(&mut self, psi: &[Complex64], px_out: &mut [f64], py_out: &mut [f64]) {
        self.momentum_component(psi, Axis2::X, px_out);
        self.momentum_component(psi, Axis2::Y, py_out);
    }
}

/// Regularised velocity `v_n = p_n / sqrt(rho)`.
pub fn regularised_velocity(p: &[f64], rho: &[f64], v_out: &mut [f64]) {
    for (v, &pn, &r) in izip!(v_out.iter_mut(), p.iter(), rho.iter()) {
        *v = pn * r.sqrt().recip();
    }
}

/// Velocity `v_n = p_n / (rho + eps)`.
///
/// When `eps == 0.0` and a cell has exactly `rho == 0.0`, this is a
/// genuine division by zero; rather than propagate `NaN`/`inf` into the
/// statistics this returns [`CirculationError::NumericDomain`].
pub fn velocity(p: &[f64], rho: &[f64], eps: f64, v_out: &mut [f64]) -> Result<()> {
    for (i, (v, &pn, &r)) in izip!(v_out.iter_mut(), p.iter(), rho.iter()).enumerate() {
        let denom = r + eps;
        if denom == 0.0 {
            return Err(CirculationError::NumericDomain(format!(
                "zero density with eps=0 at cell {i}"
            )));
        }
        *v = pn / denom;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn density_matches_norm_sqr() {
        let psi = vec![Complex64::new(3.0, 4.0), Complex64::new(0.0, 0.0)];
        let mut rho = vec![0.0; 2];
        let deriver = FieldDeriver::new(2, 1, 2.0 * PI, 2.0 * PI, 1.0, 1.0);
        deriver.density(&psi, &mut rho);
        assert_eq!(rho[0], 25.0);
        assert_eq!(rho[1], 0.0);
    }

    #[test]
    fn momentum_of_plane_wave_is_constant() {
        // psi(x,y) = exp(i*x): d/dx psi = i*psi, so
        // p_x = alpha * Im(conj(psi) * i * psi) = alpha * |psi|^2 = alpha
        let nx = 16;
        let ny = 8;
        let lx = 2.0 * PI;
        let ly = 2.0 * PI;
        let dx = lx / nx as f64;
        let c = 1.0;
        let xi = 1.0;
        let mut psi = vec![Complex64::new(0.0, 0.0); nx * ny];
        for iy in 0..ny {
            for ix in 0..nx {
                let x = ix as f64 * dx;
                psi[iy * nx + ix] = Complex64::new(x.cos(), x.sin());
            }
        }
        let mut deriver = FieldDeriver::new(nx, ny, lx, ly, c, xi);
        let mut px = vec![0.0; nx * ny];
        let mut py = vec![0.0; nx * ny];
        deriver.momentum(&psi, &mut px, &mut py);
        let alpha = c * xi * std::f64::consts::SQRT_2;
        for &v in &px {
            assert!((v - alpha).abs() < 1e-8, "got {v}, expected {alpha}");
        }
        for &v in &py {
            assert!(v.abs() < 1e-8);
        }
    }

    #[test]
    fn velocity_rejects_zero_density_zero_eps() {
        let p = vec![1.0];
        let rho = vec![0.0];
        let mut v = vec![0.0];
        assert!(velocity(&p, &rho, 0.0, &mut v).is_err());
    }

    #[test]
    fn velocity_with_eps_avoids_division_by_zero() {
        let p = vec![1.0];
        let rho = vec![0.0];
        let mut v = vec![0.0];
        velocity(&p, &rho, 1e-6, &mut v).unwrap();
        assert!((v[0] - 1e6).abs() < 1.0);
    }
}
