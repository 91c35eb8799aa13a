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

//! Periodic grid metadata, wavenumber sequences and wrap-around indexing.

use std::f64::consts::PI;

/// A single periodic axis: `n` equally spaced nodes covering physical
/// length `l`, node `i` sitting at `i * dx`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodicAxis {
    n: usize,
    l: f64,
}

impl PeriodicAxis {
    pub fn new(n: usize, l: f64) -> Self {
        assert!(n > 0, "axis must have at least one grid point");
        PeriodicAxis { n, l }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn l(&self) -> f64 {
        self.l
    }

    pub fn dx(&self) -> f64 {
        self.l / self.n as f64
    }

    /// Physical coordinate of node `i` without any wrap bookkeeping.
    pub fn x(&self, i: usize) -> f64 {
        i as f64 * self.dx()
    }

    /// Map a possibly out-of-range integer index to a valid node index
    /// `i' in 0..n` plus the true (unwrapped) physical coordinate.
    ///
    /// `x0 = k * l` tracks how many periods were crossed, so
    /// `wrap(i + k*n) == (i, k*l + x(i))`.
    pub fn wrap(&self, i: i64) -> (usize, f64) {
        let n = self.n as i64;
        let mut i = i;
        let mut x0 = 0.0;
        while i < 0 {
            i += n;
            x0 -= self.l;
        }
        while i >= n {
            i -= n;
            x0 += self.l;
        }
        (i as usize, x0 + self.x(i as usize))
    }
}

/// Signed FFT mode indices in standard `rustfft`/numpy bin order:
/// `0, 1, ..., n/2-1, -n/2, ..., -1`. The Nyquist bin (even `n`) carries
/// the negative sign by convention.
pub fn fft_modes(n: usize) -> Vec<i64> {
    assert!(n % 2 == 0, "axis length must be even, got {n}");
    let half = (n / 2) as i64;
    (0..n as i64)
        .map(|j| {
            if j < half {
                j
            } else if j == half {
                -half
            } else {
                j - n as i64
            }
        })
        .collect()
}

/// Two-sided wavenumber sequence for a complex-to-complex FFT of length
/// `n` over physical length `l`: positive frequencies first, then
/// negative, with the Nyquist bin (even `n`) carrying the negative sign
/// by convention.
pub fn wavenumbers_complex(n: usize, l: f64) -> Vec<f64> {
    let dk = 2.0 * PI / l;
    fft_modes(n).into_iter().map(|m| m as f64 * dk).collect()
}

/// One-sided non-negative wavenumber sequence for a real-to-complex FFT
/// of length `n` (output length `n/2 + 1`).
pub fn wavenumbers_real(n: usize, l: f64) -> Vec<f64> {
    assert!(n % 2 == 0, "axis length must be even, got {n}");
    let dk = 2.0 * PI / l;
    (0..=(n / 2)).map(|j| j as f64 * dk).collect()
}

/// `sinc(x) = sin(pi*x)/(pi*x)`, `sinc(0) = 1` exactly.
pub fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}
