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

//! Immutable domain parameters shared by every component of a pipeline run.

use std::f64::consts::SQRT_2;

/// Physical and grid parameters of a 2D working slice. Dimensionality
/// of the underlying simulation may be 2 or 3, but every analysis runs
/// on a 2D plane after slicing, so this record only ever carries the
/// two kept axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DomainParams {
    nx: usize,
    ny: usize,
    lx: f64,
    ly: f64,
    c: f64,
    xi: f64,
}

impl DomainParams {
    pub fn new(nx: usize, ny: usize, lx: f64, ly: f64, c: f64, xi: f64) -> Self {
        assert!(nx > 0 && ny > 0, "grid resolution must be positive");
        assert!(lx > 0.0 && ly > 0.0, "domain lengths must be positive");
        DomainParams { nx, ny, lx, ly, c, xi }
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn lx(&self) -> f64 {
        self.lx
    }

    pub fn ly(&self) -> f64 {
        self.ly
    }

    pub fn dx(&self) -> f64 {
        self.lx / self.nx as f64
    }

    pub fn dy(&self) -> f64 {
        self.ly / self.ny as f64
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn xi(&self) -> f64 {
        self.xi
    }

    /// Quantum of circulation `kappa = 2*pi*xi*c*sqrt(2)`.
    pub fn kappa(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.xi * self.c * SQRT_2
    }
}
