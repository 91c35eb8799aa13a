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

//! Statistics of velocity circulation around closed loops in 2D slices
//! of Gross-Pitaevskii wave-function fields.
//!
//! The crate is organised bottom-up: [`grid`] and [`fft`] provide
//! periodic-grid and spectral primitives; [`kernels`], [`fields`],
//! [`resample`], [`integral_field`] and [`convolution`] build the
//! circulation evaluation paths on top of them; [`stats`] accumulates
//! moments and histograms over the resulting circulation fields; and
//! [`pipeline`] drives the whole thing slice by slice, reading
//! configuration from [`config`] and writing results via [`output`].

pub mod config;
pub mod convolution;
pub mod error;
pub mod fft;
pub mod fields;
pub mod grid;
pub mod integral_field;
pub mod io;
pub mod kernels;
pub mod output;
pub mod params;
pub mod pipeline;
pub mod resample;
pub mod stats;
pub mod threads;

pub use error::{CirculationError, Result};
pub use params::DomainParams;
