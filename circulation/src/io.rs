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

//! Byte-source abstraction for reading field files, and slice assembly
//! from the column-major on-disk layout into this crate's row-major
//! in-memory layout.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use num_complex::Complex64;

use crate::error::{CirculationError, Result};

/// A read-only source of bytes, the size of which is known up front.
/// Abstracts over memory-mapped files so tests can exercise the same
/// size-validation and assembly logic against an in-memory buffer.
pub trait ByteSource {
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn bytes(&self) -> &[u8];
}

/// Memory-mapped field file.
pub struct MmapByteSource {
    mmap: Mmap,
}

impl MmapByteSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // Safety: the mapping is read-only and the file is not expected to be
        // mutated concurrently by another process during a pipeline run.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(MmapByteSource { mmap })
    }
}

impl ByteSource for MmapByteSource {
    fn len(&self) -> usize {
        self.mmap.len()
    }

    fn bytes(&self) -> &[u8] {
        &self.mmap
    }
}

/// In-memory stand-in for [`MmapByteSource`], used by tests.
pub struct InMemoryByteSource {
    data: Vec<u8>,
}

impl InMemoryByteSource {
    pub fn new(data: Vec<u8>) -> Self {
        InMemoryByteSource { data }
    }
}

impl ByteSource for InMemoryByteSource {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

fn check_size(source: &dyn ByteSource, n_cells: usize, label: &str) -> Result<()> {
    let expected = n_cells * std::mem::size_of::<f64>();
    if source.len() != expected {
        return Err(CirculationError::DimensionMismatch(format!(
            "{label}: expected {expected} bytes for {n_cells} cells, got {}",
            source.len()
        )));
    }
    Ok(())
}

/// Read `n_cells` native-endian `f64`s from `source`, validating the
/// byte length up front.
fn read_f64_column_major(source: &dyn ByteSource, n_cells: usize, label: &str) -> Result<Vec<f64>> {
    check_size(source, n_cells, label)?;
    let bytes = source.bytes();
    let mut out = Vec::with_capacity(n_cells);
    for chunk in bytes.chunks_exact(8) {
        let arr: [u8; 8] = chunk.try_into().unwrap();
        out.push(f64::from_ne_bytes(arr));
    }
    Ok(out)
}

/// Swap a column-major `(nx, ny)` array (on-disk layout, fastest-varying
/// index first as read) into this crate's row-major `(ny, nx)` layout.
fn column_major_to_row_major(src: &[f64], nx: usize, ny: usize) -> Vec<f64> {
    assert_eq!(src.len(), nx * ny);
    let mut dst = vec![0.0; nx * ny];
    for iy in 0..ny {
        for ix in 0..nx {
            // On disk: index = ix + iy*nx (column-major, x fastest).
            dst[iy * nx + ix] = src[ix + iy * nx];
        }
    }
    dst
}

/// Assemble a complex wave-function slice from two column-major
/// real/imaginary byte sources into a row-major `(ny, nx)` buffer.
pub fn assemble_psi_slice(real: &dyn ByteSource, imag: &dyn ByteSource, nx: usize, ny: usize) -> Result<Vec<Complex64>> {
    let n = nx * ny;
    let re = read_f64_column_major(real, n, "ReaPsi")?;
    let im = read_f64_column_major(imag, n, "ImaPsi")?;
    let re = column_major_to_row_major(&re, nx, ny);
    let im = column_major_to_row_major(&im, nx, ny);
    Ok(re.into_iter().zip(im).map(|(r, i)| Complex64::new(r, i)).collect())
}

/// Assemble a single real scalar field (velocity component or
/// dissipation) from a column-major byte source into row-major layout.
pub fn assemble_scalar_slice(source: &dyn ByteSource, nx: usize, ny: usize, label: &str) -> Result<Vec<f64>> {
    let n = nx * ny;
    let data = read_f64_column_major(source, n, label)?;
    Ok(column_major_to_row_major(&data, nx, ny))
}
