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

//! Error hierarchy shared by every component of the pipeline.

use thiserror::Error;

/// A failure anywhere in grid setup, field derivation, circulation
/// evaluation, statistics accumulation or serialisation.
#[derive(Debug, Error)]
pub enum CirculationError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    #[error("stats accumulator already finalised")]
    UseAfterFinalise,

    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, CirculationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_offending_value() {
        let err = CirculationError::DimensionMismatch("expected 64 bytes, got 48".into());
        assert_eq!(err.to_string(), "dimension mismatch: expected 64 bytes, got 48");
    }

    #[test]
    fn use_after_finalise_has_a_fixed_message() {
        let err = CirculationError::UseAfterFinalise;
        assert_eq!(err.to_string(), "stats accumulator already finalised");
    }
}
