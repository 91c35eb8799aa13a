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

//! TOML-driven run configuration, with `$VAR` environment substitution.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CirculationError, Result};
use crate::kernels::LoopShape;
use crate::stats::QuantityTag;

/// Which kind of analysis a run performs. Mutually exclusive: a config
/// naming both is an [`CirculationError::InvalidConfig`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Circulation,
    Increments,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum QuantityName {
    Velocity,
    RegVelocity,
    Momentum,
}

impl From<&QuantityName> for QuantityTag {
    fn from(q: &QuantityName) -> QuantityTag {
        match q {
            QuantityName::Velocity => QuantityTag::Velocity,
            QuantityName::RegVelocity => QuantityTag::RegVelocity,
            QuantityName::Momentum => QuantityTag::Momentum,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum LoopShapeConfig {
    Rectangle,
    Ellipse,
}

/// Domain section of the configuration file: resolution, physical
/// lengths and the two GP physical scalars.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct DomainConfig {
    pub dims: usize,
    pub n: Vec<usize>,
    pub l: Vec<f64>,
    pub c: f64,
    pub xi: f64,
    #[serde(default)]
    pub eps: f64,
}

/// Top-level run configuration, deserialised from a TOML document.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    pub input_dir: String,
    pub timestep_start: usize,
    pub timestep_end: usize,
    pub domain: DomainConfig,
    pub analysis: AnalysisKind,
    pub quantities: Vec<QuantityName>,
    pub loop_sizes: Vec<usize>,
    pub loop_shape: LoopShapeConfig,
    pub histogram_bins: usize,
    pub histogram_min: f64,
    pub histogram_max: f64,
    pub moment_orders: usize,
    #[serde(default = "default_resample_factor")]
    pub resample_factor: usize,
    #[serde(default)]
    pub threads: Option<usize>,
    pub output_path: String,
}

fn default_resample_factor() -> usize {
    1
}

impl Config {
    /// Load and validate a configuration from a TOML file on disk,
    /// substituting `$VAR` placeholders against the process environment
    /// before any numeric/path field is parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse a configuration from an in-memory TOML document (used
    /// directly by tests, and by [`Self::load`]).
    pub fn parse(raw: &str) -> Result<Self> {
        let substituted = substitute_env(raw);
        let config: Config = toml::from_str(&substituted)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.quantities.is_empty() {
            return Err(CirculationError::InvalidConfig("no quantities selected".into()));
        }
        if self.loop_sizes.is_empty() {
            return Err(CirculationError::InvalidConfig("no loop sizes configured".into()));
        }
        if self.moment_orders == 0 {
            return Err(CirculationError::InvalidConfig("moment_orders must be at least 1".into()));
        }
        if !self.resample_factor.is_power_of_two() {
            return Err(CirculationError::InvalidConfig(format!(
                "resample_factor must be a power of two, got {}",
                self.resample_factor
            )));
        }
        Ok(())
    }

    /// Worker-thread count: explicit config key, else `CIRCULATION_THREADS`,
    /// else 1.
    pub fn thread_count(&self) -> usize {
        if let Some(n) = self.threads {
            return n.max(1);
        }
        env::var("CIRCULATION_THREADS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1)
            .max(1)
    }

    /// Turn a grid-index loop size `r` into a physical-length [`LoopShape`],
    /// given the grid spacing `(grid_dx, grid_dy)` of the slice it will be
    /// evaluated on. `LoopShape`'s fields are physical lengths (the kernel
    /// formulas in `kernels::materialise` divide by `lx`/`ly`), so `r` must
    /// be scaled by the spacing, not used directly.
    pub fn loop_shape_for(&self, r: usize, grid_dx: f64, grid_dy: f64) -> LoopShape {
        let r = r as f64;
        match self.loop_shape {
            LoopShapeConfig::Rectangle => LoopShape::Rectangle { rx: r * grid_dx, ry: r * grid_dy },
            LoopShapeConfig::Ellipse => LoopShape::Ellipse { dx: r * grid_dx, dy: r * grid_dy },
        }
    }
}

/// Replace every `$VAR` substring with the value of the environment
/// variable `VAR`, leaving unknown variables untouched.
fn substitute_env(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();
    let bytes = raw.as_bytes();
    while let Some((i, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && (bytes[end] as char).is_ascii_alphanumeric() || end < bytes.len() && bytes[end] == b'_' {
            end += 1;
        }
        if end == start {
            out.push('$');
            continue;
        }
        let name = &raw[start..end];
        match env::var(name) {
            Ok(value) => out.push_str(&value),
            Err(_) => {
                out.push('$');
                out.push_str(name);
            }
        }
        for _ in start..end {
            chars.next();
        }
    }
    out
}
