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

//! Small threading helpers shared by the circulation sweep and the
//! statistics shard update.

/// `ceil(x / y)` for `x > 0`.
pub(crate) fn ceil_div(x: usize, y: usize) -> usize {
    assert!(x > 0);
    1 + (x - 1) / y
}

/// Worker-thread pool used for both the circulation-field sweep and the
/// statistics shard update. A thin alias over `scoped_threadpool::Pool`
/// so the rest of the crate doesn't need to name it directly.
#[cfg(not(target_arch = "wasm32"))]
pub type WorkerPool = scoped_threadpool::Pool;

#[cfg(not(target_arch = "wasm32"))]
pub fn new_pool(num_threads: usize) -> WorkerPool {
    scoped_threadpool::Pool::new(num_threads.max(1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceil_div_rounds_up() {
        assert_eq!(ceil_div(10, 3), 4);
        assert_eq!(ceil_div(9, 3), 3);
        assert_eq!(ceil_div(1, 3), 1);
    }
}
