//! Cell-space coordinates for terrain chunks: fixed-point chunk centers and grid-quantized distances.
//!
//! Terrain is addressed in *cell units*: one cell is the square area covered by one
//! heightfield tile. Chunks are power-of-two fractions or multiples of a cell, so their
//! centers are exact binary fractions. [`ChunkCenter`] stores them in fixed point so they
//! can be hashed and totally ordered without float comparison.

mod center;
mod grid;

pub use center::{ChunkCenter, SUBCELL_BITS, SUBCELL_SCALE};
pub use grid::{chunk_grid_index, grid_distance, world_to_cells};
