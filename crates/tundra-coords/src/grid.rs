//! Grid quantization helpers.
//!
//! Distances used for subdivision and weight tiers are measured on the chunk grid rather
//! than as circular distance: both the player and the chunk are snapped to the grid of
//! chunks of the same size and the Chebyshev step count is taken. This keeps every chunk
//! of one ring at the same distance, so decisions never differ between two chunks that
//! are equally far from the player's chunk.

use glam::{I64Vec2, Vec2, Vec3};

/// Convert a z-up world position to a horizontal cell-space coordinate.
pub fn world_to_cells(world: Vec3, cell_world_size: f32) -> Vec2 {
    debug_assert!(cell_world_size > 0.0, "cell size must be positive");
    Vec2::new(world.x, world.y) / cell_world_size
}

/// Index of the chunk of size `chunk_size` (in cells) that contains `cells`.
pub fn chunk_grid_index(cells: Vec2, chunk_size: f32) -> I64Vec2 {
    debug_assert!(chunk_size > 0.0, "chunk size must be positive");
    I64Vec2::new(
        (cells.x as f64 / chunk_size as f64).floor() as i64,
        (cells.y as f64 / chunk_size as f64).floor() as i64,
    )
}

/// Grid-quantized distance, in cells, between a chunk and a point.
///
/// Returns `0.0` when the point lies inside the chunk, `chunk_size` for the
/// eight surrounding chunks, `2 × chunk_size` for the next ring, and so on.
pub fn grid_distance(chunk_center: Vec2, chunk_size: f32, point_cells: Vec2) -> f32 {
    let chunk = chunk_grid_index(chunk_center, chunk_size);
    let point = chunk_grid_index(point_cells, chunk_size);
    let delta = (chunk - point).abs();
    delta.x.max(delta.y) as f32 * chunk_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inside_chunk_is_zero() {
        let d = grid_distance(Vec2::new(0.5, 0.5), 1.0, Vec2::new(0.9, 0.1));
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_ring_distance_is_chebyshev() {
        let center = Vec2::new(0.0625, 0.0625);
        // Diagonal neighbour and straight neighbour are the same distance.
        let diag = grid_distance(center, 0.125, Vec2::new(0.2, 0.2));
        let straight = grid_distance(center, 0.125, Vec2::new(0.2, 0.05));
        assert_eq!(diag, 0.125);
        assert_eq!(straight, 0.125);
        assert_eq!(grid_distance(center, 0.125, Vec2::new(-0.2, 0.3)), 0.25);
    }

    #[test]
    fn test_negative_coordinates() {
        let d = grid_distance(Vec2::new(-0.5, -0.5), 1.0, Vec2::new(0.5, 0.5));
        assert_eq!(d, 1.0);
        assert_eq!(chunk_grid_index(Vec2::new(-0.01, 0.0), 1.0), I64Vec2::new(-1, 0));
    }

    #[test]
    fn test_world_to_cells() {
        let cells = world_to_cells(Vec3::new(8192.0, -4096.0, 300.0), 8192.0);
        assert_eq!(cells, Vec2::new(1.0, -0.5));
    }
}
