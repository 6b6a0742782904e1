//! Cache keys and the request that produces them.

use std::fmt;

use glam::{Vec2, Vec3};
use tundra_coords::ChunkCenter;
use tundra_mesh::LodFlags;

/// Identifies one cached geometry variant.
///
/// The chunk size is implied: a center of a chunk of size `s` is an odd multiple of
/// `s / 2`, so no two sizes share a center.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkKey {
    pub center: ChunkCenter,
    pub lod: u8,
    pub lod_flags: LodFlags,
    pub subdivision_level: u8,
}

impl ChunkKey {
    /// The variant-independent part of the key.
    pub fn template(&self) -> TemplateKey {
        TemplateKey {
            center: self.center,
            lod: self.lod,
        }
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} lod {} {:?} sub {}",
            self.center, self.lod, self.lod_flags, self.subdivision_level
        )
    }
}

/// Chunks with the same template key sample identical heightfield data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateKey {
    pub center: ChunkCenter,
    pub lod: u8,
}

/// Everything the renderer knows about a chunk it wants to draw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkRequest {
    /// Edge length in cells.
    pub chunk_size: f32,
    /// Center in cells.
    pub center: Vec2,
    pub lod: u8,
    pub lod_flags: LodFlags,
    /// Whether the chunk belongs to the active grid around the player. Only those subdivide.
    pub active_grid: bool,
    /// Camera position in world units.
    pub viewpoint: Vec3,
    /// The chunk is about to be drawn; collaborator work should not be deferred.
    pub compile: bool,
}

impl ChunkRequest {
    /// A request with no stitching, outside the active grid, viewed from the origin.
    pub fn new(chunk_size: f32, center: Vec2, lod: u8) -> Self {
        Self {
            chunk_size,
            center,
            lod,
            lod_flags: LodFlags::NONE,
            active_grid: false,
            viewpoint: Vec3::ZERO,
            compile: false,
        }
    }

    pub fn with_lod_flags(mut self, lod_flags: LodFlags) -> Self {
        self.lod_flags = lod_flags;
        self
    }

    pub fn with_active_grid(mut self, active_grid: bool) -> Self {
        self.active_grid = active_grid;
        self
    }

    pub fn with_viewpoint(mut self, viewpoint: Vec3) -> Self {
        self.viewpoint = viewpoint;
        self
    }

    pub fn with_compile(mut self, compile: bool) -> Self {
        self.compile = compile;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tundra_mesh::Edge;

    #[test]
    fn test_template_ignores_variant_fields() {
        let center = ChunkCenter::from_cells(Vec2::new(0.25, 0.75));
        let a = ChunkKey {
            center,
            lod: 2,
            lod_flags: LodFlags::NONE,
            subdivision_level: 0,
        };
        let b = ChunkKey {
            lod_flags: LodFlags::NONE.with_delta(Edge::West, 1),
            subdivision_level: 3,
            ..a
        };
        assert_ne!(a, b);
        assert_eq!(a.template(), b.template());
    }

    #[test]
    fn test_keys_order_by_center_first() {
        let key = |x: f32, lod| ChunkKey {
            center: ChunkCenter::from_cells(Vec2::new(x, 0.5)),
            lod,
            lod_flags: LodFlags::NONE,
            subdivision_level: 0,
        };
        let mut keys = vec![key(1.5, 0), key(0.5, 3), key(0.5, 1)];
        keys.sort();
        assert_eq!(keys, vec![key(0.5, 1), key(0.5, 3), key(1.5, 0)]);
    }
}
