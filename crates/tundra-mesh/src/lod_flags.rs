//! Per-edge LOD mismatch bitfield.

use std::fmt;

/// A cardinal edge of a chunk. The discriminant is the nibble index in [`LodFlags`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// +Y edge (last grid row).
    North = 0,
    /// +X edge (last grid column).
    East = 1,
    /// -Y edge (grid row 0).
    South = 2,
    /// -X edge (grid column 0).
    West = 3,
}

impl Edge {
    /// All four edges in nibble order.
    pub const ALL: [Edge; 4] = [Edge::North, Edge::East, Edge::South, Edge::West];
}

/// Four 4-bit values, one per [`Edge`], each the log2 step-size mismatch versus the
/// neighbor across that edge. Zero everywhere means no stitching is needed.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LodFlags(u16);

impl LodFlags {
    /// No mismatch on any edge.
    pub const NONE: Self = Self(0);

    /// Create from the packed representation.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// The packed representation.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Mismatch on one edge.
    pub const fn delta(self, edge: Edge) -> u8 {
        ((self.0 >> (4 * edge as u16)) & 0xf) as u8
    }

    /// Replace the mismatch on one edge. Deltas above 15 are a caller bug.
    pub fn with_delta(self, edge: Edge, delta: u8) -> Self {
        assert!(delta <= 0xf, "LOD delta {delta} does not fit in 4 bits");
        let shift = 4 * edge as u16;
        Self((self.0 & !(0xf << shift)) | ((delta as u16) << shift))
    }

    /// Build flags from the LOD of this chunk and its four neighbors.
    ///
    /// Only coarser neighbors produce a mismatch; `None` means the neighbor is not
    /// loaded and is treated as the same LOD.
    pub fn from_neighbor_lods(own_lod: u8, neighbors: [Option<u8>; 4]) -> Self {
        Edge::ALL
            .iter()
            .zip(neighbors)
            .fold(Self::NONE, |flags, (&edge, neighbor)| {
                let delta = neighbor.map_or(0, |lod| lod.saturating_sub(own_lod));
                flags.with_delta(edge, delta.min(0xf))
            })
    }

    /// Whether any edge needs stitching.
    pub const fn any(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for LodFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LodFlags(n={}, e={}, s={}, w={})",
            self.delta(Edge::North),
            self.delta(Edge::East),
            self.delta(Edge::South),
            self.delta(Edge::West)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nibble_layout() {
        let flags = LodFlags::NONE
            .with_delta(Edge::North, 1)
            .with_delta(Edge::East, 2)
            .with_delta(Edge::South, 3)
            .with_delta(Edge::West, 4);
        assert_eq!(flags.bits(), 0x4321);
        assert_eq!(flags.delta(Edge::South), 3);
    }

    #[test]
    fn test_with_delta_replaces_existing() {
        let flags = LodFlags::from_bits(0x0f00).with_delta(Edge::South, 1);
        assert_eq!(flags.bits(), 0x0100);
    }

    #[test]
    fn test_from_neighbor_lods_ignores_finer_neighbors() {
        let flags = LodFlags::from_neighbor_lods(2, [Some(3), Some(1), None, Some(4)]);
        assert_eq!(flags.delta(Edge::North), 1);
        assert_eq!(flags.delta(Edge::East), 0);
        assert_eq!(flags.delta(Edge::South), 0);
        assert_eq!(flags.delta(Edge::West), 2);
        assert!(flags.any());
        assert!(!LodFlags::from_neighbor_lods(1, [Some(1); 4]).any());
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_oversized_delta_panics() {
        LodFlags::NONE.with_delta(Edge::East, 16);
    }

    #[test]
    fn test_debug_format() {
        let flags = LodFlags::NONE.with_delta(Edge::South, 1);
        assert_eq!(format!("{flags:?}"), "LodFlags(n=0, e=0, s=1, w=0)");
    }
}
