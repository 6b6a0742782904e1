//! Index generation for a square vertex grid with per-edge LOD stitching.
//!
//! Vertex `(col, row)` of an `N × N` grid has index `col * N + row`. Row 0 is the south
//! edge, column 0 the west edge.
//!
//! With no mismatch the whole grid is covered by a diamond triangulation: the diagonal of
//! each quad flips with `(row + col) % 2`, so no direction is favoured. With any mismatch
//! the outer ring of quads is left out of the uniform interior and each edge is fanned
//! separately: the outer row uses only every `2^delta`-th vertex, and fans connect those
//! coarse vertices to the full-resolution inner ring. Every vertex a coarser neighbor
//! samples on the shared edge is therefore also a vertex of this chunk's edge, and no
//! vertex the neighbor skips is used, so the seam has no T-junctions.
//!
//! Corner quads are shared between two edges. Each edge's fan skips the inner-ring
//! vertices next to the corners, and the adjoining edge covers them instead.

use crate::{Edge, LodFlags};

/// Index of vertex `(col, row)` in a grid with `verts` vertices per side.
#[inline]
pub fn grid_vertex(verts: u32, col: u32, row: u32) -> u32 {
    verts * col + row
}

/// Receives the primitives of a triangulation.
trait PrimitiveSink {
    /// A full grid quad, corners counter-clockwise from bottom-left.
    fn quad(&mut self, corners: [u32; 4], flip: bool);
    /// A stitching triangle, counter-clockwise.
    fn triangle(&mut self, a: u32, b: u32, c: u32);
}

struct TriangleSink(Vec<u32>);

impl PrimitiveSink for TriangleSink {
    fn quad(&mut self, [bl, br, tr, tl]: [u32; 4], flip: bool) {
        if flip {
            self.0.extend_from_slice(&[br, tr, tl, bl, br, tl]);
        } else {
            self.0.extend_from_slice(&[bl, tr, tl, bl, br, tr]);
        }
    }

    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.0.extend_from_slice(&[a, b, c]);
    }
}

/// Emits quads as-is and stitching triangles as degenerate patches `(a, b, c, c)`.
struct PatchSink(Vec<u32>);

impl PrimitiveSink for PatchSink {
    fn quad(&mut self, corners: [u32; 4], _flip: bool) {
        self.0.extend_from_slice(&corners);
    }

    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.0.extend_from_slice(&[a, b, c, c]);
    }
}

/// Triangle indices for a `verts × verts` grid stitched according to `flags`.
pub fn triangle_indices(verts: u32, flags: LodFlags) -> Vec<u32> {
    let mut sink = TriangleSink(Vec::with_capacity(((verts - 1) * (verts - 1) * 6) as usize));
    triangulate(verts, flags, &mut sink);
    sink.0
}

/// Quad-patch indices for hardware tessellation, stitched according to `flags`.
pub fn patch_indices(verts: u32, flags: LodFlags) -> Vec<u32> {
    let mut sink = PatchSink(Vec::with_capacity(((verts - 1) * (verts - 1) * 4) as usize));
    triangulate(verts, flags, &mut sink);
    sink.0
}

fn triangulate(verts: u32, flags: LodFlags, sink: &mut dyn PrimitiveSink) {
    assert!(verts >= 2, "a chunk grid needs at least 2 vertices per side, got {verts}");
    let inner: u32 = 1;
    assert!(inner < verts, "stitch increment {inner} must be smaller than grid size {verts}");

    let v = |col: u32, row: u32| grid_vertex(verts, col, row);
    let last = verts - 1;
    let stitched = flags.any();

    let (start, end) = if stitched {
        (inner, last - inner)
    } else {
        (0, last)
    };

    let mut row = start;
    while row < end {
        let mut col = start;
        while col < end {
            let corners = [
                v(col, row),
                v(col + inner, row),
                v(col + inner, row + inner),
                v(col, row + inner),
            ];
            sink.quad(corners, (row + col) % 2 == 1);
            col += inner;
        }
        row += inner;
    }

    if !stitched {
        return;
    }

    // A 2-vertex grid has no inner ring to stitch against.
    if verts < 3 {
        sink.quad([v(0, 0), v(1, 0), v(1, 1), v(0, 1)], false);
        return;
    }

    let outer_step = |edge: Edge| -> u32 {
        let delta = flags.delta(edge) as u32;
        let step = 1u32.checked_shl(delta).unwrap_or(u32::MAX);
        assert!(
            step < verts,
            "stitch step {step} on {edge:?} edge must be smaller than grid size {verts}"
        );
        assert!(
            last % step == 0,
            "grid of {verts} vertices does not divide into stitch step {step} on {edge:?} edge"
        );
        step
    };

    // South: row 0.
    let outer = outer_step(Edge::South);
    let mut col = 0;
    while col < last {
        let far = if col + outer == last {
            v(col + outer - inner, inner)
        } else {
            v(col + outer, inner)
        };
        sink.triangle(v(col, 0), v(col + outer, 0), far);
        let mut i = 0;
        while i < outer {
            if col + i != 0 && col + i != last - inner {
                sink.triangle(v(col, 0), v(col + i + inner, inner), v(col + i, inner));
            }
            i += inner;
        }
        col += outer;
    }

    // North: row N-1.
    let outer = outer_step(Edge::North);
    let mut col = 0;
    while col < last {
        let near = if col == 0 {
            v(col + inner, last - inner)
        } else {
            v(col, last - inner)
        };
        sink.triangle(v(col + outer, last), v(col, last), near);
        let mut i = 0;
        while i < outer {
            if col + i != 0 && col + i != last - inner {
                sink.triangle(
                    v(col + i, last - inner),
                    v(col + i + inner, last - inner),
                    v(col + outer, last),
                );
            }
            i += inner;
        }
        col += outer;
    }

    // West: column 0.
    let outer = outer_step(Edge::West);
    let mut row = 0;
    while row < last {
        let far = if row + outer == last {
            v(inner, row + outer - inner)
        } else {
            v(inner, row + outer)
        };
        sink.triangle(v(0, row + outer), v(0, row), far);
        let mut i = 0;
        while i < outer {
            if row + i != 0 && row + i != last - inner {
                sink.triangle(v(0, row), v(inner, row + i), v(inner, row + i + inner));
            }
            i += inner;
        }
        row += outer;
    }

    // East: column N-1.
    let outer = outer_step(Edge::East);
    let mut row = 0;
    while row < last {
        let near = if row == 0 {
            v(last - inner, row + inner)
        } else {
            v(last - inner, row)
        };
        sink.triangle(v(last, row), v(last, row + outer), near);
        let mut i = 0;
        while i < outer {
            if row + i != 0 && row + i != last - inner {
                sink.triangle(
                    v(last, row + outer),
                    v(last - inner, row + i + inner),
                    v(last - inner, row + i),
                );
            }
            i += inner;
        }
        row += outer;
    }
}
