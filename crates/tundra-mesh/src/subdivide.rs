//! Recursive 4-way midpoint subdivision of an indexed triangle mesh.
//!
//! The output is a flat triangle list: every triangle owns its three vertices, so the
//! vertex count is exactly three times the triangle count.

use glam::{Vec2, Vec3};
use tundra_materials::WeightVector;

use crate::IndexBuffer;

/// Deepest supported subdivision level. Level `L` multiplies the triangle count by `4^L`.
pub const MAX_SUBDIVISION_LEVEL: u8 = 4;

/// Borrowed per-vertex attributes of an indexed mesh. All streams have one entry per vertex.
#[derive(Clone, Copy, Debug)]
pub struct VertexStreams<'a> {
    pub positions: &'a [Vec3],
    pub normals: &'a [Vec3],
    pub colors: &'a [[u8; 4]],
    pub uvs: &'a [Vec2],
    /// Optional material weights. When absent the output carries none either.
    pub weights: Option<&'a [WeightVector]>,
}

impl VertexStreams<'_> {
    fn len(&self) -> usize {
        self.positions.len()
    }

    fn vertex(&self, i: usize) -> Vertex {
        Vertex {
            position: self.positions[i],
            normal: self.normals[i],
            color: self.colors[i],
            uv: self.uvs[i],
            weight: self.weights.map(|w| w[i]),
        }
    }
}

/// A non-indexed triangle list produced by [`TriangleSubdivider`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubdividedMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub colors: Vec<[u8; 4]>,
    pub uvs: Vec<Vec2>,
    pub weights: Option<Vec<WeightVector>>,
}

impl SubdividedMesh {
    fn with_capacity(vertices: usize, weighted: bool) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            normals: Vec::with_capacity(vertices),
            colors: Vec::with_capacity(vertices),
            uvs: Vec::with_capacity(vertices),
            weights: weighted.then(|| Vec::with_capacity(vertices)),
        }
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    fn push(&mut self, v: &Vertex) {
        self.positions.push(v.position);
        self.normals.push(v.normal);
        self.colors.push(v.color);
        self.uvs.push(v.uv);
        if let (Some(out), Some(w)) = (self.weights.as_mut(), v.weight) {
            out.push(w);
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Vertex {
    position: Vec3,
    normal: Vec3,
    color: [u8; 4],
    uv: Vec2,
    weight: Option<WeightVector>,
}

impl Vertex {
    fn midpoint(&self, other: &Vertex) -> Vertex {
        Vertex {
            position: (self.position + other.position) * 0.5,
            normal: (self.normal + other.normal)
                .try_normalize()
                .unwrap_or(self.normal),
            color: std::array::from_fn(|c| {
                ((self.color[c] as u16 + other.color[c] as u16 + 1) / 2) as u8
            }),
            uv: (self.uv + other.uv) * 0.5,
            weight: match (self.weight, other.weight) {
                (Some(a), Some(b)) => Some(WeightVector::midpoint(a, b)),
                _ => None,
            },
        }
    }
}

/// Splits every triangle of a mesh `level` times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriangleSubdivider {
    level: u8,
}

impl TriangleSubdivider {
    /// Create a subdivider. Levels above [`MAX_SUBDIVISION_LEVEL`] are a caller bug.
    pub fn new(level: u8) -> Self {
        assert!(
            level <= MAX_SUBDIVISION_LEVEL,
            "subdivision level {level} exceeds {MAX_SUBDIVISION_LEVEL}"
        );
        Self { level }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Triangles produced per input triangle.
    pub fn factor(&self) -> usize {
        4usize.pow(self.level as u32)
    }

    /// Subdivide the triangles described by `indices` over `streams`.
    pub fn subdivide(&self, streams: &VertexStreams<'_>, indices: &IndexBuffer) -> SubdividedMesh {
        let count = streams.len();
        assert!(
            streams.normals.len() == count
                && streams.colors.len() == count
                && streams.uvs.len() == count
                && streams.weights.is_none_or(|w| w.len() == count),
            "vertex streams have mismatched lengths"
        );
        assert!(
            indices.len() % 3 == 0,
            "index count {} is not a triangle list",
            indices.len()
        );

        let triangles = indices.len() / 3;
        let mut out =
            SubdividedMesh::with_capacity(triangles * self.factor() * 3, streams.weights.is_some());

        let mut corners = indices.iter().map(|i| streams.vertex(i as usize));
        while let (Some(a), Some(b), Some(c)) = (corners.next(), corners.next(), corners.next()) {
            split(&a, &b, &c, self.level, &mut out);
        }

        tracing::trace!(
            level = self.level,
            input = triangles,
            output = out.triangle_count(),
            "subdivided mesh"
        );
        out
    }
}

fn split(v0: &Vertex, v1: &Vertex, v2: &Vertex, level: u8, out: &mut SubdividedMesh) {
    if level == 0 {
        out.push(v0);
        out.push(v1);
        out.push(v2);
        return;
    }

    let v01 = v0.midpoint(v1);
    let v12 = v1.midpoint(v2);
    let v20 = v2.midpoint(v0);
    split(v0, &v01, &v20, level - 1, out);
    split(&v01, v1, &v12, level - 1, out);
    split(&v20, &v12, v2, level - 1, out);
    split(&v01, &v12, &v20, level - 1, out);
}
