//! Index storage that picks 16- or 32-bit width from the grid size.

/// How a chunk's indices are assembled into primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveMode {
    /// Three indices per triangle.
    Triangles,
    /// Four indices per patch, counter-clockwise from the bottom-left corner.
    Patches,
}

impl PrimitiveMode {
    /// Indices per primitive.
    pub const fn vertices_per_primitive(self) -> usize {
        match self {
            PrimitiveMode::Triangles => 3,
            PrimitiveMode::Patches => 4,
        }
    }
}

/// An index sequence. 16-bit when the grid has at most 65535 vertices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexBuffer {
    /// 16-bit indices.
    U16(Vec<u16>),
    /// 32-bit indices.
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Store `indices` for a grid of `verts × verts` vertices at the narrowest width.
    pub fn for_grid(verts: u32, indices: Vec<u32>) -> Self {
        if (verts as u64) * (verts as u64) <= 0xffff {
            IndexBuffer::U16(indices.into_iter().map(|i| i as u16).collect())
        } else {
            IndexBuffer::U32(indices)
        }
    }

    /// Number of indices.
    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(v) => v.len(),
            IndexBuffer::U32(v) => v.len(),
        }
    }

    /// Whether the buffer holds no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index at position `i`, widened to `u32`.
    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            IndexBuffer::U16(v) => v.get(i).map(|&x| x as u32),
            IndexBuffer::U32(v) => v.get(i).copied(),
        }
    }

    /// Iterate over all indices widened to `u32`.
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            IndexBuffer::U16(v) => Box::new(v.iter().map(|&x| x as u32)),
            IndexBuffer::U32(v) => Box::new(v.iter().copied()),
        }
    }

    /// Bytes per index.
    pub fn index_size(&self) -> usize {
        match self {
            IndexBuffer::U16(_) => 2,
            IndexBuffer::U32(_) => 4,
        }
    }

    /// Raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            IndexBuffer::U16(v) => bytemuck::cast_slice(v),
            IndexBuffer::U32(v) => bytemuck::cast_slice(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_grid_uses_u16() {
        let buffer = IndexBuffer::for_grid(255, vec![0, 1, 2]);
        assert!(matches!(buffer, IndexBuffer::U16(_)));
        assert_eq!(buffer.index_size(), 2);
        assert_eq!(buffer.as_bytes().len(), 6);
    }

    #[test]
    fn test_large_grid_uses_u32() {
        let buffer = IndexBuffer::for_grid(256, vec![65_000, 65_535, 65_536]);
        assert!(matches!(buffer, IndexBuffer::U32(_)));
        assert_eq!(buffer.get(2), Some(65_536));
    }

    #[test]
    fn test_iter_widens() {
        let buffer = IndexBuffer::for_grid(9, vec![3, 1, 4]);
        assert_eq!(buffer.iter().collect::<Vec<_>>(), vec![3, 1, 4]);
        assert_eq!(buffer.get(3), None);
    }
}
