mod mesh;
pub use mesh::{vertex_capacity, CubeMesh};


#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

/// Floats per vertex in the packed `pos, color` layout.
#[cfg(feature = "native")]
pub const VERTEX_FLOATS: usize = 6;

#[cfg(feature = "native")]
impl Vertex {
    pub fn from_floats(f: &[f32]) -> Option<Self> {
        match f {
            [x, y, z, r, g, b, ..] => Some(Self {
                pos: [*x, *y, *z],
                color: [*r, *g, *b],
            }),
            _ => None,
        }
    }
}
