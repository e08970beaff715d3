extern crate nalgebra as na;

use super::Vertex;
use crate::cube::{Axis, Cube, TurnFrame};

const BODY_COLOR: [f32; 3] = [0.04, 0.04, 0.04];
/// Half extent of a piece body, in doubled lattice units (a piece spans 2).
const BODY_HALF: f32 = 0.96;
const STICKER_HALF: f32 = 0.82;
const STICKER_LIFT: f32 = 0.015;

const BODY_VERTICES: usize = 36;
const STICKER_VERTICES: usize = 6;

/// Exact number of vertices `CubeMesh::build` emits for a cube of `size`.
pub fn vertex_capacity(size: usize) -> usize {
    let inner = size.saturating_sub(2);
    let pieces = size.pow(3) - inner.pow(3);
    pieces * BODY_VERTICES + 6 * size * size * STICKER_VERTICES
}

/// Triangle list for the whole cube in model space, spanning `[-1, 1]`.
pub struct CubeMesh {
    vertices: Vec<Vertex>,
}

impl CubeMesh {
    pub fn build(cube: &Cube, turning: Option<&TurnFrame>) -> Self {
        let scale = 1.0 / cube.size() as f32;
        let mut vertices = Vec::with_capacity(vertex_capacity(cube.size()));

        let rotation = turning.map(|frame| {
            let axis = match frame.axis {
                Axis::X => na::Vector3::x_axis(),
                Axis::Y => na::Vector3::y_axis(),
                Axis::Z => na::Vector3::z_axis(),
            };
            na::Rotation3::from_axis_angle(&axis, frame.angle)
        });

        for (index, piece) in cube.pieces().iter().enumerate() {
            let start = vertices.len();
            let center = to_vector(piece.position);

            // each sticker directly follows the body face it sits on
            for normal in FACE_NORMALS {
                push_quad(&mut vertices, center, normal, BODY_HALF, BODY_HALF, BODY_COLOR);
                if let Some(sticker) = piece.sticker_facing(normal) {
                    push_quad(
                        &mut vertices,
                        center,
                        normal,
                        BODY_HALF + STICKER_LIFT,
                        STICKER_HALF,
                        sticker.colour.colour(),
                    );
                }
            }

            let turned = match (turning, rotation.as_ref()) {
                (Some(frame), Some(rot)) if frame.pieces.contains(&index) => Some(rot),
                _ => None,
            };
            for vertex in &mut vertices[start..] {
                let mut p = na::Point3::from(vertex.pos);
                if let Some(rot) = turned {
                    p = rot * p;
                }
                vertex.pos = [p.x * scale, p.y * scale, p.z * scale];
            }
        }

        Self { vertices }
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }
}

const FACE_NORMALS: [[i32; 3]; 6] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
];

fn to_vector(v: [i32; 3]) -> na::Vector3<f32> {
    na::Vector3::new(v[0] as f32, v[1] as f32, v[2] as f32)
}

/// Two counter-clockwise triangles facing along `normal`, centred
/// `offset` away from `center`.
fn push_quad(
    out: &mut Vec<Vertex>,
    center: na::Vector3<f32>,
    normal: [i32; 3],
    offset: f32,
    half: f32,
    color: [f32; 3],
) {
    let n = to_vector(normal);
    // u x v == n
    let (u, v) = match normal {
        [x, 0, 0] => (na::Vector3::y(), na::Vector3::z() * x as f32),
        [0, y, 0] => (na::Vector3::z(), na::Vector3::x() * y as f32),
        _ => (na::Vector3::x(), na::Vector3::y() * n.z),
    };

    let c = center + n * offset;
    let corners = [
        c - u * half - v * half,
        c + u * half - v * half,
        c + u * half + v * half,
        c - u * half + v * half,
    ];

    for i in [0, 1, 2, 0, 2, 3] {
        let p = corners[i];
        out.push(Vertex {
            pos: [p.x, p.y, p.z],
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra as na;
    use crate::cube::{Animator, Face, Move};
    use std::time::Duration;

    #[test]
    fn vertex_count_matches_capacity() {
        for size in 1..=5 {
            let cube = Cube::new(size).unwrap();
            let mesh = CubeMesh::build(&cube, None).into_vertices();
            assert_eq!(mesh.len(), vertex_capacity(size));
        }
        // 26 bodies and 54 stickers
        assert_eq!(vertex_capacity(3), 26 * 36 + 54 * 6);
    }

    #[test]
    fn idle_mesh_fits_unit_cube() {
        let cube = Cube::new(4).unwrap();
        let mesh = CubeMesh::build(&cube, None).into_vertices();
        let limit = 1.0 + STICKER_LIFT;
        for v in &mesh {
            assert!(v.pos.iter().all(|c| c.abs() <= limit + 1e-5), "{:?}", v.pos);
        }
    }

    #[test]
    fn solved_front_shows_green() {
        let cube = Cube::new(3).unwrap();
        let mesh = CubeMesh::build(&cube, None).into_vertices();
        let front: Vec<_> = mesh
            .iter()
            .filter(|v| v.pos[2] > 0.99)
            .collect();
        assert_eq!(front.len(), 9 * 6);
        assert!(front.iter().all(|v| v.color == Face::F.colour()));
    }

    #[test]
    fn quads_wind_counter_clockwise_outwards() {
        let cube = Cube::new(1).unwrap();
        let mesh = CubeMesh::build(&cube, None).into_vertices();
        for tri in mesh.chunks(3) {
            let a = na::Vector3::from(tri[0].pos);
            let b = na::Vector3::from(tri[1].pos);
            let c = na::Vector3::from(tri[2].pos);
            let normal = (b - a).cross(&(c - a));
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn turning_layer_is_rotated() {
        let mut cube = Cube::new(3).unwrap();
        let mut animator = Animator::new(Duration::from_millis(100));
        animator.push(Move::face(Face::U, 1));
        animator.update(&mut cube, Duration::from_millis(50));

        let frame = animator.current().unwrap();
        let turning = CubeMesh::build(&cube, Some(&frame)).into_vertices();
        let still = CubeMesh::build(&cube, None).into_vertices();
        assert_eq!(turning.len(), still.len());

        let moved = turning
            .iter()
            .zip(&still)
            .filter(|(a, b)| a.pos != b.pos)
            .count();
        // only the nine top pieces move
        assert_eq!(moved, 9 * 36 + 21 * 6);
        let top_only = turning
            .iter()
            .zip(&still)
            .filter(|(a, b)| a.pos != b.pos)
            .all(|(_, b)| b.pos[1] > 0.2);
        assert!(top_only);
    }

    #[test]
    fn stickers_follow_their_body_face() {
        let cube = Cube::new(2).unwrap();
        let mesh = CubeMesh::build(&cube, None).into_vertices();
        // a corner piece: three stickers, each right after its body face
        let corner = &mesh[..BODY_VERTICES + 3 * STICKER_VERTICES];
        let mut quads = corner.chunks_exact(6).peekable();
        let mut stickers = 0;
        while let Some(quad) = quads.next() {
            assert_eq!(quad[0].color, BODY_COLOR);
            if let Some(next) = quads.peek() {
                if next[0].color != BODY_COLOR {
                    let body = na::Vector3::from(quad[0].pos) + na::Vector3::from(quad[2].pos);
                    let sticker = na::Vector3::from(next[0].pos) + na::Vector3::from(next[2].pos);
                    let lift = (sticker - body) / 2.0;
                    assert!((lift.norm() - STICKER_LIFT / 2.0).abs() < 1e-5, "{:?}", lift);
                    stickers += 1;
                    quads.next();
                }
            }
        }
        assert_eq!(stickers, 3);
    }
}
