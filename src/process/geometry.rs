use cgmath::{InnerSpace, Vector3};

use crate::primitives::vertex::Vertex;

/// Splits a quad given in winding order into triangles (0, 1, 3) and (1, 2, 3).
pub fn quad_of_four_vertices(corners: [Vertex; 4]) -> [Vertex; 6] {
    let [a, b, c, d] = corners;
    [a, b, d, b, c, d]
}

pub fn quad_vertices(
    top_left: Vector3<f32>,
    top_right: Vector3<f32>,
    bottom_right: Vector3<f32>,
    bottom_left: Vector3<f32>,
) -> Vec<Vertex> {
    let normal: [f32; 3] = face_normal(top_left, top_right, bottom_left).into();
    let corner = |position: Vector3<f32>, texture_coord: [f32; 2]| {
        Vertex::new(position.into(), texture_coord, normal)
    };

    vec![
        corner(top_left, [0.0, 1.0]),
        corner(top_right, [1.0, 1.0]),
        corner(bottom_left, [0.0, 0.0]),
        corner(top_right, [1.0, 1.0]),
        corner(bottom_right, [1.0, 0.0]),
        corner(bottom_left, [0.0, 0.0]),
    ]
}

fn face_normal(origin: Vector3<f32>, a: Vector3<f32>, b: Vector3<f32>) -> Vector3<f32> {
    let n = (a - origin).cross(b - origin);
    if n.magnitude2() > 0.0 {
        n.normalize()
    } else {
        Vector3::new(0.0, 0.0, 0.0)
    }
}

// (corner offsets, texture coordinates, normal) per face; offsets are scaled by half the edge.
const CUBE_FACES: [([[f32; 3]; 4], [[f32; 2]; 4], [f32; 3]); 6] = [
    // bottom
    (
        [[-1.0, -1.0, -1.0], [1.0, -1.0, -1.0], [1.0, -1.0, 1.0], [-1.0, -1.0, 1.0]],
        [[1.0, 0.0], [0.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
        [0.0, -1.0, 0.0],
    ),
    // top
    (
        [[-1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, -1.0], [-1.0, 1.0, -1.0]],
        [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        [0.0, 1.0, 0.0],
    ),
    // front
    (
        [[-1.0, 1.0, -1.0], [1.0, 1.0, -1.0], [1.0, -1.0, -1.0], [-1.0, -1.0, -1.0]],
        [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        [0.0, 0.0, -1.0],
    ),
    // back
    (
        [[-1.0, -1.0, 1.0], [1.0, -1.0, 1.0], [1.0, 1.0, 1.0], [-1.0, 1.0, 1.0]],
        [[1.0, 0.0], [0.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
        [0.0, 0.0, 1.0],
    ),
    // right
    (
        [[1.0, 1.0, -1.0], [1.0, 1.0, 1.0], [1.0, -1.0, 1.0], [1.0, -1.0, -1.0]],
        [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]],
        [1.0, 0.0, 0.0],
    ),
    // left
    (
        [[-1.0, -1.0, -1.0], [-1.0, -1.0, 1.0], [-1.0, 1.0, 1.0], [-1.0, 1.0, -1.0]],
        [[1.0, 0.0], [0.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
        [-1.0, 0.0, 0.0],
    ),
];

pub fn cube_vertices(center: Vector3<f32>, edge: f32) -> Vec<Vertex> {
    let half = edge * 0.5;
    let mut vertices = Vec::with_capacity(CUBE_FACES.len() * 6);

    for (offsets, texture_coords, normal) in CUBE_FACES.iter() {
        let mut corners = [Vertex::default(); 4];
        for (i, corner) in corners.iter_mut().enumerate() {
            let position = center + Vector3::from(offsets[i]) * half;
            *corner = Vertex::new(position.into(), texture_coords[i], *normal);
        }
        vertices.extend_from_slice(&quad_of_four_vertices(corners));
    }

    vertices
}
