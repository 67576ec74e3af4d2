//! Synthetic PLC generators shared by `cdt`'s test suite, mirroring the
//! teacher's `rita_test_utils` crate.
#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::all, clippy::missing_const_for_fn)]

use std::ops::RangeInclusive;

use rand::{distr::Uniform, prelude::Distribution};
use rand_distr::Normal;

pub type Vertex3 = [f64; 3];

/// A flat (vertices, triangles) PLC, ready to hand to `compute_cdt`.
pub type Plc = (Vec<f64>, Vec<u32>);

/// Samples `n` vertices in 3D space from the [Uniform] distribution.
///
/// If no range is specified, the unit cube centered around the origin is
/// used, `[-0.5, 0.5]`.
pub fn sample_vertices_3d(n: usize, range: Option<RangeInclusive<f64>>) -> Vec<Vertex3> {
    let mut rng = rand::rng();
    let range = range.unwrap_or(-0.5..=0.5);
    let uniform = Uniform::try_from(range).expect("expected range with a greater start than end");

    let mut vertices: Vec<Vertex3> = Vec::with_capacity(n);
    for _ in 0..n {
        let x = uniform.sample(&mut rng);
        let y = uniform.sample(&mut rng);
        let z = uniform.sample(&mut rng);
        vertices.push([x, y, z]);
    }
    vertices
}

/// Samples `n` perturbations from a [Normal] distribution.
///
/// The default parametrization is `μ = 0.0` and `σ = 0.05`.
pub fn sample_jitter(n: usize, params: Option<(f64, f64)>) -> Vec<f64> {
    let mut rng = rand::rng();
    let (mean, std_dev) = params.unwrap_or((0.0, 0.05));
    let normal = Normal::new(mean, std_dev).unwrap();

    let mut jitter: Vec<f64> = Vec::with_capacity(n);
    for _ in 0..n {
        jitter.push(normal.sample(&mut rng));
    }
    jitter
}

fn flatten(vertices: &[Vertex3]) -> Vec<f64> {
    vertices.iter().flat_map(|p| p.iter().copied()).collect()
}

/// A unit cube, 8 vertices and 12 triangles (two per face), in the same
/// shape as the README/spec example.
pub fn unit_cube() -> Plc {
    let vertices = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
        [1.0, 0.0, 1.0],
        [1.0, 1.0, 1.0],
        [0.0, 1.0, 1.0],
    ];
    let triangles: Vec<u32> = vec![
        0, 1, 2, 0, 2, 3, // bottom
        4, 6, 5, 4, 7, 6, // top
        0, 4, 5, 0, 5, 1, // front
        1, 5, 6, 1, 6, 2, // right
        2, 6, 7, 2, 7, 3, // back
        3, 7, 4, 3, 4, 0, // left
    ];
    (flatten(&vertices), triangles)
}

/// A regular tetrahedron, 4 vertices and 4 triangles, every one of its
/// outward-facing faces wound counter-clockwise as seen from outside.
pub fn regular_tetrahedron() -> Plc {
    let vertices = [
        [1.0, 1.0, 1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
    ];
    let triangles: Vec<u32> = vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3];
    (flatten(&vertices), triangles)
}

/// A regular octahedron, 6 vertices and 8 triangles.
pub fn regular_octahedron() -> Plc {
    let vertices = [
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
    ];
    let triangles: Vec<u32> = vec![
        0, 2, 4, 2, 1, 4, 1, 3, 4, 3, 0, 4, // top half
        2, 0, 5, 1, 2, 5, 3, 1, 5, 0, 3, 5, // bottom half
    ];
    (flatten(&vertices), triangles)
}

/// An octahedron with its 6 vertices perturbed by small radial jitter,
/// keeping the same 8-triangle combinatorial structure. A cheap stand-in
/// for "a random point cloud with a convex-hull triangulation as its PLC"
/// (`spec.md` §8): the jitter is kept well below the octahedron's own edge
/// length, so the perturbed vertex set's convex hull is combinatorially
/// identical to the unperturbed octahedron's.
pub fn jittered_octahedron(seed_jitter: Option<f64>) -> Plc {
    let (flat, triangles) = regular_octahedron();
    let jitter = sample_jitter(flat.len(), seed_jitter.map(|sigma| (0.0, sigma)));
    let vertices: Vec<f64> = flat.iter().zip(jitter.iter()).map(|(v, j)| v + j).collect();
    (vertices, triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_has_eight_vertices_and_twelve_triangles() {
        let (vertices, triangles) = unit_cube();
        assert_eq!(vertices.len(), 24);
        assert_eq!(triangles.len(), 36);
    }

    #[test]
    fn sample_vertices_3d_respects_count() {
        let vertices = sample_vertices_3d(16, None);
        assert_eq!(vertices.len(), 16);
    }
}
