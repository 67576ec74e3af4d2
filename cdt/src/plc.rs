//! Input PLC: the canonical input container and its validation (§4.B).

use thiserror::Error;

use crate::arena::VertexArena;

/// Why an input (vertices, triangles) pair was rejected (§4.B's three
/// rejection rules, plus `validate_mesh`'s own reporting of the same rules
/// via §6).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlcError {
    #[error("vertex array length {0} is not divisible by 3")]
    VertexLengthNotDivisibleByThree(usize),
    #[error("triangle array length {0} is not divisible by 3")]
    TriangleLengthNotDivisibleByThree(usize),
    #[error("triangle {triangle} references vertex index {index}, but only {num_vertices} vertices were given")]
    TriangleIndexOutOfRange {
        triangle: usize,
        index: u32,
        num_vertices: usize,
    },
    #[error("triangle {0} is degenerate (repeats a vertex index)")]
    DegenerateTriangle(usize),
}

/// A validated input PLC: a vertex array and a triangle index array, stored
/// contiguously with stable handles (§4.B).
#[derive(Debug, Clone)]
pub struct RawPlc {
    pub vertices: Vec<[f64; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

impl RawPlc {
    /// Validate and pack a flat `vertices`/`triangles` pair (§6's wire
    /// format: `vertices` length `3*V`, `triangles` length `3*T`, each index
    /// in `[0, V)`).
    pub fn validate(vertices: &[f64], triangles: &[u32]) -> Result<Self, PlcError> {
        if vertices.len() % 3 != 0 {
            return Err(PlcError::VertexLengthNotDivisibleByThree(vertices.len()));
        }
        if triangles.len() % 3 != 0 {
            return Err(PlcError::TriangleLengthNotDivisibleByThree(triangles.len()));
        }

        let num_vertices = vertices.len() / 3;
        let packed_vertices: Vec<[f64; 3]> = vertices
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();

        let packed_triangles: Vec<[u32; 3]> = triangles.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

        for (i, tri) in packed_triangles.iter().enumerate() {
            for &index in tri {
                if index as usize >= num_vertices {
                    return Err(PlcError::TriangleIndexOutOfRange {
                        triangle: i,
                        index,
                        num_vertices,
                    });
                }
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(PlcError::DegenerateTriangle(i));
            }
        }

        Ok(Self {
            vertices: packed_vertices,
            triangles: packed_triangles,
        })
    }

    pub const fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub const fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Append eight axis-aligned vertices just outside the input's bounding
    /// box, and no triangles for them (§4.B, "addBoundingBox"). Guarantees
    /// every input vertex is strictly interior to the Delaunay hull.
    pub fn add_bounding_box(&mut self) {
        if self.vertices.is_empty() {
            return;
        }

        let mut min = self.vertices[0];
        let mut max = self.vertices[0];
        for p in &self.vertices {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }

        let diag = (0..3)
            .map(|axis| max[axis] - min[axis])
            .fold(0.0_f64, f64::max)
            .max(1.0);
        let margin = diag * 1e-2;

        let lo = [min[0] - margin, min[1] - margin, min[2] - margin];
        let hi = [max[0] + margin, max[1] + margin, max[2] + margin];

        for x in [lo[0], hi[0]] {
            for y in [lo[1], hi[1]] {
                for z in [lo[2], hi[2]] {
                    self.vertices.push([x, y, z]);
                }
            }
        }
    }

    /// Whether the input surface is closed and 2-manifold: every
    /// (deduplicated) triangle edge is shared by exactly two triangles.
    /// A purely topological property of `triangles`, computed independently
    /// of whether recovery later succeeds (§6, `isPolyhedron`).
    pub fn is_closed_2manifold(&self) -> bool {
        if self.triangles.is_empty() {
            return false;
        }

        let mut edge_counts: std::collections::HashMap<(u32, u32), u32> = std::collections::HashMap::new();
        for tri in &self.triangles {
            for [a, b] in [[tri[0], tri[1]], [tri[1], tri[2]], [tri[2], tri[0]]] {
                let key = if a <= b { (a, b) } else { (b, a) };
                *edge_counts.entry(key).or_insert(0) += 1;
            }
        }

        edge_counts.values().all(|&count| count == 2)
    }

    /// Load a validated PLC's vertices into a fresh [`VertexArena`], in
    /// input order (§4.D, "the input array is not reordered").
    pub fn build_arena(&self) -> VertexArena {
        let mut arena = VertexArena::with_capacity(self.vertices.len());
        for &p in &self.vertices {
            arena.push_input(p);
        }
        arena
    }
}

/// The result of `validateMesh` (§6): a pure input check, independent of
/// whether `computeCDT` would subsequently succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshValidation {
    pub num_vertices: usize,
    pub num_triangles: usize,
    pub valid: bool,
}

pub fn validate_mesh(vertices: &[f64], triangles: &[u32]) -> MeshValidation {
    match RawPlc::validate(vertices, triangles) {
        Ok(plc) => MeshValidation {
            num_vertices: plc.num_vertices(),
            num_triangles: plc.num_triangles(),
            valid: true,
        },
        Err(_) => MeshValidation {
            num_vertices: vertices.len() / 3,
            num_triangles: triangles.len() / 3,
            valid: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_vertex_length_not_divisible_by_three() {
        let vertices = [0.0, 0.0];
        let err = RawPlc::validate(&vertices, &[]).unwrap_err();
        assert_eq!(err, PlcError::VertexLengthNotDivisibleByThree(2));
    }

    #[test]
    fn rejects_out_of_range_triangle_index() {
        let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let triangles = [0, 1, 3];
        let err = RawPlc::validate(&vertices, &triangles).unwrap_err();
        assert_eq!(
            err,
            PlcError::TriangleIndexOutOfRange {
                triangle: 0,
                index: 3,
                num_vertices: 3
            }
        );
    }

    #[test]
    fn rejects_degenerate_triangle() {
        let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let triangles = [0, 1, 1];
        let err = RawPlc::validate(&vertices, &triangles).unwrap_err();
        assert_eq!(err, PlcError::DegenerateTriangle(0));
    }

    #[test]
    fn accepts_unit_tetrahedron() {
        let vertices = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
        ];
        let triangles = [0, 1, 2, 0, 1, 3, 0, 2, 3, 1, 2, 3];
        let plc = RawPlc::validate(&vertices, &triangles).unwrap();
        assert_eq!(plc.num_vertices(), 4);
        assert_eq!(plc.num_triangles(), 4);
    }

    #[test]
    fn tetrahedron_boundary_is_closed_2manifold() {
        let vertices = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
        ];
        let triangles = [0, 1, 2, 0, 1, 3, 0, 2, 3, 1, 2, 3];
        let plc = RawPlc::validate(&vertices, &triangles).unwrap();
        assert!(plc.is_closed_2manifold());
    }

    #[test]
    fn open_patch_is_not_closed_2manifold() {
        let vertices = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
        ];
        let triangles = [0, 1, 2, 0, 1, 3];
        let plc = RawPlc::validate(&vertices, &triangles).unwrap();
        assert!(!plc.is_closed_2manifold());
    }

    #[test]
    fn add_bounding_box_appends_eight_vertices_and_no_triangles() {
        let vertices = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
        ];
        let triangles = [0, 1, 2, 0, 1, 3, 0, 2, 3, 1, 2, 3];
        let mut plc = RawPlc::validate(&vertices, &triangles).unwrap();
        plc.add_bounding_box();
        assert_eq!(plc.num_vertices(), 12);
        assert_eq!(plc.num_triangles(), 4);
    }
}
