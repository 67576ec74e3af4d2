//! Geometric predicates: `orient3d` and `insphere`, the two signs every
//! other module in this crate is built from (§4.A).
//!
//! Both predicates are evaluated through a two-tier strategy:
//!
//! - If every operand is an `Input` vertex, use [`robust`]'s adaptive
//!   floating-point implementation. It is exact whenever the true
//!   determinant is nonzero (Shewchuk's adaptive-precision expansion
//!   technique), and the common case — no Steiner vertices involved — never
//!   touches [`crate::exact`].
//! - If any operand is a `Steiner` vertex, fall through to
//!   [`crate::exact`]'s `BigRational` determinants. Steiner coordinates are
//!   themselves the result of a division (a segment/triangle intersection
//!   parameter), so the filtered float expansion `robust` builds from their
//!   cached `approx` coordinates cannot be trusted to carry a certified sign.
//!
//! This mirrors the dispatch in `rita`'s own `predicates` module, which
//! picks a predicate backend by `cfg`; here the choice is made per call,
//! keyed on which vertices are involved, because both backends coexist in
//! the same build.

use std::cmp::Ordering;

use robust::{Coord3D, insphere as robust_insphere, orient3d as robust_orient3d};

use crate::arena::VertexArena;
use crate::exact::{exact_point, insphere_exact, orient3d_exact};
use crate::vertex::VertexId;

/// The sign of a geometric predicate, with `Zero` meaning exactly coplanar
/// or cospherical — never a rounding artifact (§4.A).
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Orientation {
    Negative,
    Zero,
    Positive,
}

impl Orientation {
    const fn from_f64(sign: f64) -> Self {
        if sign > 0.0 {
            Orientation::Positive
        } else if sign < 0.0 {
            Orientation::Negative
        } else {
            Orientation::Zero
        }
    }

    const fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Greater => Orientation::Positive,
            Ordering::Less => Orientation::Negative,
            Ordering::Equal => Orientation::Zero,
        }
    }

    pub const fn is_positive(self) -> bool {
        matches!(self, Orientation::Positive)
    }

    pub const fn is_negative(self) -> bool {
        matches!(self, Orientation::Negative)
    }

    pub const fn is_zero(self) -> bool {
        matches!(self, Orientation::Zero)
    }

    pub const fn flip(self) -> Self {
        match self {
            Orientation::Negative => Orientation::Positive,
            Orientation::Zero => Orientation::Zero,
            Orientation::Positive => Orientation::Negative,
        }
    }
}

fn coord3d(p: [f64; 3]) -> Coord3D<f64> {
    Coord3D {
        x: p[0],
        y: p[1],
        z: p[2],
    }
}

/// Sign of the volume of the tetrahedron `(a, b, c, d)`: positive if `d`
/// lies below the plane through `a, b, c` in their given winding (the
/// convention `robust::orient3d` and this crate's mesh module both use).
pub fn orient3d(arena: &VertexArena, a: VertexId, b: VertexId, c: VertexId, d: VertexId) -> Orientation {
    if [a, b, c, d].iter().any(|v| arena.is_steiner(*v)) {
        let pts = [a, b, c, d].map(|v| exact_point(arena, v));
        return Orientation::from_ordering(orient3d_exact(&pts[0], &pts[1], &pts[2], &pts[3]));
    }

    let [a, b, c, d] = [a, b, c, d].map(|v| coord3d(arena.approx(v)));
    Orientation::from_f64(robust_orient3d(a, b, c, d))
}

/// Sign of whether `e` lies inside the oriented sphere through `(a, b, c, d)`.
pub fn insphere(
    arena: &VertexArena,
    a: VertexId,
    b: VertexId,
    c: VertexId,
    d: VertexId,
    e: VertexId,
) -> Orientation {
    if [a, b, c, d, e].iter().any(|v| arena.is_steiner(*v)) {
        let pts = [a, b, c, d, e].map(|v| exact_point(arena, v));
        return Orientation::from_ordering(insphere_exact(
            &pts[0], &pts[1], &pts[2], &pts[3], &pts[4],
        ));
    }

    let [a, b, c, d, e] = [a, b, c, d, e].map(|v| coord3d(arena.approx(v)));
    Orientation::from_f64(robust_insphere(a, b, c, d, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::SteinerPoint;

    fn arena_with(points: &[[f64; 3]]) -> VertexArena {
        let mut arena = VertexArena::new();
        for p in points {
            arena.push_input(*p);
        }
        arena
    }

    #[test]
    fn orient3d_positive_for_standard_basis() {
        let arena = arena_with(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);
        let ids: Vec<VertexId> = (0..4).map(|i| VertexId(i)).collect();
        let sign = orient3d(&arena, ids[0], ids[1], ids[2], ids[3]);
        assert!(sign.is_positive());
    }

    #[test]
    fn orient3d_zero_for_coplanar_points() {
        let arena = arena_with(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ]);
        let ids: Vec<VertexId> = (0..4).map(|i| VertexId(i)).collect();
        let sign = orient3d(&arena, ids[0], ids[1], ids[2], ids[3]);
        assert!(sign.is_zero());
    }

    #[test]
    fn insphere_detects_point_inside_unit_sphere_tet() {
        let arena = arena_with(&[
            [1.0, 1.0, 1.0],
            [-1.0, -1.0, 1.0],
            [-1.0, 1.0, -1.0],
            [1.0, -1.0, -1.0],
            [0.0, 0.0, 0.0],
        ]);
        let ids: Vec<VertexId> = (0..5).map(|i| VertexId(i)).collect();
        let sign = insphere(&arena, ids[0], ids[1], ids[2], ids[3], ids[4]);
        assert!(sign.is_positive());
    }

    #[test]
    fn orient3d_matches_exact_path_for_steiner_vertex() {
        let mut arena = arena_with(&[
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [0.0, 0.0, 2.0],
            [1.0, 1.0, 1.0],
        ]);
        let a = VertexId(0);
        let b = VertexId(1);
        let c = VertexId(2);
        let d = VertexId(3);
        let seg_from = VertexId(0);
        let seg_to = VertexId(4);
        let steiner_id = arena.push_steiner(SteinerPoint {
            segment: [seg_from, seg_to],
            triangle: [a, b, c],
            approx: [0.5, 0.5, 0.0],
        });
        let sign = orient3d(&arena, a, b, c, steiner_id);
        assert!(sign.is_zero(), "steiner point lies on its own defining triangle");
        let _ = d;
    }
}
