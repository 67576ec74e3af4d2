//! Vertex handles and the symbolic/approximate coordinate representation.
//!
//! A `casual` handle indexes into the vertex arena; `Infinite` is the
//! distinguished point at infinity used to close the convex hull with ghost
//! tetrahedra. See [`crate::predicates`] and [`crate::exact`] for how the two
//! coordinate variants are dispatched during predicate evaluation.

use core::fmt;

/// A dense, non-negative handle into the vertex arena.
///
/// Handles `0..num_input` are input vertices; handles `>= num_input` are
/// Steiner vertices introduced by segment/face recovery.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Debug)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct VertexId(pub u32);

impl VertexId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A tet-mesh vertex slot: either a finite handle or the point at infinity.
///
/// A tetrahedron is a *ghost* iff one of its four slots is [`VertexSlot::Infinite`].
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum VertexSlot {
    /// A finite vertex with a handle into the vertex arena.
    Finite(VertexId),
    /// The point at infinity, used to close the convex hull combinatorially.
    Infinite,
}

impl VertexSlot {
    /// Get the handle of this slot, if finite.
    pub const fn id(&self) -> Option<VertexId> {
        match self {
            VertexSlot::Finite(id) => Some(*id),
            VertexSlot::Infinite => None,
        }
    }

    pub const fn is_infinite(&self) -> bool {
        matches!(self, VertexSlot::Infinite)
    }
}

impl fmt::Display for VertexSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexSlot::Finite(id) => write!(f, "Finite({id})"),
            VertexSlot::Infinite => write!(f, "Infinite"),
        }
    }
}

/// Coordinates backing a finite [`VertexId`].
///
/// `Input` vertices carry the caller's original double-precision coordinates.
/// `Steiner` vertices are exact algebraic objects — the intersection of a
/// segment and a triangle in input coordinates — so that predicates
/// involving them can be evaluated exactly (§4.A, §9). Their approximate
/// double coordinates are only materialized when the result is serialized.
#[derive(Clone, Debug)]
pub enum VertexCoords {
    Input([f64; 3]),
    Steiner(SteinerPoint),
}

/// The symbolic representation of a Steiner point: the transverse
/// intersection of the segment `(segment[0], segment[1])` with the plane of
/// the triangle `(triangle[0], triangle[1], triangle[2])`.
///
/// Stored as endpoint handles rather than coordinates so recursive
/// intersections (a Steiner point defined against another Steiner point)
/// resolve exactly, by looking up each endpoint's own [`VertexCoords`] at
/// evaluation time.
#[derive(Clone, Debug)]
pub struct SteinerPoint {
    pub segment: [VertexId; 2],
    pub triangle: [VertexId; 3],
    /// Cached approximate coordinates, computed once at construction time for
    /// use by the fast floating-point predicate path and for serialization.
    pub approx: [f64; 3],
}

impl VertexCoords {
    /// Approximate double-precision coordinates, materialized for output.
    pub const fn approx(&self) -> [f64; 3] {
        match self {
            VertexCoords::Input(p) => *p,
            VertexCoords::Steiner(s) => s.approx,
        }
    }

    pub const fn is_steiner(&self) -> bool {
        matches!(self, VertexCoords::Steiner(_))
    }
}
