//! Segment recovery (§4.F): force every input edge to appear as a chain of
//! mesh edges, inserting Steiner vertices at transversal crossings.
//!
//! Mirrors segment insertion in real constrained tetrahedralizers (the
//! approach TetGen calls "Steiner point insertion for segment recovery"):
//! walk from one endpoint toward the other, and whenever the straight line
//! would have to pass through the interior of a tet face rather than along
//! an existing edge, split that face's plane at the exact intersection point
//! and re-triangulate through the ordinary Bowyer–Watson insertion path —
//! no separate "segment insertion" cavity logic is needed, since inserting
//! the crossing point via [`DelaunayBuilder::insert_vertex`] already
//! recomputes the local cavity around it.

use crate::builder::DelaunayBuilder;
use crate::mesh::{TetId, TetStore};
use crate::overlay::EDGE_VERTS;
use crate::vertex::{SteinerPoint, VertexId, VertexSlot};

/// Recover the input edge `(u, v)` as a chain of mesh edges, returning
/// whether the walk reached `v` plus the ordered vertex chain from `u` to
/// `v` inclusive (face recovery, §4.G, needs the latter to build a
/// triangle's boundary when one of its edges was subdivided).
///
/// Deliberately does *not* record any `(TetId, u8)` here — a tet slot this
/// walk observes can be freed and recycled by a later, unrelated Steiner
/// insertion elsewhere in the mesh before region marking ever looks at it
/// (`TetStore::alloc`/`free`, §4.C, tombstone and recycle slots). Vertex
/// handles never change once assigned, so the chain this returns stays
/// valid no matter what recovery does afterward; [`crate::recovery::recover_all`]
/// re-resolves it to `(TetId, u8)` pairs only once every insertion segment
/// and face recovery will ever make has already happened. A chain that
/// never reaches `v` (`false`) means recovery gave up (§7 category 3) — the
/// caller leaves the constraint unresolved and the pipeline continues with
/// `isPolyhedron = false`.
pub fn recover_edge(builder: &mut DelaunayBuilder, u: VertexId, v: VertexId) -> (bool, Vec<VertexId>) {
    let mut vertices = vec![u];
    let mut from = u;
    // Bounded by construction: each iteration either terminates the walk or
    // consumes one Steiner insertion, and a correctly functioning mesh can
    // only need finitely many crossings to connect two points (§4.F,
    // "terminates"). The bound itself is a defensive backstop against a
    // degenerate input defeating that argument.
    let max_steps = builder.arena().len() * 4 + 256;

    for _ in 0..max_steps {
        if find_mesh_edge(builder.mesh(), from, v).is_some() {
            vertices.push(v);
            return (true, vertices);
        }

        if let Some(next) = find_collinear_waypoint(builder, from, v) {
            vertices.push(next);
            from = next;
            continue;
        }

        let Some((t, f)) = find_exit_face(builder, from, v) else {
            return (false, vertices);
        };

        let face = builder.mesh().face_vertices(t, f);
        let ids: [VertexId; 3] = face.map(|s| s.id().expect("non-ghost tet has finite faces"));
        let approx = approx_segment_triangle_intersection(builder.arena(), u, v, ids[0], ids[1], ids[2]);
        let steiner = builder.arena_mut().push_steiner(SteinerPoint {
            segment: [u, v],
            triangle: ids,
            approx,
        });
        builder.insert_vertex(steiner);
        vertices.push(steiner);
        from = steiner;
    }

    (false, vertices)
}

/// Find a live tet with an edge exactly `(a, b)`, returning it as an
/// `EDGE_VERTS` index.
pub(crate) fn find_mesh_edge(mesh: &TetStore, a: VertexId, b: VertexId) -> Option<(TetId, u8)> {
    for t in mesh.iter_live() {
        let verts = mesh.vertices(t);
        let ia = verts.iter().position(|s| *s == VertexSlot::Finite(a));
        let ib = verts.iter().position(|s| *s == VertexSlot::Finite(b));
        if let (Some(ia), Some(ib)) = (ia, ib) {
            let pair = if ia < ib { [ia, ib] } else { [ib, ia] };
            if let Some(idx) = EDGE_VERTS.iter().position(|e| *e == pair) {
                return Some((t, idx as u8));
            }
        }
    }
    None
}

/// Look for an existing mesh vertex `w`, adjacent to `from`, that lies
/// exactly on the open segment `from`-`to` — i.e. the walk can advance along
/// an existing edge instead of needing a fresh crossing. Approximate
/// (float) collinearity test: a false negative here only costs an extra,
/// still-correct Steiner insertion, never a wrong mesh.
fn find_collinear_waypoint(builder: &DelaunayBuilder, from: VertexId, to: VertexId) -> Option<VertexId> {
    let arena = builder.arena();
    let mesh = builder.mesh();
    let p_from = arena.approx(from);
    let p_to = arena.approx(to);
    let dir = sub(p_to, p_from);
    let dir_len2 = dot(dir, dir);
    if dir_len2 == 0.0 {
        return None;
    }

    for t in mesh.iter_live() {
        let verts = mesh.vertices(t);
        let Some(i) = verts.iter().position(|s| *s == VertexSlot::Finite(from)) else {
            continue;
        };
        for (j, slot) in verts.iter().enumerate() {
            if j == i {
                continue;
            }
            let Some(w) = slot.id() else { continue };
            if w == from || w == to {
                continue;
            }
            let p_w = arena.approx(w);
            let rel = sub(p_w, p_from);
            let cross = cross(rel, dir);
            let tol = 1e-12 * dir_len2.max(1.0);
            if dot(cross, cross) > tol {
                continue;
            }
            let t_param = dot(rel, dir) / dir_len2;
            if t_param > 1e-9 && t_param < 1.0 - 1e-9 {
                let pair = if i < j { [i, j] } else { [j, i] };
                if EDGE_VERTS.iter().any(|e| *e == pair) {
                    return Some(w);
                }
            }
        }
    }
    None
}

/// Find the tet incident to `from` whose face opposite `from` the ray
/// toward `to` exits through (§4.F). Scans every live, non-ghost tet
/// touching `from` and tests whether `to` lies within the tet's solid
/// angle at that vertex.
fn find_exit_face(builder: &DelaunayBuilder, from: VertexId, to: VertexId) -> Option<(TetId, u8)> {
    let arena = builder.arena();
    let mesh = builder.mesh();

    for t in mesh.iter_live() {
        if mesh.is_ghost(t) {
            continue;
        }
        let verts = mesh.vertices(t);
        let Some(i) = verts.iter().position(|s| *s == VertexSlot::Finite(from)) else {
            continue;
        };
        let f = i as u8;
        let face = mesh.face_vertices(t, f);
        let ids: [VertexId; 3] = face.map(|s| s.id().expect("non-ghost tet has finite faces"));
        if solid_angle_contains(arena, from, ids, to) {
            return Some((t, f));
        }
    }
    None
}

fn solid_angle_contains(
    arena: &crate::arena::VertexArena,
    from: VertexId,
    face: [VertexId; 3],
    to: VertexId,
) -> bool {
    let [a, b, c] = face;
    same_side_or_on(arena, from, a, b, to, c)
        && same_side_or_on(arena, from, b, c, to, a)
        && same_side_or_on(arena, from, c, a, to, b)
}

fn same_side_or_on(
    arena: &crate::arena::VertexArena,
    p0: VertexId,
    p1: VertexId,
    p2: VertexId,
    test: VertexId,
    reference: VertexId,
) -> bool {
    use crate::predicates::orient3d;
    let wanted = orient3d(arena, p0, p1, p2, reference);
    let got = orient3d(arena, p0, p1, p2, test);
    got == wanted || got.is_zero()
}

fn approx_segment_triangle_intersection(
    arena: &crate::arena::VertexArena,
    a: VertexId,
    b: VertexId,
    t0: VertexId,
    t1: VertexId,
    t2: VertexId,
) -> [f64; 3] {
    let a = arena.approx(a);
    let b = arena.approx(b);
    let t0 = arena.approx(t0);
    let t1 = arena.approx(t1);
    let t2 = arena.approx(t2);

    let normal = cross(sub(t1, t0), sub(t2, t0));
    let dir = sub(b, a);
    let denom = dot(dir, normal);
    if denom.abs() < f64::EPSILON {
        return a;
    }
    let t = dot(sub(t0, a), normal) / denom;
    [a[0] + t * dir[0], a[1] + t * dir[1], a[2] + t * dir[2]]
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::VertexArena;
    use crate::builder::DelaunayBuilder;

    #[test]
    fn already_present_edge_resolves_without_steiner_insertion() {
        let mut arena = VertexArena::new();
        arena.push_input([0.0, 0.0, 0.0]);
        arena.push_input([1.0, 0.0, 0.0]);
        arena.push_input([0.0, 1.0, 0.0]);
        arena.push_input([0.0, 0.0, 1.0]);
        let mut builder = DelaunayBuilder::new(&mut arena);
        builder.insert_all().unwrap();

        let (recovered, vertices) = recover_edge(&mut builder, VertexId(0), VertexId(1));
        assert!(recovered);
        assert_eq!(vertices, vec![VertexId(0), VertexId(1)]);
        assert_eq!(builder.arena().num_steiner(), 0);
    }

    #[test]
    fn diagonal_edge_across_a_cube_face_is_recovered() {
        let mut arena = VertexArena::new();
        for p in [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ] {
            arena.push_input(p);
        }
        let mut builder = DelaunayBuilder::new(&mut arena);
        builder.insert_all().unwrap();

        // the face diagonal (0,2) on the bottom face may or may not already
        // be a mesh edge depending on how the Delaunay tetrahedrization split
        // that face; either way recovery must resolve it.
        let (recovered, vertices) = recover_edge(&mut builder, VertexId(0), VertexId(2));
        assert!(recovered);
        assert_eq!(vertices[0], VertexId(0));
        assert_eq!(*vertices.last().unwrap(), VertexId(2));
    }
}
