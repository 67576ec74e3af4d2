//! Face recovery (§4.G): force every input triangle to appear as one or more
//! mesh faces, once its three edges are already mesh-edge chains.
//!
//! Most input triangles are already present directly once their boundary
//! edges are Delaunay — this is the easy, common case. When a triangle is
//! still missing, some existing mesh edge must pass transversally through
//! its interior (an edge that "pierces" the facet and blocks recovery,
//! TetGen's own term for the obstruction). The fix mirrors segment
//! recovery's own crossing rule, with the two roles swapped: split the
//! piercing edge at its exact intersection with the facet's plane, via the
//! same [`crate::vertex::SteinerPoint`] representation, and re-insert
//! through the ordinary Bowyer–Watson path. Repeating this removes piercing
//! edges one at a time until the facet is either present or recovery gives
//! up (§7 category 3).

use std::collections::{HashSet, VecDeque};

use crate::builder::DelaunayBuilder;
use crate::mesh::{TetId, TetStore};
use crate::overlay::EDGE_VERTS;
use crate::predicates::orient3d;
use crate::vertex::{SteinerPoint, VertexId, VertexSlot};

/// Recover the input triangle `(a, b, c)` as a union of mesh faces, assuming
/// its three edges are already present as mesh-edge chains (§4.F must have
/// already run). Returns the ordered list of sub-triangle vertex triples
/// that tile it, or `None` if recovery gave up (§7 category 3).
///
/// Returns vertex triples rather than `(TetId, u8)` pairs deliberately: a
/// later input triangle's own Steiner insertions can still free and recycle
/// the very tet slot a face found here was resolved against
/// (`TetStore::alloc`/`free`, §4.C), so any `(TetId, u8)` captured before
/// every triangle's recovery has finished could already be stale by the time
/// [`crate::recovery::recover_all`] is done. [`crate::recovery::recover_all`]'s
/// final resolution pass looks these vertex triples back up once no further
/// insertion will ever happen.
///
/// When every boundary edge is still a single mesh edge this degenerates to
/// the one-face case directly. When segment recovery subdivided a boundary
/// edge with an intermediate vertex, `(a, b, c)` itself can never again be a
/// single mesh face — the boundary is the polygon obtained by walking the
/// three (possibly subdivided) edge chains in order, and that polygon is
/// ear-clipped into the sub-triangles this function actually recovers.
pub fn recover_triangle(
    builder: &mut DelaunayBuilder,
    chain_ab: &[VertexId],
    chain_bc: &[VertexId],
    chain_ca: &[VertexId],
) -> Option<Vec<[VertexId; 3]>> {
    let mut boundary = Vec::with_capacity(chain_ab.len() + chain_bc.len() + chain_ca.len() - 2);
    boundary.extend_from_slice(&chain_ab[..chain_ab.len() - 1]);
    boundary.extend_from_slice(&chain_bc[..chain_bc.len() - 1]);
    boundary.extend_from_slice(&chain_ca[..chain_ca.len() - 1]);

    // The boundary is convex (it is the original triangle `(a, b, c)` with
    // extra, collinear points threaded along its edges by segment recovery),
    // so a plane normal from the three corners is enough to ear-clip it —
    // no interior point of the triangle can fall inside a corner's ear.
    let normal = plane_normal(builder.arena(), chain_ab[0], chain_bc[0], chain_ca[0]);
    let triangles = ear_clip(builder.arena(), &boundary, normal);

    recover_polygon(builder, triangles)
}

/// Fan-triangulate a convex planar polygon by repeatedly clipping the first
/// ear found (a consecutive triple whose turn matches `normal`), falling
/// back to a naive fan if the remainder is perfectly degenerate (shouldn't
/// happen for a non-degenerate input triangle, kept only as a backstop).
fn ear_clip(arena: &crate::arena::VertexArena, boundary: &[VertexId], normal: [f64; 3]) -> Vec<[VertexId; 3]> {
    let mut poly = boundary.to_vec();
    let mut triangles = Vec::new();

    while poly.len() > 3 {
        let n = poly.len();
        let ear = (0..n).find(|&i| {
            let prev = poly[(i + n - 1) % n];
            let cur = poly[i];
            let next = poly[(i + 1) % n];
            is_ear(arena, prev, cur, next, normal)
        });

        match ear {
            Some(i) => {
                let prev = poly[(i + n - 1) % n];
                let next = poly[(i + 1) % n];
                triangles.push([prev, poly[i], next]);
                poly.remove(i);
            }
            None => {
                for window in poly[1..].windows(2) {
                    triangles.push([poly[0], window[0], window[1]]);
                }
                poly.truncate(1);
            }
        }
    }
    if poly.len() == 3 {
        triangles.push([poly[0], poly[1], poly[2]]);
    }
    triangles
}

fn plane_normal(arena: &crate::arena::VertexArena, a: VertexId, b: VertexId, c: VertexId) -> [f64; 3] {
    cross(sub(arena.approx(b), arena.approx(a)), sub(arena.approx(c), arena.approx(a)))
}

/// Whether `(prev, cur, next)` turns the same way as `normal` and isn't a
/// degenerate (collinear) triple — i.e. is a legal ear to clip.
fn is_ear(arena: &crate::arena::VertexArena, prev: VertexId, cur: VertexId, next: VertexId, normal: [f64; 3]) -> bool {
    let turn = cross(
        sub(arena.approx(cur), arena.approx(prev)),
        sub(arena.approx(next), arena.approx(cur)),
    );
    dot(turn, normal) > 1e-12 * dot(normal, normal).max(1.0)
}

/// Recover a list of triangles forming a convex polygon's ear-clip
/// decomposition as a union of mesh faces (§4.G's "pipe of tets" generalized
/// to a triangle whose own edge was subdivided). Triangles needing a Steiner
/// point to resolve fan out into three further sub-triangles around it.
/// Returns the resolved sub-triangles as vertex triples — see
/// [`recover_triangle`] for why a `(TetId, u8)` is never recorded here.
fn recover_polygon(builder: &mut DelaunayBuilder, initial_triangles: Vec<[VertexId; 3]>) -> Option<Vec<[VertexId; 3]>> {
    let mut resolved = Vec::new();
    let mut queue: VecDeque<[VertexId; 3]> = initial_triangles.into_iter().collect();

    let max_insertions = builder.arena().len() * 4 + 256;
    let mut insertions = 0usize;

    while let Some([a, b, c]) = queue.pop_front() {
        if find_mesh_face(builder.mesh(), a, b, c).is_some() {
            resolved.push([a, b, c]);
            continue;
        }

        if insertions >= max_insertions {
            return None;
        }
        let (p, q, t0, t1, t2) = find_piercing_edge(builder, a, b, c)?;
        let approx = approx_segment_triangle_intersection(builder.arena(), p, q, t0, t1, t2);
        let steiner = builder.arena_mut().push_steiner(SteinerPoint {
            segment: [p, q],
            triangle: [t0, t1, t2],
            approx,
        });
        builder.insert_vertex(steiner);
        insertions += 1;

        queue.push_back([a, b, steiner]);
        queue.push_back([b, c, steiner]);
        queue.push_back([c, a, steiner]);
    }

    Some(resolved)
}

/// Find a live mesh face exactly matching vertex set `{a, b, c}`. Used both
/// as an existence check during recovery and, by
/// [`crate::recovery::recover_all`]'s final resolution pass, to look up the
/// authoritative `(TetId, u8)` once every insertion has already happened.
pub(crate) fn find_mesh_face(mesh: &TetStore, a: VertexId, b: VertexId, c: VertexId) -> Option<(TetId, u8)> {
    let want: HashSet<VertexId> = [a, b, c].into_iter().collect();
    for t in mesh.iter_live() {
        for f in 0..4u8 {
            let face = mesh.face_vertices(t, f);
            let ids: Option<HashSet<VertexId>> = face.iter().map(|s| s.id()).collect();
            if ids.as_ref() == Some(&want) {
                return Some((t, f));
            }
        }
    }
    None
}

/// Find a live mesh edge `(p, q)`, disjoint from `{a, b, c}`, whose segment
/// transversally crosses the open interior of triangle `(a, b, c)`.
///
/// Uses the classical segment/triangle intersection test: `p` and `q` must
/// fall strictly on opposite sides of the triangle's plane, and the three
/// "side" orientation tests around the segment must agree in sign — the
/// segment's shadow, viewed end-on, winds consistently around the triangle.
fn find_piercing_edge(
    builder: &DelaunayBuilder,
    a: VertexId,
    b: VertexId,
    c: VertexId,
) -> Option<(VertexId, VertexId, VertexId, VertexId, VertexId)> {
    let arena = builder.arena();
    let mesh = builder.mesh();
    let triangle_verts: HashSet<VertexId> = [a, b, c].into_iter().collect();

    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    for t in mesh.iter_live() {
        if mesh.is_ghost(t) {
            continue;
        }
        let verts = mesh.vertices(t);
        for &[i, j] in &EDGE_VERTS {
            let (Some(p), Some(q)) = (verts[i].id(), verts[j].id()) else {
                continue;
            };
            if triangle_verts.contains(&p) || triangle_verts.contains(&q) {
                continue;
            }
            let key = if p.0 <= q.0 { (p.0, q.0) } else { (q.0, p.0) };
            if !seen.insert(key) {
                continue;
            }

            let side_p = orient3d(arena, a, b, c, p);
            let side_q = orient3d(arena, a, b, c, q);
            if side_p.is_zero() || side_q.is_zero() || side_p == side_q {
                continue;
            }

            let s1 = orient3d(arena, p, a, b, q);
            let s2 = orient3d(arena, p, b, c, q);
            let s3 = orient3d(arena, p, c, a, q);
            if s1.is_zero() || s2.is_zero() || s3.is_zero() {
                continue;
            }
            if s1 == s2 && s2 == s3 {
                return Some((p, q, a, b, c));
            }
        }
    }
    None
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
    fn face_of_the_seed_tetrahedron_is_recovered_directly() {
        let mut arena = VertexArena::new();
        arena.push_input([0.0, 0.0, 0.0]);
        arena.push_input([1.0, 0.0, 0.0]);
        arena.push_input([0.0, 1.0, 0.0]);
        arena.push_input([0.0, 0.0, 1.0]);
        let mut builder = DelaunayBuilder::new(&mut arena);
        builder.insert_all().unwrap();

        let chain_ab = [VertexId(0), VertexId(1)];
        let chain_bc = [VertexId(1), VertexId(2)];
        let chain_ca = [VertexId(2), VertexId(0)];
        let faces = recover_triangle(&mut builder, &chain_ab, &chain_bc, &chain_ca);
        assert_eq!(faces.as_ref().map(Vec::len), Some(1));
        assert_eq!(builder.arena().num_steiner(), 0);
    }

    #[test]
    fn ear_clip_skips_the_degenerate_ear_along_a_subdivided_edge() {
        // triangle (0,1,2) whose edge (0,1) carries an on-edge midpoint `3`:
        // naive fan-from-`0` would clip the zero-area ear (0,3,1) before
        // ever reaching a real triangle. Ear-clipping must instead produce
        // the two genuine faces (2,0,3) and (3,1,2).
        let mut arena = VertexArena::new();
        arena.push_input([0.0, 0.0, 0.0]); // 0 = a
        arena.push_input([2.0, 0.0, 0.0]); // 1 = b
        arena.push_input([0.0, 2.0, 0.0]); // 2 = c
        arena.push_input([1.0, 0.0, 0.0]); // 3 = m, midpoint of a-b
        let boundary = [VertexId(0), VertexId(3), VertexId(1), VertexId(2)];
        let normal = plane_normal(&arena, VertexId(0), VertexId(1), VertexId(2));

        let triangles = ear_clip(&arena, &boundary, normal);
        assert_eq!(triangles.len(), 2);

        let degenerate: HashSet<VertexId> = [VertexId(0), VertexId(3), VertexId(1)].into_iter().collect();
        for tri in &triangles {
            let verts: HashSet<VertexId> = tri.iter().copied().collect();
            assert_eq!(verts.len(), 3, "no ear should repeat a vertex");
            assert_ne!(verts, degenerate, "the zero-area ear must never be clipped");
        }
    }
}
