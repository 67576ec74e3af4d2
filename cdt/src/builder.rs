//! Incremental Delaunay tetrahedrizer with ghost tetrahedra (§4.D).
//!
//! Generalizes the teacher's `Tetrahedralization`/`TetDataStructure` pair
//! (`rita/src/tetrahedralization.rs`, `rita/src/tetds/tet_data_structure.rs`):
//! same Bowyer–Watson cavity-carve-and-retetrahedrize shape, the
//! weighted/epsilon machinery dropped (this CDT has no power-diagram
//! weights), and a [`crate::mesh::Mark`] assigned at creation time instead of
//! left implicit.

use std::collections::{HashMap, HashSet, VecDeque};

use rayon::prelude::*;

use crate::arena::VertexArena;
use crate::mesh::{Mark, TetId, TetStore};
use crate::predicates::{self, Orientation};
use crate::vertex::{VertexId, VertexSlot};

/// A boundary triangle of a cavity (or, during seeding, of the very first
/// tetrahedron), carrying both its vertex slots — already in the winding the
/// *new* tet needs to use — and the existing tet/face it borders on the
/// outside.
struct BoundaryFace {
    /// The three vertices as seen from outside the cavity (i.e. the existing
    /// neighbor's own face winding).
    outer: [VertexSlot; 3],
    /// The tet bordering this face from the outside, and which of its faces
    /// this is. Always a concrete tet: while seeding the very first
    /// tetrahedron it is that very tet's own face (the new ghosts attach to
    /// it); while retetrahedrizing a cavity it is the existing tet the
    /// cavity boundary borders on the outside.
    outside: (TetId, u8),
}

/// Builds a Delaunay tetrahedrization of a finite vertex set, closing the
/// hull with ghost tetrahedra (§4.D).
pub struct DelaunayBuilder<'a> {
    mesh: TetStore,
    arena: &'a mut VertexArena,
    /// A recently touched tet, used as the starting point for the next
    /// point-location walk (§4.D, "start from a recently-modified tet").
    hint: Option<TetId>,
}

/// The Delaunay seed could not be formed: every candidate quadruple of input
/// vertices was coplanar (§4.D, "Failure").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegenerateSeed;

impl<'a> DelaunayBuilder<'a> {
    /// Construct an empty builder. Call [`Self::insert_all`] or
    /// [`Self::insert_vertex`] to populate it.
    pub fn new(arena: &'a mut VertexArena) -> Self {
        Self {
            mesh: TetStore::new(),
            arena,
            hint: None,
        }
    }

    pub const fn mesh(&self) -> &TetStore {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut TetStore {
        &mut self.mesh
    }

    pub fn arena(&self) -> &VertexArena {
        self.arena
    }

    /// Mutable access to the backing arena, for recovery (§4.F) to push new
    /// Steiner vertices into before re-inserting them via [`Self::insert_vertex`].
    pub fn arena_mut(&mut self) -> &mut VertexArena {
        self.arena
    }

    /// Insert every vertex `0..arena.num_input()` in caller order (§4.D,
    /// "Ordering" — the input array is never reordered).
    pub fn insert_all(&mut self) -> Result<(), DegenerateSeed> {
        let n = self.arena.num_input();
        if n < 4 {
            return Err(DegenerateSeed);
        }

        let seed = self.find_seed(n)?;
        self.seed_tetrahedron(seed);

        for i in 0..n {
            if seed.contains(&(i as u32)) {
                continue;
            }
            self.insert_vertex(VertexId(i as u32));
        }

        Ok(())
    }

    /// Scan vertices `0..n` for the first four that are not coplanar
    /// (§4.D, "Initialization").
    fn find_seed(&self, n: usize) -> Result<[u32; 4], DegenerateSeed> {
        for a in 0..n {
            for b in (a + 1)..n {
                for c in (b + 1)..n {
                    for d in (c + 1)..n {
                        let (va, vb, vc, vd) = (
                            VertexId(a as u32),
                            VertexId(b as u32),
                            VertexId(c as u32),
                            VertexId(d as u32),
                        );
                        if !predicates::orient3d(self.arena, va, vb, vc, vd).is_zero() {
                            return Ok([a as u32, b as u32, c as u32, d as u32]);
                        }
                    }
                }
            }
        }
        Err(DegenerateSeed)
    }

    /// Build the seed tetrahedron from four non-coplanar vertices, oriented
    /// positively, plus its four ghost neighbors (§4.D).
    fn seed_tetrahedron(&mut self, ids: [u32; 4]) {
        let [a, b, c, d] = ids.map(VertexId);
        let (a, b, c, d) = if predicates::orient3d(self.arena, a, b, c, d).is_negative() {
            (a, b, d, c)
        } else {
            (a, b, c, d)
        };

        let real = self.mesh.alloc(
            [
                VertexSlot::Finite(a),
                VertexSlot::Finite(b),
                VertexSlot::Finite(c),
                VertexSlot::Finite(d),
            ],
            Mark::Unset,
        );

        let boundary: Vec<BoundaryFace> = (0..4u8)
            .map(|f| BoundaryFace {
                outer: self.mesh.face_vertices(real, f),
                outside: (real, f),
            })
            .collect();

        self.attach_apex(VertexSlot::Infinite, boundary);
        self.hint = Some(real);
    }

    /// Insert a single already-arena-resident vertex, locating its cavity
    /// from the most recently touched tet (§4.D steps 1–4).
    pub fn insert_vertex(&mut self, v: VertexId) -> TetId {
        let start = self.hint.unwrap_or(TetId(0));
        let seed = self.locate_seed(start, v);
        let (cavity, boundary_raw) = self.build_cavity(seed, v);

        let boundary: Vec<BoundaryFace> = boundary_raw
            .into_iter()
            .map(|(outside_t, outside_f)| BoundaryFace {
                outer: self.mesh.face_vertices(outside_t, outside_f),
                outside: (outside_t, outside_f),
            })
            .collect();

        let new_tets = self.attach_apex(VertexSlot::Finite(v), boundary);

        // §4.D step 4: free cavity tets onto the free-list after the new
        // tets have been built (the spec's "3, then 4" order — new tets are
        // allocated fresh rather than recycling the cavity slots mid-build).
        for t in cavity {
            self.mesh.free(t);
        }

        let first = new_tets[0];
        self.hint = Some(first);
        first
    }

    /// Does `t`'s circumsphere contain `v`? For a ghost tet this degenerates
    /// to an `orient3d` of its three finite vertices against `v` (§4.D,
    /// "Ghost handling").
    fn in_circumsphere(&self, t: TetId, v: VertexId) -> bool {
        if let Some(inf) = self.mesh.infinite_slot(t) {
            let face = self.mesh.face_vertices(t, inf as u8);
            let [a, b, c] = face.map(|s| s.id().expect("ghost tet's non-infinite face is finite"));
            predicates::orient3d(self.arena, a, b, c, v).is_positive()
        } else {
            let verts = self.mesh.vertices(t);
            let [a, b, c, d] = verts.map(|s| s.id().expect("non-ghost tet has only finite slots"));
            predicates::insphere(self.arena, a, b, c, d, v).is_positive()
        }
    }

    /// Point-location walk toward `v`, starting from `start` (§4.D step 1).
    /// Only walks through non-ghost tets — if the walk exits the hull or
    /// fails to converge within a bounded number of steps, falls back to an
    /// exhaustive scan for any tet whose circumsphere contains `v` (mirroring
    /// the teacher's `locate_vis_walk` / `walk_check_all` fallback pair).
    fn locate_seed(&self, start: TetId, v: VertexId) -> TetId {
        let mut current = start;
        let max_steps = self.mesh.num_live().max(4);

        for _ in 0..max_steps {
            if self.mesh.is_ghost(current) {
                break;
            }

            let mut crossed = None;

            for f in 0..4u8 {
                let face = self.mesh.face_vertices(current, f);
                let ids = face.map(|s| s.id().expect("non-ghost tet has finite faces"));
                let sign = predicates::orient3d(self.arena, ids[0], ids[1], ids[2], v);
                if sign == Orientation::Negative {
                    crossed = Some(self.mesh.get_neighbor(current, f).0);
                    break;
                }
            }

            match crossed {
                Some(next) => current = next,
                None => return current,
            }
        }

        self.scan_for_seed(v).unwrap_or(current)
    }

    fn scan_for_seed(&self, v: VertexId) -> Option<TetId> {
        self.mesh.iter_live().find(|&t| self.in_circumsphere(t, v))
    }

    /// Flood-fill the maximal connected set of tets whose circumsphere
    /// contains `v`, starting from `seed` (§4.D step 2). Returns the cavity
    /// membership set and its boundary as (outside tet, outside face) pairs.
    ///
    /// The boundary is built by walking `order` — the BFS discovery
    /// order, a plain `Vec` — rather than iterating `cavity` itself.
    /// `HashSet`'s iteration order comes from `RandomState`'s per-construction
    /// hash seed, which reseeds on every call into this function; iterating
    /// it directly would make the order `attach_apex` allocates new tets in
    /// (and therefore the slot index — the `TetId` — each one gets, and
    /// therefore `mesh.iter_live()`'s enumeration order, and therefore the
    /// final `tetrahedra` array `compute_cdt` returns) depend on that seed.
    /// Both the BFS order and the fixed `0..4` face scan below are pure
    /// functions of the mesh's own (deterministic) neighbor links, so this
    /// keeps the boundary — and everything downstream of it — reproducible
    /// across repeated calls on the same input (§5, §8's Determinism law).
    fn build_cavity(&self, seed: TetId, v: VertexId) -> (HashSet<TetId>, Vec<(TetId, u8)>) {
        let mut cavity = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        cavity.insert(seed);
        order.push(seed);
        queue.push_back(seed);

        while let Some(t) = queue.pop_front() {
            for f in 0..4u8 {
                let (nb, _) = self.mesh.get_neighbor(t, f);
                if cavity.contains(&nb) {
                    continue;
                }
                if self.in_circumsphere(nb, v) {
                    cavity.insert(nb);
                    order.push(nb);
                    queue.push_back(nb);
                }
            }
        }

        let mut boundary = Vec::new();
        for &t in &order {
            for f in 0..4u8 {
                let (nb, nbf) = self.mesh.get_neighbor(t, f);
                if !cavity.contains(&nb) {
                    boundary.push((nb, nbf));
                }
            }
        }

        (cavity, boundary)
    }

    /// Connect `apex` to every boundary face, producing one new tet per
    /// face (§4.D step 3). Each new tet's vertex order is the boundary
    /// face's outer winding with the last two slots swapped, which is
    /// exactly the permutation that keeps the new tet positively oriented
    /// (the same trick the teacher's `bw_insert_node` uses:
    /// `replace_tet(ind_add, nod0, nod2, nod1, nod)`).
    ///
    /// New tets' face 3 (opposite `apex`) is linked to the boundary's
    /// `outside` tet; their three remaining faces are linked to each other
    /// by matching the undirected edge of the boundary triangle they
    /// correspond to — every edge of a closed cavity boundary (or of the
    /// seed tetrahedron's four faces) is shared by exactly two boundary
    /// triangles, so every side face finds exactly one partner.
    fn attach_apex(&mut self, apex: VertexSlot, boundary: Vec<BoundaryFace>) -> Vec<TetId> {
        let mut new_tets = Vec::with_capacity(boundary.len());
        let mut edge_map: HashMap<(EdgeKey, EdgeKey), (TetId, u8)> = HashMap::new();

        for bf in &boundary {
            let [a, b, c] = bf.outer;
            let new_tet = self.mesh.alloc([a, c, b, apex], Mark::Unset);
            new_tets.push(new_tet);

            let (outside_t, outside_f) = bf.outside;
            self.mesh.set_neighbor_pair(new_tet, 3, outside_t, outside_f);

            // Side faces, keyed by the undirected edge they share with the
            // adjacent boundary triangle (face-local indices per FACE_VERTS
            // applied to [a, c, b, apex]): face0 <-> edge(c,b), face1 <->
            // edge(a,b), face2 <-> edge(a,c).
            for (local_face, (x, y)) in [(0u8, (c, b)), (1u8, (a, b)), (2u8, (a, c))] {
                let key = edge_key(x, y);
                if let Some((other_tet, other_face)) = edge_map.remove(&key) {
                    self.mesh.set_neighbor_pair(new_tet, local_face, other_tet, other_face);
                } else {
                    edge_map.insert(key, (new_tet, local_face));
                }
            }
        }

        debug_assert!(edge_map.is_empty(), "cavity boundary must be a closed surface");
        new_tets
    }

    /// Check that every live, non-ghost tet is positively oriented, in
    /// parallel across tets (mirrors the teacher's `TetDataStructure::is_valid`
    /// regularity check, which farms its per-tet work out to `rayon` the same
    /// way). Exists for tests and fuzz harnesses to assert the invariant §4.D
    /// is supposed to maintain after every insertion, not for the hot path.
    pub fn all_finite_tets_positively_oriented(&self) -> bool {
        let live: Vec<TetId> = self.mesh.iter_live().filter(|&t| !self.mesh.is_ghost(t)).collect();
        live.par_iter().all(|&t| {
            let verts = self.mesh.vertices(t);
            let ids = verts.map(|s| s.id().expect("non-ghost tet has only finite slots"));
            predicates::orient3d(self.arena, ids[0], ids[1], ids[2], ids[3]).is_positive()
        })
    }
}

type EdgeKey = (u8, u32);

fn edge_key(a: VertexSlot, b: VertexSlot) -> (EdgeKey, EdgeKey) {
    let ka = slot_key(a);
    let kb = slot_key(b);
    if ka <= kb { (ka, kb) } else { (kb, ka) }
}

fn slot_key(s: VertexSlot) -> EdgeKey {
    match s {
        VertexSlot::Finite(id) => (0, id.0),
        VertexSlot::Infinite => (1, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::VertexArena;

    fn arena_cube() -> VertexArena {
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
        arena
    }

    #[test]
    fn builds_tetrahedron_from_four_vertices() {
        let mut arena = VertexArena::new();
        arena.push_input([0.0, 0.0, 0.0]);
        arena.push_input([1.0, 0.0, 0.0]);
        arena.push_input([0.0, 1.0, 0.0]);
        arena.push_input([0.0, 0.0, 1.0]);

        let mut builder = DelaunayBuilder::new(&mut arena);
        builder.insert_all().unwrap();

        let non_ghost = builder.mesh().iter_live().filter(|&t| !builder.mesh().is_ghost(t)).count();
        assert_eq!(non_ghost, 1);
        let ghosts = builder.mesh().iter_live().filter(|&t| builder.mesh().is_ghost(t)).count();
        assert_eq!(ghosts, 4);
    }

    #[test]
    fn coplanar_input_is_a_degenerate_seed() {
        let mut arena = VertexArena::new();
        arena.push_input([0.0, 0.0, 0.0]);
        arena.push_input([1.0, 0.0, 0.0]);
        arena.push_input([0.0, 1.0, 0.0]);
        arena.push_input([1.0, 1.0, 0.0]);

        let mut builder = DelaunayBuilder::new(&mut arena);
        assert_eq!(builder.insert_all(), Err(DegenerateSeed));
    }

    #[test]
    fn builds_cube_and_every_tet_is_positively_oriented() {
        let mut arena = arena_cube();
        let mut builder = DelaunayBuilder::new(&mut arena);
        builder.insert_all().unwrap();

        for t in builder.mesh().iter_live() {
            if builder.mesh().is_ghost(t) {
                continue;
            }
            let verts = builder.mesh().vertices(t);
            let [a, b, c, d] = verts.map(|s| s.id().unwrap());
            assert!(predicates::orient3d(builder.arena(), a, b, c, d).is_positive());
        }
    }

    #[test]
    fn every_finite_tet_stays_positively_oriented_after_all_insertions() {
        let mut arena = arena_cube();
        let mut builder = DelaunayBuilder::new(&mut arena);
        builder.insert_all().unwrap();

        assert!(builder.all_finite_tets_positively_oriented());
    }

    #[test]
    fn neighbor_links_are_symmetric_after_all_insertions() {
        let mut arena = arena_cube();
        let mut builder = DelaunayBuilder::new(&mut arena);
        builder.insert_all().unwrap();

        for t in builder.mesh().iter_live() {
            for f in 0..4u8 {
                let (nb, nbf) = builder.mesh().get_neighbor(t, f);
                assert_eq!(builder.mesh().get_neighbor(nb, nbf), (t, f));
            }
        }
    }
}
