//! The tet mesh: a combinatorial tetrahedron store with ghost handling (§4.C).
//!
//! Tetrahedra live in a flat arena, one `[VertexSlot; 4]` and one
//! `[TetId; 4]`/`[u8; 4]` neighbor pair per slot. Deletion tombstones a slot
//! onto a free-list threaded through the neighbor array (`neighbors[t][0]`
//! holds the next free slot while `t` is dead) rather than shrinking the
//! backing `Vec`s, exactly as §4.C and §9 ("cyclic neighbor graph ... as
//! indices into a single owning arena") specify.
//!
//! Face `f` of a tet is always the triangle opposite local vertex `f`; the
//! vertex order within that triangle is [`FACE_VERTS`], carried over from the
//! teacher's `TRIANGLE_SUBINDICES` table (`tetds/tet_data_structure.rs`): it
//! is exactly the permutation for which a positively oriented tet satisfies
//! `orient3d(face_verts(f), tet[f]) > 0` for every `f`.

use core::fmt;

use crate::vertex::VertexSlot;

/// For each local face index, the local vertex indices of that face in a
/// winding such that a positively oriented tet has its opposite vertex on
/// the positive side of the face (teacher's `TRIANGLE_SUBINDICES`).
pub const FACE_VERTS: [[usize; 3]; 4] = [[1, 3, 2], [0, 2, 3], [0, 3, 1], [0, 1, 2]];

/// A dense handle into the tet arena. `NIL` is reserved for the free-list
/// sentinel and is never returned by [`TetStore::alloc`].
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct TetId(pub u32);

impl TetId {
    pub(crate) const NIL: TetId = TetId(u32::MAX);

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A tetrahedron's classification within the final region-marked mesh (§3,
/// §4.H). `Unset` is the state every tet is created in; after region marking
/// completes no non-ghost tet remains `Unset`.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum Mark {
    #[default]
    Unset,
    In,
    Out,
}

/// The combinatorial tetrahedron store (§4.C).
///
/// Owns no vertex coordinates — only the four [`VertexSlot`]s per tet, the
/// neighbor-tet/neighbor-face pair per face, and a mark byte. Coordinates
/// live in [`crate::arena::VertexArena`]; callers needing them pass the arena
/// alongside a [`VertexSlot`].
#[derive(Clone, Debug, Default)]
pub struct TetStore {
    verts: Vec<[VertexSlot; 4]>,
    neighbor_tet: Vec<[TetId; 4]>,
    neighbor_face: Vec<[u8; 4]>,
    marks: Vec<Mark>,
    /// `None` when no slot has ever been freed. Otherwise the head of the
    /// free-list threaded through `neighbor_tet[.][0]`.
    free_head: Option<TetId>,
    num_live: usize,
}

impl TetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a tet with the given vertex slots and mark, reusing a freed
    /// slot from the free-list when one is available (amortized doubling via
    /// `Vec::push` otherwise — §4.C, "growth is amortized doubling").
    pub fn alloc(&mut self, verts: [VertexSlot; 4], mark: Mark) -> TetId {
        self.num_live += 1;

        if let Some(head) = self.free_head {
            let next = self.neighbor_tet[head.index()][0];
            self.free_head = if next == TetId::NIL { None } else { Some(next) };
            self.verts[head.index()] = verts;
            self.marks[head.index()] = mark;
            return head;
        }

        let id = TetId(self.verts.len() as u32);
        self.verts.push(verts);
        self.neighbor_tet.push([TetId::NIL; 4]);
        self.neighbor_face.push([0; 4]);
        self.marks.push(mark);
        id
    }

    /// Attempt to allocate, surfacing an allocation failure (§7 category 4)
    /// instead of aborting the process.
    pub fn try_alloc(&mut self, verts: [VertexSlot; 4], mark: Mark) -> Result<TetId, ()> {
        if self.free_head.is_none() && self.verts.try_reserve(1).is_err() {
            return Err(());
        }
        Ok(self.alloc(verts, mark))
    }

    /// Tombstone a tet onto the free-list. Its vertex slots are left
    /// untouched (harmless, since a freed slot is unreachable from
    /// `iter_live`) until the slot is recycled by [`Self::alloc`].
    pub fn free(&mut self, t: TetId) {
        let next = self.free_head.unwrap_or(TetId::NIL);
        self.neighbor_tet[t.index()][0] = next;
        self.free_head = Some(t);
        self.num_live -= 1;
    }

    pub fn vertices(&self, t: TetId) -> [VertexSlot; 4] {
        self.verts[t.index()]
    }

    pub fn set_vertices(&mut self, t: TetId, verts: [VertexSlot; 4]) {
        self.verts[t.index()] = verts;
    }

    /// The three vertex slots of face `f`, in the winding [`FACE_VERTS`]
    /// describes.
    pub fn face_vertices(&self, t: TetId, f: u8) -> [VertexSlot; 3] {
        let verts = self.verts[t.index()];
        let idx = FACE_VERTS[f as usize];
        [verts[idx[0]], verts[idx[1]], verts[idx[2]]]
    }

    pub fn get_neighbor(&self, t: TetId, f: u8) -> (TetId, u8) {
        (
            self.neighbor_tet[t.index()][f as usize],
            self.neighbor_face[t.index()][f as usize],
        )
    }

    pub fn set_neighbor(&mut self, t: TetId, f: u8, other: TetId, other_face: u8) {
        self.neighbor_tet[t.index()][f as usize] = other;
        self.neighbor_face[t.index()][f as usize] = other_face;
    }

    /// Set the neighbor link symmetrically: §3's invariant that `t` naming
    /// `u` across face `f` implies `u` names `t` across the corresponding
    /// face.
    pub fn set_neighbor_pair(&mut self, t: TetId, f: u8, u: TetId, g: u8) {
        self.set_neighbor(t, f, u, g);
        self.set_neighbor(u, g, t, f);
    }

    pub fn mark(&self, t: TetId) -> Mark {
        self.marks[t.index()]
    }

    pub fn set_mark(&mut self, t: TetId, mark: Mark) {
        self.marks[t.index()] = mark;
    }

    /// A tet is a ghost iff one of its four slots is the infinite vertex.
    pub fn is_ghost(&self, t: TetId) -> bool {
        self.verts[t.index()].iter().any(VertexSlot::is_infinite)
    }

    /// The local index of the infinite slot, for a ghost tet.
    pub fn infinite_slot(&self, t: TetId) -> Option<usize> {
        self.verts[t.index()].iter().position(VertexSlot::is_infinite)
    }

    /// Number of live (non-freed) tets. Includes ghosts.
    pub const fn num_live(&self) -> usize {
        self.num_live
    }

    /// Total number of slots ever allocated, live or freed — the upper bound
    /// on a valid [`TetId`].
    pub fn capacity_slots(&self) -> usize {
        self.verts.len()
    }

    fn is_live(&self, t: TetId) -> bool {
        // A slot is free iff it is currently reachable from `free_head`.
        // Walking the free-list per query would be O(free-list length); the
        // mesh instead tracks liveness implicitly via `num_live` and the
        // iteration below walks the free-list once to build a skip-set.
        let mut cur = self.free_head;
        while let Some(c) = cur {
            if c == t {
                return false;
            }
            let next = self.neighbor_tet[c.index()][0];
            cur = if next == TetId::NIL { None } else { Some(next) };
        }
        true
    }

    /// Iterate every live tet's handle, ghost and non-ghost alike, in slot
    /// order (not input order — callers needing a stable scan order should
    /// collect and sort).
    pub fn iter_live(&self) -> impl Iterator<Item = TetId> + '_ {
        (0..self.verts.len() as u32).map(TetId).filter(move |&t| self.is_live(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::VertexId;

    fn v(i: u32) -> VertexSlot {
        VertexSlot::Finite(VertexId(i))
    }

    #[test]
    fn alloc_and_free_recycles_slots() {
        let mut store = TetStore::new();
        let a = store.alloc([v(0), v(1), v(2), v(3)], Mark::Unset);
        let b = store.alloc([v(1), v(2), v(3), v(4)], Mark::Unset);
        assert_eq!(store.num_live(), 2);

        store.free(a);
        assert_eq!(store.num_live(), 1);

        let c = store.alloc([v(4), v(5), v(6), v(7)], Mark::Unset);
        assert_eq!(c, a, "freed slot should be recycled");
        assert_eq!(store.capacity_slots(), 2);
        assert_eq!(store.num_live(), 2);

        let live: Vec<_> = store.iter_live().collect();
        assert_eq!(live.len(), 2);
        assert!(live.contains(&b));
        assert!(live.contains(&c));
    }

    #[test]
    fn face_vertices_match_table() {
        let mut store = TetStore::new();
        let t = store.alloc([v(10), v(11), v(12), v(13)], Mark::Unset);
        assert_eq!(store.face_vertices(t, 3), [v(10), v(11), v(12)]);
        assert_eq!(store.face_vertices(t, 0), [v(11), v(13), v(12)]);
    }

    #[test]
    fn neighbor_pair_is_symmetric() {
        let mut store = TetStore::new();
        let a = store.alloc([v(0), v(1), v(2), v(3)], Mark::Unset);
        let b = store.alloc([v(1), v(2), v(3), v(4)], Mark::Unset);
        store.set_neighbor_pair(a, 3, b, 0);
        assert_eq!(store.get_neighbor(a, 3), (b, 0));
        assert_eq!(store.get_neighbor(b, 0), (a, 3));
    }

    #[test]
    fn is_ghost_detects_infinite_slot() {
        let mut store = TetStore::new();
        let t = store.alloc([v(0), v(1), v(2), VertexSlot::Infinite], Mark::Unset);
        assert!(store.is_ghost(t));
        assert_eq!(store.infinite_slot(t), Some(3));
    }
}
