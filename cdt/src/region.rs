//! Region marking: flood-fill `In`/`Out` across the recovered boundary
//! (§4.H).
//!
//! Every ghost tet is definitionally outside the PLC's solid, so the flood
//! fill seeds there and crosses into the finite mesh only through faces that
//! were never recovered as part of the boundary — crossing a recovered face
//! means leaving the solid (or entering it), so the fill stops at every one.

use std::collections::{HashSet, VecDeque};

use crate::mesh::{Mark, TetStore};
use crate::overlay::StructuredPlc;

/// Treats the union of every recovered child face as a cut in the tet
/// adjacency graph, flood-fills `Out` from every ghost tet, and marks
/// everything else `In`. Returns the number of tets marked `In`.
///
/// If `is_polyhedron` is false the boundary is not closed and a flood fill
/// cannot be trusted to stay outside the solid, so marking is skipped and
/// every non-ghost tet is reported `In` (§4.H, "If isPolyhedron is false").
pub fn mark_regions(mesh: &mut TetStore, overlay: &StructuredPlc, is_polyhedron: bool) -> usize {
    let boundary: HashSet<(u32, u8)> = overlay
        .triangles
        .iter()
        .flat_map(|tri| tri.child_faces.iter().copied())
        .map(|(t, f)| (t.0, f))
        .collect();

    if !is_polyhedron {
        let mut count = 0;
        for t in mesh.iter_live().collect::<Vec<_>>() {
            if mesh.is_ghost(t) {
                continue;
            }
            mesh.set_mark(t, Mark::In);
            count += 1;
        }
        return count;
    }

    let mut queue = VecDeque::new();
    let mut visited: HashSet<u32> = HashSet::new();

    for t in mesh.iter_live().collect::<Vec<_>>() {
        if mesh.is_ghost(t) && visited.insert(t.0) {
            mesh.set_mark(t, Mark::Out);
            queue.push_back(t);
        }
    }

    while let Some(t) = queue.pop_front() {
        for f in 0..4u8 {
            if boundary.contains(&(t.0, f)) {
                continue;
            }
            let (nb, nbf) = mesh.get_neighbor(t, f);
            if boundary.contains(&(nb.0, nbf)) {
                continue;
            }
            if visited.insert(nb.0) {
                mesh.set_mark(nb, Mark::Out);
                queue.push_back(nb);
            }
        }
    }

    let mut in_count = 0;
    for t in mesh.iter_live().collect::<Vec<_>>() {
        if !visited.contains(&t.0) {
            mesh.set_mark(t, Mark::In);
            in_count += 1;
        }
    }

    in_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::VertexArena;
    use crate::builder::DelaunayBuilder;
    use crate::plc::RawPlc;

    #[test]
    fn unconstrained_cube_has_no_in_tets_since_nothing_cuts_off_the_ghosts() {
        let vertices = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0,
            0.0, 1.0, 1.0,
        ];
        let plc = RawPlc::validate(&vertices, &[]).unwrap();
        let mut arena = plc.build_arena();
        let mut builder = DelaunayBuilder::new(&mut arena);
        builder.insert_all().unwrap();

        let overlay = StructuredPlc::from_plc(&plc);
        let in_count = mark_regions(builder.mesh_mut(), &overlay, true);
        // no recovered faces at all means the fill reaches every finite tet
        // from the ghosts, so none are left `In`.
        assert_eq!(in_count, 0);
    }

    #[test]
    fn non_polyhedron_marks_every_non_ghost_tet_in() {
        let vertices = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0,
            0.0, 1.0, 1.0,
        ];
        let plc = RawPlc::validate(&vertices, &[]).unwrap();
        let mut arena = plc.build_arena();
        let mut builder = DelaunayBuilder::new(&mut arena);
        builder.insert_all().unwrap();

        let overlay = StructuredPlc::from_plc(&plc);
        let in_count = mark_regions(builder.mesh_mut(), &overlay, false);
        let non_ghost = builder.mesh().iter_live().filter(|&t| !builder.mesh().is_ghost(t)).count();
        assert_eq!(in_count, non_ghost);
    }
}
