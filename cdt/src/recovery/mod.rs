//! Constraint recovery: segments first, then faces (§4.F, §4.G).
//!
//! Segment recovery must run to completion before face recovery starts —
//! every input triangle's three edges need to already be mesh-edge chains
//! before `recover_triangle` can look for a matching mesh face, since a
//! dangling (unsubdivided) edge can never bound a recovered face.
//!
//! Three phases, in order:
//!
//! 1. Recover every input edge into a vertex chain (`segments::recover_edge`).
//! 2. Recover every input triangle into sub-triangle vertex triples
//!    (`faces::recover_triangle`), using those chains.
//! 3. Only once every insertion phases 1 and 2 will ever make has already
//!    happened, re-resolve every recovered chain/triangle to its final
//!    `(TetId, u8)` pairs.
//!
//! Phases 1 and 2 never record a `(TetId, u8)` — only vertex identities,
//! which are stable for the rest of the computation. A tet slot is
//! tombstoned and recycled by `TetStore::alloc`/`free` (§4.C) whenever a
//! *later* Steiner insertion anywhere in the mesh needs the space, so a
//! `(TetId, u8)` captured mid-pipeline (e.g. while recovering input
//! triangle 3 of 10) can silently point at a different face, or a freed
//! one, by the time triangle 10 is done and region marking runs. Phase 3's
//! lookups happen after the last insertion, so nothing can invalidate them
//! before `mark_regions` (§4.H) reads `overlay.triangles[..].child_faces`.

pub mod faces;
pub mod segments;

use crate::builder::DelaunayBuilder;
use crate::overlay::StructuredPlc;
use crate::vertex::VertexId;

/// Run segment recovery over every input edge, then face recovery over
/// every input triangle, then re-resolve every recovered constraint to its
/// final mesh faces/edges. Returns whether recovery completed without a
/// failure being recorded — §4.G's `faceRecoverySuccess`, surfaced to the
/// caller as `CdtResult::success` (§6).
pub fn recover_all(builder: &mut DelaunayBuilder, overlay: &mut StructuredPlc) -> bool {
    for i in 0..overlay.edges.len() {
        let [u, v] = overlay.edges[i].vertices;
        let (recovered, vertex_chain) = segments::recover_edge(builder, u, v);
        overlay.edges[i].vertex_chain = vertex_chain;
        overlay.edges[i].recovered = recovered;
    }

    let mut all_faces_ok = true;
    for i in 0..overlay.triangles.len() {
        let [a, b, c] = overlay.triangles[i].vertices;
        let (Some(chain_ab), Some(chain_bc), Some(chain_ca)) = (
            directed_chain(overlay, a, b),
            directed_chain(overlay, b, c),
            directed_chain(overlay, c, a),
        ) else {
            // one of the bounding edges never recovered at all; the
            // triangle can't be attempted.
            all_faces_ok = false;
            continue;
        };

        match faces::recover_triangle(builder, &chain_ab, &chain_bc, &chain_ca) {
            Some(child_face_verts) => {
                overlay.triangles[i].child_face_verts = child_face_verts;
                overlay.triangles[i].recovered = true;
            }
            None => all_faces_ok = false,
        }
    }

    // Phase 3: every insertion is done; re-resolve by vertex identity, not
    // by any `TetId` captured during phases 1-2.
    for edge in &mut overlay.edges {
        if !edge.recovered {
            continue;
        }
        edge.child_edges = edge
            .vertex_chain
            .windows(2)
            .map(|w| {
                segments::find_mesh_edge(builder.mesh(), w[0], w[1])
                    .expect("edge recovery reached v, so every consecutive pair must be a mesh edge")
            })
            .collect();
    }

    for tri in &mut overlay.triangles {
        if !tri.recovered {
            continue;
        }
        tri.child_faces = tri
            .child_face_verts
            .iter()
            .map(|&[a, b, c]| {
                faces::find_mesh_face(builder.mesh(), a, b, c)
                    .expect("face recovery resolved this triangle, so it must still be a mesh face")
            })
            .collect();
    }

    all_faces_ok && overlay.edges.iter().all(|e| e.is_resolved())
}

/// The recovered vertex chain for edge `(u, v)`, oriented `u -> v` (the
/// overlay stores each edge once, canonicalized by vertex-id order, so the
/// direction a triangle actually needs may be the reverse of what's stored).
fn directed_chain(overlay: &StructuredPlc, u: VertexId, v: VertexId) -> Option<Vec<VertexId>> {
    let edge = overlay.edges.iter().find(|e| {
        (e.vertices[0] == u && e.vertices[1] == v) || (e.vertices[0] == v && e.vertices[1] == u)
    })?;
    if !edge.is_resolved() {
        return None;
    }
    if edge.vertices[0] == u {
        Some(edge.vertex_chain.clone())
    } else {
        Some(edge.vertex_chain.iter().rev().copied().collect())
    }
}
