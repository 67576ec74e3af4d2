//! # cdt
//!
//! Constrained Delaunay tetrahedrization of a 3D piecewise linear complex:
//! given a vertex set and a set of triangular surface constraints, produce a
//! tetrahedral decomposition whose tetrahedra respect the input triangles as
//! a union of mesh faces, inserting Steiner vertices only where strictly
//! required to make the constraints recoverable.
#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::all, clippy::missing_const_for_fn)]

mod arena;
mod exact;
pub mod builder;
pub mod fpu;
pub mod mesh;
pub mod overlay;
pub mod plc;
pub mod predicates;
pub mod recovery;
pub mod region;
pub mod vertex;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use plc::{MeshValidation, PlcError, validate_mesh};

use builder::DelaunayBuilder;
use fpu::FpuGuard;
use mesh::Mark;
use overlay::StructuredPlc;
use plc::RawPlc;

/// Tunables for [`compute_cdt`] (§6's "complete set" of configuration
/// options).
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct CdtOptions {
    /// Close the input with eight axis-aligned vertices just outside its
    /// bounding box before tetrahedrizing (§4.B).
    pub add_bounding_box: bool,
    /// Route `log::debug!`/`log::trace!` diagnostics for this call. Never
    /// affects output values, only what is logged (§6, §9 "injectable
    /// sink").
    pub verbose: bool,
}

/// The outcome of a [`compute_cdt`] call. Every failure mode §7 names
/// collapses into `success = false` with empty arrays rather than a
/// distinct error variant — only resource exhaustion (§7 category 4)
/// reaches the caller as an `Err` instead (§6, "Error signalling").
#[derive(Debug, Clone, Default)]
pub struct CdtResult {
    /// Output coordinates, length `3 * (numInputVertices + numSteinerVertices)`.
    pub vertices: Vec<f64>,
    /// Four vertex indices per interior (non-ghost, `In`) tet.
    pub tetrahedra: Vec<u32>,
    pub num_input_vertices: usize,
    pub num_steiner_vertices: usize,
    pub num_tetrahedra: usize,
    /// True iff the input surface was detected closed and 2-manifold
    /// (purely topological — see [`RawPlc::is_closed_2manifold`]).
    pub is_polyhedron: bool,
    /// True iff constraint recovery (§4.F, §4.G) completed without a
    /// failure being recorded.
    pub success: bool,
}

/// Resource exhaustion only (§7 category 4); every other failure mode is
/// reported as data in [`CdtResult`].
#[derive(thiserror::Error, Debug)]
pub enum CdtError {
    #[error("out of memory growing the tet store")]
    OutOfMemory,
}

/// Compute the CDT of `vertices`/`triangles` (§6's primary operation).
///
/// `vertices` is a flat, row-major array of length `3*V`; `triangles` is a
/// flat array of length `3*T`, each index in `[0, V)`. Invalid input,
/// degenerate seeds, and recovery failures all collapse into
/// `Ok(CdtResult { success: false, .. })`; only an allocation failure while
/// growing the tet store surfaces as `Err`.
pub fn compute_cdt(vertices: &[f64], triangles: &[u32], options: CdtOptions) -> Result<CdtResult, CdtError> {
    let _fpu = FpuGuard::acquire();

    let mut plc = match RawPlc::validate(vertices, triangles) {
        Ok(plc) => plc,
        Err(_e) => {
            #[cfg(feature = "logging")]
            if options.verbose {
                log::debug!("computeCDT: rejecting invalid input: {_e}");
            }
            return Ok(CdtResult::default());
        }
    };

    let num_input_vertices = plc.num_vertices();
    let is_polyhedron = plc.is_closed_2manifold();
    if options.add_bounding_box {
        plc.add_bounding_box();
    }

    let mut arena = plc.build_arena();
    let mut builder = DelaunayBuilder::new(&mut arena);
    if builder.insert_all().is_err() {
        #[cfg(feature = "logging")]
        if options.verbose {
            log::debug!("computeCDT: degenerate seed, all input vertices are coplanar");
        }
        return Ok(CdtResult::default());
    }

    let mut overlay = StructuredPlc::from_plc(&plc);
    let success = recovery::recover_all(&mut builder, &mut overlay);
    #[cfg(feature = "logging")]
    if options.verbose {
        log::trace!("computeCDT: constraint recovery completed, success={success}");
    }

    let in_count = region::mark_regions(builder.mesh_mut(), &overlay, is_polyhedron);
    #[cfg(feature = "logging")]
    if options.verbose {
        log::trace!("computeCDT: region marking produced {in_count} IN tets");
    }

    let mesh = builder.mesh();
    let mut tetrahedra = Vec::with_capacity(in_count * 4);
    for t in mesh.iter_live() {
        // §9's defensive filtering: a ghost tet should never be marked `In`,
        // but the check costs nothing and the source this is grounded on
        // keeps it too, since whether that can happen is left unclear.
        if mesh.is_ghost(t) || mesh.mark(t) != Mark::In {
            continue;
        }
        for slot in mesh.vertices(t) {
            let id = slot.id().expect("non-ghost In tet has only finite vertex slots");
            tetrahedra.push(id.0);
        }
    }

    let mut out_vertices = Vec::with_capacity(arena.len() * 3);
    for coords in arena.iter() {
        out_vertices.extend_from_slice(&coords.approx());
    }

    Ok(CdtResult {
        num_tetrahedra: tetrahedra.len() / 4,
        vertices: out_vertices,
        tetrahedra,
        num_input_vertices,
        num_steiner_vertices: arena.num_steiner(),
        is_polyhedron,
        success,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_recovers_as_a_polyhedron_with_no_steiner_vertices() {
        let (vertices, triangles) = cdt_test_utils::unit_cube();
        let result = compute_cdt(&vertices, &triangles, CdtOptions::default()).unwrap();
        assert!(result.success);
        assert!(result.is_polyhedron);
        assert_eq!(result.num_steiner_vertices, 0);
        assert!(result.num_tetrahedra >= 5 && result.num_tetrahedra <= 24);
    }

    #[test]
    fn regular_octahedron_recovers_as_a_polyhedron() {
        let (vertices, triangles) = cdt_test_utils::regular_octahedron();
        let result = compute_cdt(&vertices, &triangles, CdtOptions::default()).unwrap();
        assert!(result.success);
        assert!(result.is_polyhedron);
        assert!(result.num_tetrahedra >= 4 && result.num_tetrahedra <= 12);
    }

    #[test]
    fn regular_tetrahedron_produces_exactly_one_tet() {
        let vertices = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
        ];
        let triangles = [0, 1, 2, 0, 1, 3, 0, 2, 3, 1, 2, 3];
        let result = compute_cdt(&vertices, &triangles, CdtOptions::default()).unwrap();
        assert!(result.success);
        assert!(result.is_polyhedron);
        assert_eq!(result.num_tetrahedra, 1);
        assert_eq!(result.num_steiner_vertices, 0);
    }

    #[test]
    fn malformed_vertex_length_reports_failure_with_empty_arrays() {
        let vertices = [0.0, 0.0];
        let result = compute_cdt(&vertices, &[], CdtOptions::default()).unwrap();
        assert!(!result.success);
        assert!(result.vertices.is_empty());
        assert!(result.tetrahedra.is_empty());
    }

    #[test]
    fn coplanar_input_reports_failure() {
        let vertices = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0,
        ];
        let triangles = [0, 1, 2, 0, 1, 3];
        let result = compute_cdt(&vertices, &triangles, CdtOptions::default()).unwrap();
        assert!(!result.success);
    }

    #[test]
    #[cfg(feature = "logging")]
    fn verbose_option_runs_without_panicking_with_a_logger_installed() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (vertices, triangles) = cdt_test_utils::unit_cube();
        let result = compute_cdt(&vertices, &triangles, CdtOptions { add_bounding_box: false, verbose: true }).unwrap();
        assert!(result.success);
    }

    #[test]
    fn validate_mesh_rejects_what_compute_cdt_rejects() {
        let vertices = [0.0, 0.0];
        let validation = validate_mesh(&vertices, &[]);
        assert!(!validation.valid);
        let result = compute_cdt(&vertices, &[], CdtOptions::default()).unwrap();
        assert!(!result.success);
    }

    /// An asymmetric, non-cospherical point set with no constraint triangles.
    /// Deliberately not [`cdt_test_utils::unit_cube`] or the regular solids —
    /// those are cospherical, so a circumsphere-containment tie between two
    /// insertion orders could legitimately resolve differently while still
    /// being a valid Delaunay tetrahedrization, which would make the
    /// permutation test below flaky rather than a fault detector.
    fn scattered_points() -> Vec<f64> {
        vec![
            0.0, 0.0, 0.0, //
            2.3, 0.1, 0.0, //
            0.4, 1.9, 0.2, //
            0.1, 0.3, 2.7, //
            1.1, 1.3, 0.4, //
            0.7, 0.2, 1.1, //
            1.6, 0.9, 1.8, //
        ]
    }

    /// §8's Determinism law: the same input produces bit-identical output
    /// across repeated calls. This only holds if nothing downstream depends
    /// on an unordered container's iteration order (e.g. `HashSet` reseeding
    /// its hasher per construction).
    #[test]
    fn same_input_produces_identical_output_across_repeated_calls() {
        let vertices = scattered_points();
        let first = compute_cdt(&vertices, &[], CdtOptions::default()).unwrap();
        let second = compute_cdt(&vertices, &[], CdtOptions::default()).unwrap();
        assert!(first.success);
        assert_eq!(first.vertices, second.vertices);
        assert_eq!(first.tetrahedra, second.tetrahedra);
        assert_eq!(first.num_steiner_vertices, second.num_steiner_vertices);
        assert_eq!(first.num_tetrahedra, second.num_tetrahedra);
    }

    /// §8's Permutation law: relabeling the input vertices and re-running
    /// must produce a combinatorially isomorphic tetrahedrization — the same
    /// set of tets once both results are expressed in the original labeling.
    #[test]
    fn permuted_input_produces_an_isomorphic_tetrahedrization() {
        let vertices = scattered_points();
        let num_vertices = vertices.len() / 3;
        // a fixed, non-trivial permutation of the seven points above.
        let permutation = [4usize, 0, 6, 2, 5, 1, 3];
        assert_eq!(permutation.len(), num_vertices);

        let mut permuted_vertices = vec![0.0; vertices.len()];
        for (new_idx, &old_idx) in permutation.iter().enumerate() {
            permuted_vertices[new_idx * 3..new_idx * 3 + 3].copy_from_slice(&vertices[old_idx * 3..old_idx * 3 + 3]);
        }

        let original = compute_cdt(&vertices, &[], CdtOptions::default()).unwrap();
        let permuted = compute_cdt(&permuted_vertices, &[], CdtOptions::default()).unwrap();
        assert!(original.success && permuted.success);
        assert_eq!(original.num_steiner_vertices, 0);
        assert_eq!(permuted.num_steiner_vertices, 0);

        // map the permuted result's indices back to the original labeling,
        // then canonicalize each tet by sorting its four vertex indices so
        // the two tet lists can be compared as sets.
        let mut original_tets: Vec<[u32; 4]> = canonical_tets(&original.tetrahedra);
        let mut permuted_tets: Vec<[u32; 4]> = permuted
            .tetrahedra
            .chunks(4)
            .map(|c| {
                let mut tet = [0u32; 4];
                for (i, &v) in c.iter().enumerate() {
                    tet[i] = permutation[v as usize] as u32;
                }
                tet.sort_unstable();
                tet
            })
            .collect();

        original_tets.sort_unstable();
        permuted_tets.sort_unstable();
        assert_eq!(original_tets, permuted_tets);
    }

    fn canonical_tets(tetrahedra: &[u32]) -> Vec<[u32; 4]> {
        tetrahedra
            .chunks(4)
            .map(|c| {
                let mut tet = [c[0], c[1], c[2], c[3]];
                tet.sort_unstable();
                tet
            })
            .collect()
    }
}
