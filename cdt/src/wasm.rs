//! WASM bindings for `computeCDT`/`validateMesh` (§6).
//!
//! Thin marshaling layer over [`crate::compute_cdt`]/[`crate::validate_mesh`],
//! in the same style as the teacher's `wasm::triangulate_2d`: flat typed
//! arrays in, a plain `js_sys::Object` out.

use wasm_bindgen::prelude::*;

use crate::{CdtOptions, compute_cdt, validate_mesh};

/// Wire up `log`'s output to the browser console as soon as the module
/// loads, so `verbose` diagnostics (§9, "injectable sink") land somewhere a
/// host page can actually see. Mirrors the usual `wasm-bindgen(start)` +
/// `console_log::init_with_level` pairing; a failed re-init (the function
/// panics if called twice) is swallowed, not propagated, since it only
/// means logging was already wired up.
#[wasm_bindgen(start)]
pub fn init_console_logging() {
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// Compute the CDT of `vertices`/`triangles` (§6).
///
/// # Arguments
/// * `vertices` - flat array of 3D coordinates: `[x1, y1, z1, x2, ...]`
/// * `triangles` - flat array of triangle vertex indices: `[a1, b1, c1, ...]`
/// * `add_bounding_box` - close the input with eight axis-aligned vertices
///   just outside its bounding box before tetrahedrizing
/// * `verbose` - route diagnostics through the `console_log` backend
///
/// # Returns
/// A JavaScript object with `vertices`, `tetrahedra`, `numInputVertices`,
/// `numSteinerVertices`, `numTetrahedra`, `isPolyhedron`, `success`.
#[wasm_bindgen(js_name = computeCDT)]
pub fn compute_cdt_js(
    vertices: &[f64],
    triangles: &[u32],
    add_bounding_box: Option<bool>,
    verbose: Option<bool>,
) -> Result<JsValue, JsValue> {
    let options = CdtOptions {
        add_bounding_box: add_bounding_box.unwrap_or(false),
        verbose: verbose.unwrap_or(false),
    };

    let result = compute_cdt(vertices, triangles, options)
        .map_err(|e| JsValue::from_str(&format!("computeCDT failed: {e}")))?;

    let obj = js_sys::Object::new();
    js_sys::Reflect::set(
        &obj,
        &"vertices".into(),
        &js_sys::Float64Array::from(result.vertices.as_slice()),
    )?;
    js_sys::Reflect::set(
        &obj,
        &"tetrahedra".into(),
        &js_sys::Uint32Array::from(result.tetrahedra.as_slice()),
    )?;
    js_sys::Reflect::set(
        &obj,
        &"numInputVertices".into(),
        &(result.num_input_vertices as u32).into(),
    )?;
    js_sys::Reflect::set(
        &obj,
        &"numSteinerVertices".into(),
        &(result.num_steiner_vertices as u32).into(),
    )?;
    js_sys::Reflect::set(&obj, &"numTetrahedra".into(), &(result.num_tetrahedra as u32).into())?;
    js_sys::Reflect::set(&obj, &"isPolyhedron".into(), &result.is_polyhedron.into())?;
    js_sys::Reflect::set(&obj, &"success".into(), &result.success.into())?;
    Ok(obj.into())
}

/// Validate a `vertices`/`triangles` pair without computing a tetrahedrization (§6).
#[wasm_bindgen(js_name = validateMesh)]
pub fn validate_mesh_js(vertices: &[f64], triangles: &[u32]) -> Result<JsValue, JsValue> {
    let validation = validate_mesh(vertices, triangles);

    let obj = js_sys::Object::new();
    js_sys::Reflect::set(&obj, &"numVertices".into(), &(validation.num_vertices as u32).into())?;
    js_sys::Reflect::set(&obj, &"numTriangles".into(), &(validation.num_triangles as u32).into())?;
    js_sys::Reflect::set(&obj, &"valid".into(), &validation.valid.into())?;
    Ok(obj.into())
}
