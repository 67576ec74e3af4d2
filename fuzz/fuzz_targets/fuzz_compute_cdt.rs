#![no_main]

use cdt::{CdtOptions, compute_cdt};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (Vec<f64>, Vec<u32>, CdtOptions)| {
    let (vertices, triangles, options) = data;

    // Every input byte stream must either produce a clean `success = false`
    // result or a typed `CdtError` — never panic (§7's taxonomy is meant to
    // be exhaustive).
    let _ = compute_cdt(&vertices, &triangles, options);
});
