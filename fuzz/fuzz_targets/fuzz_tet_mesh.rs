#![no_main]

use arbitrary::Arbitrary;
use cdt::mesh::{Mark, TetStore};
use cdt::vertex::VertexSlot;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Alloc([VertexSlot; 4], Mark),
    /// Index is taken modulo the number of tets allocated so far.
    Free(u32),
}

fuzz_target!(|ops: Vec<Op>| {
    let mut mesh = TetStore::new();
    let mut allocated = Vec::new();

    for op in ops {
        match op {
            Op::Alloc(verts, mark) => {
                let t = mesh.alloc(verts, mark);
                allocated.push(t);
            }
            Op::Free(idx) => {
                if allocated.is_empty() {
                    continue;
                }
                let t = allocated.swap_remove(idx as usize % allocated.len());
                mesh.free(t);
            }
        }
    }

    // The free-list bookkeeping must stay consistent no matter the
    // alloc/free interleaving: every handle returned by `iter_live` must
    // still be readable, and the live count must match what was tracked
    // independently here.
    let mut live_count = 0;
    for t in mesh.iter_live() {
        let _ = mesh.vertices(t);
        let _ = mesh.is_ghost(t);
        live_count += 1;
    }
    assert_eq!(live_count, allocated.len());
});
