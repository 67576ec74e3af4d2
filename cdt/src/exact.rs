//! Exact rational arithmetic fallback for predicates touching a Steiner
//! vertex.
//!
//! §4.A requires predicates to never return a wrong nonzero sign, including
//! for the symbolic Steiner vertices §9 introduces (the intersection of a
//! segment and a triangle). Doubles alone cannot certify that case, so this
//! module resolves every operand to an exact [`BigRational`] point — by
//! bit-exact conversion for `Input` vertices, recursively for `Steiner`
//! vertices — and evaluates the same determinant formulas [`crate::predicates`]
//! uses, just over exact arithmetic instead of `f64`.
//!
//! Grounded on `other_examples`'s `rgeometry` constrained-Delaunay module,
//! which certifies its incircle test the same way: build the determinant
//! from `BigRational` coordinates and read the sign off `Ordering`.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

use crate::arena::VertexArena;
use crate::vertex::{SteinerPoint, VertexCoords, VertexId};

pub type ExactPoint = [BigRational; 3];

/// Exact, bit-for-bit conversion of an `f64` to a `BigRational`.
///
/// Every finite `f64` is a dyadic rational (`mantissa * 2^exponent`), so this
/// conversion is exact — unlike continued-fraction based "nearest rational"
/// reconstructions, which only approximate the double.
pub fn f64_to_exact(x: f64) -> BigRational {
    if x == 0.0 {
        return BigRational::from_integer(BigInt::zero());
    }

    let bits = x.to_bits();
    let sign: i64 = if (bits >> 63) & 1 == 1 { -1 } else { 1 };
    let raw_exponent = ((bits >> 52) & 0x7ff) as i64;
    let raw_mantissa = bits & 0x000f_ffff_ffff_ffff;

    let (mantissa, exponent) = if raw_exponent == 0 {
        // subnormal: no implicit leading bit, fixed exponent
        (raw_mantissa, -1074)
    } else {
        (raw_mantissa | (1u64 << 52), raw_exponent - 1075)
    };

    let numerator = BigInt::from(sign) * BigInt::from(mantissa);
    if exponent >= 0 {
        let scale = BigInt::from(2u32).pow(exponent as u32);
        BigRational::from_integer(numerator * scale)
    } else {
        let denom = BigInt::from(2u32).pow((-exponent) as u32);
        BigRational::new(numerator, denom)
    }
}

fn exact_input_point(p: [f64; 3]) -> ExactPoint {
    [f64_to_exact(p[0]), f64_to_exact(p[1]), f64_to_exact(p[2])]
}

/// Resolve a vertex handle to its exact coordinates, recursing through
/// Steiner intersections until only input vertices remain.
pub fn exact_point(arena: &VertexArena, id: VertexId) -> ExactPoint {
    match arena.get(id) {
        VertexCoords::Input(p) => exact_input_point(*p),
        VertexCoords::Steiner(steiner) => exact_steiner_point(arena, steiner),
    }
}

fn exact_steiner_point(arena: &VertexArena, steiner: &SteinerPoint) -> ExactPoint {
    let a = exact_point(arena, steiner.segment[0]);
    let b = exact_point(arena, steiner.segment[1]);
    let t0 = exact_point(arena, steiner.triangle[0]);
    let t1 = exact_point(arena, steiner.triangle[1]);
    let t2 = exact_point(arena, steiner.triangle[2]);

    segment_triangle_intersection(&a, &b, &t0, &t1, &t2)
}

fn sub(a: &ExactPoint, b: &ExactPoint) -> ExactPoint {
    [
        a[0].clone() - b[0].clone(),
        a[1].clone() - b[1].clone(),
        a[2].clone() - b[2].clone(),
    ]
}

fn dot(a: &ExactPoint, b: &ExactPoint) -> BigRational {
    a[0].clone() * b[0].clone() + a[1].clone() * b[1].clone() + a[2].clone() * b[2].clone()
}

fn cross(a: &ExactPoint, b: &ExactPoint) -> ExactPoint {
    [
        a[1].clone() * b[2].clone() - a[2].clone() * b[1].clone(),
        a[2].clone() * b[0].clone() - a[0].clone() * b[2].clone(),
        a[0].clone() * b[1].clone() - a[1].clone() * b[0].clone(),
    ]
}

/// Exact intersection of line `a`-`b` with the plane of triangle `(t0,t1,t2)`.
///
/// Used only when segment recovery (§4.F) or face recovery (§4.G) has
/// already certified a transverse crossing via [`orient3d_exact`]; this
/// function assumes the denominator (`dot(b-a, normal)`) is nonzero.
pub fn segment_triangle_intersection(
    a: &ExactPoint,
    b: &ExactPoint,
    t0: &ExactPoint,
    t1: &ExactPoint,
    t2: &ExactPoint,
) -> ExactPoint {
    let normal = cross(&sub(t1, t0), &sub(t2, t0));
    let direction = sub(b, a);
    let denom = dot(&direction, &normal);
    debug_assert!(!denom.is_zero(), "segment is parallel to triangle plane");

    let numer = dot(&sub(t0, a), &normal);
    let t = numer / denom;

    [
        a[0].clone() + t.clone() * direction[0].clone(),
        a[1].clone() + t.clone() * direction[1].clone(),
        a[2].clone() + t * direction[2].clone(),
    ]
}

/// Exact `orient3d`: sign of the determinant of `(b-a, c-a, d-a)`.
pub fn orient3d_exact(a: &ExactPoint, b: &ExactPoint, c: &ExactPoint, d: &ExactPoint) -> Ordering {
    let ab = sub(b, a);
    let ac = sub(c, a);
    let ad = sub(d, a);

    let det = ab[0].clone() * (ac[1].clone() * ad[2].clone() - ac[2].clone() * ad[1].clone())
        - ab[1].clone() * (ac[0].clone() * ad[2].clone() - ac[2].clone() * ad[0].clone())
        + ab[2].clone() * (ac[0].clone() * ad[1].clone() - ac[1].clone() * ad[0].clone());

    det.cmp(&BigRational::zero())
}

/// Exact `insphere`: sign of the classical relative-coordinate 4x4
/// determinant (the same formula `robust`/Shewchuk's `predicates.c` use),
/// evaluated over `BigRational` instead of filtered doubles.
pub fn insphere_exact(
    a: &ExactPoint,
    b: &ExactPoint,
    c: &ExactPoint,
    d: &ExactPoint,
    e: &ExactPoint,
) -> Ordering {
    let rel = |p: &ExactPoint| -> [BigRational; 4] {
        let x = p[0].clone() - e[0].clone();
        let y = p[1].clone() - e[1].clone();
        let z = p[2].clone() - e[2].clone();
        let w = x.clone() * x.clone() + y.clone() * y.clone() + z.clone() * z.clone();
        [x, y, z, w]
    };

    let ra = rel(a);
    let rb = rel(b);
    let rc = rel(c);
    let rd = rel(d);

    // 3x3 determinant via cofactor expansion along the first row.
    let det3 = |m: [[BigRational; 3]; 3]| -> BigRational {
        m[0][0].clone() * (m[1][1].clone() * m[2][2].clone() - m[1][2].clone() * m[2][1].clone())
            - m[0][1].clone()
                * (m[1][0].clone() * m[2][2].clone() - m[1][2].clone() * m[2][0].clone())
            + m[0][2].clone()
                * (m[1][0].clone() * m[2][1].clone() - m[1][1].clone() * m[2][0].clone())
    };

    let minor = |rows: [&[BigRational; 4]; 3], skip_col: usize| -> BigRational {
        let cols: Vec<usize> = (0..4).filter(|&c| c != skip_col).collect();
        let m = [
            [
                rows[0][cols[0]].clone(),
                rows[0][cols[1]].clone(),
                rows[0][cols[2]].clone(),
            ],
            [
                rows[1][cols[0]].clone(),
                rows[1][cols[1]].clone(),
                rows[1][cols[2]].clone(),
            ],
            [
                rows[2][cols[0]].clone(),
                rows[2][cols[1]].clone(),
                rows[2][cols[2]].clone(),
            ],
        ];
        det3(m)
    };

    let rows = [&ra, &rb, &rc, &rd];
    let m0 = minor([rows[1], rows[2], rows[3]], 0);
    let m1 = minor([rows[0], rows[2], rows[3]], 1);
    let m2 = minor([rows[0], rows[1], rows[3]], 2);
    let m3 = minor([rows[0], rows[1], rows[2]], 3);

    let det = rows[0][0].clone() * m0 - rows[1][0].clone() * m1 + rows[2][0].clone() * m2
        - rows[3][0].clone() * m3;

    det.cmp(&BigRational::zero())
}
