//! Optimal correction of point matches (Hartley & Zisserman, Alg. 12.1).
//!
//! Given a match `a ↔ b` and `F` with `bᵀ F a = 0` for exact matches, find
//! the pair `â ↔ b̂` on the epipolar constraint that minimises
//! `d(a, â)² + d(b, b̂)²`. Both points are moved to the origin and the
//! epipoles rotated onto the x axis, which reduces the problem to one
//! parameter `t` of the epipolar line pencil and a degree-6 polynomial.

use nalgebra::{DMatrix, Matrix3, Point2, Vector3};

/// Corrected pair `(â, b̂)`.
///
/// Degenerate inputs (an epipole at one of the points, or a rank-deficient
/// SVD) return the input unchanged.
pub fn correct_match(f: &Matrix3<f64>, a: Point2<f64>, b: Point2<f64>) -> (Point2<f64>, Point2<f64>) {
    correct_match_inner(f, a, b).unwrap_or((a, b))
}

fn correct_match_inner(
    f: &Matrix3<f64>,
    a: Point2<f64>,
    b: Point2<f64>,
) -> Option<(Point2<f64>, Point2<f64>)> {
    // Translations taking a and b to the origin; F' = T_b⁻ᵀ F T_a⁻¹.
    let ta_inv = Matrix3::new(1.0, 0.0, a.x, 0.0, 1.0, a.y, 0.0, 0.0, 1.0);
    let tb_inv = Matrix3::new(1.0, 0.0, b.x, 0.0, 1.0, b.y, 0.0, 0.0, 1.0);
    let f1 = tb_inv.transpose() * f * ta_inv;

    let svd = f1.svd(true, true);
    let (u, v_t) = (svd.u?, svd.v_t?);
    let null = svd.singular_values.imin();
    let ea = normalize_epipole(v_t.row(null).transpose())?;
    let eb = normalize_epipole(u.column(null).into_owned())?;

    let ra = rotation_onto_x(&ea);
    let rb = rotation_onto_x(&eb);
    let f2 = rb * f1 * ra.transpose();

    let (fa, fb) = (ea.z, eb.z);
    let (pa, pb, pc, pd) = (f2[(1, 1)], f2[(1, 2)], f2[(2, 1)], f2[(2, 2)]);

    let t = best_parameter(fa, fb, pa, pb, pc, pd);
    let (la, lb) = match t {
        Some(t) => (
            Vector3::new(t * fa, 1.0, -t),
            Vector3::new(-fb * (pc * t + pd), pa * t + pb, pc * t + pd),
        ),
        // t → ∞
        None => (
            Vector3::new(fa, 0.0, -1.0),
            Vector3::new(-fb * pc, pa, pc),
        ),
    };

    let xa = ta_inv * ra.transpose() * closest_to_origin(&la);
    let xb = tb_inv * rb.transpose() * closest_to_origin(&lb);
    if xa.z.abs() <= f64::EPSILON || xb.z.abs() <= f64::EPSILON {
        return None;
    }
    Some((
        Point2::new(xa.x / xa.z, xa.y / xa.z),
        Point2::new(xb.x / xb.z, xb.y / xb.z),
    ))
}

/// Scale so that `e.x² + e.y² = 1`.
fn normalize_epipole(e: Vector3<f64>) -> Option<Vector3<f64>> {
    let n = e.x.hypot(e.y);
    (n > f64::EPSILON).then(|| e / n)
}

fn rotation_onto_x(e: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(e.x, e.y, 0.0, -e.y, e.x, 0.0, 0.0, 0.0, 1.0)
}

/// Foot of the perpendicular from the origin to the line `l`.
fn closest_to_origin(l: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(-l.x * l.z, -l.y * l.z, l.x * l.x + l.y * l.y)
}

/// Pencil parameter minimising the cost; `None` means `t → ∞`.
fn best_parameter(fa: f64, fb: f64, a: f64, b: f64, c: f64, d: f64) -> Option<f64> {
    let k = a * d - b * c;
    let fa2 = fa * fa;
    let fa4 = fa2 * fa2;
    let fb2 = fb * fb;

    let q2 = a * a + fb2 * c * c;
    let q1 = 2.0 * (a * b + fb2 * c * d);
    let q0 = b * b + fb2 * d * d;

    // Highest degree first.
    let coeffs = [
        -k * fa4 * a * c,
        q2 * q2 - k * fa4 * (a * d + b * c),
        2.0 * q2 * q1 - k * (fa4 * b * d + 2.0 * fa2 * a * c),
        q1 * q1 + 2.0 * q2 * q0 - 2.0 * k * fa2 * (a * d + b * c),
        2.0 * q1 * q0 - k * (2.0 * fa2 * b * d + a * c),
        q0 * q0 - k * (a * d + b * c),
        -k * b * d,
    ];

    let cost = |t: f64| {
        let u = c * t + d;
        let v = a * t + b;
        t * t / (1.0 + fa2 * t * t) + u * u / (v * v + fb2 * u * u)
    };

    let mut best: Option<(f64, f64)> = None;
    for t in real_parts_of_roots(&coeffs) {
        let s = cost(t);
        if s.is_finite() && best.is_none_or(|(_, bs)| s < bs) {
            best = Some((t, s));
        }
    }

    let at_infinity = if fa2 > 0.0 {
        1.0 / fa2 + c * c / (a * a + fb2 * c * c)
    } else {
        f64::INFINITY
    };
    match best {
        Some((t, s)) if s <= at_infinity => Some(t),
        Some(_) => None,
        None if at_infinity.is_finite() => None,
        None => Some(0.0),
    }
}

/// Real parts of all complex roots of the polynomial, via the eigenvalues
/// of its companion matrix. Negligible leading coefficients are dropped.
fn real_parts_of_roots(coeffs: &[f64]) -> Vec<f64> {
    let scale = coeffs.iter().fold(0.0f64, |m, c| m.max(c.abs()));
    if scale == 0.0 {
        return Vec::new();
    }
    let first = coeffs
        .iter()
        .position(|c| c.abs() > 1e-12 * scale)
        .unwrap_or(coeffs.len());
    let poly = &coeffs[first..];
    let degree = poly.len().saturating_sub(1);
    if degree == 0 {
        return Vec::new();
    }

    let lead = poly[0];
    let mut comp = DMatrix::<f64>::zeros(degree, degree);
    for (j, c) in poly[1..].iter().enumerate() {
        comp[(0, j)] = -c / lead;
    }
    for i in 1..degree {
        comp[(i, i - 1)] = 1.0;
    }

    let schur = nalgebra::linalg::Schur::new(comp);
    schur.complex_eigenvalues().iter().map(|z| z.re).collect()
}
