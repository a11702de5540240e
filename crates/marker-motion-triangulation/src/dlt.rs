use nalgebra::{Matrix3x4, Matrix4, Point2, Vector4};

/// Linear two-view triangulation.
///
/// Returns the homogeneous point `X` minimising `‖A X‖` with `‖X‖ = 1`,
/// where each view contributes the rows `u·P₂ − P₀` and `v·P₂ − P₁`.
/// `None` only if the SVD fails to produce `Vᵀ`.
pub fn triangulate_dlt(
    p_a: &Matrix3x4<f64>,
    p_b: &Matrix3x4<f64>,
    a: Point2<f64>,
    b: Point2<f64>,
) -> Option<Vector4<f64>> {
    let mut m = Matrix4::<f64>::zeros();
    for (i, (p, x)) in [(p_a, a), (p_b, b)].into_iter().enumerate() {
        m.row_mut(2 * i).copy_from(&(x.x * p.row(2) - p.row(0)));
        m.row_mut(2 * i + 1).copy_from(&(x.y * p.row(2) - p.row(1)));
    }

    let svd = m.svd(false, true);
    let v_t = svd.v_t?;
    let null = svd.singular_values.imin();
    Some(v_t.row(null).transpose())
}
