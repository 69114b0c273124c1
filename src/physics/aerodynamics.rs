use nalgebra::Vector3;

/// Rotor thrust along body +z: `k * w^2`.
pub fn rotor_thrust(k_thrust: f64, w: f64) -> Vector3<f64> {
    Vector3::new(0.0, 0.0, k_thrust * w * w)
}

/// Magnitude of one rotor's reaction torque about body z: `k * w^2`.
pub fn rotor_reaction(k_reaction: f64, w: f64) -> f64 {
    k_reaction * w * w
}

/// Per-axis quadratic drag, always opposing `rate`: `-k * r * |r|`.
///
/// Used for both linear drag (velocity → force) and angular drag
/// (angular velocity → torque).
pub fn quadratic_drag(rate: &Vector3<f64>, coeffs: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(
        -coeffs.x * rate.x * rate.x.abs(),
        -coeffs.y * rate.y * rate.y.abs(),
        -coeffs.z * rate.z * rate.z.abs(),
    )
}
