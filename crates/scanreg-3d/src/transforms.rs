/// Compute the rotation matrix from an axis and angle.
///
/// # Arguments
///
/// * `axis` - The axis of rotation, normalized internally.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The row-major rotation matrix, or an error for a zero axis.
pub fn axis_angle_to_rotation_matrix(
    axis: &[f64; 3],
    angle: f64,
) -> Result<[[f64; 3]; 3], &'static str> {
    let magnitude = (axis[0] * axis[0] + axis[1] * axis[1] + axis[2] * axis[2]).sqrt();
    if magnitude < 1e-10 {
        return Err("cannot compute rotation matrix from a zero vector");
    }

    let x = axis[0] / magnitude;
    let y = axis[1] / magnitude;
    let z = axis[2] / magnitude;

    let c = angle.cos();
    let s = angle.sin();
    let t = 1.0 - c;

    Ok([
        [c + x * x * t, x * y * t - z * s, x * z * t + y * s],
        [x * y * t + z * s, c + y * y * t, y * z * t - x * s],
        [x * z * t - y * s, y * z * t + x * s, c + z * z * t],
    ])
}
