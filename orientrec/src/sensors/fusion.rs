//! Attitude extraction from rotation-vector and gravity samples.
//!
//! The rotation vector gives the device attitude relative to the world frame
//! (X east, Y north, Z up). The device is worn upright, looking along its own
//! Z axis, so the matrix is remapped (device X stays X, device Z becomes Y)
//! before azimuth and pitch are read off it.

/// Row-major 3×3 rotation matrix.
pub type RotationMatrix = [[f32; 3]; 3];

/// Azimuth and pitch derived from one rotation-vector sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attitude {
    /// Clockwise angle from magnetic north, degrees in `(-180, 180]`.
    pub azimuth_deg: f32,
    /// Head tilt, degrees in `[-90, 90]`.
    pub pitch_deg: f32,
}

/// Rotation matrix for a rotation vector.
///
/// The scalar part is recovered from the unit-norm constraint when the
/// sensor does not report it.
pub fn rotation_matrix_from_vector(x: f32, y: f32, z: f32, w: Option<f32>) -> RotationMatrix {
    let q0 = w.unwrap_or_else(|| {
        let rest = 1.0 - x * x - y * y - z * z;
        if rest > 0.0 {
            rest.sqrt()
        } else {
            0.0
        }
    });

    let sq_q1 = 2.0 * x * x;
    let sq_q2 = 2.0 * y * y;
    let sq_q3 = 2.0 * z * z;
    let q1_q2 = 2.0 * x * y;
    let q3_q0 = 2.0 * z * q0;
    let q1_q3 = 2.0 * x * z;
    let q2_q0 = 2.0 * y * q0;
    let q2_q3 = 2.0 * y * z;
    let q1_q0 = 2.0 * x * q0;

    [
        [1.0 - sq_q2 - sq_q3, q1_q2 - q3_q0, q1_q3 + q2_q0],
        [q1_q2 + q3_q0, 1.0 - sq_q1 - sq_q3, q2_q3 - q1_q0],
        [q1_q3 - q2_q0, q2_q3 + q1_q0, 1.0 - sq_q1 - sq_q2],
    ]
}

/// Remap so that device X stays X and device Z becomes the new Y axis.
///
/// The new Z axis is device -Y, which keeps the frame right-handed.
pub fn remap_upright(m: &RotationMatrix) -> RotationMatrix {
    let mut out = [[0.0; 3]; 3];
    for (row_out, row_in) in out.iter_mut().zip(m.iter()) {
        row_out[0] = row_in[0];
        row_out[1] = -row_in[2];
        row_out[2] = row_in[1];
    }
    out
}

/// Azimuth, pitch and roll (radians) of a rotation matrix.
pub fn orientation_angles(m: &RotationMatrix) -> [f32; 3] {
    [
        m[0][1].atan2(m[1][1]),
        (-m[2][1]).clamp(-1.0, 1.0).asin(),
        (-m[2][0]).atan2(m[2][2]),
    ]
}

/// Attitude of an upright-worn device from a rotation-vector sample.
pub fn attitude_from_rotation_vector(x: f32, y: f32, z: f32, w: Option<f32>) -> Attitude {
    let remapped = remap_upright(&rotation_matrix_from_vector(x, y, z, w));
    let [azimuth, pitch, _] = orientation_angles(&remapped);
    Attitude {
        azimuth_deg: azimuth.to_degrees(),
        pitch_deg: pitch.to_degrees(),
    }
}

/// Roll in degrees from a gravity sample.
///
/// Arctangent of the sideways component over the hypotenuse of the other
/// two; zero when the sample is all zeros.
pub fn roll_from_gravity(x: f32, y: f32, z: f32) -> f32 {
    -x.atan2(y.hypot(z)).to_degrees()
}

/// Rotation-vector quaternion `(x, y, z, w)` for an upright device facing
/// the given azimuth with the given pitch.
///
/// Inverse of [`attitude_from_rotation_vector`]; used to synthesize input.
pub fn rotation_vector_for(azimuth_deg: f32, pitch_deg: f32) -> (f32, f32, f32, f32) {
    // Tilting up by `pitch` means rotating less than 90° about X; turning
    // clockwise by `azimuth` is a negative rotation about world Z.
    let (sx, cx) = ((90.0 - pitch_deg).to_radians() / 2.0).sin_cos();
    let (sz, cz) = ((-azimuth_deg).to_radians() / 2.0).sin_cos();

    // q = qz ⊗ qx
    (cz * sx, sz * sx, cx * sz, cz * cx)
}
