//! Math types used by the renderer.
//!
//! Re-exports the [`glam`] types the 2D pipeline needs and a couple of helpers
//! for building the matrices uploaded as uniforms.

pub use glam::{Affine2, Mat3, Mat4, Vec2, Vec3, Vec4};

/// Orthographic projection mapping a `width` x `height` pixel space with a
/// top-left origin into clip space.
pub fn ortho_projection(width: f32, height: f32) -> Mat3 {
    let sx = if width > 0.0 { 2.0 / width } else { 0.0 };
    let sy = if height > 0.0 { -2.0 / height } else { 0.0 };
    Mat3::from_cols(
        Vec3::new(sx, 0.0, 0.0),
        Vec3::new(0.0, sy, 0.0),
        Vec3::new(-1.0, 1.0, 1.0),
    )
}

/// Expand a 3x3 matrix into the std140 layout: three columns, each padded to
/// a `vec4`.
pub fn mat3_to_std140(matrix: &Mat3) -> [f32; 12] {
    let c = matrix.to_cols_array();
    [
        c[0], c[1], c[2], 0.0, //
        c[3], c[4], c[5], 0.0, //
        c[6], c[7], c[8], 0.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ortho_maps_corners() {
        let projection = ortho_projection(800.0, 600.0);

        let top_left = projection.transform_point2(Vec2::new(0.0, 0.0));
        let bottom_right = projection.transform_point2(Vec2::new(800.0, 600.0));

        assert!((top_left - Vec2::new(-1.0, 1.0)).length() < 1e-6);
        assert!((bottom_right - Vec2::new(1.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_ortho_zero_size() {
        let projection = ortho_projection(0.0, 0.0);
        assert_eq!(projection.x_axis.x, 0.0);
        assert_eq!(projection.y_axis.y, 0.0);
    }

    #[test]
    fn test_mat3_std140_padding() {
        let packed = mat3_to_std140(&Mat3::IDENTITY);
        assert_eq!(
            packed,
            [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        );
    }
}
