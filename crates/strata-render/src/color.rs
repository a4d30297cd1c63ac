//! Colors and the packed 32-bit color convention.
//!
//! Packed colors are `0xAABBGGRR`: red in the least significant byte, alpha
//! in the most significant. [`Color::to_packed`] produces exactly the layout
//! [`unpack_color`] consumes. Unpacked colors carry straight alpha;
//! premultiplication is a separate step.

/// An RGBA color with `f32` components in the `0.0..=1.0` range.
///
/// ```
/// use strata_render::Color;
///
/// let red = Color::rgb(1.0, 0.0, 0.0);
/// assert_eq!(red.to_packed(), 0xFF0000FF);
/// assert_eq!(Color::from_packed(0xFF0000FF), red);
/// ```
///
/// The struct is `#[repr(C)]` and implements `bytemuck::Pod`, so it can be
/// written directly into uniform blocks.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a color from 8-bit RGBA values (0–255 mapped to 0.0–1.0).
    pub fn from_rgba_u8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: channel_to_unit(r),
            g: channel_to_unit(g),
            b: channel_to_unit(b),
            a: channel_to_unit(a),
        }
    }

    /// Decode a packed `0xAABBGGRR` value.
    pub fn from_packed(packed: u32) -> Self {
        let [r, g, b, a] = packed.to_le_bytes();
        Self::from_rgba_u8(r, g, b, a)
    }

    /// Encode as packed `0xAABBGGRR`, clamping and rounding each channel.
    pub fn to_packed(self) -> u32 {
        u32::from_le_bytes([
            unit_to_channel(self.r),
            unit_to_channel(self.g),
            unit_to_channel(self.b),
            unit_to_channel(self.a),
        ])
    }

    /// Multiply the color channels by alpha.
    pub fn premultiplied(self) -> Self {
        Self {
            r: self.r * self.a,
            g: self.g * self.a,
            b: self.b * self.a,
            a: self.a,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<[f32; 4]> for Color {
    fn from(arr: [f32; 4]) -> Self {
        Self::rgba(arr[0], arr[1], arr[2], arr[3])
    }
}

impl From<Color> for [f32; 4] {
    fn from(color: Color) -> Self {
        color.to_array()
    }
}

/// Unpack a `0xAABBGGRR` color into straight-alpha `[r, g, b, a]`.
#[inline]
pub fn unpack_color(packed: u32) -> [f32; 4] {
    Color::from_packed(packed).to_array()
}

/// Unpack a `0xAABBGGRR` color and premultiply it by its alpha.
#[inline]
pub fn unpack_color_premultiplied(packed: u32) -> [f32; 4] {
    Color::from_packed(packed).premultiplied().to_array()
}

/// Pack straight-alpha `[r, g, b, a]` into `0xAABBGGRR`.
#[inline]
pub fn pack_color(rgba: [f32; 4]) -> u32 {
    Color::from(rgba).to_packed()
}

#[inline]
fn channel_to_unit(c: u8) -> f32 {
    c as f32 / 255.0
}

#[inline]
fn unit_to_channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_order() {
        assert_eq!(unpack_color(0x000000FF), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(unpack_color(0x0000FF00), [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(unpack_color(0x00FF0000), [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(unpack_color(0xFF000000), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(Color::RED.to_packed(), 0xFF0000FF);
    }

    #[test]
    fn test_every_channel_value_round_trips() {
        for shift in [0u32, 8, 16, 24] {
            for value in 0u32..=255 {
                let packed = value << shift;
                let unpacked = unpack_color(packed);
                let channel = unpacked[(shift / 8) as usize];
                assert_eq!((channel * 255.0).round() as u32, value);
                assert_eq!(pack_color(unpacked), packed);
            }
        }
    }

    #[test]
    fn test_strided_full_range_round_trip() {
        // Odd stride so every byte lane sees every residue.
        let mut packed = 0u32;
        loop {
            assert_eq!(pack_color(unpack_color(packed)), packed, "{packed:#010x}");
            match packed.checked_add(65_537) {
                Some(next) => packed = next,
                None => break,
            }
        }
        assert_eq!(pack_color(unpack_color(u32::MAX)), u32::MAX);
    }

    #[test]
    #[ignore = "walks all 2^32 packed values"]
    fn test_exhaustive_round_trip() {
        for packed in 0..=u32::MAX {
            assert_eq!(pack_color(unpack_color(packed)), packed);
        }
    }

    #[test]
    fn test_premultiplied_unpack() {
        let [r, g, b, a] = unpack_color_premultiplied(0x80FFFFFF);
        assert_eq!(a, 128.0 / 255.0);
        assert_eq!([r, g, b], [a, a, a]);
        assert_eq!(unpack_color_premultiplied(0x00FFFFFF), [0.0; 4]);
    }

    #[test]
    fn test_pack_clamps_out_of_range() {
        assert_eq!(pack_color([2.0, -1.0, 0.5, 1.0]), 0xFF8000FF);
    }
}
