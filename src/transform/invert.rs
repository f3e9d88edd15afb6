//! Film-negative color inversion.
//!
//! Each color channel becomes `255 - c`; alpha is left untouched. Inverting
//! twice restores the input. A single inversion never leaves a channel
//! unchanged: the closest it gets is swapping 127 and 128.

/// Mask for the alpha byte of a little-endian packed RGBA word.
const ALPHA_MASK: u32 = 0xff00_0000;

/// Inverts RGB channel by channel.
///
/// A trailing partial pixel (fewer than four bytes) is left as is.
pub fn invert_channels(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px[0] = 255 - px[0];
        px[1] = 255 - px[1];
        px[2] = 255 - px[2];
    }
}

/// Inverts RGB one packed 32-bit word at a time.
///
/// Bit-identical to [`invert_channels`]: the low 24 bits are complemented
/// and the alpha byte is masked back in.
pub fn invert_packed(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let word = u32::from_le_bytes([px[0], px[1], px[2], px[3]]);
        let inverted = (!word & !ALPHA_MASK) | (word & ALPHA_MASK);
        px.copy_from_slice(&inverted.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_pixel() {
        let mut px = [255u8, 0, 128, 255];
        invert_channels(&mut px);
        assert_eq!(px, [0, 255, 127, 255]);
    }

    #[test]
    fn test_packed_known_pixel() {
        let mut px = [255u8, 0, 128, 200];
        invert_packed(&mut px);
        assert_eq!(px, [0, 255, 127, 200]);
    }

    #[test]
    fn test_partial_pixel_untouched() {
        let mut data = [10u8, 20, 30, 40, 50, 60];
        invert_channels(&mut data);
        assert_eq!(data, [245, 235, 225, 40, 50, 60]);

        let mut packed = [10u8, 20, 30, 40, 50, 60];
        invert_packed(&mut packed);
        assert_eq!(packed, data);
    }

    #[test]
    fn test_midpoint_swaps() {
        let mut px = [127u8, 128, 127, 0];
        invert_channels(&mut px);
        assert_eq!(px, [128, 127, 128, 0]);
    }

    #[test]
    fn test_empty_slice() {
        let mut empty: [u8; 0] = [];
        invert_channels(&mut empty);
        invert_packed(&mut empty);
    }
}
