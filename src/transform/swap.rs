//! Red/blue channel swap.

/// Exchanges the R and B channels of every pixel. Its own inverse.
pub fn swap_red_blue(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        px.swap(0, 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_pixel() {
        let mut px = [255u8, 0, 128, 255];
        swap_red_blue(&mut px);
        assert_eq!(px, [128, 0, 255, 255]);
    }

    #[test]
    fn test_green_and_alpha_kept() {
        let mut data = [1u8, 2, 3, 4, 5, 6, 7, 8];
        swap_red_blue(&mut data);
        assert_eq!(data, [3, 2, 1, 4, 7, 6, 5, 8]);
    }
}
