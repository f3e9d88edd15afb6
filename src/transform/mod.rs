//! Per-pixel color transforms.
//!
//! A [`TransformPolicy`] is chosen once per session and applied in place to
//! every presented frame. Transforms touch nothing but the buffer they are
//! given.

mod invert;
mod swap;

pub use invert::{invert_channels, invert_packed};
pub use swap::swap_red_blue;

use crate::surface::FrameBuffer;
use serde::{Deserialize, Serialize};

/// Pixel mapping applied to every frame.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TransformPolicy {
    /// Full RGB invert, alpha preserved.
    #[default]
    Invert,
    /// Red and blue channels exchanged.
    Swap,
}

impl TransformPolicy {
    /// Applies the policy to raw RGBA bytes in place.
    pub fn apply(self, pixels: &mut [u8]) {
        match self {
            TransformPolicy::Invert => invert_packed(pixels),
            TransformPolicy::Swap => swap_red_blue(pixels),
        }
    }
}

impl std::fmt::Display for TransformPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransformPolicy::Invert => write!(f, "invert"),
            TransformPolicy::Swap => write!(f, "swap"),
        }
    }
}

/// Transforms a frame buffer in place and hands it back.
pub fn transform(buffer: &mut FrameBuffer, policy: TransformPolicy) -> &mut FrameBuffer {
    policy.apply(buffer.pixels_mut());
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn two_by_two(rgba: [u8; 4]) -> FrameBuffer {
        FrameBuffer::from_rgba(rgba.repeat(4), 2, 2).unwrap()
    }

    fn arb_buffer() -> impl Strategy<Value = FrameBuffer> {
        (0u32..12, 0u32..12).prop_flat_map(|(w, h)| {
            proptest::collection::vec(any::<u8>(), (w * h * 4) as usize)
                .prop_map(move |px| FrameBuffer::from_rgba(px, w, h).unwrap())
        })
    }

    #[test]
    fn test_invert_two_by_two() {
        let mut buffer = two_by_two([255, 0, 128, 255]);
        transform(&mut buffer, TransformPolicy::Invert);

        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(buffer.pixel(x, y), Some([0, 255, 127, 255]));
            }
        }
    }

    #[test]
    fn test_swap_two_by_two() {
        let mut buffer = two_by_two([255, 0, 128, 255]);
        transform(&mut buffer, TransformPolicy::Swap);

        assert_eq!(buffer.pixel(1, 1), Some([128, 0, 255, 255]));
    }

    #[test]
    fn test_single_invert_changes_buffer() {
        let original = two_by_two([10, 20, 30, 40]);
        let mut buffer = original.clone();
        transform(&mut buffer, TransformPolicy::Invert);

        assert_ne!(buffer, original);
    }

    #[test]
    fn test_policy_parses_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: TransformPolicy,
        }
        let parsed: Wrapper = toml::from_str("policy = \"swap\"").unwrap();
        assert_eq!(parsed.policy, TransformPolicy::Swap);
    }

    proptest! {
        #[test]
        fn prop_double_invert_is_identity(original in arb_buffer()) {
            let mut buffer = original.clone();
            transform(&mut buffer, TransformPolicy::Invert);
            transform(&mut buffer, TransformPolicy::Invert);
            prop_assert_eq!(buffer, original);
        }

        #[test]
        fn prop_double_swap_is_identity(original in arb_buffer()) {
            let mut buffer = original.clone();
            transform(&mut buffer, TransformPolicy::Swap);
            transform(&mut buffer, TransformPolicy::Swap);
            prop_assert_eq!(buffer, original);
        }

        #[test]
        fn prop_invert_preserves_alpha(original in arb_buffer()) {
            let mut buffer = original.clone();
            transform(&mut buffer, TransformPolicy::Invert);
            let before = original.pixels().chunks_exact(4).map(|p| p[3]);
            let after = buffer.pixels().chunks_exact(4).map(|p| p[3]);
            prop_assert!(before.eq(after));
        }

        #[test]
        fn prop_packed_matches_per_channel(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut packed = data.clone();
            let mut channels = data;
            invert_packed(&mut packed);
            invert_channels(&mut channels);
            prop_assert_eq!(packed, channels);
        }
    }
}
