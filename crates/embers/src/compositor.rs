//! Compositing the effect surfaces into a single frame.
//!
//! Effect surfaces are stacked by their layer value and merged with the "screen" blend mode,
//! which only ever brightens: exactly what you want for embers glowing over a dark background.

use crate::surface::{Colour, Surface};

/// The colour underneath every layer. Terminals are mostly dark themed, so the page behind the
/// flames is pure black.
pub const BACKGROUND: Colour = (0.0, 0.0, 0.0, 1.0);

/// `Compositor`
pub(crate) struct Compositor {
    /// The frame's width in pixels.
    pub width: usize,
    /// The frame's height in pixels.
    pub height: usize,
}

impl Compositor {
    /// Create a compositor for the current viewport.
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// "Screen" blend a translucent colour onto an opaque base pixel. The classic formula is
    /// `1 - (1 - below)(1 - above)` per channel; the layer's alpha scales its contribution.
    #[must_use]
    pub fn screen_blend(below: Colour, above: Colour) -> Colour {
        let blend_channel = |below_channel: f32, above_channel: f32| {
            let screened = below_channel + above_channel - below_channel * above_channel;
            below_channel + (screened - below_channel) * above.3
        };

        (
            blend_channel(below.0, above.0),
            blend_channel(below.1, above.1),
            blend_channel(below.2, above.2),
            below.3,
        )
    }

    /// Merge all the effect surfaces, lowest layer first, over the background. Surfaces whose
    /// dimensions don't match the frame (stale frames from just before a resize) are clipped or
    /// padded rather than stretched; they'll be replaced by a correctly-sized frame on the
    /// effect's next tick.
    pub fn composite(&self, mut surfaces: Vec<&Surface>) -> Vec<Colour> {
        surfaces.sort_by_key(|surface| surface.layer);

        let mut frame = vec![BACKGROUND; self.width.saturating_mul(self.height)];
        for surface in surfaces {
            for y in 0..self.height.min(surface.height) {
                for x in 0..self.width.min(surface.width) {
                    let Some(above) = surface.pixel(x, y) else {
                        continue;
                    };
                    let index = y * self.width + x;
                    frame[index] = Self::screen_blend(frame[index], above);
                }
            }
        }

        frame
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const OPAQUE_RED: Colour = (1.0, 0.0, 0.0, 1.0);

    fn assert_colour_eq(left: Colour, right: Colour) {
        assert!((left.0 - right.0).abs() < 0.0001, "{left:?} != {right:?}");
        assert!((left.1 - right.1).abs() < 0.0001, "{left:?} != {right:?}");
        assert!((left.2 - right.2).abs() < 0.0001, "{left:?} != {right:?}");
        assert!((left.3 - right.3).abs() < 0.0001, "{left:?} != {right:?}");
    }

    #[test]
    fn screening_over_black_passes_the_colour_through() {
        let blended = Compositor::screen_blend(BACKGROUND, (1.0, 0.5, 0.25, 1.0));
        assert_colour_eq(blended, (1.0, 0.5, 0.25, 1.0));
    }

    #[test]
    fn screening_only_ever_brightens() {
        let base = (0.5, 0.5, 0.5, 1.0);
        let blended = Compositor::screen_blend(base, (0.5, 0.0, 0.25, 1.0));
        assert!(blended.0 >= base.0);
        assert!(blended.1 >= base.1);
        assert!(blended.2 >= base.2);
        assert_colour_eq(blended, (0.75, 0.5, 0.625, 1.0));
    }

    #[test]
    fn alpha_scales_the_contribution() {
        let faint = Compositor::screen_blend(BACKGROUND, (1.0, 1.0, 1.0, 0.5));
        assert_colour_eq(faint, (0.5, 0.5, 0.5, 1.0));

        let invisible = Compositor::screen_blend(BACKGROUND, (1.0, 1.0, 1.0, 0.0));
        assert_colour_eq(invisible, BACKGROUND);
    }

    #[test]
    fn transparent_surfaces_leave_the_background_untouched() {
        let compositor = Compositor::new(2, 2);
        let surface = Surface::new("test".into(), 2, 2, -5);
        let frame = compositor.composite(vec![&surface]);
        for pixel in frame {
            assert_colour_eq(pixel, BACKGROUND);
        }
    }

    #[test]
    fn painted_pixels_reach_the_frame() {
        let compositor = Compositor::new(2, 2);
        let mut surface = Surface::new("test".into(), 2, 2, -5);
        surface.add_pixel(1, 0, OPAQUE_RED).unwrap();
        let frame = compositor.composite(vec![&surface]);
        assert_colour_eq(frame[1], OPAQUE_RED);
        assert_colour_eq(frame[0], BACKGROUND);
    }

    #[test]
    fn mismatched_surfaces_are_clipped_not_stretched() {
        let compositor = Compositor::new(2, 2);
        let mut surface = Surface::new("test".into(), 4, 4, -5);
        surface.add_pixel(3, 3, OPAQUE_RED).unwrap();
        surface.add_pixel(0, 0, OPAQUE_RED).unwrap();
        let frame = compositor.composite(vec![&surface]);
        assert_colour_eq(frame[0], OPAQUE_RED);
        assert_colour_eq(frame[3], BACKGROUND);
    }
}
