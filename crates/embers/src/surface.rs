//! The drawing surface that an effect paints its frame onto.
//!
//! The surface is a true colour pixel raster the size of the viewport: one pixel per terminal
//! column and 2 pixels per terminal row (the renderer packs pixel pairs into "▀" half-block
//! cells). A fresh surface is made for every frame, so a resize between frames never leaves
//! stale pixels behind.

use color_eyre::eyre::bail;
use color_eyre::eyre::Result;

/// An RGBA colour, each channel in `0.0..=1.0`.
pub(crate) type Colour = (f32, f32, f32, f32);

/// A fully transparent pixel.
pub const TRANSPARENT: Colour = (0.0, 0.0, 0.0, 0.0);

/// `Surface`
#[derive(Clone, Debug)]
pub(crate) struct Surface {
    /// The unique ID of the effect to which this surface belongs.
    pub id: String,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// The order in which the effect should be composited. The background is always the lowest,
    /// so effects with a lower layer value sit further behind any foreground content.
    pub layer: i16,
    /// Row-major pixels.
    pixels: Vec<Colour>,
}

impl Surface {
    /// Create an effect surface sized to the current viewport.
    #[must_use]
    pub fn new(id: String, width: usize, height: usize, layer: i16) -> Self {
        Self {
            id,
            width,
            height,
            layer,
            pixels: vec![TRANSPARENT; width.saturating_mul(height)],
        }
    }

    /// Set a single pixel. Coordinates outside the surface are an error.
    pub fn add_pixel(&mut self, x: usize, y: usize, colour: Colour) -> Result<()> {
        if x >= self.width {
            bail!("Tried to add pixel to column: {x}")
        }
        if y >= self.height {
            bail!("Tried to add pixel to row: {y}")
        }
        self.pixels[y * self.width + x] = colour;
        Ok(())
    }

    /// Get a single pixel, or `None` outside the surface.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Colour> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Paint a filled circle. Anything outside the surface extent is clipped: particles that have
    /// drifted past an edge are still alive, they're just not visible.
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Viewport coordinates are tiny compared to what f32 can represent"
    )]
    pub fn fill_circle(&mut self, centre: glam::Vec2, radius: f32, colour: Colour) -> Result<()> {
        let left = (centre.x - radius).floor().max(0.0) as usize;
        let top = (centre.y - radius).floor().max(0.0) as usize;
        let right = ((centre.x + radius).ceil().max(0.0) as usize).min(self.width);
        let bottom = ((centre.y + radius).ceil().max(0.0) as usize).min(self.height);

        for y in top..bottom {
            for x in left..right {
                let to_centre = glam::Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - centre;
                if to_centre.length_squared() <= radius * radius {
                    let below = self.pixel(x, y).unwrap_or(TRANSPARENT);
                    self.add_pixel(x, y, Self::source_over(below, colour))?;
                }
            }
        }

        Ok(())
    }

    /// Source-over blend a translucent colour onto an existing pixel. Overlapping particles on
    /// the same surface accumulate just as they would on a 2D canvas.
    fn source_over(below: Colour, above: Colour) -> Colour {
        let alpha = above.3 + below.3 * (1.0 - above.3);
        if alpha <= f32::EPSILON {
            return TRANSPARENT;
        }

        let blend_channel = |above_channel: f32, below_channel: f32| {
            (above_channel * above.3 + below_channel * below.3 * (1.0 - above.3)) / alpha
        };

        (
            blend_channel(above.0, below.0),
            blend_channel(above.1, below.1),
            blend_channel(above.2, below.2),
            alpha,
        )
    }
}
