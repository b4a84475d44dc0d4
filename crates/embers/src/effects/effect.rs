//! Shared state and behaviour useful to all effects.

use color_eyre::eyre::Result;

/// Shared state and behaviour useful to all effects.
pub(crate) struct Effect {
    /// A unique identifier.
    pub id: String,
    /// The compositing layer that the effect is rendered to. Background layers are negative,
    /// foreground layers positive.
    pub layer: i16,
    /// A channel to send final rendered output.
    pub output_channel: tokio::sync::mpsc::Sender<crate::run::FrameUpdate>,
    /// The surface on which to construct this effect's frame.
    pub surface: crate::surface::Surface,
    /// Viewport width in pixels
    pub width: u16,
    /// Viewport height in pixels. Note that this is twice the terminal's row count, because a
    /// cell is 2 "pixels" tall.
    pub height: u16,
    /// The target frame rate.
    pub frame_rate: u32,
    /// The time at which the previous frame was rendered.
    pub last_frame_tick: std::time::Instant,
}

impl Effect {
    /// Instantiate
    pub(crate) fn new(
        id: String,
        layer: i16,
        output_channel: tokio::sync::mpsc::Sender<crate::run::FrameUpdate>,
    ) -> Self {
        Self {
            id: id.clone(),
            layer,
            output_channel,
            surface: crate::surface::Surface::new(id, 0, 0, layer),
            width: 0,
            height: 0,
            frame_rate: 30,
            last_frame_tick: std::time::Instant::now(),
        }
    }

    /// Is the effect ready to be rendered?
    pub const fn is_ready(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Create an empty surface ready for building a new frame. Making it fresh at the current
    /// viewport size doubles as the per-frame clear, so a resize between frames never leaves
    /// stale pixels behind.
    pub fn initialise_surface(&mut self) {
        self.surface = crate::surface::Surface::new(
            self.id.clone(),
            self.width.into(),
            self.height.into(),
            self.layer,
        );
    }

    /// Keep track of the size of the viewport, in pixels.
    pub const fn set_viewport_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    /// Handle common protocol messages, like resizing.
    pub(crate) fn handle_common_protocol_messages(&mut self, message: crate::run::Protocol) {
        tracing::trace!("'{}' effect received protocol message: {message:?}", self.id);

        match message {
            crate::run::Protocol::Resize { width, height } => {
                // A terminal row is 2 pixels tall.
                self.set_viewport_size(width, height.saturating_mul(2));
            }
            crate::run::Protocol::End => (),
        }
    }

    /// Send the final surface to the main renderer.
    pub(crate) async fn send_output(&mut self) -> Result<()> {
        self.output_channel
            .send(crate::run::FrameUpdate::EffectSurface(self.surface.clone()))
            .await?;

        Ok(())
    }

    /// Sleep until the next frame render is due.
    pub async fn sleep_until_next_frame_tick(&mut self) {
        let target = crate::renderer::ONE_MICROSECOND.wrapping_div(self.frame_rate.into());
        let target_frame_rate_micro = std::time::Duration::from_micros(target);
        if let Some(wait) = target_frame_rate_micro.checked_sub(self.last_frame_tick.elapsed()) {
            tokio::time::sleep(wait).await;
        }
        self.last_frame_tick = std::time::Instant::now();
    }
}
