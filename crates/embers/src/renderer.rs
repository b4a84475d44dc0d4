//! Render the composited effect frames to the user's terminal.
//!
//! A terminal cell becomes 2 vertically stacked pixels by drawing the upper half block "▀":
//! its foreground colour is the upper pixel and its background colour the lower pixel.

use std::sync::Arc;

use color_eyre::eyre::Result;
use tokio::sync::mpsc;

use termwiz::surface::Surface as TermwizSurface;
use termwiz::surface::{Change as TermwizChange, Position as TermwizPosition};
use termwiz::terminal::buffered::BufferedTerminal;
use termwiz::terminal::{ScreenSize, Terminal as TermwizTerminal};

use crate::compositor::Compositor;
use crate::run::FrameUpdate;
use crate::shared_state::SharedState;
use crate::surface::Colour;

/// The number of microseconds in a second
pub const ONE_MICROSECOND: u64 = 1_000_000;

/// `Renderer`
pub(crate) struct Renderer {
    /// Shared app state
    pub state: Arc<SharedState>,
    /// The terminal's width
    pub width: u16,
    /// The terminal's height
    pub height: u16,
    /// The most recent frame from every effect, keyed by effect ID.
    pub frames: std::collections::HashMap<String, crate::surface::Surface>,
}

impl Renderer {
    /// Create a renderer to render to a user's terminal. If there's no usable terminal this
    /// fails here, before any task starts, and the app renders nothing at all.
    pub fn new(state: Arc<SharedState>) -> Result<Self> {
        let mut renderer = Self {
            state,
            width: Default::default(),
            height: Default::default(),
            frames: std::collections::HashMap::new(),
        };

        let size = Self::get_users_tty_size()?;
        renderer.width = size.cols.try_into()?;
        renderer.height = size.rows.try_into()?;

        Ok(renderer)
    }

    /// Instantiate and run
    pub fn start(
        state: Arc<SharedState>,
        surfaces_rx: mpsc::Receiver<FrameUpdate>,
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> tokio::task::JoinHandle<Result<()>> {
        let protocol_rx = protocol_tx.subscribe();
        tokio::spawn(async move {
            // This would be much simpler if async closures where stable, because then we could use
            // the `?` syntax.
            match Self::new(Arc::clone(&state)) {
                Ok(mut renderer) => {
                    let result = renderer
                        .run(surfaces_rx, protocol_rx, protocol_tx.clone())
                        .await;

                    if let Err(error) = result {
                        crate::run::broadcast_protocol_end(&protocol_tx);
                        return Err(error);
                    };
                }
                Err(error) => {
                    crate::run::broadcast_protocol_end(&protocol_tx);
                    return Err(error);
                }
            };

            Ok(())
        })
    }

    /// We need this just because I can't figure out how to pass `Box<dyn Terminal>` to
    /// `BufferedTerminal::new()`
    fn get_termwiz_terminal() -> Result<impl TermwizTerminal> {
        let capabilities = termwiz::caps::Capabilities::new_from_env()?;
        Ok(termwiz::terminal::new_terminal(capabilities)?)
    }

    /// Just for initialisation
    pub fn get_users_tty_size() -> Result<ScreenSize> {
        let mut terminal = Self::get_termwiz_terminal()?;
        Ok(terminal.get_screen_size()?)
    }

    /// Get the user's current terminal size and propagate it.
    pub async fn handle_resize<T: TermwizTerminal + Send>(
        &mut self,
        composited_terminal: &mut BufferedTerminal<T>,
        protocol_tx: &tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<()> {
        let is_resized = composited_terminal.check_for_resize()?;
        if !is_resized {
            return Ok(());
        }

        composited_terminal.repaint()?;

        let (width, height) = composited_terminal.dimensions();
        self.width = width.try_into()?;
        self.height = height.try_into()?;
        self.state.set_tty_size(self.width, self.height).await;
        protocol_tx.send(crate::run::Protocol::Resize {
            width: self.width,
            height: self.height,
        })?;

        Ok(())
    }

    /// Listen for surface updates from the effects. It lives in its own method so that we can
    /// catch any errors and ensure that the user's terminal is always returned to cooked mode.
    async fn run(
        &mut self,
        mut surfaces: mpsc::Receiver<FrameUpdate>,
        mut protocol_rx: tokio::sync::broadcast::Receiver<crate::run::Protocol>,
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    ) -> Result<()> {
        tracing::debug!("Putting user's terminal into raw mode");
        let mut copy_of_users_terminal = Self::get_termwiz_terminal()?;
        copy_of_users_terminal.set_raw_mode()?;
        let mut composited_terminal = BufferedTerminal::new(copy_of_users_terminal)?;
        composited_terminal.add_change(TermwizChange::CursorVisibility(
            termwiz::surface::CursorVisibility::Hidden,
        ));

        tracing::debug!("Starting render loop");
        loop {
            tokio::select! {
                Some(update) = surfaces.recv() => {
                    self.handle_resize(&mut composited_terminal, &protocol_tx).await?;
                    self.render(update, &mut composited_terminal)?;
                }
                Ok(message) = protocol_rx.recv() => {
                    if matches!(message, crate::run::Protocol::End) {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Exited render loop");

        composited_terminal.add_change(TermwizChange::CursorVisibility(
            termwiz::surface::CursorVisibility::Visible,
        ));
        composited_terminal.flush()?;

        tracing::debug!("Setting user's terminal to cooked mode");
        composited_terminal.terminal().set_cooked_mode()?;

        Ok(())
    }

    /// Do a single render to the user's actual terminal. It uses a diffing algorithm to make
    /// the minimum number of changes.
    fn render(
        &mut self,
        update: FrameUpdate,
        composited_terminal: &mut BufferedTerminal<impl TermwizTerminal + Send>,
    ) -> Result<()> {
        let FrameUpdate::EffectSurface(surface) = update;
        self.frames.insert(surface.id.clone(), surface);

        let pixel_frame = self.composite_pixel_frame();
        let new_frame = self.pixels_to_cells(&pixel_frame);

        composited_terminal.draw_from_screen(&new_frame, 0, 0);
        composited_terminal.flush()?;

        Ok(())
    }

    /// Merge the latest frame from every effect into one pixel frame.
    fn composite_pixel_frame(&self) -> Vec<Colour> {
        let compositor = Compositor::new(self.width.into(), usize::from(self.height) * 2);
        compositor.composite(self.frames.values().collect())
    }

    /// Pack pixel pairs into "▀" cells: the upper pixel is the cell's foreground, the lower
    /// pixel its background.
    fn pixels_to_cells(&self, pixels: &[Colour]) -> TermwizSurface {
        let mut frame = TermwizSurface::new(self.width.into(), self.height.into());
        let width = usize::from(self.width);

        for row in 0..usize::from(self.height) {
            frame.add_change(TermwizChange::CursorPosition {
                x: TermwizPosition::Absolute(0),
                y: TermwizPosition::Absolute(row),
            });
            for col in 0..width {
                let upper = pixels.get((row * 2) * width + col).copied();
                let lower = pixels.get((row * 2 + 1) * width + col).copied();
                frame.add_changes(vec![
                    Self::make_fg_colour(upper.unwrap_or(crate::compositor::BACKGROUND)),
                    Self::make_bg_colour(lower.unwrap_or(crate::compositor::BACKGROUND)),
                ]);
                frame.add_change("▀");
            }
        }

        frame
    }

    /// Make a Termwiz foreground colour
    #[must_use]
    pub const fn make_fg_colour(colour: Colour) -> TermwizChange {
        TermwizChange::Attribute(termwiz::cell::AttributeChange::Foreground(
            Self::make_colour_attribute(colour),
        ))
    }

    /// Make a Termwiz background colour
    #[must_use]
    pub const fn make_bg_colour(colour: Colour) -> TermwizChange {
        TermwizChange::Attribute(termwiz::cell::AttributeChange::Background(
            Self::make_colour_attribute(colour),
        ))
    }

    /// Make a Termwiz colour attribute
    #[must_use]
    pub const fn make_colour_attribute(colour: Colour) -> termwiz::color::ColorAttribute {
        termwiz::color::ColorAttribute::TrueColorWithDefaultFallback(termwiz::color::SrgbaTuple(
            colour.0, colour.1, colour.2, colour.3,
        ))
    }
}
