//! The flame background: a field of glowing motes rising up from below the fold

use std::sync::Arc;

use color_eyre::eyre::Result;

use super::simulation::Simulation;

/// `FlameBackground`
pub(crate) struct FlameBackground {
    /// The base effect struct
    effect: crate::effects::effect::Effect,
    /// The particle field
    simulation: Simulation,
}

impl FlameBackground {
    /// The compositing layer: above the page background, below any foreground content.
    const LAYER: i16 = -5;

    /// Instantiate
    fn new(
        output_channel: tokio::sync::mpsc::Sender<crate::run::FrameUpdate>,
        config: super::config::Config,
        frame_rate: u32,
    ) -> Self {
        let mut effect =
            crate::effects::effect::Effect::new("flame".to_owned(), Self::LAYER, output_channel);
        effect.frame_rate = frame_rate;

        Self {
            effect,
            simulation: Simulation::new(0, 0, config),
        }
    }

    /// Initialise the simulation, because we don't have the dimensions when instantiating Self.
    fn initialise(&mut self) {
        let config = self.simulation.config.clone();
        self.simulation = Simulation::new(
            self.effect.width.into(),
            self.effect.height.into(),
            config,
        );
        self.simulation.initial_burst();
        tracing::debug!("Flame simulation initialised.");
    }

    /// Our main entrypoint. Runs until the `End` protocol message arrives; `tokio::select!`
    /// drops the pending frame sleep on that branch, so no further tick can run afterwards.
    pub(crate) async fn start(
        state: Arc<crate::shared_state::SharedState>,
        protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
        output: tokio::sync::mpsc::Sender<crate::run::FrameUpdate>,
    ) -> Result<()> {
        let config = state.config.read().await.clone();
        let mut flame = Self::new(output, config.flame, config.frame_rate);

        let tty_size = state.get_tty_size().await;
        flame
            .effect
            .set_viewport_size(tty_size.width, tty_size.height.saturating_mul(2));

        let mut protocol = protocol_tx.subscribe();

        loop {
            tokio::select! {
                () = flame.effect.sleep_until_next_frame_tick() => {
                    flame.render().await?;
                },
                Ok(message) = protocol.recv() => {
                    if matches!(message, crate::run::Protocol::End) {
                        break;
                    }
                    flame.handle_protocol_message(message);
                }
            }
        }

        tracing::debug!("Flame effect loop finished");
        Ok(())
    }

    /// Handle messages from the main Embers app.
    fn handle_protocol_message(&mut self, message: crate::run::Protocol) {
        self.effect.handle_common_protocol_messages(message);

        // Keep the simulation's spawn extent in step with the viewport. Live particles are
        // kept over a resize.
        if self.simulation.is_ready() {
            self.simulation
                .set_size(self.effect.width.into(), self.effect.height.into());
        }
    }

    /// One frame of the effect.
    async fn render(&mut self) -> Result<()> {
        if !self.effect.is_ready() {
            return Ok(());
        }

        if !self.simulation.is_ready() {
            self.initialise();
        }

        self.effect.initialise_surface();
        self.simulation.tick();

        // Paint before culling, so a particle on its death tick appears in one last frame.
        for particle in &self.simulation.particles {
            particle.draw(&mut self.effect.surface)?;
        }
        self.simulation.cull();

        self.effect.send_output().await
    }
}
