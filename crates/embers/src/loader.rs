//! The manager of all the eye-candy effects

use std::sync::Arc;

use color_eyre::eyre::Result;

use crate::run::{FrameUpdate, Protocol};
use crate::shared_state::SharedState;

/// `Loader`
pub(crate) struct Loader;

impl Loader {
    /// Start the main effects thread.
    pub fn start(
        enabled_effects: Vec<String>,
        state: Arc<SharedState>,
        protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
        frame_tx: tokio::sync::mpsc::Sender<FrameUpdate>,
    ) -> std::thread::JoinHandle<Result<(), color_eyre::eyre::Error>> {
        let tokio_runtime = tokio::runtime::Handle::current();
        std::thread::spawn(move || -> Result<()> {
            tokio_runtime.block_on(async {
                if let Err(error) =
                    Self::start_without_concurrency(enabled_effects, state, protocol_tx.clone(), frame_tx)
                        .await
                {
                    crate::run::broadcast_protocol_end(&protocol_tx);
                    return Err(error);
                }

                Ok(())
            })
        })
    }

    /// Just a convenience wrapper to catch all the magic `?` errors in one place.
    async fn start_without_concurrency(
        enabled_effects: Vec<String>,
        state: Arc<SharedState>,
        protocol_tx: tokio::sync::broadcast::Sender<Protocol>,
        frame_tx: tokio::sync::mpsc::Sender<FrameUpdate>,
    ) -> Result<()> {
        if enabled_effects.is_empty() {
            return Err(color_eyre::eyre::eyre!("No effects to run"));
        }

        tracing::debug!("Starting effects: {enabled_effects:?}");
        let mut tasks = Vec::new();
        for effect in enabled_effects {
            let task = crate::effects::index::start_effect(
                &effect,
                &state,
                protocol_tx.clone(),
                frame_tx.clone(),
            )?;
            tasks.push(task);
        }

        for task in tasks {
            task.await??;
        }

        tracing::debug!("Effects loop finished");
        Ok(())
    }
}
