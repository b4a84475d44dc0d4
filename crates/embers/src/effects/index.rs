//! Map all effects to CLI-callable strings

use std::sync::Arc;

use color_eyre::eyre::Result;

use crate::shared_state::SharedState;

/// How to map from a CLI arg to an effect implementation.
pub(crate) fn start_effect(
    effect: &str,
    state: &Arc<SharedState>,
    protocol_tx: tokio::sync::broadcast::Sender<crate::run::Protocol>,
    output: tokio::sync::mpsc::Sender<crate::run::FrameUpdate>,
) -> Result<tokio::task::JoinHandle<Result<()>>> {
    let state_clone = Arc::clone(state);
    match effect {
        "flame" => Ok(tokio::spawn(
            crate::effects::flame::main::FlameBackground::start(state_clone, protocol_tx, output),
        )),
        _ => Err(color_eyre::eyre::eyre!(
            "The effect, `{effect}` was not found"
        )),
    }
}
