//! Just `main()`. Keep as small as possible.

pub mod cli_args;
pub mod compositor;
pub mod config;
pub mod input;
pub mod loader;
pub mod renderer;
pub mod run;
pub mod shared_state;
pub mod surface;
pub mod utils;

/// This is where all the various effects are kept
pub mod effects {
    pub mod effect;
    pub mod index;

    /// The rising-flame particle field
    pub mod flame {
        pub mod config;
        pub mod main;
        pub mod particle;
        pub mod simulation;
    }
}

use color_eyre::eyre::Result;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let (protocol_tx, _) = tokio::sync::broadcast::channel(64);
    let state_arc = shared_state::SharedState::init(protocol_tx).await?;
    let result = run::run(&std::sync::Arc::clone(&state_arc)).await;
    println!("{}", utils::RESET_SCREEN);

    let logpath = state_arc.config.read().await.log_path.clone();
    let is_logging = *state_arc.is_logging.read().await;
    tracing::debug!("Embers is exiting");

    match result {
        Ok(()) => {
            if is_logging {
                println!("Logs saved to {}", logpath.display());
            }
        }
        Err(error) => {
            tracing::error!("{error:?}");
            eprintln!("Error: {error}");
            if is_logging {
                eprintln!("See {} for more details", logpath.display());
            }
        }
    }

    Ok(())
}
