//! Main entrypoint for running Embers

use std::sync::Arc;

use clap::Parser as _;
use color_eyre::eyre::{ContextCompat as _, Result};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _};

use crate::cli_args::CliArgs;
use crate::renderer::Renderer;
use crate::shared_state::SharedState;

/// An effect has finished building a frame.
pub(crate) enum FrameUpdate {
    /// A frame of an effect's surface.
    EffectSurface(crate::surface::Surface),
}

/// Commands to control the various tasks/threads
#[non_exhaustive]
#[derive(Clone, Debug)]
pub(crate) enum Protocol {
    /// The entire application is exiting.
    End,
    /// User's TTY is resized.
    Resize {
        /// Width of new terminal.
        width: u16,
        /// Height of new terminal.
        height: u16,
    },
}

/// Main entrypoint
pub(crate) async fn run(state_arc: &Arc<SharedState>) -> Result<()> {
    let protocol_tx = state_arc.protocol_tx.clone();
    let cli_args = setup(state_arc).await?;

    let users_tty_size = Renderer::get_users_tty_size()?;
    state_arc
        .set_tty_size(
            users_tty_size.cols.try_into()?,
            users_tty_size.rows.try_into()?,
        )
        .await;

    let (frame_tx, frame_rx) = tokio::sync::mpsc::channel(128);
    let renderer = Renderer::start(Arc::clone(state_arc), frame_rx, protocol_tx.clone());
    let input_thread_handle = crate::input::Input::start(protocol_tx.clone());
    let effects_handle = crate::loader::Loader::start(
        cli_args.enabled_effects.clone(),
        Arc::clone(state_arc),
        protocol_tx.clone(),
        frame_tx,
    );

    // The renderer owns the user's terminal, so when it finishes, so do we.
    renderer.await??;
    broadcast_protocol_end(&protocol_tx);

    effects_handle
        .join()
        .map_err(|err| color_eyre::eyre::eyre!("Effects handle: {err:?}"))??;
    if input_thread_handle.is_finished() {
        // The STDIN loop doesn't listen to the global Embers protocol, so it can't exit its loop.
        // Therefore we should only join it if it finished due of its own error.
        input_thread_handle
            .join()
            .map_err(|err| color_eyre::eyre::eyre!("STDIN handle: {err:?}"))??;
    }

    tracing::trace!("Leaving Embers' main `run()` function");
    Ok(())
}

/// Signal all task/thread loops to exit.
///
/// We keep it in its own function because we need to handle the error separately. If the error
/// were to be bubbled with `?` as usual, there's a chance it would never be logged, because the
/// protocol end signal is itself what allows the central error handler to even be reached.
pub(crate) fn broadcast_protocol_end(protocol_tx: &tokio::sync::broadcast::Sender<Protocol>) {
    tracing::debug!("Broadcasting the protocol `End` message to all listeners");
    let result = protocol_tx.send(Protocol::End);
    if let Err(error) = result {
        tracing::error!("{error:?}");
    }
}

/// Prepare the application to start.
async fn setup(state: &Arc<SharedState>) -> Result<CliArgs> {
    let cli_args = CliArgs::parse();

    let directory_result =
        crate::config::Config::setup_directory(cli_args.config_dir.clone(), state).await;
    if let Err(directory_error) = directory_result {
        color_eyre::eyre::bail!("Error setting up config directory: {directory_error:?}");
    }

    let config_result = crate::config::Config::load_config_into_shared_state(state).await;
    if let Err(config_error) = config_result {
        let path = crate::config::Config::main_config_path(state).await;
        color_eyre::eyre::bail!(
            "Bad config file: {config_error:?}\n\nConfig path: {}",
            path.display()
        );
    }

    if let Some(seed) = cli_args.seed {
        state.config.write().await.flame.seed = Some(seed);
    }

    setup_logging(cli_args.clone(), state).await?;

    tracing::info!("Starting Embers");
    tracing::debug!("Loaded config: {:?}", state.config.read().await);

    Ok(cli_args)
}

/// Setup logging
async fn setup_logging(cli_args: CliArgs, state: &Arc<SharedState>) -> Result<()> {
    let are_log_filters_manually_set = std::env::var("EMBERS_LOG").is_ok();
    let mut path = state.config.read().await.log_path.clone();

    if let Some(cli_override_path) = cli_args.log_path {
        path = cli_override_path;
    }

    let mut level = state.config.read().await.log_level.clone();
    if let Some(cli_override_level) = cli_args.log_level {
        level = cli_override_level;
    }
    let level_as_string = format!("{level:?}").to_lowercase();

    let is_loggable =
        !matches!(level, crate::config::LogLevel::Off) || are_log_filters_manually_set;

    if !is_loggable {
        return Ok(());
    }

    let directory = path.parent().context("Couldn't get log path's parent")?;
    std::fs::create_dir_all(directory)?;
    let file = std::fs::File::create(path)?;

    let filters = if are_log_filters_manually_set {
        if let Ok(user_filters) = std::env::var("EMBERS_LOG") {
            std::env::set_var("RUST_LOG", user_filters);
        }

        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("error".parse()?)
            .from_env_lossy()
    } else {
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("off".parse()?)
            .from_env_lossy()
            .add_directive(format!("embers={level_as_string}").parse()?)
    };

    let logfile_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_filter(filters);

    tracing_subscriber::registry().with(logfile_layer).init();

    let mut is_logging = state.is_logging.write().await;
    *is_logging = true;
    drop(is_logging);

    Ok(())
}
