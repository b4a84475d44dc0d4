//! All of the user config for Embers.

use color_eyre::eyre::ContextCompat as _;
use color_eyre::eyre::Result;

/// A copy of the default config file. It gets copied to the user's config folder the first time
/// they start Embers.
static DEFAULT_CONFIG: &str = include_str!("../default_config.toml");

/// The name of the main config file.
const MAIN_CONFIG_FILE_NAME: &str = "embers.toml";

/// The valid log levels. Based on our `tracing` crate.
#[derive(serde::Serialize, serde::Deserialize, clap::ValueEnum, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error
    Error,
    /// Warnings
    Warn,
    /// Info
    Info,
    /// Debug
    Debug,
    /// Trace
    Trace,
    /// No logging
    Off,
}

/// Managing user config.
#[derive(serde::Deserialize, Debug, Clone)]
#[serde(default)]
pub(crate) struct Config {
    /// The maximum log level
    pub log_level: LogLevel,
    /// The location of the log file.
    pub log_path: std::path::PathBuf,
    /// Target frame rate
    pub frame_rate: u32,
    /// The flame effect
    pub flame: crate::effects::flame::config::Config,
}

impl Default for Config {
    fn default() -> Self {
        let log_directory = match dirs::state_dir() {
            Some(directory) => directory,
            None => std::path::PathBuf::new().join("./"),
        };
        let log_path = log_directory.join("embers").join("embers.log");

        Self {
            log_level: LogLevel::Off,
            log_path,
            frame_rate: 30,
            flame: crate::effects::flame::config::Config::default(),
        }
    }
}

impl Config {
    /// Canonical path to the config directory.
    pub async fn directory(
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> std::path::PathBuf {
        state.config_path.read().await.clone()
    }

    /// Get the stable location of Embers' config directory on the user's system.
    pub fn default_directory() -> Result<std::path::PathBuf> {
        Ok(dirs::config_dir()
            .context("Couldn't get standard config directory")?
            .join("embers"))
    }

    /// Figure out where our config is being stored, and create the directory if needed.
    pub async fn setup_directory(
        maybe_custom_path: Option<std::path::PathBuf>,
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> Result<()> {
        let path = match maybe_custom_path {
            None => Self::default_directory()?,
            Some(path_string) => std::path::PathBuf::new().join(path_string),
        };

        std::fs::create_dir_all(path.clone())?;

        *state.config_path.write().await = path;

        Ok(())
    }

    /// Canonical path to the main config file.
    pub async fn main_config_path(
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> std::path::PathBuf {
        Self::directory(state).await.join(MAIN_CONFIG_FILE_NAME)
    }

    /// Load the main config
    pub async fn load(state: &std::sync::Arc<crate::shared_state::SharedState>) -> Result<Self> {
        let config_path = Self::main_config_path(state).await;
        if !config_path.exists() {
            std::fs::write(config_path.clone(), DEFAULT_CONFIG)?;
        }

        tracing::info!("(Re)loading the main Embers config from: {config_path:?}");
        let result = std::fs::read_to_string(config_path.clone());
        match result {
            Ok(data) => {
                tracing::trace!("Using config file:\n{data}");
                let config = toml::from_str::<Self>(&data)?;
                config.validate()?;
                Ok(config)
            }
            Err(err) => {
                tracing::error!("Loading config: {err:?}");
                color_eyre::eyre::bail!(
                    "Couldn't load config at {config_path:?}: {}",
                    err.to_string()
                );
            }
        }
    }

    /// Check the loaded values before they drive the renderer and the effects. The config file
    /// is user-edited, so anything that would panic deeper in the app is rejected here instead.
    pub fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 {
            color_eyre::eyre::bail!("`frame_rate` must be greater than zero");
        }
        self.flame.validate()
    }

    /// Load the main config into the shared state.
    pub async fn load_config_into_shared_state(
        state: &std::sync::Arc<crate::shared_state::SharedState>,
    ) -> Result<Self> {
        let mut config_state = state.config.write().await;
        let new_config = Self::load(state).await?;
        *config_state = new_config.clone();
        drop(config_state);

        Ok(new_config)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn the_bundled_default_config_parses() {
        let config = toml::from_str::<Config>(DEFAULT_CONFIG).unwrap();
        config.validate().unwrap();
        assert_eq!(config.frame_rate, 30);
        assert_eq!(config.flame.max_particles, 300);
        assert_eq!(config.flame.spawn_per_tick, 2);
    }

    #[test]
    fn a_zero_frame_rate_is_rejected() {
        let config = toml::from_str::<Config>("frame_rate = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn a_config_that_would_panic_the_sampler_is_rejected() {
        let config = toml::from_str::<Config>("[flame]\nhorizontal_drift = 0.0").unwrap();
        assert!(config.validate().is_err());
    }
}
