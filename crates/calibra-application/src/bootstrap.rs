//! Default wiring: JSON file store plus Ollama oracle.

use std::sync::Arc;
use std::time::Duration;

use calibra_core::config::EngineConfig;
use calibra_core::error::Result;
use calibra_infrastructure::{CalibraPaths, JsonSessionStore};
use calibra_interaction::{OllamaOracle, OracleConfig};
use tracing::debug;

use crate::session_usecase::SessionUseCase;

/// Builds a [`SessionUseCase`] on the default storage location with an
/// oracle configured from the environment.
///
/// Engine configuration is read from the user config file when present,
/// otherwise defaults apply. The oracle timeout follows the engine
/// configuration.
pub async fn default_usecase() -> Result<SessionUseCase> {
    let config = match CalibraPaths::config_file() {
        Ok(path) if path.exists() => {
            debug!(path = %path.display(), "loading engine configuration");
            EngineConfig::load(&path)?
        }
        _ => EngineConfig::default(),
    };

    let store = JsonSessionStore::default_location().await?;
    let oracle_config = OracleConfig::from_env()
        .with_timeout(Duration::from_secs(config.oracle.request_timeout_secs));
    let oracle = OllamaOracle::new(oracle_config)?;

    Ok(SessionUseCase::new(
        Arc::new(store),
        Arc::new(oracle),
        config,
    ))
}
