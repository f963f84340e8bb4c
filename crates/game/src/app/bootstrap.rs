use ledgefall_engine::{LoopConfig, Scene};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::config::{load_match_config, ConfigError, MatchConfig};
use super::gameplay;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) lobby: Box<dyn Scene>,
    pub(crate) arena: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, ConfigError> {
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "=== Ledgefall Startup ===");

    let match_config = load_match_config()?;
    Ok(wire(&match_config))
}

fn wire(match_config: &MatchConfig) -> AppWiring {
    let (lobby, arena) = gameplay::build_scene_pair(match_config);
    let config = LoopConfig {
        target_tps: match_config.normal_tick_rate,
        ..LoopConfig::default()
    };
    info!(
        fighters = match_config.roster.len(),
        target_tps = config.target_tps,
        "app_wired"
    );

    AppWiring {
        config,
        lobby,
        arena,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_ticks_at_the_configured_match_rate() {
        let match_config = MatchConfig {
            normal_tick_rate: 90,
            ..MatchConfig::default()
        };
        let wiring = wire(&match_config);
        assert_eq!(wiring.config.target_tps, 90);
        assert_eq!(wiring.config.initial_scene, ledgefall_engine::SceneKey::Lobby);
    }
}
