mod controls;
mod effects;
mod fighter;
mod lobby_scene;
mod match_scene;
mod stage;

#[cfg(test)]
mod tests;

use ledgefall_engine::Scene;

use super::config::MatchConfig;

pub(crate) use fighter::FighterTuning;

use lobby_scene::LobbyScene;
use match_scene::MatchScene;

/// Returns `(lobby, match)` in the order the scene machine expects.
pub(crate) fn build_scene_pair(config: &MatchConfig) -> (Box<dyn Scene>, Box<dyn Scene>) {
    let lobby = LobbyScene::default();
    let arena = MatchScene::new(config.clone());
    (Box::new(lobby), Box::new(arena))
}
