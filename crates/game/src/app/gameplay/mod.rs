mod canvas;
mod enemies;
mod level;
mod player;
mod script;
mod tiles;

pub(crate) use canvas::AsciiCanvas;
pub(crate) use enemies::{enemy_state, Enemy};
pub(crate) use level::{build_level, LevelHandles, TILE_SIZE};
pub(crate) use player::Player;
pub(crate) use script::{default_script, ScriptStep, ScriptedInput};

/// Downward acceleration in px/ms².
pub(crate) const GRAVITY: f32 = 0.0015;
pub(crate) const MAX_FALL_SPEED: f32 = 0.4;
pub(crate) const WALK_SPEED: f32 = 0.1;
pub(crate) const JUMP_SPEED: f32 = 0.45;
pub(crate) const BOUNCE_SPEED: f32 = 0.3;
pub(crate) const ACTOR_SIZE: f32 = 16.0;

pub(crate) const BUTTON_JUMP: &str = "jump";

/// Horizontal walking speed of an enemy, set from level data.
pub(crate) const PROP_SPEED: &str = "speed";
/// Set on an enemy by whoever landed on it.
pub(crate) const PROP_STOMPED: &str = "stomped";
/// Published by enemies every tick so other actors can read their motion.
pub(crate) const PROP_VELOCITY_X: &str = "vx";

#[cfg(test)]
pub(crate) mod testing {
    use engine::{Engine, KeyboardState, LoopConfig, NodeId, Object, ObjectTree, TileGridError};

    use super::level::{spawn_actor, spawn_grid};
    use crate::app::config::default_bindings;

    pub(crate) const TICK_MS: f32 = 1_000.0 / 60.0;

    pub(crate) fn new_engine() -> Engine {
        let mut engine = Engine::new(LoopConfig::default());
        engine.input_mut().apply_bindings(&default_bindings());
        engine
    }

    /// Level group plus a grid built from `rows`.
    pub(crate) fn stage(tree: &mut ObjectTree, rows: &[&str]) -> Result<NodeId, TileGridError> {
        let root = tree.root();
        let level = spawn_actor(tree, root, engine::Group, "stage", 0.0, 0.0);
        spawn_grid(tree, level, rows)?;
        Ok(level)
    }

    pub(crate) fn place(
        engine: &mut Engine,
        level: NodeId,
        object: impl Object,
        x: f32,
        y: f32,
    ) -> NodeId {
        spawn_actor(engine.tree_mut(), level, object, "actor", x, y)
    }

    pub(crate) fn run(engine: &mut Engine, keys: &KeyboardState, ticks: u32) {
        for _ in 0..ticks {
            engine.tick(TICK_MS, keys);
        }
    }
}
