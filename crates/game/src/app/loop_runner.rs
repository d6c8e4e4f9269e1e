use std::process::ExitCode;
use std::time::Duration;

use engine::{Engine, FixedStepClock, TileGrid};
use tracing::{debug, info};

use super::bootstrap::AppWiring;
use super::config::DemoConfig;
use super::gameplay::{
    enemy_state, AsciiCanvas, Enemy, LevelHandles, Player, ScriptedInput, TILE_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) frames: u64,
    pub(crate) ticks: u64,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        mut engine,
        level,
    } = app;

    let summary = run_demo(&mut engine, &config);
    report(&engine, level, summary);
    ExitCode::SUCCESS
}

/// Drives the engine with simulated frames of `frame_ms` until the tick
/// budget is spent, feeding it the scripted keys.
pub(crate) fn run_demo(engine: &mut Engine, config: &DemoConfig) -> RunSummary {
    let mut clock = FixedStepClock::new(engine.config());
    let mut script = ScriptedInput::new(config.script.clone());
    let frame = Duration::from_millis(config.frame_ms.max(1));
    let tick_ms = clock.fixed_tick_ms();
    let mut frames = 0u64;

    while engine.ticks() < config.tick_budget {
        let plan = clock.advance(frame);
        frames += 1;
        for _ in 0..plan.ticks_to_run {
            if engine.ticks() >= config.tick_budget {
                break;
            }
            let keys = script.advance(engine.ticks());
            engine.tick(tick_ms, keys);
        }
    }

    RunSummary {
        frames,
        ticks: engine.ticks(),
    }
}

fn report(engine: &Engine, level: LevelHandles, summary: RunSummary) {
    let tree = engine.tree();
    let enemies: Vec<_> = tree
        .find_children_by_type::<Enemy>(level.level, false)
        .into_iter()
        .filter_map(|id| enemy_state(tree, id))
        .collect();
    let enemies_left = enemies.len();
    match tree.object::<Player>(level.player) {
        Some(player) => {
            let position = tree[level.player].position();
            info!(
                ticks = summary.ticks,
                frames = summary.frames,
                player_state = ?player.state(),
                animation = player.animation(),
                player_vx = player.velocity().x,
                player_x = position.x,
                player_y = position.y,
                stomps = player.stomps(),
                hits = player.hits(),
                enemies_left,
                enemy_states = ?enemies,
                "demo_finished"
            );
        }
        None => info!(
            ticks = summary.ticks,
            frames = summary.frames,
            enemies_left,
            "demo_finished_without_player"
        ),
    }

    if let Some(grid) = tree.object::<TileGrid>(level.grid) {
        let mut canvas = AsciiCanvas::new(grid.bounds(), TILE_SIZE / 2.0);
        engine.draw(&mut canvas);
        debug!(snapshot = %format!("\n{canvas}"), "frame_snapshot");
    }
}
