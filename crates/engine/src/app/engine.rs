use tracing::{debug, info};

use crate::content::Resources;
use crate::render::RenderTarget;
use crate::scene::ObjectTree;
use crate::timer::TimerManager;

use super::input::{InputManager, InputSource};
use super::loop_runner::LoopConfig;

/// Everything one running game owns: the scene, its timers, input state and
/// loaded resources. Built once at startup and passed around explicitly.
pub struct Engine {
    tree: ObjectTree,
    timers: TimerManager<ObjectTree>,
    input: InputManager,
    resources: Resources,
    config: LoopConfig,
    ticks: u64,
}

impl Engine {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            tree: ObjectTree::new(),
            timers: TimerManager::new(),
            input: InputManager::new(),
            resources: Resources::new(),
            config,
            ticks: 0,
        }
    }

    pub fn with_resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn tree(&self) -> &ObjectTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ObjectTree {
        &mut self.tree
    }

    pub fn timers(&self) -> &TimerManager<ObjectTree> {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut TimerManager<ObjectTree> {
        &mut self.timers
    }

    pub fn input(&self) -> &InputManager {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One fixed simulation step: structural changes queued last tick land
    /// first, then input is sampled, timers advance and the tree updates.
    pub fn tick(&mut self, delta_ms: f32, source: &dyn InputSource) {
        if self.ticks == 0 {
            info!(
                nodes = self.tree.len(),
                textures = self.resources.textures().len(),
                "engine_first_tick"
            );
        }
        let pending = self.tree.pending().len();
        self.tree.apply_pending();
        if pending > 0 {
            debug!(tick = self.ticks, pending, "tree_sync_applied");
        }
        self.input.update(source);
        self.timers.update(delta_ms, &mut self.tree);
        self.tree.update(delta_ms, &mut self.timers, &self.input);
        self.ticks = self.ticks.saturating_add(1);
    }

    pub fn draw(&self, target: &mut dyn RenderTarget) {
        self.tree.draw(target);
    }
}
