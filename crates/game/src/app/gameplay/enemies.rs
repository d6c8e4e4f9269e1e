use std::mem;

use engine::{
    CollisionTag, Color, Node, NodeCx, NodeId, Object, ObjectTree, Property, Rect, RenderTarget,
    StateMachine, StaticCollider, TileGrid, TimerId, UpdateCx, Vector,
};
use tracing::{debug, info};

use super::canvas::{GOOMBA, KOOPA, SQUASHED};
use super::{GRAVITY, MAX_FALL_SPEED, PROP_SPEED, PROP_STOMPED, PROP_VELOCITY_X};

const GOOMBA_SQUASH_MS: f32 = 500.0;
const KOOPA_SHELL_MS: f32 = 1_500.0;

/// Abstract base of everything the player can stomp.
pub(crate) enum Enemy {}

engine::declare_type!(Enemy);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum EnemyState {
    Walk,
    Squashed,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnemyEvent {
    Stomp,
    Hit,
}

#[derive(Debug, Default)]
struct EnemyBody {
    velocity: Vector,
}

/// Walk-and-turn behavior shared by every enemy kind.
struct EnemyCore {
    fsm: StateMachine<EnemyState, EnemyEvent, EnemyBody>,
    body: EnemyBody,
    color: Color,
    squash_ms: f32,
    stomp_pending: bool,
    removal: Option<TimerId>,
}

impl EnemyCore {
    fn new(color: Color, squash_ms: f32) -> Self {
        let mut fsm = StateMachine::new();
        fsm.add_transition(EnemyEvent::Stomp, EnemyState::Walk, EnemyState::Squashed)
            .add_transition_from_any(EnemyEvent::Hit, EnemyState::Dead)
            .add_on_enter(EnemyState::Squashed, |body: &mut EnemyBody| {
                body.velocity.x = 0.0;
            });
        Self {
            fsm,
            body: EnemyBody::default(),
            color,
            squash_ms,
            stomp_pending: false,
            removal: None,
        }
    }

    fn on_started(&mut self) {
        self.fsm.start(EnemyState::Walk, &mut self.body);
    }

    fn on_property_changed(&mut self, name: &str, value: &Property) {
        match name {
            PROP_SPEED => self.body.velocity.x = value.as_float(),
            PROP_STOMPED => self.stomp_pending = value.as_bool(),
            _ => {}
        }
    }

    fn update(&mut self, cx: &mut UpdateCx<'_>) {
        let Some(level) = cx.parent() else {
            return;
        };
        let node = cx.node;

        if mem::take(&mut self.stomp_pending)
            && self.fsm.dispatch_event(EnemyEvent::Stomp, &mut self.body)
        {
            let delay_ms = self.squash_ms;
            self.removal = Some(
                cx.timers
                    .set_timer(delay_ms, move |tree: &mut ObjectTree| tree.remove_later(node)),
            );
            info!(enemy = cx.this().name(), delay_ms, "enemy_squashed");
        }
        if self.fsm.is_in(EnemyState::Dead) {
            return;
        }

        let dt = cx.delta_ms;
        self.body.velocity.y = (self.body.velocity.y + GRAVITY * dt).min(MAX_FALL_SPEED);
        let bounds = cx.this().bounds();
        let Some((_, grid)) = cx.tree.find_child_object::<TileGrid>(level) else {
            return;
        };
        let world_bottom = grid.bounds().bottom();
        let resolved = grid.collision_response(bounds, self.body.velocity, dt);

        if resolved.tag.contains(CollisionTag::FLOOR) {
            self.body.velocity.y = 0.0;
        }
        if resolved.tag.intersects(CollisionTag::X_AXIS) {
            self.body.velocity.x = -self.body.velocity.x;
            debug!(enemy = cx.this().name(), vx = self.body.velocity.x, "enemy_turned");
        }
        cx.this_mut().set_position(resolved.position);

        if resolved.position.y > world_bottom {
            self.fsm.dispatch_event(EnemyEvent::Hit, &mut self.body);
            if let Some(timer) = self.removal.take() {
                cx.timers.clear_timer(timer);
            }
            info!(enemy = cx.this().name(), "enemy_fell_out");
            cx.remove_self_later();
        }
        cx.tree
            .set_property(node, PROP_VELOCITY_X, self.body.velocity.x);
    }

    fn draw(&self, node: &Node, target: &mut dyn RenderTarget) {
        let bounds = node.bounds();
        if self.fsm.is_in(EnemyState::Squashed) {
            let half = bounds.height() / 2.0;
            target.draw_rect(
                Rect::new(bounds.left(), bounds.top() + half, bounds.width(), half),
                SQUASHED,
            );
        } else {
            target.draw_rect(bounds, self.color);
        }
    }
}

/// Walks until stomped, then lies flat briefly before disappearing.
pub(crate) struct Goomba {
    core: EnemyCore,
}

engine::declare_type!(Goomba: Enemy);

impl Default for Goomba {
    fn default() -> Self {
        Self {
            core: EnemyCore::new(GOOMBA, GOOMBA_SQUASH_MS),
        }
    }
}

impl Goomba {
    pub(crate) fn state(&self) -> Option<EnemyState> {
        self.core.fsm.state()
    }
}

impl Object for Goomba {
    fn on_started(&mut self, _cx: &mut NodeCx<'_>) {
        self.core.on_started();
    }

    fn update(&mut self, cx: &mut UpdateCx<'_>) {
        self.core.update(cx);
    }

    fn draw(&self, node: &Node, target: &mut dyn RenderTarget) {
        self.core.draw(node, target);
    }

    fn on_property_changed(&mut self, name: &str, value: &Property) {
        self.core.on_property_changed(name, value);
    }
}

/// Like a goomba, but its shell stays on the ground longer.
pub(crate) struct Koopa {
    core: EnemyCore,
}

engine::declare_type!(Koopa: Enemy);

impl Default for Koopa {
    fn default() -> Self {
        Self {
            core: EnemyCore::new(KOOPA, KOOPA_SHELL_MS),
        }
    }
}

impl Koopa {
    pub(crate) fn state(&self) -> Option<EnemyState> {
        self.core.fsm.state()
    }
}

impl Object for Koopa {
    fn on_started(&mut self, _cx: &mut NodeCx<'_>) {
        self.core.on_started();
    }

    fn update(&mut self, cx: &mut UpdateCx<'_>) {
        self.core.update(cx);
    }

    fn draw(&self, node: &Node, target: &mut dyn RenderTarget) {
        self.core.draw(node, target);
    }

    fn on_property_changed(&mut self, name: &str, value: &Property) {
        self.core.on_property_changed(name, value);
    }
}

/// State of whichever enemy kind lives at `id`.
pub(crate) fn enemy_state(tree: &ObjectTree, id: NodeId) -> Option<EnemyState> {
    tree.object::<Goomba>(id)
        .and_then(Goomba::state)
        .or_else(|| tree.object::<Koopa>(id).and_then(Koopa::state))
}
