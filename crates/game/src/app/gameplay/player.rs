use engine::{
    dynamic_collision_response, CollisionTag, Node, NodeCx, Object, Property, RenderTarget,
    StateMachine, StaticCollider, TileGrid, UpdateCx, Vector,
};
use tracing::{info, warn};

use super::canvas::PLAYER;
use super::enemies::Enemy;
use super::{
    BOUNCE_SPEED, BUTTON_JUMP, GRAVITY, JUMP_SPEED, MAX_FALL_SPEED, PROP_STOMPED,
    PROP_VELOCITY_X, WALK_SPEED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum PlayerState {
    Idle,
    Walk,
    Jump,
    Fall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayerEvent {
    Move,
    Stop,
    Jump,
    Fall,
    Land,
    Bounce,
}

/// What the state machine's actions are allowed to touch.
#[derive(Debug, Default)]
struct PlayerBody {
    velocity: Vector,
    animation: &'static str,
    stomps: u32,
    hits: u32,
}

pub(crate) struct Player {
    fsm: StateMachine<PlayerState, PlayerEvent, PlayerBody>,
    body: PlayerBody,
}

engine::declare_type!(Player);

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    pub(crate) fn new() -> Self {
        use PlayerEvent as E;
        use PlayerState as S;

        let mut fsm = StateMachine::new();
        fsm.add_transition(E::Move, S::Idle, S::Walk)
            .add_transition(E::Stop, S::Walk, S::Idle)
            .add_transition_with_action(E::Jump, S::Idle, S::Jump, launch)
            .add_transition_with_action(E::Jump, S::Walk, S::Jump, launch)
            .add_transition(E::Fall, S::Idle, S::Fall)
            .add_transition(E::Fall, S::Walk, S::Fall)
            .add_transition(E::Fall, S::Jump, S::Fall)
            .add_transition(E::Land, S::Jump, S::Idle)
            .add_transition(E::Land, S::Fall, S::Idle)
            .add_transition_from_any_with_action(E::Bounce, S::Jump, bounce)
            .attach_on_enter_map(
                set_animation,
                [
                    (S::Idle, "idle"),
                    (S::Walk, "walk"),
                    (S::Jump, "jump"),
                    (S::Fall, "fall"),
                ],
            );

        Self {
            fsm,
            body: PlayerBody::default(),
        }
    }

    pub(crate) fn state(&self) -> Option<PlayerState> {
        self.fsm.state()
    }

    pub(crate) fn animation(&self) -> &'static str {
        self.body.animation
    }

    pub(crate) fn velocity(&self) -> Vector {
        self.body.velocity
    }

    pub(crate) fn stomps(&self) -> u32 {
        self.body.stomps
    }

    pub(crate) fn hits(&self) -> u32 {
        self.body.hits
    }

    fn dispatch(&mut self, event: PlayerEvent) -> bool {
        self.fsm.dispatch_event(event, &mut self.body)
    }
}

fn launch(body: &mut PlayerBody) {
    body.velocity.y = -JUMP_SPEED;
}

fn bounce(body: &mut PlayerBody) {
    body.velocity.y = -BOUNCE_SPEED;
    body.stomps += 1;
}

fn set_animation(body: &mut PlayerBody, animation: &'static str) {
    body.animation = animation;
}

impl Object for Player {
    fn on_started(&mut self, _cx: &mut NodeCx<'_>) {
        self.fsm.start(PlayerState::Idle, &mut self.body);
    }

    fn update(&mut self, cx: &mut UpdateCx<'_>) {
        let Some(level) = cx.parent() else {
            return;
        };
        let dt = cx.delta_ms;

        self.body.velocity.x = cx.input.get_xy_axis().x * WALK_SPEED;
        if cx.input.is_button_pressed(BUTTON_JUMP) {
            self.dispatch(PlayerEvent::Jump);
        }
        self.body.velocity.y = (self.body.velocity.y + GRAVITY * dt).min(MAX_FALL_SPEED);

        let bounds = cx.this().bounds();
        let Some((_, grid)) = cx.tree.find_child_object::<TileGrid>(level) else {
            warn!(node = ?cx.node, "player_without_level_grid");
            return;
        };
        let resolved = grid.collision_response(bounds, self.body.velocity, dt);
        let mut position = resolved.position;

        if resolved.tag.contains(CollisionTag::FLOOR) {
            self.body.velocity.y = 0.0;
            self.dispatch(PlayerEvent::Land);
            let stride = if self.body.velocity.x == 0.0 {
                PlayerEvent::Stop
            } else {
                PlayerEvent::Move
            };
            self.dispatch(stride);
        } else if resolved.tag.contains(CollisionTag::CEILING) {
            self.body.velocity.y = 0.0;
            self.dispatch(PlayerEvent::Fall);
        } else if self.body.velocity.y > 0.0 {
            self.dispatch(PlayerEvent::Fall);
        }

        for enemy in cx.tree.find_children_by_type::<Enemy>(level, false) {
            let node = &cx.tree[enemy];
            if node.property(PROP_STOMPED).is_valid() {
                continue;
            }
            let enemy_velocity = match node.property(PROP_VELOCITY_X) {
                Property::Float(vx) => Vector::new(*vx, 0.0),
                _ => Vector::ZERO,
            };
            let contact = dynamic_collision_response(
                bounds,
                self.body.velocity,
                node.bounds(),
                enemy_velocity,
                dt,
            );

            if contact.tag.contains(CollisionTag::FLOOR) {
                info!(enemy = node.name(), "enemy_stomped");
                position.y = contact.position.y;
                cx.tree.set_property(enemy, PROP_STOMPED, true);
                self.dispatch(PlayerEvent::Bounce);
            } else if contact.tag.intersects(CollisionTag::X_AXIS) {
                info!(enemy = node.name(), hits = self.body.hits + 1, "player_hit");
                position.x = contact.position.x;
                self.body.hits += 1;
            }
        }

        cx.this_mut().set_position(position);
    }

    fn draw(&self, node: &Node, target: &mut dyn RenderTarget) {
        target.draw_rect(node.bounds(), PLAYER);
    }
}
