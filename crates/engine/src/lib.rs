pub mod app;
pub mod content;
pub mod fsm;
pub mod geometry;
pub mod physics;
pub mod property;
pub mod render;
pub mod rtti;
pub mod scene;
pub mod timer;

pub use app::{
    ButtonBinding, Engine, FixedStepClock, InputBindings, InputManager, InputSource,
    JoystickAxis, KeyboardState, LoopConfig, StepPlan,
};
pub use content::{
    validate_resource_key, AssetManifest, FontData, ResourceError, ResourceHolder,
    ResourceKeyError, Resources, SoundBuffer, Texture,
};
pub use fsm::{StateMachine, StateMatch};
pub use geometry::{Rect, Vector};
pub use physics::{
    dynamic_collision_response, CollisionTag, Matrix, Resolution, StaticCollider, Tile,
    TileCollision, TileGrid, TileGridError, TileSlot,
};
pub use property::Property;
pub use render::{Color, RenderTarget};
pub use rtti::{DynTyped, TypeInfo, TypeTag, Typed};
pub use scene::{Group, Node, NodeCx, NodeId, Object, ObjectTree, TreeCommand, UpdateCx};
pub use timer::{TimerId, TimerManager};
