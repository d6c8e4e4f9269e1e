mod engine;
mod input;
mod loop_runner;

pub use engine::Engine;
pub use input::{
    ButtonBinding, InputBindings, InputManager, InputSource, JoystickAxis, KeyboardState,
    BUTTON_DOWN, BUTTON_LEFT, BUTTON_RIGHT, BUTTON_UP, JOYSTICK_DEAD_ZONE,
};
pub use loop_runner::{FixedStepClock, LoopConfig, StepPlan};
