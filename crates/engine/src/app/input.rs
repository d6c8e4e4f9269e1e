use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::Vector;

/// Joystick readings smaller than this are treated as centered.
pub const JOYSTICK_DEAD_ZONE: f32 = 0.3;

pub const BUTTON_LEFT: &str = "left";
pub const BUTTON_RIGHT: &str = "right";
pub const BUTTON_UP: &str = "up";
pub const BUTTON_DOWN: &str = "down";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoystickAxis {
    X,
    Y,
}

/// Raw device state, polled once per tick by [`InputManager::update`].
pub trait InputSource {
    fn is_key_down(&self, key: &str) -> bool;

    fn is_joystick_button_down(&self, _button: u32) -> bool {
        false
    }

    /// Axis position in `-1.0..=1.0`.
    fn joystick_axis(&self, _axis: JoystickAxis) -> f32 {
        0.0
    }
}

/// In-memory device state. Backs headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    keys_down: HashSet<String>,
    joystick_buttons_down: HashSet<u32>,
    axis_x: f32,
    axis_y: f32,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: &str) {
        self.keys_down.insert(key.to_string());
    }

    pub fn release(&mut self, key: &str) {
        self.keys_down.remove(key);
    }

    pub fn release_all(&mut self) {
        self.keys_down.clear();
        self.joystick_buttons_down.clear();
    }

    pub fn press_joystick_button(&mut self, button: u32) {
        self.joystick_buttons_down.insert(button);
    }

    pub fn release_joystick_button(&mut self, button: u32) {
        self.joystick_buttons_down.remove(&button);
    }

    pub fn set_axis(&mut self, axis: JoystickAxis, value: f32) {
        let value = value.clamp(-1.0, 1.0);
        match axis {
            JoystickAxis::X => self.axis_x = value,
            JoystickAxis::Y => self.axis_y = value,
        }
    }
}

impl InputSource for KeyboardState {
    fn is_key_down(&self, key: &str) -> bool {
        self.keys_down.contains(key)
    }

    fn is_joystick_button_down(&self, button: u32) -> bool {
        self.joystick_buttons_down.contains(&button)
    }

    fn joystick_axis(&self, axis: JoystickAxis) -> f32 {
        match axis {
            JoystickAxis::X => self.axis_x,
            JoystickAxis::Y => self.axis_y,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonBinding {
    pub keys: Vec<String>,
    pub joystick_buttons: Vec<u32>,
}

/// Logical button name to physical inputs, usually read from config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputBindings {
    pub buttons: BTreeMap<String, ButtonBinding>,
}

impl InputBindings {
    pub fn with_button(mut self, name: &str, keys: &[&str]) -> Self {
        self.buttons.entry(name.to_string()).or_default().keys =
            keys.iter().map(|key| key.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, Default)]
struct ButtonState {
    keys: Vec<String>,
    joystick_buttons: Vec<u32>,
    is_down: bool,
    was_down: bool,
}

/// Logical buttons with edge detection.
///
/// `update` samples every bound button once per tick, so "pressed" and
/// "released" hold for exactly the tick on which the edge was observed.
#[derive(Debug, Clone, Default)]
pub struct InputManager {
    buttons: HashMap<String, ButtonState>,
    axis_x: f32,
    axis_y: f32,
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to the given keys, replacing any earlier key list.
    pub fn setup_button(&mut self, name: &str, keys: &[&str]) {
        let button = self.buttons.entry(name.to_string()).or_default();
        button.keys = keys.iter().map(|key| key.to_string()).collect();
        debug!(button = name, keys = ?button.keys, "button_bound");
    }

    pub fn setup_joystick_button(&mut self, name: &str, joystick_button: u32) {
        let button = self.buttons.entry(name.to_string()).or_default();
        if !button.joystick_buttons.contains(&joystick_button) {
            button.joystick_buttons.push(joystick_button);
        }
        debug!(button = name, joystick_button, "joystick_button_bound");
    }

    pub fn apply_bindings(&mut self, bindings: &InputBindings) {
        for (name, binding) in &bindings.buttons {
            let keys: Vec<&str> = binding.keys.iter().map(String::as_str).collect();
            self.setup_button(name, &keys);
            for joystick_button in &binding.joystick_buttons {
                self.setup_joystick_button(name, *joystick_button);
            }
        }
    }

    pub fn update(&mut self, source: &dyn InputSource) {
        for button in self.buttons.values_mut() {
            button.was_down = button.is_down;
            button.is_down = button.keys.iter().any(|key| source.is_key_down(key))
                || button
                    .joystick_buttons
                    .iter()
                    .any(|joystick_button| source.is_joystick_button_down(*joystick_button));
        }
        self.axis_x = apply_dead_zone(source.joystick_axis(JoystickAxis::X));
        self.axis_y = apply_dead_zone(source.joystick_axis(JoystickAxis::Y));
    }

    /// Went down on the latest update.
    pub fn is_button_pressed(&self, name: &str) -> bool {
        self.buttons
            .get(name)
            .is_some_and(|button| button.is_down && !button.was_down)
    }

    pub fn is_button_down(&self, name: &str) -> bool {
        self.buttons.get(name).is_some_and(|button| button.is_down)
    }

    /// Went up on the latest update.
    pub fn is_button_up(&self, name: &str) -> bool {
        self.buttons
            .get(name)
            .is_some_and(|button| !button.is_down && button.was_down)
    }

    /// Direction from the `left`/`right`/`up`/`down` buttons, falling back
    /// to the joystick on an axis where no button is held. Y grows downward.
    pub fn get_xy_axis(&self) -> Vector {
        let mut x = self.button_axis(BUTTON_LEFT, BUTTON_RIGHT);
        let mut y = self.button_axis(BUTTON_UP, BUTTON_DOWN);
        if x == 0.0 {
            x = self.axis_x;
        }
        if y == 0.0 {
            y = self.axis_y;
        }
        Vector::new(x, y)
    }

    fn button_axis(&self, negative: &str, positive: &str) -> f32 {
        let mut value = 0.0;
        if self.is_button_down(negative) {
            value -= 1.0;
        }
        if self.is_button_down(positive) {
            value += 1.0;
        }
        value
    }
}

fn apply_dead_zone(value: f32) -> f32 {
    if value.abs() < JOYSTICK_DEAD_ZONE {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}
