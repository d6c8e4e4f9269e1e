use engine::KeyboardState;
use serde::{Deserialize, Serialize};

/// Holds `keys` down for ticks in `from_tick..until_tick`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ScriptStep {
    pub(crate) from_tick: u64,
    pub(crate) until_tick: u64,
    pub(crate) keys: Vec<String>,
}

impl ScriptStep {
    fn new(from_tick: u64, until_tick: u64, keys: &[&str]) -> Self {
        Self {
            from_tick,
            until_tick,
            keys: keys.iter().map(|key| key.to_string()).collect(),
        }
    }

    fn is_active(&self, tick: u64) -> bool {
        (self.from_tick..self.until_tick).contains(&tick)
    }
}

/// Walk right, hop onto the goomba, then run for the pit.
pub(crate) fn default_script() -> Vec<ScriptStep> {
    vec![
        ScriptStep::new(30, 70, &["Right"]),
        ScriptStep::new(45, 50, &["Space"]),
        ScriptStep::new(90, 200, &["Right"]),
        ScriptStep::new(150, 160, &["Space"]),
    ]
}

/// Replays a fixed key script in place of a real keyboard.
pub(crate) struct ScriptedInput {
    steps: Vec<ScriptStep>,
    keys: KeyboardState,
}

impl ScriptedInput {
    pub(crate) fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            keys: KeyboardState::new(),
        }
    }

    /// Key state for `tick`.
    pub(crate) fn advance(&mut self, tick: u64) -> &KeyboardState {
        self.keys.release_all();
        for step in self.steps.iter().filter(|step| step.is_active(tick)) {
            for key in &step.keys {
                self.keys.press(key);
            }
        }
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use engine::InputSource;

    use super::*;

    #[test]
    fn steps_hold_keys_for_a_half_open_tick_range() {
        let mut input = ScriptedInput::new(vec![
            ScriptStep::new(2, 4, &["Right"]),
            ScriptStep::new(3, 5, &["Space"]),
        ]);

        let held = |input: &mut ScriptedInput, tick| {
            let keys = input.advance(tick);
            (keys.is_key_down("Right"), keys.is_key_down("Space"))
        };
        assert_eq!(held(&mut input, 1), (false, false));
        assert_eq!(held(&mut input, 2), (true, false));
        assert_eq!(held(&mut input, 3), (true, true));
        assert_eq!(held(&mut input, 4), (false, true));
        assert_eq!(held(&mut input, 5), (false, false));
    }

    #[test]
    fn steps_deserialize_from_config_json() {
        let steps: Vec<ScriptStep> = serde_json::from_str(
            r#"[{ "from_tick": 0, "until_tick": 10, "keys": ["Left", "Space"] }]"#,
        )
        .expect("script json");
        assert_eq!(steps, vec![ScriptStep::new(0, 10, &["Left", "Space"])]);
    }
}
