use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::app::{BUTTON_DOWN, BUTTON_LEFT, BUTTON_RIGHT, BUTTON_UP};
use engine::{AssetManifest, InputBindings, LoopConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::gameplay::{default_script, ScriptStep, BUTTON_JUMP};

pub(crate) const CONFIG_ENV_VAR: &str = "SCROLLER_CONFIG";

const JUMP_JOYSTICK_BUTTON: u32 = 0;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path} at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything a headless demo run needs. Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct DemoConfig {
    #[serde(rename = "loop")]
    pub(crate) loop_config: LoopConfig,
    pub(crate) bindings: InputBindings,
    pub(crate) asset_root: PathBuf,
    pub(crate) assets: AssetManifest,
    /// Simulation ticks to run before exiting.
    pub(crate) tick_budget: u64,
    /// Simulated wall-clock time between frames.
    pub(crate) frame_ms: u64,
    pub(crate) script: Vec<ScriptStep>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            loop_config: LoopConfig::default(),
            bindings: default_bindings(),
            asset_root: PathBuf::from("assets"),
            assets: AssetManifest::default(),
            tick_budget: 600,
            frame_ms: 16,
            script: default_script(),
        }
    }
}

pub(crate) fn default_bindings() -> InputBindings {
    let mut bindings = InputBindings::default()
        .with_button(BUTTON_LEFT, &["Left", "A"])
        .with_button(BUTTON_RIGHT, &["Right", "D"])
        .with_button(BUTTON_UP, &["Up", "W"])
        .with_button(BUTTON_DOWN, &["Down", "S"])
        .with_button(BUTTON_JUMP, &["Space", "Z"]);
    if let Some(jump) = bindings.buttons.get_mut(BUTTON_JUMP) {
        jump.joystick_buttons.push(JUMP_JOYSTICK_BUTTON);
    }
    bindings
}

/// Reads the config named by `SCROLLER_CONFIG`, or the defaults when the
/// variable is unset.
pub(crate) fn load_config_from_env() -> Result<DemoConfig, ConfigError> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) => load_config(Path::new(&path)),
        None => Ok(DemoConfig::default()),
    }
}

pub(crate) fn load_config(path: &Path) -> Result<DemoConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(path, &raw)
}

fn parse_config(path: &Path, raw: &str) -> Result<DemoConfig, ConfigError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        ConfigError::Parse {
            path: path.to_path_buf(),
            field,
            source: error.into_inner(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_keeps_every_default() {
        let config = parse_config(Path::new("demo.json"), "{}").expect("parse");
        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.bindings.buttons["jump"].joystick_buttons, vec![0]);
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let raw = r#"{
            "loop": { "target_tps": 30 },
            "tick_budget": 90,
            "bindings": { "jump": { "keys": ["K"] } },
            "assets": { "textures": { "mario": "mario.png" } }
        }"#;
        let config = parse_config(Path::new("demo.json"), raw).expect("parse");

        assert_eq!(config.loop_config.target_tps, 30);
        assert_eq!(config.loop_config.max_ticks_per_frame, 5);
        assert_eq!(config.tick_budget, 90);
        assert_eq!(config.bindings.buttons["jump"].keys, vec!["K".to_string()]);
        assert!(!config.bindings.buttons.contains_key("left"));
        assert_eq!(config.assets.len(), 1);
        assert_eq!(config.script, default_script());
    }

    #[test]
    fn parse_error_names_the_offending_field() {
        let raw = r#"{ "loop": { "target_tps": "fast" } }"#;
        let err = parse_config(Path::new("demo.json"), raw).expect_err("bad field");

        match &err {
            ConfigError::Parse { field, .. } => assert_eq!(field, "loop.target_tps"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("demo.json at loop.target_tps"));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_config(&dir.path().join("absent.json")).expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
