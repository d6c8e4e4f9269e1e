use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Named resource files, relative to an asset root.
///
/// ```json
/// { "textures": { "tiles/brick": "tiles/brick.png" }, "sounds": {}, "fonts": {} }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    pub textures: BTreeMap<String, PathBuf>,
    pub sounds: BTreeMap<String, PathBuf>,
    pub fonts: BTreeMap<String, PathBuf>,
}

impl AssetManifest {
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty() && self.sounds.is_empty() && self.fonts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.textures.len() + self.sounds.len() + self.fonts.len()
    }
}
