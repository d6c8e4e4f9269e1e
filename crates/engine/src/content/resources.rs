use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::manifest::AssetManifest;
use super::resource_keys::{validate_resource_key, ResourceKeyError};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("invalid {kind} name '{name}': {source}")]
    InvalidName {
        kind: &'static str,
        name: String,
        #[source]
        source: ResourceKeyError,
    },
    #[error("failed to read {kind} '{name}' from {path}: {source}")]
    Read {
        kind: &'static str,
        name: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode texture '{name}' from {path}: {source}")]
    Decode {
        name: String,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl ResourceError {
    pub fn name(&self) -> &str {
        match self {
            ResourceError::InvalidName { name, .. }
            | ResourceError::Read { name, .. }
            | ResourceError::Decode { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundBuffer {
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontData {
    pub bytes: Vec<u8>,
}

/// Name-keyed owning map. Filled once at startup, read-only afterwards.
#[derive(Debug)]
pub struct ResourceHolder<R> {
    kind: &'static str,
    items: HashMap<String, R>,
}

impl<R> ResourceHolder<R> {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            items: HashMap::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Returns the previous resource stored under `name`, if any.
    pub fn insert(&mut self, name: impl Into<String>, resource: R) -> Option<R> {
        self.items.insert(name.into(), resource)
    }

    /// Panics if `name` was never loaded.
    pub fn get(&self, name: &str) -> &R {
        self.items
            .get(name)
            .unwrap_or_else(|| panic!("{} '{name}' is not loaded", self.kind))
    }

    pub fn try_get(&self, name: &str) -> Option<&R> {
        self.items.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }
}

#[derive(Debug)]
pub struct Resources {
    textures: ResourceHolder<Texture>,
    sounds: ResourceHolder<SoundBuffer>,
    fonts: ResourceHolder<FontData>,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            textures: ResourceHolder::new("texture"),
            sounds: ResourceHolder::new("sound"),
            fonts: ResourceHolder::new("font"),
        }
    }
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn textures(&self) -> &ResourceHolder<Texture> {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut ResourceHolder<Texture> {
        &mut self.textures
    }

    pub fn sounds(&self) -> &ResourceHolder<SoundBuffer> {
        &self.sounds
    }

    pub fn sounds_mut(&mut self) -> &mut ResourceHolder<SoundBuffer> {
        &mut self.sounds
    }

    pub fn fonts(&self) -> &ResourceHolder<FontData> {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut ResourceHolder<FontData> {
        &mut self.fonts
    }

    /// Loads every manifest entry relative to `root`. A failing entry is
    /// logged and reported, and loading continues with the next one.
    pub fn load_manifest(&mut self, root: &Path, manifest: &AssetManifest) -> Vec<ResourceError> {
        let mut errors = Vec::new();

        for (name, relative) in &manifest.textures {
            let loaded = load_texture(name, &root.join(relative));
            store(&mut self.textures, name, loaded, &mut errors);
        }
        for (name, relative) in &manifest.sounds {
            let loaded = read_bytes("sound", name, &root.join(relative))
                .map(|bytes| SoundBuffer { bytes });
            store(&mut self.sounds, name, loaded, &mut errors);
        }
        for (name, relative) in &manifest.fonts {
            let loaded = read_bytes("font", name, &root.join(relative))
                .map(|bytes| FontData { bytes });
            store(&mut self.fonts, name, loaded, &mut errors);
        }

        info!(
            root = %root.display(),
            requested = manifest.len(),
            failed = errors.len(),
            "resources_loaded"
        );
        errors
    }
}

fn store<R>(
    holder: &mut ResourceHolder<R>,
    name: &str,
    loaded: Result<R, ResourceError>,
    errors: &mut Vec<ResourceError>,
) {
    match loaded {
        Ok(resource) => {
            debug!(kind = holder.kind(), name, "resource_loaded");
            holder.insert(name, resource);
        }
        Err(error) => {
            warn!(kind = holder.kind(), name, error = %error, "resource_load_failed");
            errors.push(error);
        }
    }
}

fn check_name(kind: &'static str, name: &str) -> Result<(), ResourceError> {
    validate_resource_key(name).map_err(|source| ResourceError::InvalidName {
        kind,
        name: name.to_string(),
        source,
    })
}

fn load_texture(name: &str, path: &Path) -> Result<Texture, ResourceError> {
    check_name("texture", name)?;
    let reader = ImageReader::open(path).map_err(|source| ResourceError::Read {
        kind: "texture",
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| ResourceError::Decode {
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    let image = decoded.to_rgba8();
    Ok(Texture {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn read_bytes(kind: &'static str, name: &str, path: &Path) -> Result<Vec<u8>, ResourceError> {
    check_name(kind, name)?;
    fs::read(path).map_err(|source| ResourceError::Read {
        kind,
        name: name.to_string(),
        path: path.to_path_buf(),
        source,
    })
}
