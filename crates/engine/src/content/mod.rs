mod manifest;
mod resource_keys;
mod resources;

pub use manifest::AssetManifest;
pub use resource_keys::{validate_resource_key, ResourceKeyError};
pub use resources::{FontData, ResourceError, ResourceHolder, Resources, SoundBuffer, Texture};
