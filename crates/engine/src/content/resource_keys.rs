use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceKeyError {
    #[error("resource name must not be empty")]
    Empty,
    #[error("resource name must not start with '/'")]
    LeadingSlash,
    #[error("resource name must not contain '\\\\'")]
    Backslash,
    #[error("resource name must not contain '..'")]
    ParentTraversal,
    #[error("resource name contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Resource names are lowercase paths like `tiles/brick` or `sfx/jump-small`.
pub fn validate_resource_key(name: &str) -> Result<(), ResourceKeyError> {
    if name.is_empty() {
        return Err(ResourceKeyError::Empty);
    }
    if name.starts_with('/') {
        return Err(ResourceKeyError::LeadingSlash);
    }
    if name.contains('\\') {
        return Err(ResourceKeyError::Backslash);
    }
    if name.contains("..") {
        return Err(ResourceKeyError::ParentTraversal);
    }
    match name
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        Some(character) => Err(ResourceKeyError::InvalidCharacter { character }),
        None => Ok(()),
    }
}
