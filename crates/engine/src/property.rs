use std::fmt;

use serde::{Deserialize, Serialize};

/// Loosely typed configuration value attached to scene nodes.
///
/// Reading an unset property yields [`Property::Invalid`]. Reading a set
/// property as the wrong type is a content bug and panics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Property {
    #[default]
    Invalid,
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
}

impl Property {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Property::Invalid)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Property::Invalid => "invalid",
            Property::Bool(_) => "bool",
            Property::Int(_) => "int",
            Property::Float(_) => "float",
            Property::String(_) => "string",
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            Property::Bool(value) => *value,
            other => other.mismatch("bool"),
        }
    }

    pub fn as_int(&self) -> i32 {
        match self {
            Property::Int(value) => *value,
            other => other.mismatch("int"),
        }
    }

    pub fn as_float(&self) -> f32 {
        match self {
            Property::Float(value) => *value,
            other => other.mismatch("float"),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Property::String(value) => value,
            other => other.mismatch("string"),
        }
    }

    fn mismatch(&self, requested: &'static str) -> ! {
        panic!("property holds {} ({self}) but was read as {requested}", self.kind())
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Property::Invalid => f.write_str("<invalid>"),
            Property::Bool(value) => write!(f, "{value}"),
            Property::Int(value) => write!(f, "{value}"),
            Property::Float(value) => write!(f, "{value}"),
            Property::String(value) => write!(f, "{value:?}"),
        }
    }
}

impl From<bool> for Property {
    fn from(value: bool) -> Self {
        Property::Bool(value)
    }
}

impl From<i32> for Property {
    fn from(value: i32) -> Self {
        Property::Int(value)
    }
}

impl From<f32> for Property {
    fn from(value: f32) -> Self {
        Property::Float(value)
    }
}

impl From<&str> for Property {
    fn from(value: &str) -> Self {
        Property::String(value.to_string())
    }
}

impl From<String> for Property {
    fn from(value: String) -> Self {
        Property::String(value)
    }
}
