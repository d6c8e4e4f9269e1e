//! Type tags for scene objects.
//!
//! Every participating type owns one `static` [`TypeInfo`]. The address of
//! that static is the type's identity, and its `parent` link describes the
//! declared base chain, so "is-a" checks are a pointer compare plus a short
//! walk up the chain. Types opt in with [`declare_type!`](crate::declare_type).

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

pub struct TypeInfo {
    name: &'static str,
    parent: Option<fn() -> &'static TypeInfo>,
}

impl TypeInfo {
    pub const fn new(name: &'static str, parent: Option<fn() -> &'static TypeInfo>) -> Self {
        Self { name, parent }
    }

    pub fn of<T: Typed>() -> &'static TypeInfo {
        T::type_info()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tag(&'static self) -> TypeTag {
        TypeTag(self)
    }

    pub fn parent(&self) -> Option<&'static TypeInfo> {
        self.parent.map(|parent| parent())
    }

    /// True when `ancestor` appears strictly above `self` in the base chain.
    pub fn derives_from(&self, ancestor: &'static TypeInfo) -> bool {
        let mut current = self.parent();
        while let Some(info) = current {
            if ptr::eq(info, ancestor) {
                return true;
            }
            current = info.parent();
        }
        false
    }

    /// Exact match or derived.
    pub fn is_a(&'static self, other: &'static TypeInfo) -> bool {
        ptr::eq(self, other) || self.derives_from(other)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("parent", &self.parent().map(TypeInfo::name))
            .finish()
    }
}

/// Copyable identity token comparing by the address of the type's static.
#[derive(Clone, Copy)]
pub struct TypeTag(&'static TypeInfo);

impl TypeTag {
    pub fn of<T: Typed>() -> TypeTag {
        TypeTag(T::type_info())
    }

    pub fn info(self) -> &'static TypeInfo {
        self.0
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.0, other.0)
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ptr::hash(self.0, state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0.name)
    }
}

/// Static side of the type system. Implemented by [`declare_type!`](crate::declare_type).
pub trait Typed: Any {
    fn type_info() -> &'static TypeInfo;
}

/// Dynamic side, usable through trait objects.
pub trait DynTyped: Any {
    fn dyn_type_info(&self) -> &'static TypeInfo;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Typed> DynTyped for T {
    fn dyn_type_info(&self) -> &'static TypeInfo {
        T::type_info()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Declares a type's identity and, optionally, its base type.
///
/// ```ignore
/// pub enum Enemy {}
/// declare_type!(Enemy);
/// declare_type!(Goomba: Enemy);
/// ```
#[macro_export]
macro_rules! declare_type {
    ($ty:ty : $parent:ty) => {
        impl $crate::rtti::Typed for $ty {
            fn type_info() -> &'static $crate::rtti::TypeInfo {
                static INFO: $crate::rtti::TypeInfo = $crate::rtti::TypeInfo::new(
                    stringify!($ty),
                    Some(
                        <$parent as $crate::rtti::Typed>::type_info
                            as fn() -> &'static $crate::rtti::TypeInfo,
                    ),
                );
                &INFO
            }
        }
    };
    ($ty:ty) => {
        impl $crate::rtti::Typed for $ty {
            fn type_info() -> &'static $crate::rtti::TypeInfo {
                static INFO: $crate::rtti::TypeInfo =
                    $crate::rtti::TypeInfo::new(stringify!($ty), None);
                &INFO
            }
        }
    };
}
