use crate::app::InputManager;
use crate::property::Property;
use crate::render::RenderTarget;
use crate::rtti::{DynTyped, Typed};
use crate::timer::TimerManager;

use super::tree::{Node, NodeId, ObjectTree};

/// Behavior half of a scene node. The tree owns the common node data
/// (name, properties, position, children); implementors add what is
/// specific to their type and react to the hooks below.
///
/// While a hook runs, the object is detached from its node, so the hook can
/// borrow the whole tree mutably. Typed lookups still see the node because
/// the tree caches each node's type tag.
pub trait Object: DynTyped {
    fn on_parent_assigned(&mut self, _cx: &mut NodeCx<'_>) {}

    /// Runs once, after every child has been started.
    fn on_started(&mut self, _cx: &mut NodeCx<'_>) {}

    fn update(&mut self, _cx: &mut UpdateCx<'_>) {}

    fn draw(&self, _node: &Node, _target: &mut dyn RenderTarget) {}

    /// Runs after the node applied the well-known properties itself.
    fn on_property_changed(&mut self, _name: &str, _value: &Property) {}
}

impl dyn Object {
    /// Exact type match.
    pub fn is_instance_of<T: Typed>(&self) -> bool {
        std::ptr::eq(self.dyn_type_info(), T::type_info())
    }

    /// True when this object's type is a strict ancestor of `T`.
    pub fn is_base_class_of<T: Typed>(&self) -> bool {
        T::type_info().derives_from(self.dyn_type_info())
    }

    /// Exact match, or `T` is an ancestor of this object's type.
    pub fn is_type_of<T: Typed>(&self) -> bool {
        self.dyn_type_info().is_a(T::type_info())
    }

    pub fn cast<T: Object + Typed>(&self) -> Option<&T> {
        if !self.is_type_of::<T>() {
            return None;
        }
        self.as_any().downcast_ref::<T>()
    }

    pub fn cast_mut<T: Object + Typed>(&mut self) -> Option<&mut T> {
        if !self.is_type_of::<T>() {
            return None;
        }
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Reinterprets the object as `T` without checking.
    ///
    /// # Safety
    /// The object's concrete type must be exactly `T`.
    pub unsafe fn cast_unchecked<T: Object + Typed>(&self) -> &T {
        debug_assert!(
            self.is_instance_of::<T>(),
            "cast_unchecked to {} on {}",
            T::type_info().name(),
            self.dyn_type_info().name()
        );
        // SAFETY: the caller guarantees the concrete type is `T`, so the data
        // pointer of this trait object points at a valid `T`.
        &*(self as *const dyn Object as *const T)
    }
}

/// Plain grouping node with no behavior of its own. Also the root type of
/// the scene hierarchy.
#[derive(Debug, Default)]
pub struct Group;

crate::declare_type!(Group);

impl Object for Group {}

pub struct NodeCx<'a> {
    pub tree: &'a mut ObjectTree,
    pub node: NodeId,
}

impl NodeCx<'_> {
    pub fn this(&self) -> &Node {
        &self.tree[self.node]
    }

    pub fn this_mut(&mut self) -> &mut Node {
        &mut self.tree[self.node]
    }
}

pub struct UpdateCx<'a> {
    pub tree: &'a mut ObjectTree,
    pub timers: &'a mut TimerManager<ObjectTree>,
    pub input: &'a InputManager,
    pub node: NodeId,
    pub delta_ms: f32,
}

impl UpdateCx<'_> {
    pub fn this(&self) -> &Node {
        &self.tree[self.node]
    }

    pub fn this_mut(&mut self) -> &mut Node {
        &mut self.tree[self.node]
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.this().parent()
    }

    pub fn remove_self_later(&mut self) {
        self.tree.remove_later(self.node);
    }
}
