use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use tracing::{debug, warn};

use crate::app::InputManager;
use crate::geometry::{Rect, Vector};
use crate::property::Property;
use crate::render::RenderTarget;
use crate::rtti::{DynTyped, TypeInfo, Typed};
use crate::timer::TimerManager;

use super::object::{Group, NodeCx, Object, UpdateCx};

static INVALID_PROPERTY: Property = Property::Invalid;

/// Generational handle into the tree's arena. A handle to a destroyed node
/// never resolves again, even after its slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Structural change waiting for the next sync point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeCommand {
    Remove(NodeId),
    /// Moves to the end of the parent's children, drawn last.
    MoveToFront(NodeId),
    /// Moves to the start of the parent's children, drawn first.
    MoveToBack(NodeId),
    /// Moves to the slot immediately before `sibling`.
    MoveUnder { node: NodeId, sibling: NodeId },
}

pub struct Node {
    name: String,
    properties: HashMap<String, Property>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    enabled: bool,
    visible: bool,
    started: bool,
    position: Vector,
    size: Vector,
    type_info: &'static TypeInfo,
    object: Option<Box<dyn Object>>,
}

impl Node {
    fn new(object: Box<dyn Object>) -> Self {
        Self {
            name: String::new(),
            properties: HashMap::new(),
            parent: None,
            children: Vec::new(),
            enabled: true,
            visible: true,
            started: false,
            position: Vector::ZERO,
            size: Vector::ZERO,
            type_info: object.dyn_type_info(),
            object: Some(object),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns [`Property::Invalid`] for names that were never set.
    pub fn property(&self, name: &str) -> &Property {
        self.properties.get(name).unwrap_or(&INVALID_PROPERTY)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn position(&self) -> Vector {
        self.position
    }

    pub fn set_position(&mut self, position: Vector) {
        self.position = position;
    }

    pub fn move_by(&mut self, offset: Vector) {
        self.position += offset;
    }

    pub fn size(&self) -> Vector {
        self.size
    }

    pub fn set_size(&mut self, size: Vector) {
        self.size = size;
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_position_size(self.position, self.size)
    }

    pub fn set_bounds(&mut self, bounds: Rect) {
        self.position = bounds.left_top();
        self.size = bounds.size();
    }

    pub fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    pub fn is_type_of<T: Typed>(&self) -> bool {
        self.type_info.is_a(T::type_info())
    }

    /// `None` while the object is detached for one of its own hooks.
    pub fn object(&self) -> Option<&dyn Object> {
        self.object.as_deref()
    }

    pub fn object_as<T: Object + Typed>(&self) -> Option<&T> {
        self.object.as_deref()?.cast::<T>()
    }

    pub fn object_as_mut<T: Object + Typed>(&mut self) -> Option<&mut T> {
        self.object.as_deref_mut()?.cast_mut::<T>()
    }

    fn apply_well_known_property(&mut self, name: &str, value: &Property) {
        match name {
            "name" => self.name = value.as_str().to_string(),
            "x" => self.position.x = coordinate(value),
            "y" => self.position.y = coordinate(value),
            "width" => self.size.x = coordinate(value),
            "height" => self.size.y = coordinate(value),
            "enabled" => self.enabled = value.as_bool(),
            "visible" => self.visible = value.as_bool(),
            _ => {}
        }
    }
}

fn coordinate(value: &Property) -> f32 {
    match value {
        Property::Int(raw) => *raw as f32,
        other => other.as_float(),
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Owning scene graph.
///
/// Nodes live in an arena and are addressed by [`NodeId`]. Attaching a child
/// takes effect immediately, while removal and reordering are queued and
/// only applied by [`ObjectTree::apply_pending`], once per tick before any
/// update. Children only ever grow during a tick, so an update pass walks
/// the children that existed when it reached their parent.
pub struct ObjectTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    pending: Vec<TreeCommand>,
    /// Property changes made while the target's object was detached for one
    /// of its own hooks. Delivered when the object is put back.
    detached_changes: Vec<(NodeId, String, Property)>,
}

impl Default for ObjectTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTree {
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId {
                index: 0,
                generation: 0,
            },
            pending: Vec::new(),
            detached_changes: Vec::new(),
        };
        let root = tree.create(Group);
        tree[root].set_name("root");
        tree.root = root;
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Builds a standalone node. It joins the scene once passed to
    /// [`add_child`](Self::add_child).
    pub fn create(&mut self, object: impl Object) -> NodeId {
        self.create_boxed(Box::new(object))
    }

    pub fn create_boxed(&mut self, object: Box<dyn Object>) -> NodeId {
        let node = Node::new(object);
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    pub fn spawn(&mut self, parent: NodeId, object: impl Object) -> NodeId {
        let child = self.create(object);
        self.add_child(parent, child);
        child
    }

    /// Appends `child` to `parent`'s children. If `parent` has already been
    /// started, `child` and its subtree are started right away.
    ///
    /// Panics if either node is dead, if `child` already has a parent, or if
    /// the link would create a cycle.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        assert!(self.contains(parent), "add_child: parent {parent:?} is not alive");
        assert!(
            !self.is_ancestor_or_self(child, parent),
            "add_child: attaching {child:?} under {parent:?} would create a cycle"
        );
        {
            let child_node = &mut self[child];
            assert!(
                child_node.parent.is_none(),
                "add_child: {child:?} ({}) already has a parent",
                child_node.name
            );
            child_node.parent = Some(parent);
        }
        let parent_node = &mut self[parent];
        parent_node.children.push(child);
        let parent_started = parent_node.started;

        self.with_object(child, |object, tree| {
            object.on_parent_assigned(&mut NodeCx { tree, node: child })
        });
        if parent_started {
            self.start_node(child);
        }
    }

    /// Destroys a node that was never attached, along with its subtree.
    pub fn discard(&mut self, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        assert!(
            node.parent.is_none() && id != self.root,
            "discard: {id:?} is attached; use remove_later"
        );
        self.destroy_subtree(id);
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn object<T: Object + Typed>(&self, id: NodeId) -> Option<&T> {
        self.node(id)?.object_as::<T>()
    }

    pub fn object_mut<T: Object + Typed>(&mut self, id: NodeId) -> Option<&mut T> {
        self.node_mut(id)?.object_as_mut::<T>()
    }

    pub fn find_child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)?
            .children
            .iter()
            .copied()
            .find(|child| self.node(*child).is_some_and(|node| node.name == name))
    }

    /// First direct child whose type is `T` or derives from it.
    pub fn find_child_by_type<T: Typed>(&self, parent: NodeId) -> Option<NodeId> {
        let target = T::type_info();
        self.node(parent)?
            .children
            .iter()
            .copied()
            .find(|child| self.node_is_a(*child, target))
    }

    /// All matching children in sequence order. With `recursive`, each
    /// level lists its direct matches before descending, so for direct
    /// matches `[A, B]` and a match `C` under `A` the result is `[A, B, C]`.
    pub fn find_children_by_type<T: Typed>(&self, parent: NodeId, recursive: bool) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_children_by_type(parent, T::type_info(), recursive, &mut found);
        found
    }

    /// Convenience for the common "find my sibling of type T" lookup.
    pub fn find_child_object<T: Object + Typed>(&self, parent: NodeId) -> Option<(NodeId, &T)> {
        let target = T::type_info();
        self.node(parent)?.children.iter().find_map(|child| {
            if !self.node_is_a(*child, target) {
                return None;
            }
            self.object::<T>(*child).map(|object| (*child, object))
        })
    }

    /// Stores the property, applies well-known names (`name`, `x`, `y`,
    /// `width`, `height`, `enabled`, `visible`) and notifies the object. An
    /// object that is busy in one of its own hooks is notified when the hook
    /// returns.
    pub fn set_property(&mut self, id: NodeId, name: &str, value: impl Into<Property>) {
        let value = value.into();
        let Some(node) = self.node_mut(id) else {
            warn!(node = ?id, property = name, "set_property_on_dead_node");
            return;
        };
        node.apply_well_known_property(name, &value);
        let detached = match node.object.as_mut() {
            Some(object) => {
                object.on_property_changed(name, &value);
                false
            }
            None => true,
        };
        node.properties.insert(name.to_string(), value.clone());
        if detached {
            self.detached_changes.push((id, name.to_string(), value));
        }
    }

    pub fn remove_later(&mut self, id: NodeId) {
        if self.require_parent(id, "remove_later") {
            self.pending.push(TreeCommand::Remove(id));
        }
    }

    pub fn move_to_front(&mut self, id: NodeId) {
        if self.require_parent(id, "move_to_front") {
            self.pending.push(TreeCommand::MoveToFront(id));
        }
    }

    pub fn move_to_back(&mut self, id: NodeId) {
        if self.require_parent(id, "move_to_back") {
            self.pending.push(TreeCommand::MoveToBack(id));
        }
    }

    pub fn move_under(&mut self, id: NodeId, sibling: NodeId) {
        if self.require_parent(id, "move_under") {
            self.pending
                .push(TreeCommand::MoveUnder { node: id, sibling });
        }
    }

    pub fn pending(&self) -> &[TreeCommand] {
        &self.pending
    }

    /// Sync point: applies every queued structural change in the order it
    /// was requested. Commands whose node has already gone are skipped, which
    /// makes repeated `remove_later` calls harmless.
    pub fn apply_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let commands = std::mem::take(&mut self.pending);
        for command in commands {
            self.apply_command(command);
        }
    }

    pub fn is_started(&self) -> bool {
        self[self.root].started
    }

    pub fn start(&mut self) {
        self.start_node(self.root);
    }

    pub fn update(
        &mut self,
        delta_ms: f32,
        timers: &mut TimerManager<ObjectTree>,
        input: &InputManager,
    ) {
        self.update_node(self.root, delta_ms, timers, input);
    }

    pub fn draw(&self, target: &mut dyn RenderTarget) {
        self.draw_node(self.root, target);
    }

    fn apply_command(&mut self, command: TreeCommand) {
        match command {
            TreeCommand::Remove(id) => {
                let Some(node) = self.node(id) else {
                    debug!(node = ?id, "remove_skipped_already_gone");
                    return;
                };
                if let Some(parent) = node.parent {
                    if let Some(parent_node) = self.node_mut(parent) {
                        parent_node.children.retain(|child| *child != id);
                    }
                }
                self.destroy_subtree(id);
                debug!(node = ?id, "node_removed");
            }
            TreeCommand::MoveToFront(id) => {
                self.reorder(id, |siblings| Some(siblings.len()));
            }
            TreeCommand::MoveToBack(id) => {
                self.reorder(id, |_| Some(0));
            }
            TreeCommand::MoveUnder { node, sibling } => {
                self.reorder(node, |siblings| {
                    siblings.iter().position(|candidate| *candidate == sibling)
                });
            }
        }
    }

    /// Takes `id` out of its parent's children and reinserts it at the index
    /// chosen by `target`, evaluated on the list without `id`.
    fn reorder(&mut self, id: NodeId, target: impl FnOnce(&[NodeId]) -> Option<usize>) {
        let Some(parent) = self.node(id).and_then(Node::parent) else {
            debug!(node = ?id, "reorder_skipped_node_detached");
            return;
        };
        let Some(parent_node) = self.node_mut(parent) else {
            return;
        };
        let siblings = &mut parent_node.children;
        let Some(current) = siblings.iter().position(|child| *child == id) else {
            return;
        };
        siblings.remove(current);
        match target(siblings.as_slice()) {
            Some(index) => {
                siblings.insert(index, id);
                debug!(node = ?id, index, "node_reordered");
            }
            None => {
                siblings.insert(current, id);
                warn!(node = ?id, "move_under_sibling_not_found");
            }
        }
    }

    fn require_parent(&self, id: NodeId, operation: &'static str) -> bool {
        match self.node(id) {
            Some(node) if node.parent.is_some() => true,
            Some(node) => {
                warn!(node = ?id, name = node.name.as_str(), operation, "structural_change_without_parent");
                false
            }
            None => {
                warn!(node = ?id, operation, "structural_change_on_dead_node");
                false
            }
        }
    }

    fn destroy_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(current.index as usize)
                .filter(|slot| slot.generation == current.generation)
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                stack.extend(node.children.iter().copied());
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
            }
        }
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.node(candidate).and_then(Node::parent);
        }
        false
    }

    fn node_is_a(&self, id: NodeId, target: &'static TypeInfo) -> bool {
        self.node(id).is_some_and(|node| node.type_info.is_a(target))
    }

    fn collect_children_by_type(
        &self,
        parent: NodeId,
        target: &'static TypeInfo,
        recursive: bool,
        found: &mut Vec<NodeId>,
    ) {
        let Some(node) = self.node(parent) else {
            return;
        };
        found.extend(
            node.children
                .iter()
                .copied()
                .filter(|child| self.node_is_a(*child, target)),
        );
        if recursive {
            for child in &node.children {
                self.collect_children_by_type(*child, target, recursive, found);
            }
        }
    }

    /// Detaches the object so `f` can use the tree freely, then puts it back.
    fn with_object<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut dyn Object, &mut ObjectTree) -> R,
    ) -> Option<R> {
        let mut object = self.node_mut(id)?.object.take()?;
        let result = f(object.as_mut(), self);
        if !self.detached_changes.is_empty() {
            let (own, others): (Vec<_>, Vec<_>) = std::mem::take(&mut self.detached_changes)
                .into_iter()
                .partition(|(target, _, _)| *target == id);
            self.detached_changes = others;
            for (_, name, value) in own {
                debug!(node = ?id, property = %name, "property_change_delivered_after_hook");
                object.on_property_changed(&name, &value);
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.object = Some(object);
        }
        Some(result)
    }

    fn start_node(&mut self, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        if node.started {
            return;
        }
        let children = node.children.clone();
        for child in children {
            self.start_node(child);
        }
        self[id].started = true;
        self.with_object(id, |object, tree| {
            object.on_started(&mut NodeCx { tree, node: id })
        });
    }

    fn update_node(
        &mut self,
        id: NodeId,
        delta_ms: f32,
        timers: &mut TimerManager<ObjectTree>,
        input: &InputManager,
    ) {
        let Some(node) = self.node(id) else {
            return;
        };
        if !node.enabled {
            return;
        }
        if !node.started {
            self.start_node(id);
        }

        let child_count = self.node(id).map_or(0, |node| node.children.len());
        for index in 0..child_count {
            let Some(child) = self
                .node(id)
                .and_then(|node| node.children.get(index).copied())
            else {
                break;
            };
            self.update_node(child, delta_ms, timers, input);
        }

        self.with_object(id, |object, tree| {
            object.update(&mut UpdateCx {
                tree,
                timers: &mut *timers,
                input,
                node: id,
                delta_ms,
            })
        });
    }

    fn draw_node(&self, id: NodeId, target: &mut dyn RenderTarget) {
        let Some(node) = self.node(id) else {
            return;
        };
        if !node.visible {
            return;
        }
        if let Some(object) = node.object.as_deref() {
            object.draw(node, target);
        }
        for child in &node.children {
            self.draw_node(*child, target);
        }
    }
}

impl Index<NodeId> for ObjectTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.node(id)
            .unwrap_or_else(|| panic!("node {id:?} is not alive"))
    }
}

impl IndexMut<NodeId> for ObjectTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        self.node_mut(id)
            .unwrap_or_else(|| panic!("node {id:?} is not alive"))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use proptest::prelude::*;

    use super::*;
    use crate::render::Color;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        label: &'static str,
        log: Log,
    }

    impl Probe {
        fn new(label: &'static str, log: &Log) -> Self {
            Self {
                label,
                log: Rc::clone(log),
            }
        }

        fn record(&self, event: &str) {
            self.log
                .borrow_mut()
                .push(format!("{event}:{}", self.label));
        }
    }

    crate::declare_type!(Probe);

    impl Object for Probe {
        fn on_started(&mut self, _cx: &mut NodeCx<'_>) {
            self.record("start");
        }

        fn update(&mut self, _cx: &mut UpdateCx<'_>) {
            self.record("update");
        }

        fn draw(&self, _node: &Node, _target: &mut dyn RenderTarget) {
            self.record("draw");
        }

        fn on_property_changed(&mut self, name: &str, _value: &Property) {
            self.record(&format!("prop({name})"));
        }
    }

    enum Actor {}
    struct Walker;
    struct Jumper;
    struct Sprinter;

    crate::declare_type!(Actor);
    crate::declare_type!(Walker: Actor);
    crate::declare_type!(Jumper: Actor);
    crate::declare_type!(Sprinter: Walker);

    impl Object for Walker {}
    impl Object for Jumper {}

    struct NullTarget;

    impl RenderTarget for NullTarget {
        fn draw_rect(&mut self, _rect: Rect, _color: Color) {}
        fn draw_sprite(&mut self, _texture: &str, _source: Rect, _dest: Rect) {}
    }

    fn tick(tree: &mut ObjectTree) {
        let mut timers = TimerManager::new();
        let input = InputManager::new();
        tree.update(16.0, &mut timers, &input);
    }

    fn take(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    #[test]
    fn new_tree_has_started_root_group_only_after_start() {
        let mut tree = ObjectTree::new();
        let root = tree.root();
        assert_eq!(tree[root].name(), "root");
        assert!(tree[root].is_type_of::<Group>());
        assert!(!tree.is_started());

        tree.start();
        assert!(tree.is_started());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn start_update_and_draw_follow_tree_order() {
        let log = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Probe::new("a", &log));
        tree.spawn(a, Probe::new("a1", &log));
        tree.spawn(root, Probe::new("b", &log));

        tree.start();
        assert_eq!(take(&log), vec!["start:a1", "start:a", "start:b"]);

        tick(&mut tree);
        assert_eq!(take(&log), vec!["update:a1", "update:a", "update:b"]);

        tree.draw(&mut NullTarget);
        assert_eq!(take(&log), vec!["draw:a", "draw:a1", "draw:b"]);
    }

    #[test]
    fn child_added_to_started_parent_starts_at_once_but_updates_next_tick() {
        struct Spawner {
            log: Log,
            spawned: bool,
        }
        crate::declare_type!(Spawner);
        impl Object for Spawner {
            fn update(&mut self, cx: &mut UpdateCx<'_>) {
                if self.spawned {
                    return;
                }
                self.spawned = true;
                if let Some(parent) = cx.parent() {
                    cx.tree.spawn(parent, Probe::new("late", &self.log));
                }
            }
        }

        let log = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        tree.spawn(
            root,
            Spawner {
                log: Rc::clone(&log),
                spawned: false,
            },
        );
        tree.start();

        tick(&mut tree);
        assert_eq!(take(&log), vec!["start:late"]);
        assert_eq!(tree[root].children().len(), 2);

        tick(&mut tree);
        assert_eq!(take(&log), vec!["update:late"]);
    }

    #[test]
    fn remove_is_deferred_and_repeated_requests_are_harmless() {
        let log = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Probe::new("a", &log));
        let a1 = tree.spawn(a, Probe::new("a1", &log));
        let b = tree.spawn(root, Probe::new("b", &log));

        tree.remove_later(a);
        tree.remove_later(a);
        assert_eq!(tree.pending().len(), 2);
        assert!(tree.contains(a));
        assert_eq!(tree[root].children(), &[a, b]);

        tree.apply_pending();
        assert!(!tree.contains(a));
        assert!(!tree.contains(a1));
        assert_eq!(tree[root].children(), &[b]);
        assert_eq!(tree.len(), 2);
        assert!(tree.pending().is_empty());
    }

    #[test]
    fn stale_handle_does_not_resolve_after_slot_reuse() {
        let log = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Probe::new("a", &log));
        tree.remove_later(a);
        tree.apply_pending();

        let reused = tree.create(Probe::new("reused", &log));
        assert!(tree.contains(reused));
        assert!(tree.node(a).is_none());
        assert_ne!(a, reused);
    }

    #[test]
    fn reorder_commands_apply_in_request_order() {
        let log = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Probe::new("a", &log));
        let b = tree.spawn(root, Probe::new("b", &log));
        let c = tree.spawn(root, Probe::new("c", &log));
        let d = tree.spawn(root, Probe::new("d", &log));

        tree.move_to_front(a);
        tree.move_to_back(d);
        tree.move_under(a, b);
        assert_eq!(tree[root].children(), &[a, b, c, d]);

        tree.apply_pending();
        assert_eq!(tree[root].children(), &[d, a, b, c]);
    }

    #[test]
    fn move_to_front_draws_last() {
        let log = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Probe::new("a", &log));
        tree.spawn(root, Probe::new("b", &log));

        tree.move_to_front(a);
        tree.apply_pending();
        tree.draw(&mut NullTarget);
        assert_eq!(take(&log), vec!["draw:b", "draw:a"]);
    }

    #[test]
    fn move_under_missing_sibling_keeps_position() {
        let log = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Probe::new("a", &log));
        let b = tree.spawn(root, Probe::new("b", &log));
        let stranger = tree.create(Probe::new("stranger", &log));

        tree.move_under(b, stranger);
        tree.apply_pending();
        assert_eq!(tree[root].children(), &[a, b]);
    }

    #[test]
    fn structural_changes_without_parent_are_ignored() {
        let log = Log::default();
        let mut tree = ObjectTree::new();
        let detached = tree.create(Probe::new("detached", &log));
        let root = tree.root();

        tree.remove_later(detached);
        tree.move_to_front(detached);
        tree.move_to_back(root);
        assert!(tree.pending().is_empty());

        tree.apply_pending();
        assert!(tree.contains(detached));

        tree.discard(detached);
        assert!(!tree.contains(detached));
    }

    #[test]
    #[should_panic(expected = "already has a parent")]
    fn attaching_twice_panics() {
        let log = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Probe::new("a", &log));
        let b = tree.spawn(root, Probe::new("b", &log));
        tree.add_child(b, a);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn attaching_ancestor_under_descendant_panics() {
        let mut tree = ObjectTree::new();
        let outer = tree.create(Group);
        let inner = tree.spawn(outer, Group);
        tree.add_child(inner, outer);
    }

    #[test]
    fn disabled_node_skips_updates_but_still_draws() {
        let log = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Probe::new("a", &log));
        tree.spawn(a, Probe::new("a1", &log));
        tree.start();
        take(&log);

        tree.set_property(a, "enabled", false);
        take(&log);
        tick(&mut tree);
        assert!(take(&log).is_empty());

        tree.draw(&mut NullTarget);
        assert_eq!(take(&log), vec!["draw:a", "draw:a1"]);
    }

    #[test]
    fn invisible_node_hides_its_subtree() {
        let log = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Probe::new("a", &log));
        tree.spawn(a, Probe::new("a1", &log));
        tree.spawn(root, Probe::new("b", &log));

        tree[a].set_visible(false);
        tree.draw(&mut NullTarget);
        assert_eq!(take(&log), vec!["draw:b"]);
    }

    #[test]
    fn properties_apply_well_known_names_and_notify_object() {
        let log = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Probe::new("a", &log));

        assert_eq!(tree[a].property("missing"), &Property::Invalid);

        tree.set_property(a, "name", "hero");
        tree.set_property(a, "x", 12);
        tree.set_property(a, "y", 4.5_f32);
        tree.set_property(a, "width", 16);
        tree.set_property(a, "height", 32);
        tree.set_property(a, "speed", 0.25_f32);

        let node = &tree[a];
        assert_eq!(node.name(), "hero");
        assert_eq!(node.bounds(), Rect::new(12.0, 4.5, 16.0, 32.0));
        assert_eq!(node.property("speed").as_float(), 0.25);
        assert_eq!(node.property("x"), &Property::Int(12));
        assert_eq!(tree.find_child_by_name(root, "hero"), Some(a));
        assert_eq!(
            take(&log),
            vec![
                "prop(name):a",
                "prop(x):a",
                "prop(y):a",
                "prop(width):a",
                "prop(height):a",
                "prop(speed):a",
            ]
        );
    }

    struct SelfConfig {
        seen: Log,
    }

    crate::declare_type!(SelfConfig);

    impl Object for SelfConfig {
        fn on_started(&mut self, cx: &mut NodeCx<'_>) {
            let node = cx.node;
            cx.tree.set_property(node, "speed", 0.5_f32);
            cx.tree.set_property(node, "width", 8);
        }

        fn update(&mut self, cx: &mut UpdateCx<'_>) {
            cx.tree.set_property(cx.node, "ticks", 1);
            assert!(self.seen.borrow().iter().all(|event| event != "ticks"));
        }

        fn on_property_changed(&mut self, name: &str, _value: &Property) {
            self.seen.borrow_mut().push(name.to_string());
        }
    }

    #[test]
    fn properties_set_on_self_during_a_hook_reach_the_object_afterwards() {
        let seen = Log::default();
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let node = tree.spawn(
            root,
            SelfConfig {
                seen: Rc::clone(&seen),
            },
        );

        tree.start();
        assert_eq!(take(&seen), vec!["speed", "width"]);
        assert_eq!(tree[node].property("speed").as_float(), 0.5);
        assert_eq!(tree[node].size().x, 8.0);

        tick(&mut tree);
        assert_eq!(take(&seen), vec!["ticks"]);
        assert_eq!(tree[node].property("ticks").as_int(), 1);
    }

    #[test]
    #[should_panic(expected = "was read as")]
    fn well_known_property_with_wrong_kind_panics() {
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let a = tree.spawn(root, Group);
        tree.set_property(a, "x", "left");
    }

    #[test]
    fn typed_lookups_match_exact_and_derived_types() {
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let walker = tree.spawn(root, Walker);
        let group = tree.spawn(root, Group);
        let jumper = tree.spawn(root, Jumper);
        let nested = tree.spawn(walker, Walker);
        let deep = tree.spawn(group, Jumper);

        assert_eq!(
            tree.find_children_by_type::<Actor>(root, false),
            vec![walker, jumper]
        );
        assert_eq!(
            tree.find_children_by_type::<Actor>(root, true),
            vec![walker, jumper, nested, deep]
        );
        assert_eq!(tree.find_child_by_type::<Jumper>(root), Some(jumper));
        assert_eq!(tree.find_child_by_type::<Sprinter>(root), None);
        assert!(tree[walker].is_type_of::<Actor>());

        let (found, _) = tree
            .find_child_object::<Walker>(root)
            .expect("walker child");
        assert_eq!(found, walker);
    }

    #[test]
    fn casts_respect_the_declared_hierarchy() {
        let mut tree = ObjectTree::new();
        let root = tree.root();
        let walker = tree.spawn(root, Walker);

        assert!(tree.object::<Walker>(walker).is_some());
        assert!(tree.object::<Jumper>(walker).is_none());

        let object = tree[walker].object().expect("attached object");
        assert!(object.is_instance_of::<Walker>());
        assert!(!object.is_instance_of::<Actor>());
        assert!(object.is_type_of::<Actor>());
        assert!(object.is_base_class_of::<Sprinter>());
        assert!(!object.is_base_class_of::<Walker>());
        let _walker: &Walker = unsafe { object.cast_unchecked::<Walker>() };
    }

    #[test]
    fn hooks_can_reach_their_own_node_while_detached() {
        struct Mover;
        crate::declare_type!(Mover);
        impl Object for Mover {
            fn update(&mut self, cx: &mut UpdateCx<'_>) {
                let step = cx.delta_ms;
                cx.this_mut().move_by(Vector::new(step, 0.0));
                let parent = cx.parent().expect("mover is attached");
                assert_eq!(cx.tree.find_child_by_type::<Mover>(parent), Some(cx.node));
            }
        }

        let mut tree = ObjectTree::new();
        let root = tree.root();
        let mover = tree.spawn(root, Mover);
        tick(&mut tree);
        tick(&mut tree);
        assert_eq!(tree[mover].position(), Vector::new(32.0, 0.0));
    }

    const PROBES: usize = 5;
    const PROBE_LABELS: [&str; PROBES] = ["p0", "p1", "p2", "p3", "p4"];

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Remove(usize),
        Front(usize),
        Back(usize),
        Under(usize, usize),
        Add,
    }

    struct Mutator {
        ops: Vec<Op>,
        targets: Vec<NodeId>,
        added: Rc<RefCell<Vec<NodeId>>>,
        log: Log,
    }

    crate::declare_type!(Mutator);

    impl Object for Mutator {
        fn update(&mut self, cx: &mut UpdateCx<'_>) {
            let Some(parent) = cx.parent() else {
                return;
            };
            for op in &self.ops {
                match *op {
                    Op::Remove(i) => cx.tree.remove_later(self.targets[i]),
                    Op::Front(i) => cx.tree.move_to_front(self.targets[i]),
                    Op::Back(i) => cx.tree.move_to_back(self.targets[i]),
                    Op::Under(i, j) => cx.tree.move_under(self.targets[i], self.targets[j]),
                    Op::Add => {
                        let id = cx.tree.spawn(parent, Probe::new("added", &self.log));
                        self.added.borrow_mut().push(id);
                    }
                }
            }
        }
    }

    fn apply_to_model(children: &mut Vec<NodeId>, op: Op, targets: &[NodeId]) {
        let position = |children: &[NodeId], id: NodeId| children.iter().position(|c| *c == id);
        match op {
            Op::Remove(i) => children.retain(|c| *c != targets[i]),
            Op::Front(i) => {
                if let Some(at) = position(children, targets[i]) {
                    let id = children.remove(at);
                    children.push(id);
                }
            }
            Op::Back(i) => {
                if let Some(at) = position(children, targets[i]) {
                    let id = children.remove(at);
                    children.insert(0, id);
                }
            }
            Op::Under(i, j) => {
                if let Some(at) = position(children, targets[i]) {
                    let id = children.remove(at);
                    let index = position(children, targets[j]).unwrap_or(at);
                    children.insert(index, id);
                }
            }
            Op::Add => {}
        }
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..PROBES).prop_map(Op::Remove),
            (0..PROBES).prop_map(Op::Front),
            (0..PROBES).prop_map(Op::Back),
            (0..PROBES, 0..PROBES).prop_map(|(node, sibling)| Op::Under(node, sibling)),
            Just(Op::Add),
        ]
    }

    proptest! {
        #[test]
        fn queued_mutations_never_disturb_the_running_pass(
            ops in prop::collection::vec(op_strategy(), 0..24)
        ) {
            let log = Log::default();
            let added = Rc::new(RefCell::new(Vec::new()));
            let mut tree = ObjectTree::new();
            let root = tree.root();
            let container = tree.spawn(root, Group);
            let mutator = tree.spawn(
                container,
                Mutator {
                    ops: ops.clone(),
                    targets: Vec::new(),
                    added: Rc::clone(&added),
                    log: Rc::clone(&log),
                },
            );
            let targets: Vec<NodeId> = PROBE_LABELS
                .iter()
                .map(|label| tree.spawn(container, Probe::new(*label, &log)))
                .collect();
            tree.object_mut::<Mutator>(mutator)
                .expect("mutator object")
                .targets = targets.clone();
            tree.start();
            take(&log);

            tick(&mut tree);

            let updated: Vec<String> = take(&log)
                .into_iter()
                .filter(|entry| entry.starts_with("update:"))
                .collect();
            let expected: Vec<String> = PROBE_LABELS
                .iter()
                .map(|label| format!("update:{label}"))
                .collect();
            prop_assert_eq!(updated, expected);

            let mut model = vec![mutator];
            model.extend(targets.iter().copied());
            model.extend(added.borrow().iter().copied());
            prop_assert_eq!(tree[container].children(), model.as_slice());

            tree.apply_pending();
            for op in &ops {
                apply_to_model(&mut model, *op, &targets);
            }
            prop_assert_eq!(tree[container].children(), model.as_slice());
            prop_assert!(tree.pending().is_empty());
        }
    }
}
