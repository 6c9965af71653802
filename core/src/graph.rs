//! The materialized object graph of a screen.

use crate::action::{Action, ActionListener};
use crate::animation::{Animation, AnimationCenter};
use crate::binder::DataBinder;
use crate::params::ParamsObject;
use crate::task::TaskCenter;
use crate::var::Var;
use core::fmt;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// A unique identifier for a node.
///
/// (this is just a UUID)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32, u16, u16, [u8; 8]);

impl NodeId {
    pub(crate) fn new() -> NodeId {
        let uuid = Uuid::new_v4();
        let (a, b, c, d) = uuid.as_fields();
        NodeId(a, b, c, *d)
    }
}

/// Binds a data pool key to a node attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub key: String,
    pub attribute: String,
}

/// A node in the view graph.
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) kind: String,
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) params: ParamsObject,
    pub(crate) attributes: RwLock<HashMap<String, Var>>,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) action: Option<Arc<dyn Action>>,
    pub(crate) animation: Option<Arc<dyn Animation>>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The widget type, e.g. `TextView`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The markup id, if declared.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The layout parameters this node declared for its container.
    pub fn params(&self) -> &ParamsObject {
        &self.params
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn attribute(&self, key: &str) -> Option<Var> {
        self.attributes.read().get(key).cloned()
    }

    pub fn set_attribute(&self, key: &str, value: Var) {
        self.attributes.write().insert(key.to_string(), value);
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn has_animation(&self) -> bool {
        self.animation.is_some()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("children", &self.children)
            .field("params", &self.params.kind())
            .field("attributes", &*self.attributes.read())
            .field("bindings", &self.bindings)
            .field("action", &self.action)
            .field("animation", &self.animation)
            .finish()
    }
}

/// Runs once when a screen finishes loading.
pub type LoadHook = Box<dyn FnOnce(&ViewGraph) + Send>;

/// State pushed into the graph when it is loaded into a container.
#[derive(Default)]
struct Mount {
    params: Option<ParamsObject>,
    action_listener: Option<Arc<dyn ActionListener>>,
    loaded: bool,
}

/// A screen’s object graph: a tree of nodes plus the per-screen binder, task center, and
/// animation center.
pub struct ViewGraph {
    pub(crate) root: NodeId,
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) names: HashMap<String, NodeId>,
    pub(crate) binder: Arc<DataBinder>,
    pub(crate) task_center: Arc<TaskCenter>,
    pub(crate) animation_center: Arc<AnimationCenter>,
    mount: RwLock<Mount>,
    load_hooks: Mutex<Vec<LoadHook>>,
}

impl ViewGraph {
    pub(crate) fn new(
        root: NodeId,
        nodes: HashMap<NodeId, Node>,
        binder: Arc<DataBinder>,
        task_center: Arc<TaskCenter>,
        animation_center: Arc<AnimationCenter>,
    ) -> ViewGraph {
        let names = nodes
            .values()
            .filter_map(|node| node.name.clone().map(|name| (name, node.id)))
            .collect();

        ViewGraph {
            root,
            nodes,
            names,
            binder,
            task_center,
            animation_center,
            mount: RwLock::new(Mount::default()),
            load_hooks: Mutex::new(Vec::new()),
        }
    }

    /// The root node, i.e. the native view handed to the host.
    pub fn root(&self) -> &Node {
        &self.nodes[&self.root]
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Finds a node by its markup id.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.names.get(name).and_then(|id| self.nodes.get(id))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn binder(&self) -> &Arc<DataBinder> {
        &self.binder
    }

    pub fn task_center(&self) -> &Arc<TaskCenter> {
        &self.task_center
    }

    pub fn animation_center(&self) -> &Arc<AnimationCenter> {
        &self.animation_center
    }

    /// Pushes the container’s layout parameters and the host’s action listener into the graph.
    pub fn mount(&self, params: ParamsObject, action_listener: Option<Arc<dyn ActionListener>>) {
        let mut mount = self.mount.write();
        mount.params = Some(params);
        mount.action_listener = action_listener;
    }

    /// Layout parameters for attaching the root node to its container, once mounted.
    pub fn params(&self) -> Option<ParamsObject> {
        self.mount.read().params.clone()
    }

    pub fn action_listener(&self) -> Option<Arc<dyn ActionListener>> {
        self.mount.read().action_listener.clone()
    }

    /// Writes a data pool value into every node attribute bound to `key`.
    pub fn apply_data(&self, key: &str, value: &Var) {
        for node in self.nodes.values() {
            for binding in node.bindings.iter().filter(|binding| binding.key == key) {
                node.set_attribute(&binding.attribute, value.clone());
            }
        }
    }

    /// Runs the action bound to a node. Returns false if there is none or it didn’t run.
    pub fn perform_action(self: &Arc<Self>, node: NodeId) -> bool {
        let action = match self.nodes.get(&node).and_then(|node| node.action.clone()) {
            Some(action) => action,
            None => return false,
        };
        action.run(self)
    }

    /// Starts the animation bound to a node.
    pub fn start_animation(self: &Arc<Self>, node: NodeId) -> bool {
        let animation = match self.nodes.get(&node).and_then(|node| node.animation.clone()) {
            Some(animation) => animation,
            None => return false,
        };
        self.animation_center.start(self, node, animation)
    }

    /// Registers a hook to run when loading finishes.
    ///
    /// Hooks added after loading has finished never run.
    pub fn add_load_hook(&self, hook: LoadHook) {
        self.load_hooks.lock().push(hook);
    }

    /// Marks the graph as loaded and runs its load hooks.
    pub fn on_load_finish(&self) {
        self.mount.write().loaded = true;
        let hooks = std::mem::take(&mut *self.load_hooks.lock());
        for hook in hooks {
            hook(self);
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.mount.read().loaded
    }
}

impl fmt::Debug for ViewGraph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ViewGraph")
            .field("root", &self.root)
            .field("nodes", &self.nodes)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
