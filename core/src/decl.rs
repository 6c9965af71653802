//! Declarative descriptions of a screen, built into a [`ViewGraph`] with registry lookups.

use crate::action::{Action, ActionElement};
use crate::animation::Animation;
use crate::graph::{Binding, Node, NodeId, ViewGraph};
use crate::params::ParamsObject;
use crate::parser::ParseRequest;
use crate::task::{HookType, Task};
use crate::var::Var;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// An action or animation element: a registry key plus attributes.
#[derive(Debug, Clone, Default)]
pub struct PluginDecl {
    pub name: String,
    pub attributes: HashMap<String, Var>,
    /// Nested elements; only animation sets use these.
    pub children: Vec<PluginDecl>,
}

impl PluginDecl {
    pub fn new(name: &str) -> PluginDecl {
        PluginDecl {
            name: name.to_string(),
            ..PluginDecl::default()
        }
    }

    pub fn attribute(mut self, key: &str, value: impl Into<Var>) -> PluginDecl {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn child(mut self, child: PluginDecl) -> PluginDecl {
        self.children.push(child);
        self
    }
}

/// A view element.
#[derive(Debug, Clone, Default)]
pub struct NodeDecl {
    pub kind: String,
    pub name: Option<String>,
    /// Layout parameter kind name; unknown or absent names use the default kind.
    pub params: Option<String>,
    /// Layout parameter attributes.
    pub layout: Vec<(String, Var)>,
    pub attributes: HashMap<String, Var>,
    pub bindings: Vec<Binding>,
    pub action: Option<PluginDecl>,
    pub animation: Option<PluginDecl>,
    pub children: Vec<NodeDecl>,
}

impl NodeDecl {
    pub fn new(kind: &str) -> NodeDecl {
        NodeDecl {
            kind: kind.to_string(),
            ..NodeDecl::default()
        }
    }

    pub fn name(mut self, name: &str) -> NodeDecl {
        self.name = Some(name.to_string());
        self
    }

    pub fn params(mut self, kind: &str) -> NodeDecl {
        self.params = Some(kind.to_string());
        self
    }

    pub fn layout(mut self, key: &str, value: impl Into<Var>) -> NodeDecl {
        self.layout.push((key.to_string(), value.into()));
        self
    }

    pub fn attribute(mut self, key: &str, value: impl Into<Var>) -> NodeDecl {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Binds data pool key `key` to attribute `attribute`.
    pub fn bind(mut self, key: &str, attribute: &str) -> NodeDecl {
        self.bindings.push(Binding {
            key: key.to_string(),
            attribute: attribute.to_string(),
        });
        self
    }

    pub fn action(mut self, action: PluginDecl) -> NodeDecl {
        self.action = Some(action);
        self
    }

    pub fn animation(mut self, animation: PluginDecl) -> NodeDecl {
        self.animation = Some(animation);
        self
    }

    pub fn child(mut self, child: NodeDecl) -> NodeDecl {
        self.children.push(child);
        self
    }
}

/// A task element.
#[derive(Debug, Clone)]
pub struct TaskDecl {
    pub hook: HookType,
    pub value: Option<String>,
    pub actions: Vec<PluginDecl>,
}

impl TaskDecl {
    pub fn new(hook: HookType) -> TaskDecl {
        TaskDecl {
            hook,
            value: None,
            actions: Vec::new(),
        }
    }

    pub fn value(mut self, value: &str) -> TaskDecl {
        self.value = Some(value.to_string());
        self
    }

    pub fn action(mut self, action: PluginDecl) -> TaskDecl {
        self.actions.push(action);
        self
    }
}

/// A whole screen.
#[derive(Debug, Clone)]
pub struct GraphDecl {
    pub root: NodeDecl,
    pub tasks: Vec<TaskDecl>,
    /// Animations referenced by markup id.
    pub animations: Vec<(String, PluginDecl)>,
}

impl GraphDecl {
    pub fn new(root: NodeDecl) -> GraphDecl {
        GraphDecl {
            root,
            tasks: Vec::new(),
            animations: Vec::new(),
        }
    }

    pub fn task(mut self, task: TaskDecl) -> GraphDecl {
        self.tasks.push(task);
        self
    }

    pub fn animation(mut self, id: &str, animation: PluginDecl) -> GraphDecl {
        self.animations.push((id.to_string(), animation));
        self
    }

    /// Builds the graph, resolving plugins through the request’s registries.
    ///
    /// Unknown actions and animations are skipped; unknown layout parameter kinds use the
    /// default kind. Tasks and named animations are added to the request’s task center and
    /// animation center.
    pub fn build(self, request: &ParseRequest<'_>) -> ViewGraph {
        let mut nodes = HashMap::new();
        let root = build_node(request, self.root, None, &mut nodes);

        for (id, decl) in self.animations {
            if let Some(animation) = build_animation(request, decl) {
                request.animation_center.insert(&id, animation.into());
            }
        }

        for task in self.tasks {
            let actions = task
                .actions
                .into_iter()
                .filter_map(|action| build_action(request, action))
                .collect();
            request.task_center.add(Task {
                hook: task.hook,
                value: task.value,
                actions,
            });
        }

        ViewGraph::new(
            root,
            nodes,
            Arc::clone(request.binder),
            Arc::clone(request.task_center),
            Arc::clone(request.animation_center),
        )
    }
}

fn build_action(request: &ParseRequest<'_>, decl: PluginDecl) -> Option<Arc<dyn Action>> {
    let element = ActionElement {
        attributes: decl.attributes,
        env: request.env.clone(),
    };
    match request.registries.actions.resolve(&decl.name, &element) {
        Some(action) => Some(action.into()),
        None => {
            debug!(action = %decl.name, markup = request.markup, "skipping unresolved action");
            None
        }
    }
}

fn build_animation(request: &ParseRequest<'_>, decl: PluginDecl) -> Option<Box<dyn Animation>> {
    let mut animation = match request
        .registries
        .animations
        .resolve(&decl.name, request.animation_center)
    {
        Some(animation) => animation,
        None => {
            debug!(animation = %decl.name, markup = request.markup, "skipping unresolved animation");
            return None;
        }
    };

    if let Err(err) = animation.configure(&decl.attributes) {
        warn!(animation = %decl.name, %err, "skipping misconfigured animation");
        return None;
    }

    for child in decl.children {
        if let Some(child) = build_animation(request, child) {
            if !animation.add_child(child) {
                debug!(animation = %decl.name, "animation takes no children; child dropped");
            }
        }
    }
    Some(animation)
}

fn build_node(
    request: &ParseRequest<'_>,
    decl: NodeDecl,
    parent: Option<NodeId>,
    nodes: &mut HashMap<NodeId, Node>,
) -> NodeId {
    let id = NodeId::new();
    let registry = &request.registries.params;

    let mut params = registry
        .resolve(decl.params.as_deref(), request.context)
        .unwrap_or_else(|| ParamsObject::new(registry.kind_for(decl.params.as_deref())));
    for (key, value) in &decl.layout {
        if !params.set_attribute(key, value) {
            debug!(kind = %decl.kind, key = %key, "ignoring layout attribute");
        }
    }

    let children = decl
        .children
        .into_iter()
        .map(|child| build_node(request, child, Some(id), nodes))
        .collect();

    let node = Node {
        id,
        kind: decl.kind,
        name: decl.name,
        parent,
        children,
        params,
        attributes: RwLock::new(decl.attributes),
        bindings: decl.bindings,
        action: decl.action.and_then(|action| build_action(request, action)),
        animation: decl
            .animation
            .and_then(|animation| build_animation(request, animation))
            .map(Arc::from),
    };
    nodes.insert(id, node);
    id
}
