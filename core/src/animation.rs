//! Animations.
//!
//! Animation plugins only describe an animation and its end state; interpolating between states
//! is up to the host toolkit.

use crate::context::Context;
use crate::error::FactoryError;
use crate::graph::{Node, NodeId, ViewGraph};
use crate::registry::Registry;
use crate::ui::UiHandle;
use crate::var::Var;
use core::fmt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// An animation plugin.
pub trait Animation: fmt::Debug + Send + Sync {
    /// The registry key this animation was created from.
    fn name(&self) -> &'static str;

    /// Applies markup attributes.
    fn configure(&mut self, attributes: &HashMap<String, Var>) -> Result<(), FactoryError>;

    /// Adds a nested animation. Returns false if this animation can’t have children.
    fn add_child(&mut self, child: Box<dyn Animation>) -> bool {
        drop(child);
        false
    }

    fn duration(&self) -> Duration;

    /// Writes the animation’s end state onto a node’s attributes.
    fn apply(&self, node: &Node);
}

pub type AnimationRegistry = Registry<Box<dyn Animation>, AnimationCenter>;

/// Per-screen animation state: the UI thread animations run on and animations declared by name
/// in markup.
pub struct AnimationCenter {
    context: Context,
    ui: RwLock<Option<UiHandle>>,
    named: RwLock<HashMap<String, Arc<dyn Animation>>>,
}

impl AnimationCenter {
    pub fn new(context: Context) -> AnimationCenter {
        AnimationCenter {
            context,
            ui: RwLock::new(None),
            named: RwLock::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Sets the UI thread animations are started on.
    pub fn set_ui_handle(&self, ui: UiHandle) {
        *self.ui.write() = Some(ui);
    }

    pub fn ui_handle(&self) -> Option<UiHandle> {
        self.ui.read().clone()
    }

    /// Stores an animation under a markup name.
    pub fn insert(&self, id: &str, animation: Arc<dyn Animation>) {
        self.named.write().insert(id.to_string(), animation);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Animation>> {
        self.named.read().get(id).cloned()
    }

    /// Starts an animation on a node.
    ///
    /// Runs on the UI thread if one has been set, or right away otherwise. Returns false if the
    /// node doesn’t exist.
    pub fn start(&self, graph: &Arc<ViewGraph>, node: NodeId, animation: Arc<dyn Animation>) -> bool {
        if graph.node(node).is_none() {
            return false;
        }
        debug!(animation = animation.name(), ?node, "starting animation");

        let graph = Arc::clone(graph);
        let task = move || {
            if let Some(node) = graph.node(node) {
                animation.apply(node);
            }
        };
        match self.ui_handle() {
            Some(ui) => ui.dispatch(Box::new(task)),
            None => task(),
        }
        true
    }
}

impl fmt::Debug for AnimationCenter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut named: Vec<_> = self.named.read().keys().cloned().collect();
        named.sort();
        f.debug_struct("AnimationCenter")
            .field("context", &self.context)
            .field("ui", &*self.ui.read())
            .field("named", &named)
            .finish()
    }
}
