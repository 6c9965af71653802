//! Actions: behaviours declared in markup that run when a node is triggered or a task fires.

use crate::graph::ViewGraph;
use crate::registry::Registry;
use crate::var::Var;
use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

/// An action plugin.
pub trait Action: fmt::Debug + Send + Sync {
    /// Runs the action against the graph that owns it.
    ///
    /// Returns false if the action couldn’t do anything, e.g. because something it needs is
    /// missing.
    fn run(&self, graph: &Arc<ViewGraph>) -> bool;
}

/// The markup element an action is constructed from.
#[derive(Debug, Clone, Default)]
pub struct ActionElement {
    /// Attributes declared on the element.
    pub attributes: HashMap<String, Var>,
    /// Parser environment (e.g. values substituted into included markup).
    pub env: HashMap<String, String>,
}

impl ActionElement {
    pub fn new(attributes: HashMap<String, Var>) -> ActionElement {
        ActionElement {
            attributes,
            env: HashMap::new(),
        }
    }

    /// Looks up an attribute, case-insensitively.
    pub fn attribute(&self, key: &str) -> Option<&Var> {
        self.attributes.get(key).or_else(|| {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }
}

pub type ActionRegistry = Registry<Box<dyn Action>, ActionElement>;

/// Receives actions that must be handled by the host, such as navigation requests from a
/// container the host owns.
pub trait ActionListener: Send + Sync {
    fn notify(&self, key: &str, value: &str);
}

impl<F> ActionListener for F
where
    F: Fn(&str, &str) + Send + Sync,
{
    fn notify(&self, key: &str, value: &str) {
        self(key, value)
    }
}
