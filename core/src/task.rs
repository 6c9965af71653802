//! Lifecycle hooks.

use crate::action::Action;
use crate::graph::ViewGraph;
use core::fmt;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Lifecycle points tasks can hook into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookType {
    /// The data pool passed to `load` has been applied.
    DataInitialize,
    /// Loading has finished; fires after [`HookType::DataInitialize`].
    LoadFinish,
    /// The host has put the screen on display.
    ViewShow,
}

impl HookType {
    /// Parses a markup hook name, case-insensitively.
    pub fn from_name(name: &str) -> Option<HookType> {
        match name.trim().to_lowercase().as_str() {
            "datainitialize" => Some(HookType::DataInitialize),
            "loadfinish" => Some(HookType::LoadFinish),
            "viewshow" => Some(HookType::ViewShow),
            _ => None,
        }
    }
}

/// A list of actions that runs when a hook fires.
#[derive(Debug)]
pub struct Task {
    pub hook: HookType,
    /// If set, the task only runs when notified with this value.
    pub value: Option<String>,
    pub actions: Vec<Arc<dyn Action>>,
}

impl Task {
    fn matches(&self, hook: HookType, value: &str) -> bool {
        self.hook == hook && self.value.as_ref().map_or(true, |v| v == value)
    }
}

/// Dispatches lifecycle notifications to a screen’s tasks.
pub struct TaskCenter {
    restricted: bool,
    tasks: RwLock<Vec<Arc<Task>>>,
    graph: RwLock<Weak<ViewGraph>>,
}

impl TaskCenter {
    pub fn new(restricted: bool) -> TaskCenter {
        TaskCenter {
            restricted,
            tasks: RwLock::new(Vec::new()),
            graph: RwLock::new(Weak::new()),
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    pub fn add(&self, task: Task) {
        self.tasks.write().push(Arc::new(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }

    /// Sets the graph task actions run against.
    pub fn attach(&self, graph: &Arc<ViewGraph>) {
        *self.graph.write() = Arc::downgrade(graph);
    }

    /// Runs every task hooked to `hook`, in the order they were added.
    ///
    /// Returns the number of tasks that ran. Nothing runs before a graph has been attached.
    pub fn notify(&self, hook: HookType, value: &str) -> usize {
        let graph = match self.graph.read().upgrade() {
            Some(graph) => graph,
            None => {
                debug!(?hook, "no graph attached; skipping notification");
                return 0;
            }
        };

        // run with the lock released so actions may add tasks
        let tasks: Vec<_> = self
            .tasks
            .read()
            .iter()
            .filter(|task| task.matches(hook, value))
            .cloned()
            .collect();

        debug!(?hook, value, tasks = tasks.len(), "notify");
        for task in &tasks {
            for action in &task.actions {
                action.run(&graph);
            }
        }
        tasks.len()
    }
}

impl fmt::Debug for TaskCenter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TaskCenter")
            .field("restricted", &self.restricted)
            .field("tasks", &*self.tasks.read())
            .finish()
    }
}

#[test]
fn test_hook_names() {
    assert_eq!(HookType::from_name("DataInitialize"), Some(HookType::DataInitialize));
    assert_eq!(HookType::from_name("loadfinish"), Some(HookType::LoadFinish));
    assert_eq!(HookType::from_name(" ViewShow "), Some(HookType::ViewShow));
    assert_eq!(HookType::from_name("unload"), None);
}

#[test]
fn test_task_value_filter() {
    let any = Task {
        hook: HookType::LoadFinish,
        value: None,
        actions: Vec::new(),
    };
    let filtered = Task {
        hook: HookType::ViewShow,
        value: Some("tab1".into()),
        actions: Vec::new(),
    };
    assert!(any.matches(HookType::LoadFinish, "whatever"));
    assert!(!any.matches(HookType::DataInitialize, ""));
    assert!(filtered.matches(HookType::ViewShow, "tab1"));
    assert!(!filtered.matches(HookType::ViewShow, "tab2"));
}
