//! The data pool a screen displays.

use crate::graph::ViewGraph;
use crate::ui::UiHandle;
use crate::var::{DataMap, Var};
use core::fmt;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::trace;

struct BinderState {
    values: DataMap,
    loaded: bool,
    ui: Option<UiHandle>,
    views: Vec<Weak<ViewGraph>>,
}

/// Mutable key → value store bound to one or more view graphs.
///
/// Values may be updated before any graph is attached; attaching a graph replays every stored
/// value into it. Before a UI handle is set, bound nodes are updated on the calling thread, after
/// that through the UI handle. Either way a bound node ends up showing the last stored value,
/// even when graphs are attached and values updated from different threads.
pub struct DataBinder {
    state: Mutex<BinderState>,
}

impl DataBinder {
    pub fn new(initial: DataMap) -> DataBinder {
        DataBinder {
            state: Mutex::new(BinderState {
                values: initial,
                loaded: false,
                ui: None,
                views: Vec::new(),
            }),
        }
    }

    /// Sets a value and pushes it into every attached graph.
    pub fn update(&self, key: impl Into<String>, value: impl Into<Var>) {
        let key = key.into();
        let value = value.into();

        // graphs are written with the lock held so they see updates in the order they are stored
        let mut state = self.state.lock();
        state.values.insert(key.clone(), value.clone());
        state.views.retain(|view| view.strong_count() > 0);
        trace!(%key, %value, views = state.views.len(), "binder update");

        for view in &state.views {
            match &state.ui {
                Some(ui) => {
                    let view = view.clone();
                    let key = key.clone();
                    let value = value.clone();
                    ui.dispatch(Box::new(move || {
                        if let Some(view) = view.upgrade() {
                            view.apply_data(&key, &value);
                        }
                    }));
                }
                None => {
                    if let Some(view) = view.upgrade() {
                        view.apply_data(&key, &value);
                    }
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Var> {
        self.state.lock().values.get(key).cloned()
    }

    /// Returns a copy of all values.
    pub fn snapshot(&self) -> DataMap {
        self.state.lock().values.clone()
    }

    /// Attaches a graph and replays every stored value into it.
    pub fn add_view(&self, view: &Arc<ViewGraph>) {
        let mut state = self.state.lock();
        state.views.push(Arc::downgrade(view));
        for (key, value) in &state.values {
            view.apply_data(key, value);
        }
    }

    /// Sets the UI thread bound nodes are updated on from now on.
    pub fn set_ui_handle(&self, ui: UiHandle) {
        self.state.lock().ui = Some(ui);
    }

    pub fn ui_handle(&self) -> Option<UiHandle> {
        self.state.lock().ui.clone()
    }

    /// Marks the initial data as applied. Updates remain possible afterwards.
    pub fn set_loaded(&self) {
        self.state.lock().loaded = true;
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }
}

impl Default for DataBinder {
    fn default() -> DataBinder {
        DataBinder::new(DataMap::new())
    }
}

impl fmt::Debug for DataBinder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DataBinder")
            .field("values", &state.values)
            .field("loaded", &state.loaded)
            .field("ui", &state.ui)
            .field("views", &state.views.len())
            .finish()
    }
}
