//! Screen object model.
//!
//! # Conceptual overview
//! Petal interprets declarative screen descriptions. Markup is turned into a live object graph by a
//! parser (which lives outside this crate), and everything dynamic in it (actions, animations,
//! layout parameter types) is resolved by name through registries.
//!
//! ## View graphs
//! A [`ViewGraph`] is one screen: a tree of [`Node`]s with a single root, which is the view the
//! host eventually puts on screen. Nodes carry the layout parameters they declared for their
//! container, a bag of attributes, data bindings, and optionally an action and an animation.
//!
//! Each graph also owns three per-screen services:
//!
//! - a [`DataBinder`], the data pool whose values flow into bound node attributes,
//! - a [`TaskCenter`], which runs markup-declared tasks at lifecycle points, and
//! - an [`AnimationCenter`], which starts animations on the UI thread.
//!
//! ## Registries
//! Markup refers to plugins by name. A [`Registry`] maps case-insensitive names to factories; there
//! is one for actions, one for animations, and a [`ParamsRegistry`] for layout parameter kinds.
//! Registries are plain values built at startup and passed to whatever parses markup, so tests can
//! swap them freely.
//!
//! A name that isn’t registered, or whose factory fails, resolves to nothing: the node just doesn’t
//! get that action or animation. Layout parameters are the exception: an unknown kind resolves to
//! relative layout parameters.
//!
//! ## Threads
//! Graphs are built off the UI thread, so nothing in a graph may require the UI thread until it has
//! been loaded. Work that must happen on the UI thread goes through a [`UiHandle`]; the UI thread
//! owns the matching [`UiQueue`] and polls it.

pub mod action;
pub mod animation;
mod binder;
mod context;
pub mod decl;
mod error;
mod graph;
pub mod params;
mod parser;
mod registry;
pub mod task;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
mod ui;
mod var;

pub use action::{Action, ActionElement, ActionListener, ActionRegistry};
pub use animation::{Animation, AnimationCenter, AnimationRegistry};
pub use binder::DataBinder;
pub use context::{Context, ScriptEnv, ScriptGlobals};
pub use error::FactoryError;
pub use graph::{Binding, LoadHook, Node, NodeId, ViewGraph};
pub use params::{ParamsKind, ParamsObject, ParamsRegistry};
pub use parser::{ParseRequest, Parser};
pub use registry::{Factory, Registries, Registry};
pub use task::{HookType, Task, TaskCenter};
pub use ui::{UiHandle, UiQueue, UiTask};
pub use var::{DataMap, Var};
