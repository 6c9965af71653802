//! Loads declarative screens.
//!
//! A [`Loader`] owns a markup [`Parser`], the plugin [`Registries`], and a pool of worker threads.
//! Each [`Screen`] it creates goes through two phases:
//!
//! 1. [`Screen::initialize`] parses markup into a [`ViewGraph`] on a worker thread and returns
//!    immediately.
//! 2. [`Screen::load`] is called on the UI thread. It waits for initialization, mounts the graph
//!    into its container, applies the host’s data, and runs the screen’s lifecycle tasks.
//!
//! See [`petal_core`] for the object model.

pub mod builtin;
mod config;
mod error;
mod latch;
mod loader;
mod pool;
mod screen;

pub use config::LoaderConfig;
pub use error::{LoadError, LoaderError};
pub use loader::Loader;
pub use pool::WorkerPool;
pub use screen::{InitDone, InitOptions, Screen};

pub use petal_core::{action, animation, decl, params, task};
pub use petal_core::{
    Action, ActionElement, ActionListener, Animation, AnimationCenter, Context, DataBinder,
    DataMap, FactoryError, HookType, Node, NodeId, ParamsKind, ParamsObject, ParseRequest, Parser,
    Registries, Registry, ScriptEnv, ScriptGlobals, TaskCenter, UiHandle, UiQueue, Var, ViewGraph,
};
