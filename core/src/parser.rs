//! The contract between the lifecycle and the markup parser.
//!
//! Parsing markup is not this crate’s business. A [`Parser`] receives everything it needs to build
//! a graph in a [`ParseRequest`], and usually finishes by describing the screen as a
//! [`GraphDecl`](crate::decl::GraphDecl) and building it against the request.

use crate::animation::AnimationCenter;
use crate::binder::DataBinder;
use crate::context::{Context, ScriptEnv};
use crate::graph::ViewGraph;
use crate::registry::Registries;
use crate::task::TaskCenter;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything a parser gets to build one screen.
pub struct ParseRequest<'a> {
    pub context: &'a Context,
    pub instance_id: &'a str,
    pub restricted: bool,
    pub markup: &'a str,
    /// Parser environment, e.g. values substituted into included markup.
    pub env: &'a HashMap<String, String>,
    pub script_env: &'a ScriptEnv,
    pub task_center: &'a Arc<TaskCenter>,
    pub animation_center: &'a Arc<AnimationCenter>,
    pub binder: &'a Arc<DataBinder>,
    pub registries: &'a Registries,
}

/// Turns markup into a view graph.
pub trait Parser: Send + Sync {
    /// Returns `None` if the markup couldn’t be found or parsed.
    fn parse(&self, request: &ParseRequest<'_>) -> Option<ViewGraph>;
}

impl<F> Parser for F
where
    F: Fn(&ParseRequest<'_>) -> Option<ViewGraph> + Send + Sync,
{
    fn parse(&self, request: &ParseRequest<'_>) -> Option<ViewGraph> {
        self(request)
    }
}
