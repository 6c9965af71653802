//! Test fixtures, also available to dependent crates through the `testing` feature.

use crate::action::{Action, ActionElement};
use crate::animation::{Animation, AnimationCenter};
use crate::binder::DataBinder;
use crate::context::{Context, ScriptEnv};
use crate::error::FactoryError;
use crate::graph::{Node, ViewGraph};
use crate::parser::ParseRequest;
use crate::registry::Registries;
use crate::task::TaskCenter;
use crate::var::Var;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Records its `tag` attribute when run.
#[derive(Debug)]
pub struct Record {
    tag: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl Action for Record {
    fn run(&self, _graph: &Arc<ViewGraph>) -> bool {
        self.log.lock().push(self.tag.clone());
        true
    }
}

/// Sets the `alpha` attribute.
#[derive(Debug)]
pub struct Fade {
    to: f64,
}

impl Animation for Fade {
    fn name(&self) -> &'static str {
        "fade"
    }

    fn configure(&mut self, attributes: &HashMap<String, Var>) -> Result<(), FactoryError> {
        if let Some(to) = attributes.get("to") {
            self.to = to.as_f64();
        }
        Ok(())
    }

    fn duration(&self) -> Duration {
        Duration::from_millis(100)
    }

    fn apply(&self, node: &Node) {
        node.set_attribute("alpha", Var::Number(self.to));
    }
}

/// Owns everything a [`ParseRequest`] borrows.
pub struct Fixture {
    pub context: Context,
    pub env: HashMap<String, String>,
    pub script_env: ScriptEnv,
    pub task_center: Arc<TaskCenter>,
    pub animation_center: Arc<AnimationCenter>,
    pub binder: Arc<DataBinder>,
    pub registries: Registries,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl Fixture {
    pub fn new() -> Fixture {
        Fixture::with_registries(Context::default(), Registries::new())
    }

    /// Creates a fixture parsing against `registries`, with `record` and `fade` added to them.
    pub fn with_registries(context: Context, registries: Registries) -> Fixture {
        let log = Arc::new(Mutex::new(Vec::new()));

        let action_log = Arc::clone(&log);
        registries.actions.register("record", move |element: &ActionElement| {
            let tag = element
                .attribute("tag")
                .ok_or_else(|| FactoryError::MissingAttribute("tag".into()))?;
            Ok(Box::new(Record {
                tag: tag.as_string(),
                log: Arc::clone(&action_log),
            }) as Box<dyn Action>)
        });
        registries.animations.register("fade", |_: &AnimationCenter| {
            Ok(Box::new(Fade { to: 0. }) as Box<dyn Animation>)
        });

        Fixture {
            animation_center: Arc::new(AnimationCenter::new(context.clone())),
            context,
            env: HashMap::new(),
            script_env: ScriptEnv::new("test", false, None),
            task_center: Arc::new(TaskCenter::new(false)),
            binder: Arc::new(DataBinder::default()),
            registries,
            log,
        }
    }

    pub fn request<'a>(&'a self, markup: &'a str) -> ParseRequest<'a> {
        ParseRequest {
            context: &self.context,
            instance_id: "test",
            restricted: false,
            markup,
            env: &self.env,
            script_env: &self.script_env,
            task_center: &self.task_center,
            animation_center: &self.animation_center,
            binder: &self.binder,
            registries: &self.registries,
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}
