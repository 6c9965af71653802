//! Builtin actions.

use petal_core::{Action, ActionElement, ActionRegistry, FactoryError, ViewGraph, Var};
use std::sync::Arc;
use tracing::debug;

/// Forwards a key and a value to the host’s action listener.
#[derive(Debug, Clone, PartialEq)]
pub struct Outer {
    pub key: String,
    pub value: String,
}

impl Outer {
    pub fn new(element: &ActionElement) -> Outer {
        let get = |key| element.attribute(key).map(Var::as_string).unwrap_or_default();
        Outer {
            key: get("key"),
            value: get("value"),
        }
    }
}

impl Action for Outer {
    fn run(&self, graph: &Arc<ViewGraph>) -> bool {
        match graph.action_listener() {
            Some(listener) => {
                listener.notify(&self.key, &self.value);
                true
            }
            None => {
                debug!(key = %self.key, "no action listener mounted");
                false
            }
        }
    }
}

/// Writes a value into the screen’s data pool.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateData {
    pub key: String,
    pub value: Var,
}

impl UpdateData {
    pub fn new(element: &ActionElement) -> Result<UpdateData, FactoryError> {
        let key = element
            .attribute("key")
            .ok_or_else(|| FactoryError::MissingAttribute("key".into()))?
            .as_string();
        let value = element.attribute("value").cloned().unwrap_or_default();
        Ok(UpdateData { key, value })
    }
}

impl Action for UpdateData {
    fn run(&self, graph: &Arc<ViewGraph>) -> bool {
        graph.binder().update(self.key.clone(), self.value.clone());
        true
    }
}

/// Starts an animation declared by id, on the node named `target` or on the root.
#[derive(Debug, Clone, PartialEq)]
pub struct StartAnimation {
    pub animation: String,
    pub target: Option<String>,
}

impl StartAnimation {
    pub fn new(element: &ActionElement) -> Result<StartAnimation, FactoryError> {
        let animation = element
            .attribute("animation")
            .ok_or_else(|| FactoryError::MissingAttribute("animation".into()))?
            .as_string();
        let target = element.attribute("target").map(Var::as_string);
        Ok(StartAnimation { animation, target })
    }
}

impl Action for StartAnimation {
    fn run(&self, graph: &Arc<ViewGraph>) -> bool {
        let center = graph.animation_center();
        let animation = match center.get(&self.animation) {
            Some(animation) => animation,
            None => {
                debug!(animation = %self.animation, "no such animation");
                return false;
            }
        };
        let node = match &self.target {
            Some(target) => match graph.find(target) {
                Some(node) => node.id(),
                None => {
                    debug!(%target, "no such animation target");
                    return false;
                }
            },
            None => graph.root().id(),
        };
        center.start(graph, node, animation)
    }
}

/// Registers every builtin action.
pub fn register(registry: &ActionRegistry) {
    registry.register("outeraction", |element: &ActionElement| {
        Ok(Box::new(Outer::new(element)) as Box<dyn Action>)
    });
    registry.register("updatedata", |element: &ActionElement| {
        Ok(Box::new(UpdateData::new(element)?) as Box<dyn Action>)
    });
    registry.register("animationaction", |element: &ActionElement| {
        Ok(Box::new(StartAnimation::new(element)?) as Box<dyn Action>)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing;
    use petal_core::testing::Fixture;
    use parking_lot::Mutex;
    use petal_core::decl::{GraphDecl, NodeDecl, PluginDecl};
    use petal_core::{ActionListener, ParamsKind, ParamsObject};

    fn button(env: &Fixture, action: PluginDecl) -> Arc<ViewGraph> {
        let graph = GraphDecl::new(
            NodeDecl::new("RelativeLayout")
                .name("root")
                .child(NodeDecl::new("Button").name("button").action(action))
                .child(NodeDecl::new("TextView").name("label").bind("title", "text")),
        )
        .animation("fade_out", PluginDecl::new("alphaanimation").attribute("toAlpha", 0))
        .build(&env.request("screen"));
        let graph = Arc::new(graph);
        env.binder.add_view(&graph);
        graph
    }

    fn click(graph: &Arc<ViewGraph>) -> bool {
        let button = graph.find("button").unwrap().id();
        graph.perform_action(button)
    }

    #[test]
    fn test_outer_action() {
        let env = testing::fixture();
        let graph = button(
            &env,
            PluginDecl::new("OuterAction").attribute("key", "open").attribute("value", "details"),
        );

        // nothing to forward to yet
        assert!(!click(&graph));

        let received = Arc::new(Mutex::new(Vec::new()));
        let received2 = Arc::clone(&received);
        let listener: Arc<dyn ActionListener> = Arc::new(move |key: &str, value: &str| {
            received2.lock().push((key.to_string(), value.to_string()));
        });
        graph.mount(ParamsObject::new(ParamsKind::Relative), Some(listener));

        assert!(click(&graph));
        assert_eq!(*received.lock(), vec![("open".to_string(), "details".to_string())]);
    }

    #[test]
    fn test_outer_action_defaults_to_empty_strings() {
        let outer = Outer::new(&ActionElement::default());
        assert_eq!(outer.key, "");
        assert_eq!(outer.value, "");
    }

    #[test]
    fn test_update_data() {
        let env = testing::fixture();
        let graph = button(
            &env,
            PluginDecl::new("updatedata").attribute("key", "title").attribute("value", "Clicked"),
        );

        assert!(click(&graph));
        assert_eq!(env.binder.get("title"), Some(Var::from("Clicked")));
        assert_eq!(graph.find("label").unwrap().attribute("text"), Some(Var::from("Clicked")));
    }

    #[test]
    fn test_update_data_requires_key() {
        let env = testing::fixture();
        let graph = button(&env, PluginDecl::new("updatedata").attribute("value", "x"));
        assert!(!graph.find("button").unwrap().has_action());
        assert!(!click(&graph));
    }

    #[test]
    fn test_animation_action() {
        let env = testing::fixture();
        let graph = button(
            &env,
            PluginDecl::new("animationaction").attribute("animation", "fade_out").attribute("target", "label"),
        );

        assert!(click(&graph));
        assert_eq!(graph.find("label").unwrap().attribute("alpha"), Some(Var::Number(0.)));
        assert_eq!(graph.find("button").unwrap().attribute("alpha"), None);
    }

    #[test]
    fn test_animation_action_defaults_to_root() {
        let env = testing::fixture();
        let graph = button(&env, PluginDecl::new("animationaction").attribute("animation", "fade_out"));
        assert!(click(&graph));
        assert_eq!(graph.root().attribute("alpha"), Some(Var::Number(0.)));
    }

    #[test]
    fn test_animation_action_misses() {
        let env = testing::fixture();
        let graph = button(
            &env,
            PluginDecl::new("animationaction").attribute("animation", "spin"),
        );
        assert!(!click(&graph));

        let graph = button(
            &env,
            PluginDecl::new("animationaction").attribute("animation", "fade_out").attribute("target", "nobody"),
        );
        assert!(!click(&graph));
    }
}
