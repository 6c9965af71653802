//! Builtin animations.
//!
//! Each animation knows its end state and writes it onto the node it is started on:
//!
//! | animation | attributes written |
//! |---|---|
//! | `alphaanimation` | `alpha` |
//! | `rotateanimation` | `rotation`, `pivot_x`, `pivot_y` |
//! | `scaleanimation` | `scale_x`, `scale_y`, `pivot_x`, `pivot_y` |
//! | `translateanimation` | `translation_x`, `translation_y` (physical pixels) |
//! | `animationlist` | `background` |
//! | `animationset` | whatever its children write, in order |

use cgmath::{Point2, Vector2};
use petal_core::{Animation, AnimationCenter, AnimationRegistry, FactoryError, Node, Var};
use std::collections::HashMap;
use std::time::Duration;

type Attributes = HashMap<String, Var>;

fn get<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a Var> {
    attributes
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn number(attributes: &Attributes, key: &str) -> Result<Option<f64>, FactoryError> {
    let value = match get(attributes, key) {
        Some(value) => value,
        None => return Ok(None),
    };
    let n = match value {
        Var::Number(n) => *n,
        Var::String(s) => s
            .trim()
            .trim_end_matches("dp")
            .trim_end_matches('%')
            .parse()
            .map_err(|_| invalid(key, value))?,
        Var::Bool(_) => return Err(invalid(key, value)),
    };
    if n.is_finite() {
        Ok(Some(n))
    } else {
        Err(invalid(key, value))
    }
}

fn invalid(key: &str, value: &Var) -> FactoryError {
    FactoryError::InvalidAttribute {
        key: key.to_string(),
        value: value.as_string(),
    }
}

/// Reads `duration`, in milliseconds.
fn duration(attributes: &Attributes, key: &str) -> Result<Option<Duration>, FactoryError> {
    match number(attributes, key)? {
        Some(ms) if ms < 0. => Err(FactoryError::InvalidAttribute {
            key: key.to_string(),
            value: ms.to_string(),
        }),
        Some(ms) => Duration::try_from_secs_f64(ms / 1000.)
            .map(Some)
            .map_err(|_| FactoryError::InvalidAttribute {
                key: key.to_string(),
                value: ms.to_string(),
            }),
        None => Ok(None),
    }
}

fn pivot(attributes: &Attributes, pivot: &mut Point2<f64>) -> Result<(), FactoryError> {
    if let Some(x) = number(attributes, "pivotx")? {
        pivot.x = x;
    }
    if let Some(y) = number(attributes, "pivoty")? {
        pivot.y = y;
    }
    Ok(())
}

fn set_pivot(node: &Node, pivot: Point2<f64>) {
    node.set_attribute("pivot_x", Var::Number(pivot.x));
    node.set_attribute("pivot_y", Var::Number(pivot.y));
}

/// Fades a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Alpha {
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
}

impl Default for Alpha {
    fn default() -> Alpha {
        Alpha {
            from: 1.,
            to: 1.,
            duration: Duration::from_millis(0),
        }
    }
}

impl Animation for Alpha {
    fn name(&self) -> &'static str {
        "alphaanimation"
    }

    fn configure(&mut self, attributes: &Attributes) -> Result<(), FactoryError> {
        if let Some(from) = number(attributes, "fromalpha")? {
            self.from = from.max(0.).min(1.);
        }
        if let Some(to) = number(attributes, "toalpha")? {
            self.to = to.max(0.).min(1.);
        }
        if let Some(duration) = duration(attributes, "duration")? {
            self.duration = duration;
        }
        Ok(())
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn apply(&self, node: &Node) {
        node.set_attribute("alpha", Var::Number(self.to));
    }
}

/// Rotates a node around a pivot, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Rotate {
    pub from: f64,
    pub to: f64,
    pub pivot: Point2<f64>,
    pub duration: Duration,
}

impl Default for Rotate {
    fn default() -> Rotate {
        Rotate {
            from: 0.,
            to: 0.,
            pivot: Point2::new(0., 0.),
            duration: Duration::from_millis(0),
        }
    }
}

impl Animation for Rotate {
    fn name(&self) -> &'static str {
        "rotateanimation"
    }

    fn configure(&mut self, attributes: &Attributes) -> Result<(), FactoryError> {
        if let Some(from) = number(attributes, "fromdegrees")? {
            self.from = from;
        }
        if let Some(to) = number(attributes, "todegrees")? {
            self.to = to;
        }
        pivot(attributes, &mut self.pivot)?;
        if let Some(duration) = duration(attributes, "duration")? {
            self.duration = duration;
        }
        Ok(())
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn apply(&self, node: &Node) {
        node.set_attribute("rotation", Var::Number(self.to));
        set_pivot(node, self.pivot);
    }
}

/// Scales a node around a pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct Scale {
    pub from: Vector2<f64>,
    pub to: Vector2<f64>,
    pub pivot: Point2<f64>,
    pub duration: Duration,
}

impl Default for Scale {
    fn default() -> Scale {
        Scale {
            from: Vector2::new(1., 1.),
            to: Vector2::new(1., 1.),
            pivot: Point2::new(0., 0.),
            duration: Duration::from_millis(0),
        }
    }
}

impl Animation for Scale {
    fn name(&self) -> &'static str {
        "scaleanimation"
    }

    fn configure(&mut self, attributes: &Attributes) -> Result<(), FactoryError> {
        if let Some(x) = number(attributes, "fromxscale")? {
            self.from.x = x;
        }
        if let Some(y) = number(attributes, "fromyscale")? {
            self.from.y = y;
        }
        if let Some(x) = number(attributes, "toxscale")? {
            self.to.x = x;
        }
        if let Some(y) = number(attributes, "toyscale")? {
            self.to.y = y;
        }
        pivot(attributes, &mut self.pivot)?;
        if let Some(duration) = duration(attributes, "duration")? {
            self.duration = duration;
        }
        Ok(())
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn apply(&self, node: &Node) {
        node.set_attribute("scale_x", Var::Number(self.to.x));
        node.set_attribute("scale_y", Var::Number(self.to.y));
        set_pivot(node, self.pivot);
    }
}

/// Moves a node. Deltas are given in density-independent pixels and stored in physical pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct Translate {
    density: f64,
    pub from: Vector2<f64>,
    pub to: Vector2<f64>,
    pub duration: Duration,
}

impl Translate {
    pub fn new(density: f64) -> Result<Translate, FactoryError> {
        if !density.is_finite() || density <= 0. {
            return Err(FactoryError::InvalidDensity(density));
        }
        Ok(Translate {
            density,
            from: Vector2::new(0., 0.),
            to: Vector2::new(0., 0.),
            duration: Duration::from_millis(0),
        })
    }
}

impl Animation for Translate {
    fn name(&self) -> &'static str {
        "translateanimation"
    }

    fn configure(&mut self, attributes: &Attributes) -> Result<(), FactoryError> {
        let density = self.density;
        let px = |key: &str| number(attributes, key).map(|n| n.map(|n| n * density));
        if let Some(x) = px("fromxdelta")? {
            self.from.x = x;
        }
        if let Some(y) = px("fromydelta")? {
            self.from.y = y;
        }
        if let Some(x) = px("toxdelta")? {
            self.to.x = x;
        }
        if let Some(y) = px("toydelta")? {
            self.to.y = y;
        }
        if let Some(duration) = duration(attributes, "duration")? {
            self.duration = duration;
        }
        Ok(())
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn apply(&self, node: &Node) {
        node.set_attribute("translation_x", Var::Number(self.to.x));
        node.set_attribute("translation_y", Var::Number(self.to.y));
    }
}

/// Plays nested animations together.
#[derive(Debug, Default)]
pub struct Set {
    children: Vec<Box<dyn Animation>>,
    /// Overrides the children’s durations if set.
    duration: Option<Duration>,
}

impl Set {
    pub fn children(&self) -> &[Box<dyn Animation>] {
        &self.children
    }
}

impl Animation for Set {
    fn name(&self) -> &'static str {
        "animationset"
    }

    fn configure(&mut self, attributes: &Attributes) -> Result<(), FactoryError> {
        self.duration = duration(attributes, "duration")?;
        Ok(())
    }

    fn add_child(&mut self, child: Box<dyn Animation>) -> bool {
        self.children.push(child);
        true
    }

    fn duration(&self) -> Duration {
        match self.duration {
            Some(duration) => duration,
            None => self
                .children
                .iter()
                .map(|child| child.duration())
                .max()
                .unwrap_or_default(),
        }
    }

    fn apply(&self, node: &Node) {
        for child in &self.children {
            child.apply(node);
        }
    }
}

/// Frame-by-frame animation through a list of drawables.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameList {
    pub frames: Vec<String>,
    pub frame_duration: Duration,
    pub one_shot: bool,
}

impl Default for FrameList {
    fn default() -> FrameList {
        FrameList {
            frames: Vec::new(),
            frame_duration: Duration::from_millis(100),
            one_shot: false,
        }
    }
}

impl Animation for FrameList {
    fn name(&self) -> &'static str {
        "animationlist"
    }

    fn configure(&mut self, attributes: &Attributes) -> Result<(), FactoryError> {
        let frames = get(attributes, "frames")
            .ok_or_else(|| FactoryError::MissingAttribute("frames".into()))?
            .as_string();
        self.frames = frames
            .split(',')
            .map(str::trim)
            .filter(|frame| !frame.is_empty())
            .map(str::to_string)
            .collect();
        if self.frames.is_empty() {
            return Err(FactoryError::InvalidAttribute {
                key: "frames".into(),
                value: frames,
            });
        }

        if let Some(duration) = duration(attributes, "duration")? {
            self.frame_duration = duration;
        }
        if let Some(one_shot) = get(attributes, "oneshot") {
            self.one_shot = one_shot.as_bool();
        }
        Ok(())
    }

    fn duration(&self) -> Duration {
        u32::try_from(self.frames.len())
            .ok()
            .and_then(|frames| self.frame_duration.checked_mul(frames))
            .unwrap_or(Duration::MAX)
    }

    fn apply(&self, node: &Node) {
        // a looping list has no end state; show the first frame
        let frame = if self.one_shot {
            self.frames.last()
        } else {
            self.frames.first()
        };
        if let Some(frame) = frame {
            node.set_attribute("background", Var::String(frame.clone()));
        }
    }
}

/// Registers every builtin animation.
pub fn register(registry: &AnimationRegistry) {
    registry.register("alphaanimation", |_: &AnimationCenter| {
        Ok(Box::new(Alpha::default()) as Box<dyn Animation>)
    });
    registry.register("animationset", |_: &AnimationCenter| {
        Ok(Box::new(Set::default()) as Box<dyn Animation>)
    });
    registry.register("rotateanimation", |_: &AnimationCenter| {
        Ok(Box::new(Rotate::default()) as Box<dyn Animation>)
    });
    registry.register("scaleanimation", |_: &AnimationCenter| {
        Ok(Box::new(Scale::default()) as Box<dyn Animation>)
    });
    registry.register("translateanimation", |center: &AnimationCenter| {
        Ok(Box::new(Translate::new(center.context().density)?) as Box<dyn Animation>)
    });
    registry.register("animationlist", |_: &AnimationCenter| {
        Ok(Box::new(FrameList::default()) as Box<dyn Animation>)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::testing;
    use petal_core::testing::Fixture;
    use petal_core::decl::{GraphDecl, NodeDecl, PluginDecl};
    use petal_core::{Context, ViewGraph};
    use std::sync::Arc;

    fn animated(env: &Fixture, animation: PluginDecl) -> Arc<ViewGraph> {
        let graph = GraphDecl::new(
            NodeDecl::new("FrameLayout").child(NodeDecl::new("ImageView").name("image").animation(animation)),
        )
        .build(&env.request("screen"));
        Arc::new(graph)
    }

    fn start(graph: &Arc<ViewGraph>) -> bool {
        let image = graph.find("image").unwrap().id();
        graph.start_animation(image)
    }

    fn attribute(graph: &ViewGraph, key: &str) -> Option<f64> {
        graph.find("image").unwrap().attribute(key).map(|v| v.as_f64())
    }

    #[test]
    fn test_alpha() {
        let env = testing::fixture();
        let graph = animated(
            &env,
            PluginDecl::new("AlphaAnimation")
                .attribute("fromAlpha", 0.)
                .attribute("toAlpha", "0.5")
                .attribute("duration", 300),
        );
        assert!(start(&graph));
        assert_eq!(attribute(&graph, "alpha"), Some(0.5));
    }

    #[test]
    fn test_translate_uses_density() {
        let env = testing::with_context(Context {
            density: 2.,
            ..Context::default()
        });
        let graph = animated(
            &env,
            PluginDecl::new("translateanimation")
                .attribute("toXDelta", "10dp")
                .attribute("toYDelta", -4),
        );
        assert!(start(&graph));
        assert_eq!(attribute(&graph, "translation_x"), Some(20.));
        assert_eq!(attribute(&graph, "translation_y"), Some(-8.));
    }

    #[test]
    fn test_set_applies_children_in_order() {
        let env = testing::fixture();
        let graph = animated(
            &env,
            PluginDecl::new("animationset")
                .child(PluginDecl::new("rotateanimation").attribute("toDegrees", 90).attribute("duration", 200))
                .child(
                    PluginDecl::new("scaleanimation")
                        .attribute("toXScale", 2)
                        .attribute("pivotX", 5)
                        .attribute("duration", 400),
                )
                .child(PluginDecl::new("nosuchanimation")),
        );
        assert!(start(&graph));
        assert_eq!(attribute(&graph, "rotation"), Some(90.));
        assert_eq!(attribute(&graph, "scale_x"), Some(2.));
        assert_eq!(attribute(&graph, "scale_y"), Some(1.));
        // the scale pivot was applied last
        assert_eq!(attribute(&graph, "pivot_x"), Some(5.));
    }

    #[test]
    fn test_set_duration() {
        let mut set = Set::default();
        set.configure(&Attributes::new()).unwrap();
        let mut alpha = Alpha::default();
        alpha.duration = Duration::from_millis(300);
        let mut rotate = Rotate::default();
        rotate.duration = Duration::from_millis(500);
        assert!(set.add_child(Box::new(alpha)));
        assert!(set.add_child(Box::new(rotate)));
        assert_eq!(set.duration(), Duration::from_millis(500));
        assert_eq!(set.children().len(), 2);

        let mut attributes = Attributes::new();
        attributes.insert("duration".into(), Var::Number(100.));
        set.configure(&attributes).unwrap();
        assert_eq!(set.duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_frame_list() {
        let env = testing::fixture();
        let graph = animated(
            &env,
            PluginDecl::new("animationlist")
                .attribute("frames", "walk_1, walk_2,walk_3")
                .attribute("oneShot", true)
                .attribute("duration", 50),
        );
        assert!(start(&graph));
        assert_eq!(
            graph.find("image").unwrap().attribute("background"),
            Some(Var::from("walk_3"))
        );
    }

    #[test]
    fn test_invalid_attributes_are_rejected() {
        let mut frames = FrameList::default();
        assert_eq!(
            frames.configure(&Attributes::new()),
            Err(FactoryError::MissingAttribute("frames".into()))
        );

        let mut alpha = Alpha::default();
        let mut attributes = Attributes::new();
        attributes.insert("duration".into(), Var::from("soon"));
        assert!(alpha.configure(&attributes).is_err());

        // misconfigured animations are dropped while building
        let env = testing::fixture();
        let graph = animated(&env, PluginDecl::new("animationlist"));
        assert!(!graph.find("image").unwrap().has_animation());
        assert!(!start(&graph));
    }

    #[test]
    fn test_huge_duration_is_rejected() {
        let mut alpha = Alpha::default();
        let mut attributes = Attributes::new();
        attributes.insert("duration".into(), Var::Number(1e300));
        assert_eq!(
            alpha.configure(&attributes),
            Err(FactoryError::InvalidAttribute {
                key: "duration".into(),
                value: 1e300.to_string(),
            })
        );

        let env = testing::fixture();
        let graph = animated(
            &env,
            PluginDecl::new("alphaanimation").attribute("toAlpha", 0.5).attribute("duration", 1e300),
        );
        assert_eq!(graph.len(), 2);
        assert!(!graph.find("image").unwrap().has_animation());
    }

    #[test]
    fn test_frame_list_duration_saturates() {
        let mut frames = FrameList::default();
        let mut attributes = Attributes::new();
        attributes.insert("frames".into(), Var::from("a,b,c"));
        attributes.insert("duration".into(), Var::Number(1e22));
        frames.configure(&attributes).unwrap();
        assert_eq!(frames.duration(), Duration::MAX);

        let mut set = Set::default();
        assert!(set.add_child(Box::new(frames)));
        assert_eq!(set.duration(), Duration::MAX);

        let short = FrameList {
            frames: vec!["a".into(), "b".into()],
            frame_duration: Duration::from_millis(40),
            one_shot: true,
        };
        assert_eq!(short.duration(), Duration::from_millis(80));
    }

    #[test]
    fn test_translate_rejects_bad_density() {
        assert_eq!(Translate::new(0.), Err(FactoryError::InvalidDensity(0.)));
    }
}
