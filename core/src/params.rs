//! Layout parameters.
//!
//! Every node declares the layout parameter kind of the container it lives in; the host declares
//! the kind of the container a loaded screen is attached to. Kinds are a closed set, looked up by
//! name through a [`ParamsRegistry`] which falls back to [`ParamsKind::Relative`] for anything
//! it doesn’t know.

use crate::context::Context;
use crate::error::FactoryError;
use crate::registry::Registry;
use crate::var::Var;
use cgmath::Point2;
use std::collections::HashMap;

/// Known layout parameter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamsKind {
    AbsListView,
    Absolute,
    Frame,
    Linear,
    Margin,
    Relative,
    ViewGroup,
    ViewPager,
    RecyclerView,
}

impl ParamsKind {
    pub const ALL: [ParamsKind; 9] = [
        ParamsKind::AbsListView,
        ParamsKind::Absolute,
        ParamsKind::Frame,
        ParamsKind::Linear,
        ParamsKind::Margin,
        ParamsKind::Relative,
        ParamsKind::ViewGroup,
        ParamsKind::ViewPager,
        ParamsKind::RecyclerView,
    ];

    /// The markup name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            ParamsKind::AbsListView => "abslistviewlayoutparams",
            ParamsKind::Absolute => "absolutelayoutparams",
            ParamsKind::Frame => "framelayoutparams",
            ParamsKind::Linear => "linearlayoutparams",
            ParamsKind::Margin => "marginparams",
            ParamsKind::Relative => "relativelayoutparams",
            ParamsKind::ViewGroup => "viewgroupparams",
            ParamsKind::ViewPager => "viewpagerparams",
            ParamsKind::RecyclerView => "recyclerviewlayoutparams",
        }
    }

    /// Whether this kind carries margins.
    ///
    /// Plain view group and pager parameters only have a size.
    pub fn has_margins(self) -> bool {
        match self {
            ParamsKind::ViewGroup | ParamsKind::ViewPager | ParamsKind::AbsListView => false,
            _ => true,
        }
    }
}

impl Default for ParamsKind {
    fn default() -> ParamsKind {
        ParamsKind::Relative
    }
}

/// A width or height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    MatchParent,
    WrapContent,
    /// Physical pixels.
    Px(f64),
}

impl Dimension {
    /// Parses `match_parent`, `wrap_content`, or a number of density-independent pixels.
    fn parse(value: &Var, density: f64) -> Option<Dimension> {
        match value {
            Var::Number(n) => Some(Dimension::Px(n * density)),
            Var::String(s) => match s.trim().to_lowercase().as_str() {
                "match_parent" | "fill_parent" => Some(Dimension::MatchParent),
                "wrap_content" => Some(Dimension::WrapContent),
                s => s.trim_end_matches("dp").parse::<f64>().ok().map(|n| Dimension::Px(n * density)),
            },
            Var::Bool(_) => None,
        }
    }
}

/// Margins in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Layout parameters of one view, in the terms of its container.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamsObject {
    kind: ParamsKind,
    density: f64,
    pub width: Dimension,
    pub height: Dimension,
    pub margins: Margins,
    /// Linear layout weight.
    pub weight: f64,
    /// Frame and linear layout gravity.
    pub gravity: Option<String>,
    /// Absolute layout position in physical pixels.
    pub position: Point2<f64>,
    /// Relative layout rules, e.g. `below` → `title`.
    pub rules: HashMap<String, String>,
}

impl ParamsObject {
    /// Creates parameters of the given kind at a density of 1.
    pub fn new(kind: ParamsKind) -> ParamsObject {
        ParamsObject {
            kind,
            density: 1.,
            width: Dimension::WrapContent,
            height: Dimension::WrapContent,
            margins: Margins::default(),
            weight: 0.,
            gravity: None,
            position: Point2::new(0., 0.),
            rules: HashMap::new(),
        }
    }

    /// Creates parameters for a container in the given context.
    pub fn with_context(kind: ParamsKind, context: &Context) -> Result<ParamsObject, FactoryError> {
        if !context.density.is_finite() || context.density <= 0. {
            return Err(FactoryError::InvalidDensity(context.density));
        }
        let mut params = ParamsObject::new(kind);
        params.density = context.density;
        Ok(params)
    }

    pub fn kind(&self) -> ParamsKind {
        self.kind
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    /// Applies a markup attribute. Returns false if the attribute doesn’t apply to this kind or
    /// the value couldn’t be parsed.
    pub fn set_attribute(&mut self, key: &str, value: &Var) -> bool {
        let density = self.density;
        let px = || value.as_f64() * density;
        match (key.to_lowercase().as_str(), self.kind) {
            ("width", _) => match Dimension::parse(value, density) {
                Some(dim) => self.width = dim,
                None => return false,
            },
            ("height", _) => match Dimension::parse(value, density) {
                Some(dim) => self.height = dim,
                None => return false,
            },
            ("margin", kind) if kind.has_margins() => {
                let m = px();
                self.margins = Margins {
                    left: m,
                    top: m,
                    right: m,
                    bottom: m,
                };
            }
            ("marginleft", kind) if kind.has_margins() => self.margins.left = px(),
            ("margintop", kind) if kind.has_margins() => self.margins.top = px(),
            ("marginright", kind) if kind.has_margins() => self.margins.right = px(),
            ("marginbottom", kind) if kind.has_margins() => self.margins.bottom = px(),
            ("weight", ParamsKind::Linear) => self.weight = value.as_f64(),
            ("gravity", ParamsKind::Linear) | ("gravity", ParamsKind::Frame) => {
                self.gravity = Some(value.as_string());
            }
            ("x", ParamsKind::Absolute) => self.position.x = px(),
            ("y", ParamsKind::Absolute) => self.position.y = px(),
            (rule, ParamsKind::Relative) if RELATIVE_RULES.iter().any(|r| *r == rule) => {
                self.rules.insert(rule.to_string(), value.as_string());
            }
            _ => return false,
        }
        true
    }
}

const RELATIVE_RULES: [&str; 12] = [
    "above",
    "below",
    "toleftof",
    "torightof",
    "alignleft",
    "aligntop",
    "alignright",
    "alignbottom",
    "alignparentleft",
    "alignparenttop",
    "alignparentright",
    "alignparentbottom",
];

/// Registry of layout parameter kinds.
///
/// Unlike the action and animation registries, resolution never misses: unknown names resolve to
/// the default kind.
#[derive(Debug)]
pub struct ParamsRegistry {
    kinds: Registry<ParamsObject, Context>,
    default: ParamsKind,
}

impl ParamsRegistry {
    /// Creates a registry containing every [`ParamsKind`].
    pub fn new() -> ParamsRegistry {
        let kinds = Registry::new("params");
        for kind in ParamsKind::ALL.iter().copied() {
            kinds.register(kind.name(), move |context: &Context| {
                ParamsObject::with_context(kind, context)
            });
        }
        ParamsRegistry {
            kinds,
            default: ParamsKind::default(),
        }
    }

    /// Registers an alias for a known kind.
    pub fn alias(&self, name: &str, kind: ParamsKind) {
        self.kinds
            .register(name, move |context: &Context| ParamsObject::with_context(kind, context));
    }

    /// Returns the kind registered under `name`, or the default kind.
    pub fn kind_for(&self, name: Option<&str>) -> ParamsKind {
        name.and_then(|name| self.kinds.resolve(name, &Context::default()))
            .map_or(self.default, |params| params.kind())
    }

    /// Constructs parameters for `name` in the given context, falling back to the default kind if
    /// the name is absent or unknown.
    ///
    /// Returns `None` only if construction itself fails.
    pub fn resolve(&self, name: Option<&str>, context: &Context) -> Option<ParamsObject> {
        match name {
            Some(name) if self.kinds.contains(name) => self.kinds.resolve(name, context),
            _ => self.kinds.resolve(self.default.name(), context),
        }
    }
}

impl Default for ParamsRegistry {
    fn default() -> ParamsRegistry {
        ParamsRegistry::new()
    }
}
