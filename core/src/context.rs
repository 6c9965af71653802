use core::any::Any;
use core::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Host environment a screen is initialized or displayed in.
///
/// Contexts are cheap to clone and carry no UI-thread-bound state, so they may be sent to the
/// background initialization job.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    /// Physical pixels per density-independent pixel.
    pub density: f64,
    /// Where the parser should look for markup files, if anywhere in particular.
    pub resource_root: Option<PathBuf>,
}

impl Default for Context {
    fn default() -> Context {
        Context {
            density: 1.,
            resource_root: None,
        }
    }
}

/// Script globals supplied by the host, opaque to everything but the scripting bridge.
pub type ScriptGlobals = Arc<dyn Any + Send + Sync>;

/// The scripting environment a screen’s markup runs against.
#[derive(Clone)]
pub struct ScriptEnv {
    instance_id: String,
    restricted: bool,
    globals: Option<ScriptGlobals>,
}

impl ScriptEnv {
    /// Creates an environment; `globals` is shared with the host if given.
    pub fn new(instance_id: &str, restricted: bool, globals: Option<ScriptGlobals>) -> ScriptEnv {
        ScriptEnv {
            instance_id: instance_id.to_string(),
            restricted,
            globals,
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Downcasts the host globals.
    pub fn globals<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.globals.as_ref().and_then(|globals| globals.downcast_ref::<T>())
    }
}

impl fmt::Debug for ScriptEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ScriptEnv")
            .field("instance_id", &self.instance_id)
            .field("restricted", &self.restricted)
            .field("globals", &self.globals.as_ref().map(|_| ".."))
            .finish()
    }
}
