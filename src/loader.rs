use crate::builtin;
use crate::config::LoaderConfig;
use crate::error::{LoadError, LoaderError};
use crate::pool::WorkerPool;
use crate::screen::{InitOptions, Screen};
use petal_core::{ActionListener, Context, DataMap, Parser, Registries, UiHandle, ViewGraph};
use core::fmt;
use std::sync::Arc;
use tracing::debug;

/// Creates screens that share a parser, a set of registries, and a worker pool.
///
/// # Examples
/// ```
/// use petal::{InitOptions, Loader, LoaderConfig};
/// use petal::decl::{GraphDecl, NodeDecl};
/// use petal::{Context, DataMap, ParseRequest, UiQueue, ViewGraph};
///
/// fn parse(request: &ParseRequest<'_>) -> Option<ViewGraph> {
///     Some(GraphDecl::new(NodeDecl::new("FrameLayout")).build(request))
/// }
///
/// let loader = Loader::with_builtins(LoaderConfig::default(), parse).unwrap();
/// let ui = UiQueue::new();
/// let (screen, graph) = loader
///     .load(
///         "main",
///         InitOptions::default(),
///         &ui.handle(),
///         &Context::default(),
///         "framelayoutparams",
///         DataMap::new(),
///         None,
///     )
///     .unwrap();
/// assert!(!screen.is_empty());
/// assert_eq!(graph.len(), 1);
/// ```
pub struct Loader {
    config: LoaderConfig,
    registries: Arc<Registries>,
    parser: Arc<dyn Parser>,
    pool: Arc<WorkerPool>,
}

impl Loader {
    pub fn new<P: Parser + 'static>(
        config: LoaderConfig,
        registries: Registries,
        parser: P,
    ) -> Result<Loader, LoaderError> {
        let pool = WorkerPool::new(config.worker_threads, &config.thread_name)?;
        debug!(?config, "created loader");
        Ok(Loader {
            config,
            registries: Arc::new(registries),
            parser: Arc::new(parser),
            pool: Arc::new(pool),
        })
    }

    /// Creates a loader with the builtin plugins registered.
    pub fn with_builtins<P: Parser + 'static>(
        config: LoaderConfig,
        parser: P,
    ) -> Result<Loader, LoaderError> {
        Loader::new(config, builtin::registries(), parser)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The registries screens are parsed against. Plugins registered here are visible to screens
    /// initialized afterwards.
    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Creates a new, uninitialized screen.
    pub fn screen(&self) -> Screen {
        Screen::new(
            Arc::clone(&self.pool),
            Arc::clone(&self.parser),
            Arc::clone(&self.registries),
            self.config.load_timeout,
        )
    }

    /// Initializes a new screen and loads it right away, blocking until it is ready.
    ///
    /// Must be called on the UI thread.
    #[allow(clippy::too_many_arguments)]
    pub fn load(
        &self,
        markup: &str,
        options: InitOptions,
        ui: &UiHandle,
        parent: &Context,
        param_type: &str,
        data: DataMap,
        listener: Option<Arc<dyn ActionListener>>,
    ) -> Result<(Screen, Arc<ViewGraph>), LoadError> {
        let screen = self.screen();
        screen.initialize(markup, options);
        let graph = screen.load(ui, parent, param_type, data, listener)?;
        Ok((screen, graph))
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Loader")
            .field("config", &self.config)
            .field("registries", &self.registries)
            .field("threads", &self.pool.threads())
            .finish()
    }
}
