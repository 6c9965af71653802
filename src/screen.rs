//! The two-phase screen lifecycle.

use crate::error::LoadError;
use crate::latch::{Latch, Signal};
use crate::pool::WorkerPool;
use petal_core::{
    ActionListener, AnimationCenter, Context, DataBinder, DataMap, HookType, ParseRequest, Parser,
    Registries, ScriptEnv, ScriptGlobals, TaskCenter, UiHandle, ViewGraph,
};
use core::fmt;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info_span, warn};

/// Called on the worker thread once a screen has been initialized successfully.
pub type InitDone = Box<dyn FnOnce() + Send>;

/// Options for [`Screen::initialize`].
pub struct InitOptions {
    pub context: Context,
    pub instance_id: String,
    pub script_globals: Option<ScriptGlobals>,
    pub restricted: bool,
    /// Data the screen’s binder starts out with. Ignored if `binder` is set.
    pub initial_data: DataMap,
    /// A binder to share with other screens.
    pub binder: Option<Arc<DataBinder>>,
    /// Parser environment.
    pub env: HashMap<String, String>,
    pub on_done: Option<InitDone>,
}

impl InitOptions {
    pub fn new(context: Context) -> InitOptions {
        InitOptions {
            context,
            instance_id: String::new(),
            script_globals: None,
            restricted: false,
            initial_data: DataMap::new(),
            binder: None,
            env: HashMap::new(),
            on_done: None,
        }
    }

    pub fn instance_id(mut self, id: &str) -> InitOptions {
        self.instance_id = id.to_string();
        self
    }

    pub fn script_globals(mut self, globals: ScriptGlobals) -> InitOptions {
        self.script_globals = Some(globals);
        self
    }

    pub fn restricted(mut self, restricted: bool) -> InitOptions {
        self.restricted = restricted;
        self
    }

    pub fn initial_data(mut self, data: DataMap) -> InitOptions {
        self.initial_data = data;
        self
    }

    pub fn binder(mut self, binder: Arc<DataBinder>) -> InitOptions {
        self.binder = Some(binder);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> InitOptions {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn on_done<F: FnOnce() + Send + 'static>(mut self, on_done: F) -> InitOptions {
        self.on_done = Some(Box::new(on_done));
        self
    }
}

impl Default for InitOptions {
    fn default() -> InitOptions {
        InitOptions::new(Context::default())
    }
}

impl fmt::Debug for InitOptions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("InitOptions")
            .field("context", &self.context)
            .field("instance_id", &self.instance_id)
            .field("restricted", &self.restricted)
            .field("initial_data", &self.initial_data)
            .field("binder", &self.binder.is_some())
            .field("env", &self.env)
            .finish()
    }
}

struct Phase {
    called_initialize: bool,
    called_load: bool,
    /// Taken by the initialization job; dropping it releases `Shared::initialized`.
    signal: Option<Signal>,
}

struct Shared {
    phase: Mutex<Phase>,
    initialized: Latch,
    view: RwLock<Option<Arc<ViewGraph>>>,
}

/// One screen: markup that is parsed in the background and then loaded on the UI thread.
///
/// [`initialize`](Screen::initialize) may be called from any thread and returns right away.
/// [`load`](Screen::load) must be called on the UI thread, and blocks until initialization has
/// finished. Both run at most once; repeated calls are harmless.
pub struct Screen {
    shared: Arc<Shared>,
    pool: Arc<WorkerPool>,
    parser: Arc<dyn Parser>,
    registries: Arc<Registries>,
    load_timeout: Option<Duration>,
}

impl Screen {
    pub(crate) fn new(
        pool: Arc<WorkerPool>,
        parser: Arc<dyn Parser>,
        registries: Arc<Registries>,
        load_timeout: Option<Duration>,
    ) -> Screen {
        let (initialized, signal) = Latch::new();
        Screen {
            shared: Arc::new(Shared {
                phase: Mutex::new(Phase {
                    called_initialize: false,
                    called_load: false,
                    signal: Some(signal),
                }),
                initialized,
                view: RwLock::new(None),
            }),
            pool,
            parser,
            registries,
            load_timeout,
        }
    }

    /// Starts parsing `markup` on a worker thread.
    ///
    /// Only the first call does anything. If the screen is dropped before the job finishes, the
    /// resulting graph is discarded and `on_done` isn’t called.
    pub fn initialize(&self, markup: &str, options: InitOptions) {
        let signal = {
            let mut phase = self.shared.phase.lock();
            if phase.called_initialize {
                debug!(markup, "screen already initialized");
                return;
            }
            phase.called_initialize = true;
            phase.signal.take()
        };

        let shared = Arc::downgrade(&self.shared);
        let parser = Arc::clone(&self.parser);
        let registries = Arc::clone(&self.registries);
        let markup = markup.to_string();

        let span = info_span!("initialize", %markup, instance = %options.instance_id);
        let _guard = span.enter();
        debug!("scheduling initialization");
        self.pool.execute(move || {
            // released when the job ends, however it ends
            let _signal = signal;
            initialize_job(shared, &*parser, &registries, &markup, options);
        });
    }

    /// Loads the screen into a container.
    ///
    /// Waits for initialization to finish, then mounts the container’s layout parameters (of kind
    /// `param_type`, resolved against `parent`) and `listener`, applies `data`, and runs the
    /// screen’s data-initialize and load-finish tasks, in that order.
    ///
    /// Calling this again after it succeeded returns the same graph without doing anything else.
    pub fn load(
        &self,
        ui: &UiHandle,
        parent: &Context,
        param_type: &str,
        data: DataMap,
        listener: Option<Arc<dyn ActionListener>>,
    ) -> Result<Arc<ViewGraph>, LoadError> {
        {
            let mut phase = self.shared.phase.lock();
            if !phase.called_initialize {
                warn!(param_type, "load called before initialize");
                return Err(LoadError::NotInitialized);
            }
            if phase.called_load {
                return self.view().ok_or(LoadError::EmptyView);
            }
            phase.called_load = true;
        }

        if !self.wait_initialized() {
            warn!(timeout = ?self.load_timeout, "timed out waiting for initialization");
            self.shared.phase.lock().called_load = false;
            return Err(LoadError::TimedOut);
        }

        let graph = self.view().ok_or(LoadError::EmptyView)?;

        let params = match self.registries.params.resolve(Some(param_type), parent) {
            Some(params) => params,
            None => {
                warn!(param_type, "no layout parameters for parent");
                self.shared.phase.lock().called_load = false;
                return Err(LoadError::ParamsUnavailable);
            }
        };

        graph.animation_center().set_ui_handle(ui.clone());
        graph.mount(params, listener);

        let binder = graph.binder();
        for (key, value) in data {
            binder.update(key, value);
        }
        binder.set_ui_handle(ui.clone());
        binder.set_loaded();

        let task_center = graph.task_center();
        task_center.notify(HookType::DataInitialize, "");
        task_center.notify(HookType::LoadFinish, "");
        graph.on_load_finish();

        debug!(nodes = graph.len(), "screen loaded");
        Ok(graph)
    }

    fn wait_initialized(&self) -> bool {
        match self.load_timeout {
            Some(timeout) => self.shared.initialized.wait_timeout(timeout),
            None => {
                self.shared.initialized.wait();
                true
            }
        }
    }

    /// Returns true if the screen has no view graph (yet).
    pub fn is_empty(&self) -> bool {
        self.shared.view.read().is_none()
    }

    /// Returns true once initialization has finished, successfully or not.
    pub fn is_initialized(&self) -> bool {
        self.shared.initialized.is_released()
    }

    pub fn view(&self) -> Option<Arc<ViewGraph>> {
        self.shared.view.read().clone()
    }

    /// Tells the screen that its view (or the part of it named by `value`) was shown, running the
    /// matching view-show tasks. Returns how many ran.
    ///
    /// Does nothing until the screen has been loaded. Must be called on the UI thread.
    pub fn show(&self, value: &str) -> usize {
        match self.view() {
            Some(graph) if graph.is_loaded() => graph.task_center().notify(HookType::ViewShow, value),
            _ => 0,
        }
    }
}

fn initialize_job(
    shared: Weak<Shared>,
    parser: &dyn Parser,
    registries: &Registries,
    markup: &str,
    options: InitOptions,
) {
    if shared.strong_count() == 0 {
        debug!("screen dropped before initialization started");
        return;
    }

    let InitOptions {
        context,
        instance_id,
        script_globals,
        restricted,
        initial_data,
        binder,
        env,
        on_done,
    } = options;

    let binder = binder.unwrap_or_else(|| Arc::new(DataBinder::new(initial_data)));
    let task_center = Arc::new(TaskCenter::new(restricted));
    let script_env = ScriptEnv::new(&instance_id, restricted, script_globals);
    let animation_center = Arc::new(AnimationCenter::new(context.clone()));

    let graph = parser.parse(&ParseRequest {
        context: &context,
        instance_id: &instance_id,
        restricted,
        markup,
        env: &env,
        script_env: &script_env,
        task_center: &task_center,
        animation_center: &animation_center,
        binder: &binder,
        registries,
    });
    let graph = match graph {
        Some(graph) => Arc::new(graph),
        None => {
            warn!("parser produced no view");
            return;
        }
    };

    let shared = match shared.upgrade() {
        Some(shared) => shared,
        None => {
            debug!("screen dropped during initialization; discarding view");
            return;
        }
    };

    graph.task_center().attach(&graph);
    graph.binder().add_view(&graph);
    *shared.view.write() = Some(graph);
    drop(shared);

    debug!("initialized");
    if let Some(on_done) = on_done {
        on_done();
    }
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let phase = self.shared.phase.lock();
        f.debug_struct("Screen")
            .field("called_initialize", &phase.called_initialize)
            .field("called_load", &phase.called_load)
            .field("initialized", &self.shared.initialized.is_released())
            .field("view", &self.shared.view.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crossbeam::channel::{self, Receiver};
    use petal_core::decl::{GraphDecl, NodeDecl, PluginDecl, TaskDecl};
    use petal_core::{Action, ActionElement, FactoryError, ParamsKind, UiQueue, Var};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn two_nodes(request: &ParseRequest<'_>) -> Option<ViewGraph> {
        let decl = GraphDecl::new(
            NodeDecl::new("LinearLayout")
                .name("root")
                .child(NodeDecl::new("TextView").name("text").bind("text_1", "text")),
        );
        Some(decl.build(request))
    }

    fn nothing(_: &ParseRequest<'_>) -> Option<ViewGraph> {
        None
    }

    /// Counts how often it parses.
    struct Counting(Arc<AtomicUsize>);

    impl Parser for Counting {
        fn parse(&self, request: &ParseRequest<'_>) -> Option<ViewGraph> {
            self.0.fetch_add(1, Ordering::SeqCst);
            two_nodes(request)
        }
    }

    /// Reports that it started, then parses once the gate is opened (or dropped).
    struct Gated {
        started: channel::Sender<()>,
        gate: Receiver<()>,
        build: fn(&ParseRequest<'_>) -> Option<ViewGraph>,
    }

    impl Parser for Gated {
        fn parse(&self, request: &ParseRequest<'_>) -> Option<ViewGraph> {
            let _ = self.started.send(());
            let _ = self.gate.recv();
            (self.build)(request)
        }
    }

    fn gated() -> (Gated, Receiver<()>, channel::Sender<()>) {
        gated_with(two_nodes)
    }

    fn gated_with(
        build: fn(&ParseRequest<'_>) -> Option<ViewGraph>,
    ) -> (Gated, Receiver<()>, channel::Sender<()>) {
        let (started, started_recv) = channel::unbounded();
        let (gate_sender, gate) = channel::unbounded();
        (Gated { started, gate, build }, started_recv, gate_sender)
    }

    struct Harness {
        pool: Arc<WorkerPool>,
        registries: Arc<Registries>,
    }

    impl Harness {
        fn new() -> Harness {
            Harness {
                pool: Arc::new(WorkerPool::new(2, "screen-test").unwrap()),
                registries: Arc::new(builtin::registries()),
            }
        }

        fn screen(&self, parser: impl Parser + 'static, timeout: Option<Duration>) -> Screen {
            Screen::new(
                Arc::clone(&self.pool),
                Arc::new(parser),
                Arc::clone(&self.registries),
                timeout,
            )
        }
    }

    fn load(screen: &Screen, queue: &UiQueue, data: DataMap) -> Result<Arc<ViewGraph>, LoadError> {
        screen.load(&queue.handle(), &Context::default(), "FrameLayoutParams", data, None)
    }

    fn text_of(graph: &ViewGraph) -> Option<Var> {
        graph.find("text").and_then(|node| node.attribute("text"))
    }

    #[test]
    fn test_initialize_then_load() {
        let harness = Harness::new();
        let screen = harness.screen(two_nodes, None);
        let queue = UiQueue::new();
        assert!(screen.is_empty());

        screen.initialize("main", InitOptions::default());
        let mut data = DataMap::new();
        data.insert("text_1".into(), "hello".into());
        let graph = load(&screen, &queue, data).unwrap();

        assert!(!screen.is_empty());
        assert!(screen.is_initialized());
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.params().map(|p| p.kind()), Some(ParamsKind::Frame));
        assert_eq!(graph.binder().get("text_1"), Some(Var::from("hello")));
        assert!(graph.binder().is_loaded());
        assert!(graph.is_loaded());
        assert_eq!(text_of(&graph), Some(Var::from("hello")));
    }

    fn counted_loads(request: &ParseRequest<'_>) -> Option<ViewGraph> {
        let decl = GraphDecl::new(NodeDecl::new("FrameLayout"))
            .task(TaskDecl::new(HookType::LoadFinish).action(PluginDecl::new("countload")));
        Some(decl.build(request))
    }

    #[test]
    fn test_second_load_returns_same_graph() {
        let harness = Harness::new();
        let loads = register_countload(&harness);
        let screen = harness.screen(counted_loads, None);
        let queue = UiQueue::new();
        screen.initialize("main", InitOptions::default());

        let first = load(&screen, &queue, DataMap::new()).unwrap();
        let second = load(&screen, &queue, DataMap::new()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    fn register_countload(harness: &Harness) -> Arc<AtomicUsize> {
        let loads = Arc::new(AtomicUsize::new(0));
        let loads2 = Arc::clone(&loads);
        harness.registries.actions.register("countload", move |_: &ActionElement| {
            Ok(Box::new(CountLoad(Arc::clone(&loads2))) as Box<dyn Action>)
        });
        loads
    }

    #[test]
    fn test_load_while_another_load_waits() {
        let harness = Harness::new();
        let loads = register_countload(&harness);
        let (parser, started, gate) = gated_with(counted_loads);
        let screen = harness.screen(parser, None);
        screen.initialize("main", InitOptions::default());
        started.recv().unwrap();

        let queue = UiQueue::new();
        let first = thread::scope(|scope| {
            let screen = &screen;
            scope.spawn(move || {
                while !screen.shared.phase.lock().called_load {
                    thread::sleep(Duration::from_millis(1));
                }
                let opener = thread::spawn(move || {
                    thread::sleep(Duration::from_millis(200));
                    gate.send(()).unwrap();
                });

                // doesn't wait for initialization, and nothing has been stored yet
                let other = UiQueue::new();
                let result = load(screen, &other, DataMap::new());
                assert_eq!(result.unwrap_err(), LoadError::EmptyView);
                opener.join().unwrap();
            });
            load(screen, &queue, DataMap::new())
        })
        .unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        let again = load(&screen, &queue, DataMap::new()).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_screens_sharing_a_binder() {
        let harness = Harness::new();
        let binder = Arc::new(DataBinder::default());
        binder.update("text_1", "shared");
        let queue = UiQueue::new();

        let mut ignored = DataMap::new();
        ignored.insert("text_1".into(), "ignored".into());
        let a = harness.screen(two_nodes, None);
        let b = harness.screen(two_nodes, None);
        a.initialize("a", InitOptions::default().binder(Arc::clone(&binder)));
        b.initialize(
            "b",
            InitOptions::default().binder(Arc::clone(&binder)).initial_data(ignored),
        );
        let a = load(&a, &queue, DataMap::new()).unwrap();
        let b = load(&b, &queue, DataMap::new()).unwrap();

        assert!(Arc::ptr_eq(a.binder(), &binder));
        assert!(Arc::ptr_eq(b.binder(), &binder));
        assert_eq!(text_of(&a), Some(Var::from("shared")));
        assert_eq!(text_of(&b), Some(Var::from("shared")));

        binder.update("text_1", "both");
        assert_eq!(text_of(&a), Some(Var::from("both")));
        assert_eq!(text_of(&b), Some(Var::from("both")));
    }

    #[derive(Debug)]
    struct CountLoad(Arc<AtomicUsize>);

    impl Action for CountLoad {
        fn run(&self, _: &Arc<ViewGraph>) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[test]
    fn test_parser_miss_leaves_screen_empty() {
        let harness = Harness::new();
        let screen = harness.screen(nothing, None);
        let queue = UiQueue::new();

        let (done, done_recv) = channel::unbounded();
        screen.initialize("missing", InitOptions::default().on_done(move || done.send(()).unwrap()));
        assert!(screen.is_empty());
        assert_eq!(load(&screen, &queue, DataMap::new()).unwrap_err(), LoadError::EmptyView);
        assert!(screen.is_empty());
        assert!(screen.is_initialized());
        // on_done only runs on success
        assert!(done_recv.try_recv().is_err());
    }

    #[test]
    fn test_load_before_initialize() {
        let harness = Harness::new();
        let screen = harness.screen(two_nodes, None);
        let queue = UiQueue::new();

        assert_eq!(
            load(&screen, &queue, DataMap::new()).unwrap_err(),
            LoadError::NotInitialized
        );

        // nothing changed: the screen can still be initialized and loaded normally
        screen.initialize("main", InitOptions::default());
        assert!(load(&screen, &queue, DataMap::new()).is_ok());
    }

    #[test]
    fn test_concurrent_initialize_parses_once() {
        let harness = Harness::new();
        let count = Arc::new(AtomicUsize::new(0));
        let screen = harness.screen(Counting(Arc::clone(&count)), None);

        thread::scope(|scope| {
            for i in 0..8 {
                let screen = &screen;
                scope.spawn(move || {
                    screen.initialize("main", InitOptions::default().instance_id(&i.to_string()));
                });
            }
        });

        let queue = UiQueue::new();
        assert!(load(&screen, &queue, DataMap::new()).is_ok());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_waits_for_initialization() {
        let harness = Harness::new();
        let (parser, started, gate) = gated();
        let screen = harness.screen(parser, None);
        let queue = UiQueue::new();

        screen.initialize("main", InitOptions::default());
        started.recv().unwrap();
        assert!(!screen.is_initialized());

        let opener = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            gate.send(()).unwrap();
        });
        let graph = load(&screen, &queue, DataMap::new()).unwrap();
        opener.join().unwrap();
        assert!(graph.is_loaded());
    }

    #[test]
    fn test_load_timeout_rolls_back() {
        let harness = Harness::new();
        let (parser, started, gate) = gated();
        let screen = harness.screen(parser, Some(Duration::from_millis(100)));
        let queue = UiQueue::new();

        let (done, done_recv) = channel::unbounded();
        screen.initialize("main", InitOptions::default().on_done(move || done.send(()).unwrap()));
        started.recv().unwrap();
        assert_eq!(load(&screen, &queue, DataMap::new()).unwrap_err(), LoadError::TimedOut);

        gate.send(()).unwrap();
        done_recv.recv().unwrap();
        let graph = load(&screen, &queue, DataMap::new()).unwrap();
        assert!(graph.is_loaded());
    }

    #[test]
    fn test_data_is_visible_before_tasks_run() {
        let harness = Harness::new();
        let (screen, log) = logged_screen(&harness);

        let queue = UiQueue::new();
        screen.initialize("main", InitOptions::default());
        let mut data = DataMap::new();
        data.insert("text_1".into(), "hello".into());
        load(&screen, &queue, data).unwrap();

        assert_eq!(*log.lock(), vec!["data:hello", "finish:hello", "hook"]);
    }

    fn logged_screen(harness: &Harness) -> (Screen, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let action_log = Arc::clone(&log);
        harness.registries.actions.register("logtext", move |element: &ActionElement| {
            let tag = element
                .attribute("tag")
                .ok_or_else(|| FactoryError::MissingAttribute("tag".into()))?;
            Ok(Box::new(LogText {
                tag: tag.as_string(),
                log: Arc::clone(&action_log),
            }) as Box<dyn Action>)
        });
        (harness.screen(Logged(Arc::clone(&log)), None), log)
    }

    #[test]
    fn test_show_runs_view_show_tasks() {
        let harness = Harness::new();
        let (screen, log) = logged_screen(&harness);
        let queue = UiQueue::new();
        assert_eq!(screen.show("details"), 0);

        screen.initialize("main", InitOptions::default());
        // initialized but not loaded yet
        while !screen.is_initialized() {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(screen.show("details"), 0);

        let mut data = DataMap::new();
        data.insert("text_1".into(), "hello".into());
        load(&screen, &queue, data).unwrap();
        log.lock().clear();

        assert_eq!(screen.show("summary"), 0);
        assert_eq!(screen.show("details"), 1);
        assert_eq!(*log.lock(), vec!["shown:hello"]);
    }

    /// Two nodes whose tasks and load hook log what the text node shows.
    struct Logged(Arc<Mutex<Vec<String>>>);

    impl Parser for Logged {
        fn parse(&self, request: &ParseRequest<'_>) -> Option<ViewGraph> {
            let graph = GraphDecl::new(
                NodeDecl::new("LinearLayout")
                    .child(NodeDecl::new("TextView").name("text").bind("text_1", "text")),
            )
            .task(
                TaskDecl::new(HookType::LoadFinish)
                    .action(PluginDecl::new("logtext").attribute("tag", "finish")),
            )
            .task(
                TaskDecl::new(HookType::DataInitialize)
                    .action(PluginDecl::new("logtext").attribute("tag", "data")),
            )
            .task(
                TaskDecl::new(HookType::ViewShow)
                    .value("details")
                    .action(PluginDecl::new("logtext").attribute("tag", "shown")),
            )
            .build(request);

            let log = Arc::clone(&self.0);
            graph.add_load_hook(Box::new(move |_: &ViewGraph| log.lock().push("hook".to_string())));
            Some(graph)
        }
    }

    #[derive(Debug)]
    struct LogText {
        tag: String,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Action for LogText {
        fn run(&self, graph: &Arc<ViewGraph>) -> bool {
            let text = text_of(graph).map(|text| text.as_string()).unwrap_or_default();
            self.log.lock().push(format!("{}:{}", self.tag, text));
            true
        }
    }

    #[test]
    fn test_dropped_screen_discards_view() {
        let harness = Harness::new();
        let (parser, started, gate) = gated();
        let screen = harness.screen(parser, None);

        let (done, done_recv) = channel::unbounded::<()>();
        screen.initialize("main", InitOptions::default().on_done(move || done.send(()).unwrap()));
        started.recv().unwrap();
        drop(screen);
        gate.send(()).unwrap();

        // the job drops on_done without calling it
        assert!(done_recv.recv_timeout(Duration::from_secs(5)).is_err());
    }
}
