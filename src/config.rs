use std::thread;
use std::time::Duration;

/// Loader configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Number of background threads screens are initialized on.
    pub worker_threads: usize,
    /// Worker threads are named `<thread_name>-<index>`.
    pub thread_name: String,
    /// How long `load` waits for initialization before giving up. Waits forever if `None`.
    pub load_timeout: Option<Duration>,
}

impl Default for LoaderConfig {
    fn default() -> LoaderConfig {
        LoaderConfig {
            worker_threads: thread::available_parallelism()
                .map(|n| n.get().min(4))
                .unwrap_or(2),
            thread_name: "petal-init".into(),
            load_timeout: None,
        }
    }
}

impl LoaderConfig {
    pub fn with_worker_threads(mut self, threads: usize) -> LoaderConfig {
        self.worker_threads = threads;
        self
    }

    pub fn with_thread_name(mut self, name: &str) -> LoaderConfig {
        self.thread_name = name.to_string();
        self
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> LoaderConfig {
        self.load_timeout = Some(timeout);
        self
    }
}

#[test]
fn test_config_builders() {
    let config = LoaderConfig::default()
        .with_worker_threads(1)
        .with_thread_name("screens")
        .with_load_timeout(Duration::from_secs(2));
    assert_eq!(config.worker_threads, 1);
    assert_eq!(config.thread_name, "screens");
    assert_eq!(config.load_timeout, Some(Duration::from_secs(2)));
    assert!(LoaderConfig::default().worker_threads >= 1);
}
