use crate::logging::DEFAULT_FILTER;

/// Startup configuration shared by Glint applications.
#[derive(Debug, Clone)]
pub struct Config {
    /// `tracing` filter directives. `RUST_LOG` takes precedence when set.
    pub log_filter: String,
    pub profiling: ProfilingMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_filter: DEFAULT_FILTER.to_string(),
            profiling: ProfilingMode::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfilingMode {
    /// Profiling scopes are compiled in but not recorded
    Off,
    /// Scopes are recorded and can be inspected in-process
    On,
    /// Scopes are recorded and served to `puffin_viewer` over HTTP
    WithWebServer,
}
