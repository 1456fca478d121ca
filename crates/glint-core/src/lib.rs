//! Glint Core
//!
//! Shared plumbing for the Glint crates: logging setup, profiling hooks,
//! math re-exports and the top-level [`Config`](config::Config).

pub mod config;
pub mod logging;
pub mod math;
pub mod profiling;

use config::{Config, ProfilingMode};

/// Initialize logging and profiling from a [`Config`].
///
/// Call once at startup, before creating any renderer.
pub fn init(config: &Config) {
    logging::init_with_filter(&config.log_filter);

    match config.profiling {
        ProfilingMode::Off => {}
        ProfilingMode::On => profiling::enable(),
        ProfilingMode::WithWebServer => {
            profiling::init_profiling(profiling::ProfilingBackend::PuffinHttp)
        }
    }
}
