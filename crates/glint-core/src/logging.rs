use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor an explicit filter is provided.
///
/// Keeps the GPU stack quiet while leaving Glint's own spans visible.
pub const DEFAULT_FILTER: &str = "debug,wgpu_core=info,wgpu_hal=info,naga=info";

pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `filter` when it is set. Calling this more than once
/// is harmless; later calls leave the first subscriber in place.
pub fn init_with_filter(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global subscriber already installed, keeping it");
    }
}
