use tracing::warn;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

const QUIET: &str = "warn";
const VERBOSE: &str = "info";

/// Installed subscriber whose level can still be raised once the config is
/// known.
pub struct Logging {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

/// Log to stderr so stdout stays clean for status-bar JSON.
///
/// Starts at `RUST_LOG`, or `warn` when it is unset, so config loading is
/// already logged.
pub fn init() -> Logging {
    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::new(QUIET), false),
    };
    let (filter, handle) = reload::Layer::new(filter);

    // A subscriber may already be installed (e.g. by tests).
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();

    Logging { handle, from_env }
}

impl Logging {
    /// Apply the config's `logger` switch. `RUST_LOG` always wins.
    pub fn set_verbose(&self, verbose: bool) {
        if let Some(directive) = verbose_filter(self.from_env, verbose)
            && let Err(err) = self.handle.reload(EnvFilter::new(directive))
        {
            warn!("failed to raise log level: {err}");
        }
    }
}

fn verbose_filter(from_env: bool, verbose: bool) -> Option<&'static str> {
    (!from_env && verbose).then_some(VERBOSE)
}
