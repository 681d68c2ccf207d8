use std::sync::Once;

use env_logger::WriteStyle;

/// Used when neither an explicit filter nor `RUST_LOG` is given. Keeps the
/// windowing crates quiet while showing session and GL wrapper messages.
pub const DEFAULT_FILTER: &str = "warn,canvas2d=info,gl_wrapper=info";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `env_logger` filter directives, e.g. "canvas2d::resize=debug".
    pub env_filter: Option<String>,
    pub write_style: WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Picks the filter: explicit one first, then `env_value` (the contents
    /// of `RUST_LOG`), then [`DEFAULT_FILTER`]. Blank values are skipped.
    pub fn resolve_filter(&self, env_value: Option<&str>) -> String {
        self.env_filter
            .as_deref()
            .into_iter()
            .chain(env_value)
            .map(str::trim)
            .find(|f| !f.is_empty())
            .unwrap_or(DEFAULT_FILTER)
            .to_string()
    }
}

static INIT: Once = Once::new();

/// Installs the global logger. Only the first call has an effect, so tests
/// and the binary may both call it.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let env_value = std::env::var("RUST_LOG").ok();
        let filter = config.resolve_filter(env_value.as_deref());

        let installed = env_logger::Builder::new()
            .parse_filters(&filter)
            .write_style(config.write_style)
            .try_init();

        match installed {
            Ok(()) => log::debug!("logging to stderr with filter {filter:?}"),
            // another logger was set up before us (e.g. by a test harness)
            Err(e) => log::debug!("keeping existing logger: {e}"),
        }
    });
}
