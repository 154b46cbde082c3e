#![forbid(unsafe_code)]

//! Optional global log subscriber.
//!
//! Library crates only emit `tracing` events; applications that want them
//! printed call [`init`] once at startup. The filter uses `RUST_LOG` syntax,
//! e.g. `"mindmap.layout=debug,mindmap.interaction=trace"`.

use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Install a stderr fmt subscriber filtered by `filter`.
///
/// With the `logging-json` feature each event is written as one JSON
/// object per line.
pub fn init(filter: &str) -> Result<()> {
    let filter = EnvFilter::try_new(filter).map_err(|e| Error::Logging(e.to_string()))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    #[cfg(feature = "logging-json")]
    let builder = builder.json();
    builder.try_init().map_err(|e| Error::Logging(e.to_string()))
}

/// Like [`init`], reading the filter from `RUST_LOG` and falling back to
/// `default` when it is unset.
pub fn init_from_env(default: &str) -> Result<()> {
    let filter = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default.to_owned());
    init(&filter)
}
