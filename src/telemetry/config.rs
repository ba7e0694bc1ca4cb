use std::sync::OnceLock;

static JSON_MODE: OnceLock<bool> = OnceLock::new();

pub fn logs_are_json() -> bool {
    matches!(std::env::var("CAREERSCAN_LOG_FORMAT").as_deref(), Ok("json"))
}

/// Set once from `--json`; later calls are ignored.
pub fn set_json_mode(on: bool) {
    let _ = JSON_MODE.set(on);
}

/// Whether results should be emitted as a JSON envelope on stdout.
pub fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

/// Initialize tracing/logging according to RUST_LOG and CAREERSCAN_LOG_FORMAT.
/// - Defaults to `info` if `RUST_LOG` is unset
/// - Supports `CAREERSCAN_LOG_FORMAT=json` for JSON logs (stderr)
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    use tracing_subscriber::prelude::*; // for .with()

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout is reserved for the --json envelope
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let builder = tracing_subscriber::registry().with(filter);

    match std::env::var("CAREERSCAN_LOG_FORMAT").as_deref() {
        Ok("json") => {
            let _ = builder.with(fmt_layer.json().flatten_event(true)).try_init();
        }
        _ => {
            // human-friendly compact text
            let _ = builder.with(fmt_layer.compact()).try_init();
        }
    }
}
