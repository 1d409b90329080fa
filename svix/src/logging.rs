//! Tracing setup
//!
//! Terraform shows the plugin's stderr in its own log when `TF_LOG` is set,
//! so output goes there without colors.

use tracing::Level;

pub const LOG_LEVEL_ENV: &str = "TF_LOG";

/// Maps a `TF_LOG` value to a level; unset or unrecognized means info
pub fn level_from(value: Option<&str>) -> Level {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("trace") | Some("json") => Level::TRACE,
        Some("debug") => Level::DEBUG,
        Some("warn") => Level::WARN,
        Some("error") => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init() {
    let level = level_from(std::env::var(LOG_LEVEL_ENV).ok().as_deref());
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tf_log_levels() {
        assert_eq!(level_from(Some("TRACE")), Level::TRACE);
        assert_eq!(level_from(Some("debug")), Level::DEBUG);
        assert_eq!(level_from(Some(" warn ")), Level::WARN);
        assert_eq!(level_from(Some("error")), Level::ERROR);
        assert_eq!(level_from(Some("verbose")), Level::INFO);
        assert_eq!(level_from(None), Level::INFO);
    }

    #[test]
    fn init_is_idempotent() {
        init();
        init();
        tracing::info!("logging initialised twice without panicking");
    }
}
