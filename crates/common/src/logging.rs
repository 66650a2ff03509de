//! Logging and tracing initialization.
//!
//! Logs always go to stderr so command output on stdout (for example
//! `reelcut info --json`) stays machine-readable.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Target prefix shared by every reelcut crate and the `reelcut` binary.
///
/// Filter directives match targets by prefix, so this one directive
/// covers `reelcut_render_engine::export` as well as `reelcut::commands`.
pub const REELCUT_TARGET: &str = "reelcut";

/// Level applied to third-party crates when only a bare level is given.
pub const DEPENDENCY_LEVEL: &str = "warn";

/// Expand a configured level into filter directives.
///
/// A bare level such as `debug` applies to the reelcut crates only, with
/// dependencies held at [`DEPENDENCY_LEVEL`]. Anything containing `=` or
/// `,` is treated as a full directive string and used as is.
pub fn default_directives(level: &str) -> String {
    let level = level.trim();
    if level.is_empty() {
        return default_directives("info");
    }
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }

    format!("{DEPENDENCY_LEVEL},{REELCUT_TARGET}={level}")
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directives = default_directives(&config.level);
    EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Ignoring invalid log level '{}': {e}", config.level);
        EnvFilter::new(default_directives("info"))
    })
}

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` takes precedence over `config.level`. Calling this more
/// than once keeps the first subscriber.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::fmt;

    let env_filter = build_filter(config);

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// Initialize logging with defaults (useful for tests and quick scripts).
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_level_targets_reelcut_crates() {
        let directives = default_directives("debug");
        assert_eq!(directives, "warn,reelcut=debug");
        EnvFilter::try_new(&directives).unwrap();
    }

    #[test]
    fn test_explicit_directives_pass_through() {
        assert_eq!(
            default_directives("reelcut_render_engine=trace,info"),
            "reelcut_render_engine=trace,info"
        );
        assert_eq!(default_directives("ffmpeg=debug"), "ffmpeg=debug");
    }

    #[test]
    fn test_empty_level_means_info() {
        assert_eq!(default_directives("  "), default_directives("info"));
        assert_eq!(default_directives(""), "warn,reelcut=info");
    }
}
