use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Crate target prefix used to filter only library-originated logs.
pub const TARGET_PREFIX: &str = "ai_llm_service";

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
pub struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let s = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// True when `target` was emitted by this library.
pub fn is_library_target(target: &str) -> bool {
    target.starts_with(TARGET_PREFIX)
}

/// Build a **library-scoped** formatting layer that renders ONLY provider events.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with `file:line`
/// - Span close events (durations of instrumented calls)
/// - ANSI colors only when stdout is a terminal
///
/// The per-layer filter leaves logs from other crates to the binary's own layer.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let only_this_crate = filter::filter_fn(|meta| is_library_target(meta.target()));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_ansi(io::stdout().is_terminal())
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_this_crate)
}

/// Level directive for this library only, e.g. `ai_llm_service=debug`.
///
/// Falls back to a bare level directive if the target form cannot be parsed.
pub fn level_directive(level: Level) -> Directive {
    let s = format!("{TARGET_PREFIX}={}", level.as_str().to_lowercase());
    Directive::from_str(&s).unwrap_or_else(|_| LevelFilter::from_level(level).into())
}

/// `EnvFilter` from `RUST_LOG` when it is set and valid.
///
/// Otherwise `default` plus a per-crate `level` for this library.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), default, level)
}

fn filter_from(rust_log: Option<&str>, default: &str, level: Level) -> EnvFilter {
    rust_log
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(default).add_directive(level_directive(level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_targets_library() {
        assert_eq!(level_directive(Level::DEBUG).to_string(), "ai_llm_service=debug");
    }

    #[test]
    fn rust_log_keeps_library_level() {
        let f = filter_from(Some("warn,ai_llm_service=debug"), "info", Level::INFO);
        assert_eq!(f.max_level_hint(), Some(LevelFilter::DEBUG));
        assert!(!f.to_string().contains("ai_llm_service=info"));
    }

    #[test]
    fn default_applies_library_level() {
        let f = filter_from(None, "warn", Level::INFO);
        assert_eq!(f.max_level_hint(), Some(LevelFilter::INFO));
        assert!(f.to_string().contains("ai_llm_service=info"));

        let blank = filter_from(Some("  "), "warn", Level::INFO);
        assert_eq!(blank.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn target_prefix_matching() {
        assert!(is_library_target("ai_llm_service::services::gemini_service"));
        assert!(!is_library_target("api::routes"));
    }
}
