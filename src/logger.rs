use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt::{self, format::FmtSpan}};

/// Crate-specific filter variable, checked before `RUST_LOG`.
pub const LOG_ENV: &str = "MHDR_SRGB_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Installs the global subscriber.
///
/// Worker threads are named, so each conversion line shows which pool thread
/// ran it. Stage spans report their timings on close at debug verbosity.
pub fn init() {
    let env_filter = filter_from_env();
    let span_events = span_events_for(&env_filter);

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_names(true)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// `CLOSE` once any directive enables debug output, otherwise nothing.
fn span_events_for(filter: &EnvFilter) -> FmtSpan {
    match filter.max_level_hint() {
        Some(level) if level >= LevelFilter::DEBUG => FmtSpan::CLOSE,
        _ => FmtSpan::NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_timings_follow_verbosity() {
        assert_eq!(span_events_for(&EnvFilter::new("info")), FmtSpan::NONE);
        assert_eq!(span_events_for(&EnvFilter::new("warn,mhdr_srgb=debug")), FmtSpan::CLOSE);
        assert_eq!(span_events_for(&EnvFilter::new("trace")), FmtSpan::CLOSE);
    }
}
