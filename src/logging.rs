use std::env;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber for supakey
///
/// Status output is compact and untimed, filtered by RUST_LOG (default "info").
/// NO_COLOR / SUPAKEY_NO_COLOR disable ANSI colors, FORCE_COLOR / SUPAKEY_FORCE_COLOR
/// force them on.
pub fn init_logging() {
    let use_ansi = should_use_colors(|name| env::var_os(name).is_some());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(use_ansi)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .without_time()
                .compact(),
        )
        .with(env_filter)
        .init();
}

fn should_use_colors(is_set: impl Fn(&str) -> bool) -> bool {
    if is_set("NO_COLOR") || is_set("SUPAKEY_NO_COLOR") {
        return false;
    }

    if is_set("FORCE_COLOR") || is_set("SUPAKEY_FORCE_COLOR") {
        return true;
    }

    // tracing-subscriber handles TTY detection from here
    true
}
