use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Warnings (such as falling back to built-in exchange rates) are always
/// shown; `verbose` adds debug output for this crate only.
fn app_targets(verbose: bool) -> Targets {
    let app_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    Targets::new()
        .with_target("ratequote", app_level)
        .with_target("reqwest", LevelFilter::WARN)
        .with_target("fjall", LevelFilter::ERROR)
        .with_target("lsm_tree", LevelFilter::ERROR)
}

pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .without_time()
                .with_target(verbose)
                .with_writer(std::io::stderr),
        )
        .with(app_targets(verbose))
        .with(env_filter)
        .init();
}
