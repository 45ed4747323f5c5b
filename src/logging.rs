use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. Format is `json`
/// unless configured as `pretty` or `compact`.
pub fn init(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match settings.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.json().init(),
    }
}
