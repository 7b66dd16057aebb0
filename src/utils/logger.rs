use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output shape of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable single lines for a terminal.
    Compact,
    /// One JSON event per line for container log collectors.
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}

/// Default filter when `RUST_LOG` is unset.
pub fn filter_directive(verbose: bool) -> &'static str {
    if verbose {
        "tcg_bot=debug,info"
    } else {
        "tcg_bot=info"
    }
}

pub fn init_logger(format: LogFormat, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbose)));

    // 兩種輸出只會啟用一個，另一個是 None
    let compact = (format == LogFormat::Compact).then(|| {
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .compact()
    });
    let json = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .with_target(false)
            .json()
            .with_current_span(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(compact)
        .with(json)
        .init();
}
