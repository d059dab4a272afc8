use clap::ValueEnum;
use msglink_dispatch::DebugSink;
use msglink_frame::ProtocolEvent;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Target for protocol conditions reported by a link (overflow, resync, ...).
pub const PROTOCOL_TARGET: &str = "msglink::protocol";

/// Crates whose per-frame `trace!` output `--trace-frames` turns on.
const FRAME_TARGETS: [&str; 2] = ["msglink_frame", "msglink_dispatch"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Protocol conditions stay visible at `warn` even when `--log-level error`
/// silences everything else.
fn filter(level: LogLevel, trace_frames: bool) -> Targets {
    let base = level.as_filter();
    let mut targets = Targets::new()
        .with_default(base)
        .with_target(PROTOCOL_TARGET, base.max(LevelFilter::WARN));
    if trace_frames {
        for target in FRAME_TARGETS {
            targets = targets.with_target(target, LevelFilter::TRACE);
        }
    }
    targets
}

pub fn init_logging(format: LogFormat, level: LogLevel, trace_frames: bool) {
    let filter = filter(level, trace_frames);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::TRACE)
        .with_ansi(false)
        .with_target(trace_frames);

    match format {
        LogFormat::Text => {
            let _ = builder.finish().with(filter).try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().finish().with(filter).try_init();
        }
    }
}

/// Debug sink that logs every protocol condition under [`PROTOCOL_TARGET`].
pub fn protocol_sink(link: &'static str) -> impl DebugSink {
    move |event: &ProtocolEvent| report(link, event)
}

/// Log one protocol condition met on `link`.
pub fn report(link: &str, event: &ProtocolEvent) {
    tracing::warn!(target: PROTOCOL_TARGET, link, %event, "protocol condition");
}
