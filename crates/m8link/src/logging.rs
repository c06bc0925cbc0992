use clap::ValueEnum;
use m8link_session::Verbosity;
use tracing::level_filters::LevelFilter;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Verbose diagnostics are emitted at debug level, so they lift the
/// filter to at least debug. Normal diagnostics are warnings and need
/// nothing extra.
fn effective_filter(level: LogLevel, diagnostics: Verbosity) -> LevelFilter {
    let filter = level.as_filter();
    if diagnostics == Verbosity::Verbose {
        filter.max(LevelFilter::DEBUG)
    } else {
        filter
    }
}

pub fn init_logging(format: LogFormat, level: LogLevel, diagnostics: Verbosity) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(effective_filter(level, diagnostics))
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_diagnostics_raise_the_filter() {
        assert_eq!(
            effective_filter(LogLevel::Warn, Verbosity::Verbose),
            LevelFilter::DEBUG
        );
        assert_eq!(
            effective_filter(LogLevel::Trace, Verbosity::Verbose),
            LevelFilter::TRACE
        );
    }

    #[test]
    fn other_verbosities_keep_the_level() {
        assert_eq!(
            effective_filter(LogLevel::Error, Verbosity::Normal),
            LevelFilter::ERROR
        );
        assert_eq!(
            effective_filter(LogLevel::Info, Verbosity::Quiet),
            LevelFilter::INFO
        );
    }
}
