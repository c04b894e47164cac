use log::Level;

use super::{LogSink, Record, Severity};

/// Forwards records to the installed `log` logger.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFacade;

impl LogFacade {
    /// Target every forwarded record is logged under.
    pub const TARGET: &'static str = "guardheap";

    pub const fn level(severity: Severity) -> Level {
        match severity {
            Severity::Debug => Level::Debug,
            Severity::Info | Severity::Success => Level::Info,
            Severity::Warning => Level::Warn,
            Severity::Error | Severity::Fatal => Level::Error,
        }
    }
}

impl LogSink for LogFacade {
    fn log(&self, record: &Record<'_>) {
        let level = Self::level(record.severity);
        if level > log::max_level() {
            return;
        }
        log::logger().log(
            &log::Record::builder()
                .level(level)
                .target(Self::TARGET)
                .file(Some(record.file))
                .line(Some(record.line))
                .args(format_args!("{}: {}", record.function, record.message))
                .build(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_fatal_fold_into_log_levels() {
        assert_eq!(LogFacade::level(Severity::Success), Level::Info);
        assert_eq!(LogFacade::level(Severity::Fatal), Level::Error);
        assert_eq!(LogFacade::level(Severity::Warning), Level::Warn);
        assert_eq!(LogFacade::level(Severity::Debug), Level::Debug);
    }
}
