//! Where the allocator sends its diagnostics.
//!
//! The allocator never inspects what a sink does with a record: reporting is
//! fire and forget. Three sinks ship with the crate:
//!
//! * [`ConsoleSink`] prints colored lines to stderr.
//! * [`LogFacade`] forwards to whatever `log` logger is installed.
//! * [`MemorySink`] keeps records around so they can be inspected.

pub mod color;
mod console;
mod facade;
mod memory;

pub use console::ConsoleSink;
pub use facade::LogFacade;
pub use memory::{CapturedRecord, MemorySink};

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// Severity of a diagnostic, least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Success,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Debug,
        Severity::Info,
        Severity::Success,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Success => "SUCCESS",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Foreground color used when the severity is printed to a terminal.
    pub const fn color(self) -> &'static str {
        match self {
            Severity::Debug => color::FG_BLUE,
            Severity::Info => color::FG_WHITE,
            Severity::Success => color::FG_GREEN,
            Severity::Warning => color::FG_YELLOW,
            Severity::Error => color::FG_RED,
            Severity::Fatal => color::FG_MAGENTA,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown severity {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str() == s)
            .ok_or_else(|| ParseSeverityError(s.to_owned()))
    }
}

/// One diagnostic emitted by the allocator.
///
/// `file`/`line` point at the code that called into the allocator, and
/// `function` names the allocator operation that produced the record.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    pub severity: Severity,
    pub function: &'static str,
    pub file: &'a str,
    pub line: u32,
    pub message: fmt::Arguments<'a>,
}

pub trait LogSink {
    fn log(&self, record: &Record<'_>);
}

impl<T: LogSink + ?Sized> LogSink for &T {
    fn log(&self, record: &Record<'_>) {
        (**self).log(record)
    }
}

impl<T: LogSink + ?Sized> LogSink for Box<T> {
    fn log(&self, record: &Record<'_>) {
        (**self).log(record)
    }
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn log(&self, record: &Record<'_>) {
        (**self).log(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_names_round_trip() {
        for severity in Severity::ALL {
            assert_eq!(severity.as_str().parse::<Severity>(), Ok(severity));
            assert_eq!(severity.to_string(), severity.as_str());
        }
    }

    #[test]
    fn unknown_severity_is_rejected() {
        assert_eq!(
            "info".parse::<Severity>(),
            Err(ParseSeverityError("info".to_owned()))
        );
        assert!("".parse::<Severity>().is_err());
        assert!("UNKNOWN".parse::<Severity>().is_err());
    }

    #[test]
    fn severities_are_ordered() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Warning < Severity::Error);
        assert_eq!(Severity::ALL.iter().max(), Some(&Severity::Fatal));
    }

    #[test]
    fn each_severity_has_its_own_color() {
        assert_eq!(Severity::Error.color(), "\x1b[31m");
        assert_eq!(Severity::Success.color(), "\x1b[32m");
        let mut colors: Vec<_> = Severity::ALL.iter().map(|s| s.color()).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), Severity::ALL.len());
    }
}
