use std::io::{self, Write};

use super::{LogSink, Record, Severity, color};

/// Prints one line per record to stderr:
///
/// ```text
/// [ERROR] (deallocate: src/main.rs:12) address 0x1234 is not a tracked allocation
/// ```
///
/// The `[LEVEL]` tag is colored by severity unless colors are turned off.
#[derive(Clone, Copy, Debug)]
pub struct ConsoleSink {
    min_severity: Severity,
    colored: bool,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink {
    pub const fn new() -> Self {
        Self {
            min_severity: Severity::Debug,
            colored: true,
        }
    }

    /// Drop records below `severity`.
    pub const fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }

    pub const fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.min_severity
    }

    /// Write `record` as a single line, whether or not it passes the filter.
    pub fn render<W: Write>(&self, out: &mut W, record: &Record<'_>) -> io::Result<()> {
        if self.colored {
            write!(
                out,
                "{}{}[{}]{} ",
                color::BG_BLACK,
                record.severity.color(),
                record.severity,
                color::RESET
            )?;
        } else {
            write!(out, "[{}] ", record.severity)?;
        }
        writeln!(
            out,
            "({}: {}:{}) {}",
            record.function, record.file, record.line, record.message
        )
    }
}

impl LogSink for ConsoleSink {
    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.severity) {
            return;
        }
        let stderr = io::stderr();
        let mut out = stderr.lock();
        // Nowhere left to report a failed diagnostic write.
        let _ = self.render(&mut out, record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(sink: ConsoleSink, severity: Severity) -> String {
        let mut out = Vec::new();
        sink.render(
            &mut out,
            &Record {
                severity,
                function: "deallocate",
                file: "src/main.rs",
                line: 12,
                message: format_args!("{} bytes", 4),
            },
        )
        .expect("write to Vec");
        String::from_utf8(out).expect("utf-8")
    }

    #[test]
    fn colored_line_layout() {
        assert_eq!(
            rendered(ConsoleSink::new(), Severity::Error),
            "\x1b[40m\x1b[31m[ERROR]\x1b[0m (deallocate: src/main.rs:12) 4 bytes\n"
        );
    }

    #[test]
    fn plain_line_layout() {
        assert_eq!(
            rendered(ConsoleSink::new().with_colors(false), Severity::Warning),
            "[WARNING] (deallocate: src/main.rs:12) 4 bytes\n"
        );
    }

    #[test]
    fn min_severity_filters() {
        let sink = ConsoleSink::new().with_min_severity(Severity::Warning);
        assert!(!sink.enabled(Severity::Info));
        assert!(sink.enabled(Severity::Warning));
        assert!(sink.enabled(Severity::Fatal));
    }
}
