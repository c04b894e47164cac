use parking_lot::Mutex;

use super::{LogSink, Record, Severity};

/// An owned copy of a [`Record`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedRecord {
    pub severity: Severity,
    pub function: &'static str,
    pub file: String,
    pub line: u32,
    pub message: String,
}

/// Keeps every record it receives, for later inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<CapturedRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Messages logged at exactly `severity`.
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.severity == severity)
            .map(|record| record.message.clone())
            .collect()
    }

    /// Remove and return everything captured so far.
    pub fn take(&self) -> Vec<CapturedRecord> {
        std::mem::take(&mut *self.records.lock())
    }
}

impl LogSink for MemorySink {
    fn log(&self, record: &Record<'_>) {
        let captured = CapturedRecord {
            severity: record.severity,
            function: record.function,
            file: record.file.to_owned(),
            line: record.line,
            message: record.message.to_string(),
        };
        self.records.lock().push(captured);
    }
}
