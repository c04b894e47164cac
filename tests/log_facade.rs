use std::ptr::NonNull;

use guardheap::{AllocError, Config, Libc, LogFacade, TrackedAllocator, call_site};
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Seen {
    level: Level,
    target: String,
    file: Option<String>,
    line: Option<u32>,
    message: String,
}

struct Capture {
    seen: Mutex<Vec<Seen>>,
}

impl Log for Capture {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.seen.lock().push(Seen {
            level: record.level(),
            target: record.target().to_owned(),
            file: record.file().map(str::to_owned),
            line: record.line(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    seen: Mutex::new(Vec::new()),
};

// A process has one logger, so this file holds a single test.
#[test]
fn diagnostics_reach_the_installed_logger() {
    log::set_logger(&CAPTURE).expect("first logger");
    log::set_max_level(LevelFilter::Trace);

    let mut heap = TrackedAllocator::with_parts(Libc, LogFacade, Config::new());
    let bogus = NonNull::<u8>::dangling();
    let line = line!() + 1;
    let result = unsafe { heap.deallocate(Some(bogus)) };
    assert!(matches!(result, Err(AllocError::UntrackedAddress { .. })));

    let ptr = heap.allocate(2, call_site!()).expect("2 bytes");
    assert_eq!(heap.log_leaks(), 1);
    unsafe { heap.deallocate(Some(ptr)) }.expect("clean free");

    let seen = CAPTURE.seen.lock().clone();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|record| record.level == Level::Error));
    assert!(seen.iter().all(|record| record.target == LogFacade::TARGET));

    assert_eq!(seen[0].file.as_deref(), Some(file!()));
    assert_eq!(seen[0].line, Some(line));
    assert!(seen[0].message.starts_with("deallocate: Target memory address not found"));
    assert!(seen[1].message.starts_with("log_leaks: Memory leak detected at tests/log_facade.rs:"));
    assert_eq!(seen[2].message, "log_leaks: 1 allocation(s) leaked, 2 bytes in total.");

    let quiet = heap.allocate(1, call_site!()).expect("1 byte");
    log::set_max_level(LevelFilter::Off);
    assert_eq!(heap.log_leaks(), 1);
    unsafe { heap.deallocate(Some(quiet)) }.expect("clean free");
    assert_eq!(CAPTURE.seen.lock().len(), 3);
}
