//! Leaks and overruns on purpose, then prints what the allocator noticed.
//!
//! Run with `RUST_LOG=guardheap=debug cargo run --example leak_report`.

use guardheap::{Config, Libc, LogFacade, TrackedAllocator, call_site, global};

fn main() {
    env_logger::init();

    // Diagnostics go through the `log` facade here...
    let mut heap =
        TrackedAllocator::with_parts(Libc, LogFacade, Config::new().report_on_drop(true));

    let kept = heap.allocate(32, call_site!()).expect("32 bytes");
    let overrun = heap.allocate(4, call_site!()).expect("4 bytes");
    // SAFETY: `overrun` is followed by its guard; writing into it is the point.
    unsafe {
        *overrun.as_ptr().add(4) = 0xEE;
        let _ = heap.deallocate(Some(overrun));
    }

    let _grown = unsafe { heap.reallocate(Some(kept), 64, call_site!()) }.expect("64 bytes");
    println!("live after resize: {:?}", heap);
    for leak in heap.report() {
        println!("{leak}");
    }

    // ...and straight to the console through the process-wide instance.
    let block = global::malloc(10);
    let _ = global::calloc(2, 8);
    // SAFETY: block came from global::malloc and is not used afterwards.
    unsafe { global::free(block) };
    println!("global leaks: {}", global::report_leaks());

    // `heap` reports its remaining leak as it is dropped.
}
