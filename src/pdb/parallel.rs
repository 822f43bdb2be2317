//! Multi-threaded iteration over a pattern database's index space.
//!
//! Workers claim contiguous chunks off a shared pile through a single
//! atomic counter, which balances the load without any further
//! coordination. With a single job the kernel runs inline on the
//! calling thread, which keeps debugging simple.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use log::warn;

/// Hard ceiling on the number of worker threads.
pub const MAX_JOBS: usize = 64;

/// Number of indices a worker claims at a time.
pub const CHUNK_SIZE: u64 = 1024;

/// Runs `kernel(start, count)` over disjoint chunks covering
/// `[0, size)` on up to `jobs` threads.
///
/// If some worker threads cannot be spawned the iteration proceeds
/// with those that could; if not even one can be spawned there is no
/// way to make progress and the process aborts.
pub fn iterate_parallel<F>(jobs: usize, size: u64, kernel: F)
where
    F: Fn(u64, u64) + Sync,
{
    if jobs <= 1 {
        kernel(0, size);
        return;
    }

    let offset = AtomicU64::new(0);
    let worker = || loop {
        let i = offset.fetch_add(CHUNK_SIZE, Ordering::Relaxed);
        if i >= size {
            break;
        }
        kernel(i, CHUNK_SIZE.min(size - i));
    };

    thread::scope(|s| {
        let mut spawned = 0;
        for _ in 0..jobs.min(MAX_JOBS) {
            match thread::Builder::new().spawn_scoped(s, worker) {
                Ok(_) => spawned += 1,
                Err(e) => {
                    assert!(spawned > 0, "could not spawn any worker thread: {e}");
                    warn!("spawned only {spawned} of {jobs} worker threads: {e}");
                    break;
                }
            }
        }
    });
}
