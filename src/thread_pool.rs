//! Shared thread pool for permutation workers.
//!
//! Every null distribution is built on one process-wide pool, so nested or
//! concurrent analyses do not each spawn their own threads.

#[cfg(feature = "parallel")]
use rayon::ThreadPool;

#[cfg(feature = "parallel")]
use std::sync::OnceLock;

#[cfg(feature = "parallel")]
static THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();

/// Get or initialize the shared permutation pool.
///
/// The pool is configured with:
/// - Stack size: 8 MB (vs rayon's default 2 MB)
/// - Thread count: number of logical CPUs
#[cfg(feature = "parallel")]
pub fn get_thread_pool() -> &'static ThreadPool {
    THREAD_POOL.get_or_init(|| {
        rayon::ThreadPoolBuilder::new()
            .stack_size(8 * 1024 * 1024)
            .thread_name(|i| format!("tractstats-perm-{}", i))
            .build()
            .expect("Failed to build permutation thread pool")
    })
}

/// Run `op` inside the shared permutation pool.
#[cfg(feature = "parallel")]
pub fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R + Send,
    R: Send,
{
    get_thread_pool().install(op)
}

/// Run `op` on the calling thread.
#[cfg(not(feature = "parallel"))]
pub fn install<OP, R>(op: OP) -> R
where
    OP: FnOnce() -> R,
{
    op()
}
