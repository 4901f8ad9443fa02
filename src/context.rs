//! Completion tracking for one shard's rollup cycle.
//!
//! [`ExecutionContext`] counts in-flight read and write operations and wakes
//! the owning thread whenever a worker reports a completion. The owner drives
//! a recheck loop: park with a bounded timeout, recheck [`done_reading`] or
//! [`done`], repeat until satisfied or the cycle is abandoned.
//!
//! # Wake-Up Discipline
//!
//! Completions unpark the owner through its [`Thread`] handle. An unpark that
//! arrives before the owner parks is retained as a token, so the classic
//! check-then-sleep race cannot lose a wake-up. An unpark while nobody is
//! waiting is harmless: the owner rechecks its predicate after every return
//! from [`wait_timeout`], including spurious and timed-out ones.
//!
//! [`done_reading`]: ExecutionContext::done_reading
//! [`done`]: ExecutionContext::done
//! [`wait_timeout`]: ExecutionContext::wait_timeout

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::thread::{self, Thread};
use std::time::Duration;

/// Context of execution for a single shard, covering many rollups of one
/// granularity.
///
/// Exactly one thread, fixed at construction, may block on the context. Any
/// number of worker threads may report completions and failures concurrently
/// with each other and with the owner's own increments.
///
/// The three fields are independent atomic cells; no operation needs
/// multi-field atomicity, and completions from distinct workers never
/// serialize on a lock. All accesses are sequentially consistent so counter
/// movement and the success downgrade become visible to the owner in one
/// memory-visibility class.
///
/// A context serves one cycle and is discarded once the owner observes
/// [`done`](Self::done), never reused.
#[derive(Debug)]
pub struct ExecutionContext {
    pending_reads: AtomicI64,
    pending_writes: AtomicI64,
    successful: AtomicBool,
    owner: Thread,
}

impl ExecutionContext {
    /// Creates a context owned by `owner`, with no pending work and the
    /// success flag set.
    #[must_use]
    pub fn new(owner: Thread) -> Self {
        Self {
            pending_reads: AtomicI64::new(0),
            pending_writes: AtomicI64::new(0),
            successful: AtomicBool::new(true),
            owner,
        }
    }

    /// Creates a context owned by the calling thread.
    #[must_use]
    pub fn for_current_thread() -> Self {
        Self::new(thread::current())
    }

    /// Registers one pending read operation.
    ///
    /// Called by the dispatcher before the unit is handed to a worker. Does
    /// not wake anyone: the owner is the party adding work and is not
    /// waiting for an increase.
    pub fn increment_read_counter(&self) {
        self.pending_reads.fetch_add(1, Ordering::SeqCst);
    }

    /// Registers one pending write operation.
    pub fn increment_write_counter(&self) {
        self.pending_writes.fetch_add(1, Ordering::SeqCst);
    }

    /// Reports one completed read and wakes the owner.
    ///
    /// Workers call this exactly once per unit, whether the unit succeeded
    /// or failed. Safe to call while the owner is not parked; the wake is
    /// retained as an unpark token and consumed by the owner's next park.
    pub fn decrement_read_counter(&self) {
        self.decrement_read_counter_by(1);
    }

    /// Reports `count` completed reads in one call and wakes the owner once.
    pub fn decrement_read_counter_by(&self, count: i64) {
        let remaining = self.pending_reads.fetch_sub(count, Ordering::SeqCst) - count;
        tracing::trace!(count, remaining, "context::reads completed");
        self.owner.unpark();
    }

    /// Reports `count` completed writes in one call and wakes the owner once.
    pub fn decrement_write_counter_by(&self, count: i64) {
        let remaining = self.pending_writes.fetch_sub(count, Ordering::SeqCst) - count;
        tracing::trace!(count, remaining, "context::writes completed");
        self.owner.unpark();
    }

    /// True when no reads are pending.
    ///
    /// Advisory snapshot: concurrent decrements may flip it at any moment,
    /// so the owner must recheck after every wait. A counter driven below
    /// zero by over-reporting still counts as done; that is a caller
    /// contract violation the context tolerates silently.
    #[must_use]
    pub fn done_reading(&self) -> bool {
        self.pending_reads.load(Ordering::SeqCst) <= 0
    }

    /// True when no writes are pending. Same advisory caveat as
    /// [`done_reading`](Self::done_reading).
    #[must_use]
    pub fn done_writing(&self) -> bool {
        self.pending_writes.load(Ordering::SeqCst) <= 0
    }

    /// True when no reads and no writes are pending.
    #[must_use]
    pub fn done(&self) -> bool {
        self.done_reading() && self.done_writing()
    }

    /// Current value of the success flag.
    #[must_use]
    pub fn was_successful(&self) -> bool {
        self.successful.load(Ordering::SeqCst)
    }

    /// Records that one unit failed, permanently downgrading the cycle.
    ///
    /// Idempotent: every call stores the same `false`, so racing workers
    /// need no coordination. The error detail is emitted at trace level and
    /// dropped; retaining or logging it is the reporting worker's job. The
    /// failed unit must still be reported through the matching decrement so
    /// the context can reach [`done`](Self::done).
    pub fn mark_unsuccessful(&self, error: &dyn std::error::Error) {
        tracing::trace!(%error, "context::unit failed");
        self.successful.store(false, Ordering::SeqCst);
    }

    /// Blocks the calling thread until a completion is reported or `timeout`
    /// elapses, whichever comes first.
    ///
    /// Must be called from the owner thread (debug-asserted). One bounded
    /// park, not a predicate loop: the caller owns the loop of waiting,
    /// rechecking [`done`](Self::done) or [`done_reading`](Self::done_reading),
    /// and deciding when to abandon the cycle. Returns immediately when a
    /// wake-up arrived since the last park.
    pub fn wait_timeout(&self, timeout: Duration) {
        debug_assert_eq!(
            thread::current().id(),
            self.owner.id(),
            "only the owner thread may block on an ExecutionContext"
        );
        tracing::trace!(timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX), "context::owner parking");
        thread::park_timeout(timeout);
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pending reads: {} writes: {} -- Success: {}",
            self.pending_reads.load(Ordering::SeqCst),
            self.pending_writes.load(Ordering::SeqCst),
            self.successful.load(Ordering::SeqCst)
        )
    }
}
