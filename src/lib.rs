//! Rollsync: completion bookkeeping and owner wake-up for sharded rollup cycles.
//!
//! # Overview
//!
//! A rollup pass over one shard dispatches many concurrent read and write
//! operations to worker threads, then must discover the moment all of them
//! have finished (or that one failed) without busy-polling. Rollsync provides
//! the single synchronization point for that pattern: an [`ExecutionContext`]
//! with two pending-operation counters, a sticky success flag, and a wake-up
//! channel to the one thread allowed to block on it.
//!
//! # Core Guarantees
//!
//! - **No lost wake-ups**: a completion reported before the owner parks is
//!   retained, so the check-then-sleep race cannot strand the owner
//! - **Single-owner wake**: completions unpark only the designated owner
//!   thread, never an unrelated waiter
//! - **Lock-free bookkeeping**: each counter and the flag is an independent
//!   atomic cell; worker completions never serialize on a shared mutex
//! - **Sticky failure**: one failed unit downgrades the cycle permanently;
//!   the downgrade is idempotent under any interleaving
//!
//! # Module Structure
//!
//! - [`context`]: the [`ExecutionContext`] primitive
//! - [`test_utils`]: tracing-based logging helpers and assertion macros for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]

pub mod context;
pub mod test_utils;

pub use context::ExecutionContext;
