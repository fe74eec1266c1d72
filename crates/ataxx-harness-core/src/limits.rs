//! Fixed resource constants from the harness's concurrency model.
//!
//! None of these are environment-configurable; the only script-mutable
//! knobs are `@time` (per-operation timeout) and `@total-time` (match
//! deadline), both consumed above this crate.

/// Capacity of a worker's stdin and stdout queues.
pub const STDIO_QUEUE_CAPACITY: usize = 500;

/// Capacity of a worker's peer-receive queue.
pub const PEER_QUEUE_CAPACITY: usize = 4;

/// Capacity of the match's termination channel.
pub const TERMINATION_CHANNEL_CAPACITY: usize = 8;

/// Default per-operation timeout, in seconds, before `@time` overrides it.
pub const DEFAULT_OP_LIMIT_SECS: f64 = 10.0;

/// Default match deadline, in seconds, before `@total-time` overrides it.
pub const DEFAULT_TOTAL_TIME_SECS: u64 = 120;

/// Grace period after the first worker terminates, waiting for the second.
pub const CLEANUP_BUDGET_SECS: u64 = 2;
