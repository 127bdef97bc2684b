//! The Braidery notification dispatch queue.
//!
//! Jobs are persisted rows in the `jobs` table. Producers enqueue typed jobs
//! (email, SMS, push, webhook) without blocking on delivery; the
//! [`poller::Dispatcher`] claims due work on a fixed cadence, executes it
//! through per-channel [`senders`], retries with exponential backoff, and
//! dead-letters jobs that exhaust their attempt budget.

pub mod backoff;
pub mod poller;
pub mod producer;
pub mod senders;
pub mod store;
