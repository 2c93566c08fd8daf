//! Application layer - the concurrent acquisition pipeline
//!
//! One scheduler and one driver per host link, a single archive sink, all
//! owned by a supervisor that holds the cancellation scope. Components talk
//! exclusively through bounded channels; cancellation is honored at every
//! suspension point and already-received work is drained before exit.

pub mod driver;
pub mod scheduler;
pub mod sink;
pub mod supervisor;

pub use driver::Driver;
pub use scheduler::Scheduler;
pub use sink::SinkWorker;
pub use supervisor::Supervisor;

/// Capacity of the scheduler→driver and driver→sink channels. Bounded so
/// a slow consumer back-pressures its producer instead of dropping work.
pub const CHANNEL_CAPACITY: usize = 10;
