pub mod clock;
pub mod limiter;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use limiter::FixedWindowLimiter;
pub use store::{CounterStore, MemoryCounterStore};
