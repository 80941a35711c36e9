mod cancel;
mod clock;
mod controller;
mod queue;
mod spec;

pub use cancel::CancelToken;
pub use clock::{elapsed_ms, Clock, ManualClock, SystemClock};
pub use controller::{ActiveTimer, Command, ExecutionController, RunPhase};
pub use queue::TimerQueue;
pub use spec::{TimerId, TimerSpec};
