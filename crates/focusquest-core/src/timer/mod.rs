pub mod cadence;
mod engine;
mod session;

pub use engine::{ActiveTimer, Expiry, TimerState};
pub use session::{SessionType, TimerSession};
