//! Client-side elapsed-time tracking.
//!
//! [`TimerRegistry`] holds the running timers, [`ElapsedChannels`] fans the
//! recomputed values out to views, and [`TimerService`] ties both to the
//! one-second tick loop and the ten-second flush loop.

mod channel;
mod registry;
mod service;


pub use channel::ElapsedChannels;
pub use registry::{TimerRegistry, TimerState};
pub use service::{TimerConfig, TimerService};
