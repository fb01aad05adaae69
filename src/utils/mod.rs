//! Utility helpers: tracing timers and tick profiling.

pub mod logging;
pub mod profiling;

pub use logging::{warn_if_frame_budget_exceeded, ScopedTimer};
pub use profiling::{PhaseTimer, TickProfiler};
