pub mod blend;
pub mod spring;
pub mod timer;

// Re-export commonly used types and functions for convenience
pub use blend::{blend_in_progress, fade_out_progress};
pub use spring::Spring;
pub use timer::{FrameCallback, FrameTimer, TimerToken};
