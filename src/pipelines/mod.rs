pub mod advice;
pub mod chat;
pub mod gemini;
pub mod guidance;
pub mod judge;
pub mod markers;
pub mod modify;
pub mod perf;
