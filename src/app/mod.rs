pub mod effect;
pub mod event;
pub mod reducer;
pub mod runtime;
pub mod scheduler;
