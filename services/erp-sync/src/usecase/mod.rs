pub mod enqueue;
pub mod monitoring;
pub mod process;
pub mod saga;
