pub mod monitoring;
pub mod saga;
