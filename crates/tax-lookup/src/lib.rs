pub mod config;
pub mod error;
pub mod jurisdiction;
pub mod reference;
pub mod telemetry;
