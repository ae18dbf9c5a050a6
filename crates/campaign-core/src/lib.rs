pub mod config;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod query;
pub mod shaping;
